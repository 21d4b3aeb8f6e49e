//! Config command - manage the user configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;

use pagemark_core::PagemarkConfig;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Initialize a new configuration file
    Init(InitArgs),

    /// Get a specific configuration value
    Get {
        /// Configuration key (e.g., "table.x_tolerance")
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// New value (JSON, or a bare string)
        value: String,
    },

    /// Show configuration file path
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Output path for configuration file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(),
        ConfigCommand::Init(init_args) => init_config(init_args),
        ConfigCommand::Get { key } => get_config(&key),
        ConfigCommand::Set { key, value } => set_config(&key, &value),
        ConfigCommand::Path => show_path(),
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pagemark")
        .join("config.json")
}

fn read_or_default(path: &Path) -> anyhow::Result<PagemarkConfig> {
    if path.exists() {
        Ok(PagemarkConfig::from_file(path)?)
    } else {
        Ok(PagemarkConfig::default())
    }
}

fn show_config() -> anyhow::Result<()> {
    let config_path = default_config_path();
    if !config_path.exists() {
        println!("{} No config file found, showing defaults.", style("ℹ").blue());
    }

    let config = read_or_default(&config_path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn init_config(args: InitArgs) -> anyhow::Result<()> {
    let output_path = args.output.unwrap_or_else(default_config_path);

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    PagemarkConfig::default().save(&output_path)?;

    println!(
        "{} Created configuration file at {}",
        style("✓").green(),
        output_path.display()
    );
    Ok(())
}

/// Look up a dotted key in the JSON form of the config.
fn lookup<'a>(json: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.').try_fold(json, |current, part| current.get(part))
}

/// Replace a dotted key, keeping the result a valid configuration.
fn assign(config: &PagemarkConfig, key: &str, value: Value) -> anyhow::Result<PagemarkConfig> {
    let mut json = serde_json::to_value(config)?;
    let (parent_key, leaf) = match key.rsplit_once('.') {
        Some((parent, leaf)) => (Some(parent), leaf),
        None => (None, key),
    };

    let mut parent = &mut json;
    if let Some(parent_key) = parent_key {
        for part in parent_key.split('.') {
            parent = parent
                .get_mut(part)
                .ok_or_else(|| anyhow::anyhow!("Configuration path not found: {}", key))?;
        }
    }

    let object = parent
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("Cannot set value at non-object path: {}", key))?;
    if !object.contains_key(leaf) {
        anyhow::bail!("Configuration key not found: {}", key);
    }
    object.insert(leaf.to_string(), value);

    serde_json::from_value(json).map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))
}

fn get_config(key: &str) -> anyhow::Result<()> {
    let config = read_or_default(&default_config_path())?;
    let json = serde_json::to_value(&config)?;

    let value = lookup(&json, key).ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn set_config(key: &str, value: &str) -> anyhow::Result<()> {
    let config_path = default_config_path();
    let config = read_or_default(&config_path)?;

    let parsed: Value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    let updated = assign(&config, key, parsed.clone())?;

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    updated.save(&config_path)?;

    println!(
        "{} Set {} = {}",
        style("✓").green(),
        key,
        serde_json::to_string(&parsed)?
    );
    Ok(())
}

fn show_path() -> anyhow::Result<()> {
    let config_path = default_config_path();

    println!("Configuration file: {}", config_path.display());
    if config_path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'pagemark config init' to create a configuration file.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagemark_core::LayerRetention;

    #[test]
    fn test_assign_nested_value() {
        let config = PagemarkConfig::default();
        let updated = assign(&config, "viewer.layer_retention", Value::String("per_page".into())).unwrap();
        assert_eq!(updated.viewer.layer_retention, LayerRetention::PerPage);

        let updated = assign(&config, "compress.jpeg_quality", serde_json::json!(40)).unwrap();
        assert_eq!(updated.compress.jpeg_quality, 40);
    }

    #[test]
    fn test_assign_rejects_unknown_and_mistyped_keys() {
        let config = PagemarkConfig::default();
        assert!(assign(&config, "viewer.nope", serde_json::json!(1)).is_err());
        assert!(assign(&config, "missing.key", serde_json::json!(1)).is_err());
        assert!(assign(&config, "compress.jpeg_quality", serde_json::json!("high")).is_err());
    }

    #[test]
    fn test_lookup() {
        let json = serde_json::to_value(PagemarkConfig::default()).unwrap();
        assert_eq!(lookup(&json, "table.sample_lines"), Some(&serde_json::json!(8)));
        assert!(lookup(&json, "table.nope").is_none());
    }
}
