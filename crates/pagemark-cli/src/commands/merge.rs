//! Merge command - concatenate documents.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use glob::glob;
use tracing::debug;

use pagemark_core::DocumentSession;

use super::{load_config, open_session, report_noop, write_artifact};

/// Arguments for the merge command.
#[derive(Args)]
pub struct MergeArgs {
    /// Document whose pages come first
    current: Option<PathBuf>,

    /// Files or glob patterns appended in the given order
    #[arg(short, long = "with", required = true, num_args = 1..)]
    with: Vec<String>,

    /// Output file or directory
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Expand each pattern in order; literal paths are kept as given.
fn expand(patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let mut matched: Vec<PathBuf> = glob(pattern)?.filter_map(|r| r.ok()).collect();
        if matched.is_empty() {
            anyhow::bail!("No files match {}", pattern);
        }
        matched.sort();
        files.extend(matched);
    }
    Ok(files)
}

pub async fn run(args: MergeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let session = match &args.current {
        Some(path) => open_session(path, config)?.0,
        None => DocumentSession::new(config)?,
    };

    let files = expand(&args.with)?;
    println!("{} Merging {} files", style("ℹ").blue(), files.len());

    let mut contents = Vec::with_capacity(files.len());
    for path in &files {
        debug!("Reading {}", path.display());
        contents.push(fs::read(path)?);
    }

    match session.export_merged(&contents)? {
        Some(artifact) => {
            write_artifact(&artifact, args.output.as_deref())?;
        }
        None => report_noop("no documents to merge"),
    }
    Ok(())
}
