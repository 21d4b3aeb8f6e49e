//! CLI commands and the helpers they share.

pub mod compress;
pub mod config;
pub mod export;
pub mod info;
pub mod merge;
pub mod render;
pub mod split;
pub mod tables;
pub mod watermark;

use std::fs;
use std::path::{Path, PathBuf};

use console::style;
use image::{Rgba, RgbaImage};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use pagemark_core::models::PagemarkConfig;
use pagemark_core::{CancellationToken, DocumentSession, ExportArtifact, PdfDocument, PrerenderedPages, TextSource};

/// Explicit `--config` file, else the user config file if present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<PagemarkConfig> {
    if let Some(path) = config_path {
        return Ok(PagemarkConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using config from {}", default_path.display());
        Ok(PagemarkConfig::from_file(&default_path)?)
    } else {
        Ok(PagemarkConfig::default())
    }
}

/// Read `input` into a new session.
pub fn open_session(input: &Path, config: PagemarkConfig) -> anyhow::Result<(DocumentSession, Vec<u8>)> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    let bytes = fs::read(input)?;
    let name = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file");

    let mut session = DocumentSession::new(config)?;
    session.load(name, &bytes)?;
    Ok((session, bytes))
}

/// Write an artifact into `output`: a directory, a file path, or the
/// current directory when absent.
pub fn write_artifact(artifact: &ExportArtifact, output: Option<&Path>) -> anyhow::Result<PathBuf> {
    let path = match output {
        Some(path) if path.is_dir() => path.join(&artifact.file_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(&artifact.file_name),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, &artifact.bytes)?;

    println!(
        "{} Wrote {} ({} bytes)",
        style("✓").green(),
        path.display(),
        artifact.bytes.len()
    );
    Ok(path)
}

/// Report an export that had nothing to do.
pub fn report_noop(reason: &str) {
    println!("{} Nothing written: {}", style("!").yellow(), reason);
}

/// Page progress bar, hidden when stderr is not a terminal.
pub fn page_progress(total: u32) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages")?
            .progress_chars("=>-"),
    );
    Ok(pb)
}

/// Cancel `token` when Ctrl-C is pressed.
pub fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current page");
            token.cancel();
        }
    });
}

/// White pages at each page's native size, for exports that only need
/// page geometry.
pub fn geometry_pages(document: &PdfDocument) -> anyhow::Result<PrerenderedPages> {
    let mut pages = PrerenderedPages::new(document.page_count());
    for page in 1..=document.page_count() {
        let size = document.page_size(page)?;
        let width = size.width.round().max(1.0) as u32;
        let height = size.height.round().max(1.0) as u32;
        pages.supply(page, 1.0, RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])))?;
    }
    Ok(pages)
}
