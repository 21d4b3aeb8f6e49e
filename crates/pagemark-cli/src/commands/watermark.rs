//! Watermark command - diagonal text and/or page numbers on every page.

use std::path::PathBuf;

use clap::Args;

use super::{load_config, open_session, report_noop, write_artifact};

/// Arguments for the watermark command.
#[derive(Args)]
pub struct WatermarkArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Watermark text
    #[arg(short, long)]
    text: Option<String>,

    /// Add a centered "i / n" footer
    #[arg(short, long)]
    number_pages: bool,

    /// Watermark opacity (0.0 - 1.0)
    #[arg(long)]
    opacity: Option<f32>,

    /// Watermark font size in points
    #[arg(long)]
    font_size: Option<f32>,

    /// Watermark colour as hex
    #[arg(long)]
    color: Option<String>,

    /// Output file or directory
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: WatermarkArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let mut watermark = config.watermark.clone();
    if args.text.is_some() {
        watermark.text = args.text;
    }
    watermark.number_pages |= args.number_pages;
    if let Some(opacity) = args.opacity {
        watermark.opacity = opacity;
    }
    if let Some(size) = args.font_size {
        watermark.font_size = size;
    }
    if let Some(color) = args.color {
        watermark.color = color;
    }

    let (session, _) = open_session(&args.input, config)?;
    match session.export_watermarked(&watermark)? {
        Some(artifact) => {
            write_artifact(&artifact, args.output.as_deref())?;
        }
        None => report_noop("no watermark text and page numbering is off"),
    }
    Ok(())
}
