//! Compress command - rebuild the document from JPEG page images.

use std::path::PathBuf;

use clap::Args;
use console::style;

use pagemark_core::{ExportArtifact, PdfiumRasterizer};

use super::{cancel_on_ctrl_c, load_config, open_session, page_progress, report_noop, write_artifact};

/// Arguments for the compress command.
#[derive(Args)]
pub struct CompressArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Render scale before re-encoding
    #[arg(short, long)]
    scale: Option<f32>,

    /// JPEG quality (1-100)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Output file or directory
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: CompressArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(scale) = args.scale {
        if !(scale.is_finite() && scale > 0.0) {
            anyhow::bail!("Scale must be positive, got {}", scale);
        }
        config.compress.scale = scale;
    }
    if let Some(quality) = args.quality {
        config.compress.jpeg_quality = quality;
    }

    let (session, bytes) = open_session(&args.input, config)?;
    let original_size = bytes.len();

    let pb = page_progress(session.page_count())?;
    let progress = pb.clone();
    cancel_on_ctrl_c(session.token().clone());

    let artifact = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<ExportArtifact>> {
        let rasterizer = PdfiumRasterizer::new(bytes)?;
        let mut pipeline = session.pipeline().with_progress(move |done, total| {
            progress.set_length(total as u64);
            progress.set_position(done as u64);
        });
        Ok(session.export_compressed(&rasterizer, &mut pipeline)?)
    })
    .await??;
    pb.finish_and_clear();

    match artifact {
        Some(artifact) => {
            let ratio = artifact.bytes.len() as f64 / original_size.max(1) as f64;
            write_artifact(&artifact, args.output.as_deref())?;
            println!("   {} of the original size", style(format!("{:.0}%", ratio * 100.0)).cyan());
        }
        None => report_noop("the document has no pages"),
    }
    Ok(())
}
