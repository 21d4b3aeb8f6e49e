//! Render command - one page to PNG.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use pagemark_core::export::{encode_png, MIME_PNG};
use pagemark_core::{output_name, ExportArtifact, PdfiumRasterizer};

use super::{load_config, open_session, write_artifact};

/// Arguments for the render command.
#[derive(Args)]
pub struct RenderArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Page number (1-indexed, clamped to the document)
    #[arg(short, long, default_value = "1")]
    page: i64,

    /// Render scale (clamped to the configured range)
    #[arg(short, long)]
    scale: Option<f32>,

    /// Output file or directory
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: RenderArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let (mut session, bytes) = open_session(&args.input, config)?;

    session.go_to(args.page);
    if let Some(scale) = args.scale {
        session.set_scale(scale);
    }

    let image = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let rasterizer = PdfiumRasterizer::new(bytes)?;
        let image = session.render_current(&rasterizer)?;
        Ok((session, image))
    })
    .await??;

    let (session, Some(image)) = image else {
        anyhow::bail!("Nothing to render");
    };
    info!("Rendered page {} at {}", session.page(), session.scale());

    let artifact = ExportArtifact::new(
        output_name(session.file_name(), "png", Some(session.page())),
        MIME_PNG,
        encode_png(&image)?,
    );
    write_artifact(&artifact, args.output.as_deref())?;
    Ok(())
}
