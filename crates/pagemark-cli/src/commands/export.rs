//! Export command - replay annotations and write one export format.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use serde::Deserialize;
use tracing::{debug, info};

use pagemark_core::models::LayerRetention;
use pagemark_core::{
    Color, DocumentSession, ExportArtifact, PageRasterizer, PdfiumRasterizer, Point, PointerEvent, Tool,
};

use super::{cancel_on_ctrl_c, geometry_pages, load_config, open_session, page_progress, report_noop, write_artifact};

/// Arguments for the export command.
#[derive(Args)]
pub struct ExportArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Export format
    #[arg(short, long, value_enum)]
    format: ExportFormat,

    /// JSON annotation script, points in rendered pixels at the export scale
    #[arg(short, long)]
    annotations: Option<PathBuf>,

    /// Current page (1-indexed); defaults to the last annotated page
    #[arg(short, long)]
    page: Option<i64>,

    /// Render scale (clamped to the configured range)
    #[arg(short, long)]
    scale: Option<f32>,

    /// Keep ink on every page instead of only the current one
    #[arg(long)]
    per_page: bool,

    /// Output file or directory
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Current page with ink as PNG
    Png,
    /// Every page as PNG in a ZIP archive
    Zip,
    /// Extracted text
    Txt,
    /// Extracted text as DOCX paragraphs
    Docx,
    /// One page image per DOCX paragraph
    DocxImages,
    /// One slide per page
    Pptx,
    /// One worksheet of reconstructed table cells per page
    Xlsx,
    /// Original PDF with ink stamped on
    Pdf,
}

impl ExportFormat {
    /// Formats that never look at rendered pages.
    fn is_text_only(self) -> bool {
        matches!(self, ExportFormat::Txt | ExportFormat::Docx | ExportFormat::Xlsx)
    }

    /// Formats that need real page pixels rather than page geometry.
    fn needs_pixels(self) -> bool {
        matches!(
            self,
            ExportFormat::Png | ExportFormat::Zip | ExportFormat::DocxImages | ExportFormat::Pptx
        )
    }
}

/// One recorded gesture.
#[derive(Debug, Clone, Deserialize)]
pub struct Stroke {
    pub page: i64,
    pub tool: Tool,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub text: Option<String>,
    pub points: Vec<[f64; 2]>,
}

pub fn read_script(path: &Path) -> anyhow::Result<Vec<Stroke>> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid annotation script {}: {}", path.display(), e))
}

/// Replay strokes through the tool state machine, rendering pages as needed.
pub fn replay<R: PageRasterizer + ?Sized>(
    session: &mut DocumentSession,
    rasterizer: &R,
    strokes: &[Stroke],
) -> anyhow::Result<()> {
    for stroke in strokes {
        let page = session.go_to(stroke.page);
        if session.view().is_none() {
            session.render_current(rasterizer)?;
        }

        let surface = session.surface_mut();
        surface.set_tool(stroke.tool);
        if let Some(color) = &stroke.color {
            surface.set_color(Color::from_hex(color)?);
        }
        if let Some(width) = stroke.width {
            surface.set_stroke_width(width);
        }
        if let Some(text) = &stroke.text {
            surface.set_text(text.as_str());
        }

        let points: Vec<Point> = stroke.points.iter().map(|[x, y]| Point::new(*x, *y)).collect();
        let Some((first, rest)) = points.split_first() else {
            continue;
        };

        session.pointer(PointerEvent::Down(*first));
        for p in rest {
            session.pointer(PointerEvent::Move(*p));
        }
        session.pointer(PointerEvent::Up(*rest.last().unwrap_or(first)));
        debug!("Replayed {:?} stroke with {} points on page {}", stroke.tool, points.len(), page);
    }
    Ok(())
}

pub async fn run(args: ExportArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let (mut session, bytes) = open_session(&args.input, config)?;

    if args.per_page {
        session.set_layer_retention(LayerRetention::PerPage);
    }
    if let Some(scale) = args.scale {
        session.set_scale(scale);
    }
    let strokes = match &args.annotations {
        Some(path) => read_script(path)?,
        None => Vec::new(),
    };

    let format = args.format;
    let target_page = args
        .page
        .or_else(|| strokes.last().map(|s| s.page))
        .unwrap_or(1);

    let pb = page_progress(session.page_count())?;
    let progress = pb.clone();
    cancel_on_ctrl_c(session.token().clone());

    let artifact = tokio::task::spawn_blocking(move || -> anyhow::Result<Option<ExportArtifact>> {
        let rasterizer: Box<dyn PageRasterizer> = if format.needs_pixels() {
            Box::new(PdfiumRasterizer::new(bytes)?)
        } else {
            let document = session
                .document()
                .ok_or_else(|| anyhow::anyhow!("No document loaded"))?;
            Box::new(geometry_pages(document)?)
        };

        if !format.is_text_only() {
            replay(&mut session, rasterizer.as_ref(), &strokes)?;
            session.go_to(target_page);
            session.render_current(rasterizer.as_ref())?;
        }

        let mut pipeline = session.pipeline().with_progress(move |done, total| {
            progress.set_length(total as u64);
            progress.set_position(done as u64);
        });
        let rasterizer = rasterizer.as_ref();

        let artifact = match format {
            ExportFormat::Png => session.export_page_png(rasterizer)?,
            ExportFormat::Zip => session.export_pages_zip(rasterizer, &mut pipeline)?,
            ExportFormat::Txt => session.export_text(&mut pipeline)?,
            ExportFormat::Docx => session.export_docx_text(&mut pipeline)?,
            ExportFormat::DocxImages => session.export_docx_images(rasterizer, &mut pipeline)?,
            ExportFormat::Pptx => session.export_pptx(rasterizer, &mut pipeline)?,
            ExportFormat::Xlsx => session.export_xlsx(&mut pipeline)?,
            ExportFormat::Pdf => session.export_overlay_pdf()?,
        };
        Ok(artifact)
    })
    .await??;
    pb.finish_and_clear();

    match artifact {
        Some(artifact) => {
            info!("Exported {} as {:?}", artifact.file_name, format);
            write_artifact(&artifact, args.output.as_deref())?;
        }
        None => report_noop("the document has no page to export"),
    }
    Ok(())
}
