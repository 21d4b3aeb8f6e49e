//! CLI application for viewing, annotating and exporting PDF documents.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{compress, config, export, info, merge, render, split, tables, watermark};

/// pagemark - Render, annotate and export PDF documents
#[derive(Parser)]
#[command(name = "pagemark")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show page count and page sizes
    Info(info::InfoArgs),

    /// Render one page to PNG
    Render(render::RenderArgs),

    /// Replay annotations and export to another format
    Export(export::ExportArgs),

    /// Concatenate documents
    Merge(merge::MergeArgs),

    /// Extract a page range
    Split(split::SplitArgs),

    /// Rasterize pages into a smaller image-only PDF
    Compress(compress::CompressArgs),

    /// Add a watermark and/or page numbers
    Watermark(watermark::WatermarkArgs),

    /// Reconstruct tables from page text as CSV
    Tables(tables::TablesArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Info(args) => info::run(args, config_path).await,
        Commands::Render(args) => render::run(args, config_path).await,
        Commands::Export(args) => export::run(args, config_path).await,
        Commands::Merge(args) => merge::run(args, config_path).await,
        Commands::Split(args) => split::run(args, config_path).await,
        Commands::Compress(args) => compress::run(args, config_path).await,
        Commands::Watermark(args) => watermark::run(args, config_path).await,
        Commands::Tables(args) => tables::run(args, config_path).await,
        Commands::Config(args) => config::run(args).await,
    }
}
