//! Split command - keep an inclusive page range.

use std::path::PathBuf;

use clap::Args;

use super::{load_config, open_session, report_noop, write_artifact};

/// Arguments for the split command.
#[derive(Args)]
pub struct SplitArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// First page to keep (clamped to the document)
    #[arg(short, long, allow_hyphen_values = true)]
    start: String,

    /// Last page to keep (clamped to the document)
    #[arg(short, long, allow_hyphen_values = true)]
    end: String,

    /// Output file or directory
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: SplitArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let (session, _) = open_session(&args.input, config)?;

    match session.export_split(&args.start, &args.end)? {
        Some(artifact) => {
            write_artifact(&artifact, args.output.as_deref())?;
        }
        None => report_noop(&format!("empty page range {}-{}", args.start, args.end)),
    }
    Ok(())
}
