//! Info command - page count and native page sizes.

use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;

use pagemark_core::{NativePageSize, TextSource};

use super::{load_config, open_session};

/// Arguments for the info command.
#[derive(Args)]
pub struct InfoArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct DocumentInfo {
    file_name: String,
    page_count: u32,
    pages: Vec<NativePageSize>,
}

pub async fn run(args: InfoArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let (session, _) = open_session(&args.input, config)?;

    let mut pages = Vec::new();
    if let Some(document) = session.document() {
        for page in 1..=document.page_count() {
            pages.push(document.page_size(page)?);
        }
    }

    let info = DocumentInfo {
        file_name: session.file_name().to_string(),
        page_count: session.page_count(),
        pages,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{} {}", style("File:").bold(), info.file_name);
    println!("{} {}", style("Pages:").bold(), info.page_count);
    for (i, size) in info.pages.iter().enumerate() {
        println!(
            "  {:>4}  {:.1} x {:.1} pt",
            i + 1,
            size.width,
            size.height
        );
    }

    Ok(())
}
