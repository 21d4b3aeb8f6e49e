//! Tables command - reconstructed page grids as CSV.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::debug;

use pagemark_core::{output_name, TableGrid};

use super::{load_config, open_session, report_noop};

/// Arguments for the tables command.
#[derive(Args)]
pub struct TablesArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Only these pages (repeatable); all pages by default
    #[arg(short, long)]
    page: Vec<u32>,

    /// Write one CSV per page into this directory instead of stdout
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

fn grid_csv(grid: &TableGrid) -> anyhow::Result<String> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(vec![]);
    for row in grid.rows_or_placeholder() {
        wtr.write_record(&row)?;
    }
    Ok(String::from_utf8(wtr.into_inner()?)?)
}

pub async fn run(args: TablesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let (session, _) = open_session(&args.input, config)?;

    let mut pipeline = session.pipeline();
    let Some(tables) = session.page_tables(&args.page, &mut pipeline)? else {
        report_noop("no document loaded");
        return Ok(());
    };
    if tables.is_empty() {
        report_noop("no matching pages");
        return Ok(());
    }

    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir)?;
    }

    for (page, grid) in &tables {
        debug!("Page {}: {} rows x {} columns", page, grid.num_rows(), grid.num_cols());
        let csv = grid_csv(grid)?;

        match &args.output_dir {
            Some(dir) => {
                let path = dir.join(output_name(session.file_name(), "csv", Some(*page)));
                fs::write(&path, csv)?;
                println!("{} Wrote {}", style("✓").green(), path.display());
            }
            None => {
                if tables.len() > 1 {
                    eprintln!("{}", style(format!("Page {}", page)).bold());
                }
                print!("{}", csv);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_csv_quotes_cells() {
        let grid = TableGrid {
            anchors: vec![0.0, 50.0],
            rows: vec![
                vec!["Item".to_string(), "Price, net".to_string()],
                vec!["Tea".to_string(), String::new()],
            ],
        };
        assert_eq!(grid_csv(&grid).unwrap(), "Item,\"Price, net\"\nTea,\n");
    }

    #[test]
    fn test_empty_grid_is_one_empty_row() {
        assert_eq!(grid_csv(&TableGrid::default()).unwrap(), "\"\"\n");
    }
}
