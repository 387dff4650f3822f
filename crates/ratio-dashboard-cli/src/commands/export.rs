use clap::Args;
use serde_json::{json, Value};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use ratio_dashboard_core::query::export::{display_table, export_file_name, write_csv};
use ratio_dashboard_core::DatasetCache;

use super::{open, DataArgs};

/// Arguments for CSV export
#[derive(Args)]
pub struct ExportArgs {
    /// File to write, or a directory to write the suggested file name into.
    /// Writes to stdout when omitted.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run_table(cache: &DatasetCache, data: &DataArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let session = open(cache, data)?;
    let rows = display_table(
        &session.dataset.ratios,
        &session.selection.companies,
        &session.selection.category,
    );
    Ok(serde_json::to_value(rows)?)
}

/// Returns `None` when the CSV went to stdout.
pub fn run_export(
    cache: &DatasetCache,
    data: &DataArgs,
    args: ExportArgs,
) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let session = open(cache, data)?;
    let companies = &session.selection.companies;
    if companies.is_empty() {
        return Err("no company selected for export".into());
    }

    let Some(out) = args.out else {
        let stdout = io::stdout();
        write_csv(&session.dataset.ratios, companies, stdout.lock())?;
        return Ok(None);
    };

    let file_name = export_file_name(companies);
    let path = if out.is_dir() { out.join(&file_name) } else { out };
    let file = File::create(&path)
        .map_err(|e| format!("Failed to create '{}': {}", path.display(), e))?;
    let rows = write_csv(&session.dataset.ratios, companies, BufWriter::new(file))?;
    tracing::info!(path = %path.display(), rows, "wrote export");

    Ok(Some(json!({
        "result": {
            "path": path.display().to_string(),
            "file_name": file_name,
            "rows": rows,
        }
    })))
}
