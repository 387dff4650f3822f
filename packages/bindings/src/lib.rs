use std::path::Path;
use std::sync::{Arc, OnceLock};

use napi::Result as NapiResult;
use napi_derive::napi;
use serde_json::json;

use ratio_dashboard_core::query::export::{export_file_name, write_csv};
use ratio_dashboard_core::query::format::format_optional;
use ratio_dashboard_core::query::{build_dashboard, get_ratio_value};
use ratio_dashboard_core::{DashboardConfig, DatasetCache, PreparedDataset, Year};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn cache() -> &'static DatasetCache {
    static CACHE: OnceLock<DatasetCache> = OnceLock::new();
    CACHE.get_or_init(DatasetCache::new)
}

fn dataset(ratios_path: &str, inputs_path: &str) -> NapiResult<Arc<PreparedDataset>> {
    cache()
        .get_or_prepare(Path::new(ratios_path), Path::new(inputs_path))
        .map_err(to_napi_error)
}

/// Empty or missing config JSON means the defaults.
fn parse_config(config_json: Option<String>) -> NapiResult<DashboardConfig> {
    match config_json {
        Some(json) if !json.trim().is_empty() => serde_json::from_str(&json).map_err(to_napi_error),
        _ => Ok(DashboardConfig::default()),
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

#[napi]
pub fn prepare_dataset(ratios_path: String, inputs_path: String) -> NapiResult<String> {
    let dataset = dataset(&ratios_path, &inputs_path)?;
    let summary = json!({
        "companies": dataset.companies(),
        "categories": dataset.categories(),
        "ratio_rows": dataset.ratios.len(),
        "input_rows": dataset.inputs.len(),
        "warnings": dataset.warnings,
    });
    serde_json::to_string(&summary).map_err(to_napi_error)
}

#[napi]
pub fn invalidate_dataset(ratios_path: String, inputs_path: String) -> bool {
    cache().invalidate(Path::new(&ratios_path), Path::new(&inputs_path))
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[napi]
pub fn dashboard_report(
    ratios_path: String,
    inputs_path: String,
    config_json: Option<String>,
) -> NapiResult<String> {
    let config = parse_config(config_json)?;
    let dataset = dataset(&ratios_path, &inputs_path)?;
    let output = build_dashboard(&dataset, &config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn ratio_value(
    ratios_path: String,
    inputs_path: String,
    company: String,
    ratio: String,
    year: String,
) -> NapiResult<String> {
    let year: Year = year.parse().map_err(to_napi_error)?;
    let dataset = dataset(&ratios_path, &inputs_path)?;
    let value = get_ratio_value(&dataset.ratios, &company, &ratio, year);
    let result = json!({
        "value": value,
        "display": format_optional(&ratio, value),
    });
    serde_json::to_string(&result).map_err(to_napi_error)
}

/// CSV for the selected companies plus its suggested file name.
#[napi]
pub fn export_csv(
    ratios_path: String,
    inputs_path: String,
    config_json: Option<String>,
) -> NapiResult<String> {
    let config = parse_config(config_json)?;
    let dataset = dataset(&ratios_path, &inputs_path)?;
    let selection = config.resolve(&dataset).map_err(to_napi_error)?;

    let mut buf = Vec::new();
    let rows = write_csv(&dataset.ratios, &selection.companies, &mut buf).map_err(to_napi_error)?;
    let csv = String::from_utf8(buf).map_err(to_napi_error)?;
    let result = json!({
        "file_name": export_file_name(&selection.companies),
        "rows": rows,
        "csv": csv,
    });
    serde_json::to_string(&result).map_err(to_napi_error)
}
