//! Reading the two tabular sources into typed tables.
//!
//! Headers are trimmed before they are matched, so ` 2024 ` and `2024` name
//! the same column. Cells that are empty or not numeric load as absent.

use rust_decimal::Decimal;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use crate::dataset::records::{InputColumn, InputRecord, InputTable, RatioColumn, RatioRecord, RatioTable};
use crate::error::DashboardError;
use crate::types::{RatioValue, Year};
use crate::DashboardResult;

/// On-disk shape of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    /// An array of flat objects, one per row.
    Json,
}

impl SourceFormat {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> DashboardResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") | Some("txt") => Ok(SourceFormat::Csv),
            Some("json") => Ok(SourceFormat::Json),
            other => Err(DashboardError::load(
                path.display().to_string(),
                format!(
                    "unsupported source extension '{}' (expected .csv or .json)",
                    other.unwrap_or("")
                ),
            )),
        }
    }
}

/// A column vocabulary that a source is matched against.
pub trait TableColumn: Copy + PartialEq + 'static {
    const ALL: &'static [Self];

    fn header(self) -> &'static str;

    fn from_header(header: &str) -> Option<Self>;
}

impl TableColumn for RatioColumn {
    const ALL: &'static [Self] = &RatioColumn::CANONICAL;

    fn header(self) -> &'static str {
        RatioColumn::header(self)
    }

    fn from_header(header: &str) -> Option<Self> {
        RatioColumn::from_header(header)
    }
}

impl TableColumn for InputColumn {
    const ALL: &'static [Self] = &InputColumn::CANONICAL;

    fn header(self) -> &'static str {
        InputColumn::header(self)
    }

    fn from_header(header: &str) -> Option<Self> {
        InputColumn::from_header(header)
    }
}

/// Cells of one row, indexed in the column vocabulary's canonical order.
type CanonicalRow = Vec<String>;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn load_ratio_table(path: &Path) -> DashboardResult<RatioTable> {
    let (format, reader) = open_source(path)?;
    read_ratio_table(reader, format, &path.display().to_string())
}

pub fn load_input_table(path: &Path) -> DashboardResult<InputTable> {
    let (format, reader) = open_source(path)?;
    read_input_table(reader, format, &path.display().to_string())
}

pub fn read_ratio_table<R: Read>(
    reader: R,
    format: SourceFormat,
    source_name: &str,
) -> DashboardResult<RatioTable> {
    let (columns, rows) = read_rows::<RatioColumn, R>(reader, format, source_name)?;
    let mut warnings = Vec::new();
    let records = rows
        .into_iter()
        .enumerate()
        .map(|(i, mut cells)| {
            let mut cell = |year: Year, raw: &str| read_year_cell(raw, i + 1, year, source_name, &mut warnings);
            let year2023 = cell(Year::Y2023, &cells[3]);
            let year2024 = cell(Year::Y2024, &cells[4]);
            let ratio_name = std::mem::take(&mut cells[2]);
            let category = std::mem::take(&mut cells[1]);
            let company = std::mem::take(&mut cells[0]);
            RatioRecord {
                company,
                category,
                ratio_name,
                year2023,
                year2024,
            }
        })
        .collect::<Vec<_>>();

    tracing::info!(source = source_name, rows = records.len(), "loaded ratio table");
    let mut table = RatioTable::new(columns, records);
    table.warnings = warnings;
    Ok(table)
}

pub fn read_input_table<R: Read>(
    reader: R,
    format: SourceFormat,
    source_name: &str,
) -> DashboardResult<InputTable> {
    let (columns, rows) = read_rows::<InputColumn, R>(reader, format, source_name)?;
    let mut warnings = Vec::new();
    let records = rows
        .into_iter()
        .enumerate()
        .map(|(i, mut cells)| {
            let mut cell = |year: Year, raw: &str| read_year_cell(raw, i + 1, year, source_name, &mut warnings);
            let year2023 = cell(Year::Y2023, &cells[2]);
            let year2024 = cell(Year::Y2024, &cells[3]);
            let company = std::mem::take(&mut cells[1]);
            let item = std::mem::take(&mut cells[0]);
            InputRecord {
                item,
                company,
                year2023,
                year2024,
            }
        })
        .collect::<Vec<_>>();

    tracing::info!(source = source_name, rows = records.len(), "loaded input table");
    let mut table = InputTable::new(columns, records);
    table.warnings = warnings;
    Ok(table)
}

/// Parse a numeric cell. Empty or non-numeric text is absent, never zero.
pub fn parse_cell(raw: &str) -> Option<RatioValue> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Numeric text that a decimal cannot hold, such as `1e30` or `1e-40`.
pub fn is_out_of_range(raw: &str) -> bool {
    let s = raw.trim();
    parse_cell(s).is_none() && s.parse::<f64>().is_ok_and(|v| v.is_finite() && v != 0.0)
}

/// Trim a header, including a leading byte-order mark left by spreadsheet exports.
pub fn normalize_header(raw: &str) -> &str {
    raw.trim_start_matches('\u{feff}').trim()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a year cell, noting numbers that are out of range rather than
/// letting them pass as empty cells.
fn read_year_cell(
    raw: &str,
    record_no: usize,
    year: Year,
    source_name: &str,
    warnings: &mut Vec<String>,
) -> Option<RatioValue> {
    let value = parse_cell(raw);
    if value.is_none() && is_out_of_range(raw) {
        tracing::warn!(source = source_name, record = record_no, column = year.column(), "numeric cell out of range");
        warnings.push(format!(
            "{source_name}: record {record_no}, column {}: '{}' is outside the supported numeric range and was left empty",
            year.column(),
            raw.trim()
        ));
    }
    value
}

fn open_source(path: &Path) -> DashboardResult<(SourceFormat, BufReader<File>)> {
    let format = SourceFormat::from_path(path)?;
    let file = File::open(path).map_err(|e| DashboardError::load(path.display().to_string(), e))?;
    Ok((format, BufReader::new(file)))
}

fn read_rows<C: TableColumn, R: Read>(
    reader: R,
    format: SourceFormat,
    source_name: &str,
) -> DashboardResult<(Vec<C>, Vec<CanonicalRow>)> {
    match format {
        SourceFormat::Csv => read_csv_rows::<C, R>(reader, source_name),
        SourceFormat::Json => read_json_rows::<C, R>(reader, source_name),
    }
}

/// Map trimmed headers to the vocabulary, failing if any column is missing.
/// Returns the recognised columns in header order and, for each canonical
/// column, its position among the headers.
fn match_headers<C: TableColumn>(
    headers: &[String],
    source_name: &str,
) -> DashboardResult<(Vec<C>, Vec<usize>)> {
    let mut positions = Vec::with_capacity(C::ALL.len());
    for column in C::ALL {
        let pos = headers
            .iter()
            .position(|h| h == column.header())
            .ok_or_else(|| {
                DashboardError::load(
                    source_name,
                    format!(
                        "missing column '{}' (found: {})",
                        column.header(),
                        headers.join(", ")
                    ),
                )
            })?;
        positions.push(pos);
    }

    let order = headers
        .iter()
        .filter_map(|h| C::from_header(h))
        .fold(Vec::new(), |mut acc: Vec<C>, c| {
            if !acc.contains(&c) {
                acc.push(c);
            }
            acc
        });

    Ok((order, positions))
}

fn read_csv_rows<C: TableColumn, R: Read>(
    reader: R,
    source_name: &str,
) -> DashboardResult<(Vec<C>, Vec<CanonicalRow>)> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| DashboardError::load(source_name, e))?
        .iter()
        .map(|h| normalize_header(h).to_string())
        .collect();

    let (columns, positions) = match_headers::<C>(&headers, source_name)?;

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| DashboardError::load(source_name, e))?;
        let row = positions
            .iter()
            .map(|&pos| record.get(pos).unwrap_or("").to_string())
            .collect();
        rows.push(row);
    }
    Ok((columns, rows))
}

fn read_json_rows<C: TableColumn, R: Read>(
    reader: R,
    source_name: &str,
) -> DashboardResult<(Vec<C>, Vec<CanonicalRow>)> {
    let objects: Vec<serde_json::Map<String, Value>> = serde_json::from_reader(reader)
        .map_err(|e| DashboardError::load(source_name, e))?;

    if objects.is_empty() {
        return Ok((C::ALL.to_vec(), Vec::new()));
    }

    let mut headers: Vec<String> = Vec::new();
    for key in objects.iter().flat_map(|o| o.keys()) {
        let key = normalize_header(key);
        if !headers.iter().any(|h| h == key) {
            headers.push(key.to_string());
        }
    }
    match_headers::<C>(&headers, source_name)?;

    let rows = objects
        .iter()
        .map(|object| {
            C::ALL
                .iter()
                .map(|column| {
                    object
                        .iter()
                        .find(|(k, _)| normalize_header(k) == column.header())
                        .map(|(_, v)| json_cell(v))
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    // JSON objects carry no reliable key order, so the canonical one is used.
    Ok((C::ALL.to_vec(), rows))
}

fn json_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    const RATIOS_CSV: &str = "\
 company ,category, ratio_name ,2023 , 2024
FASING,liquidity,Current Ratio,1.5,1.1
FASING,profitability,Net Profit Margin,,-0.02
FEERUM,liquidity,Current Ratio,n/a,2.4
";

    #[test]
    fn test_csv_headers_are_trimmed() {
        let table = read_ratio_table(RATIOS_CSV.as_bytes(), SourceFormat::Csv, "ratios").unwrap();
        assert_eq!(table.columns, RatioColumn::CANONICAL.to_vec());
        assert_eq!(table.len(), 3);
        assert_eq!(table.records[0].company, "FASING");
        assert_eq!(table.records[0].year2023, Some(dec!(1.5)));
        assert_eq!(table.records[0].year2024, Some(dec!(1.1)));
    }

    #[test]
    fn test_empty_and_non_numeric_cells_are_absent() {
        let table = read_ratio_table(RATIOS_CSV.as_bytes(), SourceFormat::Csv, "ratios").unwrap();
        assert_eq!(table.records[1].year2023, None);
        assert_eq!(table.records[1].year2024, Some(dec!(-0.02)));
        assert_eq!(table.records[2].year2023, None);
    }

    #[test]
    fn test_out_of_range_number_is_absent_with_warning() {
        let csv = "company,category,ratio_name,2023,2024\nFASING,liquidity,Current Ratio,1e30,1.2\n";
        let table = read_ratio_table(csv.as_bytes(), SourceFormat::Csv, "ratios").unwrap();
        assert_eq!(table.records[0].year2023, None);
        assert_eq!(table.records[0].year2024, Some(dec!(1.2)));
        assert_eq!(
            table.warnings,
            vec!["ratios: record 1, column 2023: '1e30' is outside the supported numeric range and was left empty"]
        );
    }

    #[test]
    fn test_out_of_range_detection() {
        assert_eq!(parse_cell("1e30"), None);
        assert!(is_out_of_range(" 1e30 "));
        assert!(is_out_of_range("-1e30"));
        assert!(!is_out_of_range("1.5"));
        assert!(!is_out_of_range("n/a"));
        assert!(!is_out_of_range(""));
        assert!(!is_out_of_range("NaN"));
    }

    #[test]
    fn test_plain_text_cells_raise_no_warning() {
        let table = read_ratio_table(RATIOS_CSV.as_bytes(), SourceFormat::Csv, "ratios").unwrap();
        assert!(table.warnings.is_empty());
    }

    #[test]
    fn test_column_order_follows_source() {
        let csv = "ratio_name,2024,company,2023,category\nCurrent Ratio,1.2,FASING,1.0,liquidity\n";
        let table = read_ratio_table(csv.as_bytes(), SourceFormat::Csv, "ratios").unwrap();
        assert_eq!(
            table.columns,
            vec![
                RatioColumn::RatioName,
                RatioColumn::Year(Year::Y2024),
                RatioColumn::Company,
                RatioColumn::Year(Year::Y2023),
                RatioColumn::Category,
            ]
        );
        assert_eq!(table.records[0].company, "FASING");
        assert_eq!(table.records[0].year2024, Some(dec!(1.2)));
    }

    #[test]
    fn test_missing_column_is_load_error() {
        let csv = "company,category,2023,2024\nFASING,liquidity,1,2\n";
        let err = read_ratio_table(csv.as_bytes(), SourceFormat::Csv, "ratios").unwrap_err();
        match err {
            DashboardError::Load { source_name, reason } => {
                assert_eq!(source_name, "ratios");
                assert!(reason.contains("ratio_name"), "reason was: {reason}");
            }
            other => panic!("expected Load, got {other:?}"),
        }
    }

    #[test]
    fn test_ragged_row_is_load_error() {
        let csv = "item,company,2023,2024\noperating_cash_flow,FASING,1\n";
        let err = read_input_table(csv.as_bytes(), SourceFormat::Csv, "inputs").unwrap_err();
        assert!(matches!(err, DashboardError::Load { .. }));
    }

    #[test]
    fn test_json_rows_with_padded_keys() {
        let json = r#"[
            {" item ": "operating_cash_flow", "company": "FASING", "2023": 120.5, "2024 ": "98"},
            {"item": "net_cash_flow", "company": "FASING", "2023": null, "2024": -4}
        ]"#;
        let table = read_input_table(json.as_bytes(), SourceFormat::Json, "inputs").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].item, "operating_cash_flow");
        assert_eq!(table.records[0].year2023, Some(dec!(120.5)));
        assert_eq!(table.records[0].year2024, Some(dec!(98)));
        assert_eq!(table.records[1].year2023, None);
        assert_eq!(table.records[1].year2024, Some(dec!(-4)));
    }

    #[test]
    fn test_malformed_json_is_load_error() {
        let err = read_input_table("{not json".as_bytes(), SourceFormat::Json, "inputs").unwrap_err();
        assert!(err.to_string().starts_with("Failed to load inputs:"));
    }

    #[test]
    fn test_parse_cell_scientific() {
        assert_eq!(parse_cell("1.5e-2"), Some(dec!(0.015)));
        assert_eq!(parse_cell("  "), None);
        assert_eq!(parse_cell("abc"), None);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(SourceFormat::from_path(Path::new("a/b.CSV")).unwrap(), SourceFormat::Csv);
        assert_eq!(SourceFormat::from_path(Path::new("x.json")).unwrap(), SourceFormat::Json);
        assert!(SourceFormat::from_path(Path::new("x.xlsx")).is_err());
    }
}
