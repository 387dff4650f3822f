//! The formatted display table and the comma-separated export.

use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::config::CategoryFilter;
use crate::dataset::records::{RatioColumn, RatioRecord, RatioTable};
use crate::query::format::format_optional;
use crate::types::{CompanyId, Year};
use crate::{DashboardError, DashboardResult};

/// A ratio row with both year cells rendered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRow {
    pub company: CompanyId,
    pub category: String,
    pub ratio_name: String,
    #[serde(rename = "2023")]
    pub year2023: String,
    #[serde(rename = "2024")]
    pub year2024: String,
}

/// Rows whose company is selected, in table order.
pub fn rows_for_companies<'a>(
    table: &'a RatioTable,
    companies: &'a [CompanyId],
) -> impl Iterator<Item = &'a RatioRecord> + 'a {
    table
        .records
        .iter()
        .filter(move |r| companies.iter().any(|c| *c == r.company))
}

/// Selected companies and category, formatted per ratio name.
pub fn display_table(
    table: &RatioTable,
    companies: &[CompanyId],
    category: &CategoryFilter,
) -> Vec<DisplayRow> {
    rows_for_companies(table, companies)
        .filter(|r| category.matches(&r.category))
        .map(|r| DisplayRow {
            company: r.company.clone(),
            category: r.category.clone(),
            ratio_name: r.ratio_name.clone(),
            year2023: format_optional(&r.ratio_name, r.value(Year::Y2023)),
            year2024: format_optional(&r.ratio_name, r.value(Year::Y2024)),
        })
        .collect()
}

/// Write the selected companies' rows as CSV, header and column order as in
/// the prepared table. Values are written unformatted. Returns the row count.
pub fn write_csv<W: Write>(
    table: &RatioTable,
    companies: &[CompanyId],
    writer: W,
) -> DashboardResult<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(table.columns.iter().map(|c| c.header()))?;

    let mut written = 0;
    for record in rows_for_companies(table, companies) {
        wtr.write_record(table.columns.iter().map(|&c: &RatioColumn| record.cell(c)))?;
        written += 1;
    }
    wtr.flush()?;

    tracing::debug!(rows = written, "exported ratio rows");
    Ok(written)
}

pub fn export_csv_string(table: &RatioTable, companies: &[CompanyId]) -> DashboardResult<String> {
    let mut buf = Vec::new();
    write_csv(table, companies, &mut buf)?;
    String::from_utf8(buf).map_err(|e| DashboardError::SerializationError(e.to_string()))
}

/// Suggested download name, e.g. `financial_ratios_FASING_FEERUM.csv`.
pub fn export_file_name(companies: &[CompanyId]) -> String {
    format!("financial_ratios_{}.csv", companies.join("_"))
}
