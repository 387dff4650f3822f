use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::{DashboardConfig, Selection};
use crate::dataset::records::{InputRecord, RatioRecord};
use crate::dataset::PreparedDataset;
use crate::query::alerts::{alert_report, evaluate_kind, AlertKind, AlertReport};
use crate::query::export::{display_table, export_file_name, write_csv, DisplayRow};
use crate::query::groups::{
    asset_structure_rows, cash_flow_rows, efficiency_gauges, financing_structure_rows,
    leverage_rows, liquidity_rows, profitability_insights, profitability_rows, waterfall_series,
    CashFlowRow, EfficiencyGauge, MetricRow, ProfitabilityRow, WaterfallSeries,
};
use crate::query::lookup::{kpi_cards, KpiCard};
use crate::types::{with_metadata, CompanyId, ComputationOutput, Year};
use crate::{DashboardError, DashboardResult};

/// Rows of each table shown in the raw-data preview.
pub const RAW_PREVIEW_ROWS: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyColor {
    pub company: CompanyId,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPreview {
    pub ratios: Vec<RatioRecord>,
    pub inputs: Vec<InputRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportFile {
    pub file_name: String,
    pub rows: usize,
    pub csv: String,
}

/// Everything the presentation layer renders for one selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub companies: Vec<CompanyColor>,
    /// Headline cards for the first selected company.
    pub kpis: Vec<KpiCard>,
    pub alerts: AlertReport,
    pub profitability: Vec<ProfitabilityRow>,
    pub profitability_insights: Vec<String>,
    pub liquidity: Vec<MetricRow>,
    pub leverage: Vec<MetricRow>,
    pub efficiency: Vec<EfficiencyGauge>,
    pub asset_structure: Vec<MetricRow>,
    pub financing_structure: Vec<MetricRow>,
    pub table: Vec<DisplayRow>,
    pub cash_flow: Vec<CashFlowRow>,
    pub waterfalls: Vec<WaterfallSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_preview: Option<RawPreview>,
    /// Absent when no company is selected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportFile>,
}

/// Resolve `config` against the dataset and build the full report.
pub fn build_dashboard(
    dataset: &PreparedDataset,
    config: &DashboardConfig,
) -> DashboardResult<ComputationOutput<DashboardReport>> {
    let start = Instant::now();
    let selection = config.resolve(dataset)?;
    let report = build_report(dataset, &selection)?;

    tracing::debug!(
        companies = selection.companies.len(),
        critical = report.alerts.critical.len(),
        "built dashboard report"
    );

    Ok(with_metadata(
        "Financial ratio dashboard (threshold alerts, grouped ratio views, cash-flow waterfall)",
        &selection,
        dataset.warnings.clone(),
        start.elapsed().as_micros() as u64,
        report,
    ))
}

/// Build the report for an already-resolved selection.
pub fn build_report(dataset: &PreparedDataset, selection: &Selection) -> DashboardResult<DashboardReport> {
    let ratios = &dataset.ratios;
    let companies = &selection.companies;

    let alerts = if selection.show_insights {
        alert_report(ratios, companies)
    } else {
        AlertReport {
            critical: evaluate_kind(ratios, companies, AlertKind::Critical),
            ..AlertReport::default()
        }
    };

    let cash_flow = cash_flow_rows(&dataset.inputs, companies);
    let waterfalls = waterfall_series(&cash_flow, companies, Year::Y2024);

    let export = if companies.is_empty() {
        None
    } else {
        let mut buf = Vec::new();
        let rows = write_csv(ratios, companies, &mut buf)?;
        let csv = String::from_utf8(buf)
            .map_err(|e| DashboardError::SerializationError(e.to_string()))?;
        Some(ExportFile {
            file_name: export_file_name(companies),
            rows,
            csv,
        })
    };

    Ok(DashboardReport {
        companies: companies
            .iter()
            .map(|c| CompanyColor {
                company: c.clone(),
                color: selection.color_for(c).map(str::to_string),
            })
            .collect(),
        kpis: companies
            .first()
            .map(|c| kpi_cards(ratios, c))
            .unwrap_or_default(),
        alerts,
        profitability: profitability_rows(ratios, companies, &selection.years),
        profitability_insights: if selection.show_insights {
            profitability_insights(ratios, companies)
        } else {
            Vec::new()
        },
        liquidity: liquidity_rows(ratios, companies),
        leverage: leverage_rows(ratios, companies),
        efficiency: efficiency_gauges(ratios, companies),
        asset_structure: asset_structure_rows(ratios, companies),
        financing_structure: financing_structure_rows(ratios, companies),
        table: display_table(ratios, companies, &selection.category),
        cash_flow,
        waterfalls,
        raw_preview: selection.show_raw_data.then(|| RawPreview {
            ratios: ratios.records.iter().take(RAW_PREVIEW_ROWS).cloned().collect(),
            inputs: dataset.inputs.records.iter().take(RAW_PREVIEW_ROWS).cloned().collect(),
        }),
        export,
    })
}
