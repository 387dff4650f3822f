use clap::Args;
use serde_json::{json, Value};

use ratio_dashboard_core::query::alerts::{alert_report, AlertReport};
use ratio_dashboard_core::query::format::{format_optional, format_signed_value};
use ratio_dashboard_core::query::groups;
use ratio_dashboard_core::query::lookup::{kpi_cards, year_over_year};
use ratio_dashboard_core::query::{build_dashboard, get_ratio_value};
use ratio_dashboard_core::{DatasetCache, Year};

use super::{open, DataArgs};

/// Arguments for a single ratio lookup. The company and year come from the
/// shared `--company` and `--year` flags.
#[derive(Args)]
pub struct LookupArgs {
    /// Ratio name, e.g. "Current Ratio"
    #[arg(long)]
    pub ratio: String,
}

pub fn run_report(cache: &DatasetCache, data: &DataArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = data.dashboard_config()?;
    let dataset = cache.get_or_prepare(&data.ratios, &data.inputs)?;
    let output = build_dashboard(&dataset, &config)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_companies(cache: &DatasetCache, data: &DataArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let session = open(cache, data)?;
    let colors: Vec<Value> = session
        .dataset
        .companies()
        .into_iter()
        .map(|company| {
            let color = session.selection.color_for(&company);
            json!({ "company": company, "color": color })
        })
        .collect();

    Ok(json!({
        "result": {
            "companies": session.dataset.companies(),
            "categories": session.dataset.categories(),
            "colors": colors,
        },
        "warnings": session.dataset.warnings,
    }))
}

pub fn run_lookup(
    cache: &DatasetCache,
    data: &DataArgs,
    args: LookupArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let company = match data.companies.first() {
        Some(company) => company.clone(),
        None => return Err("lookup needs --company".into()),
    };
    let year = data.years.first().copied().unwrap_or(Year::Y2024);
    let session = open(cache, data)?;
    let ratios = &session.dataset.ratios;
    let value = get_ratio_value(ratios, &company, &args.ratio, year);
    let delta = year_over_year(ratios, &company, &args.ratio);

    Ok(json!({
        "result": {
            "display": format_optional(&args.ratio, value),
            "value": value,
            "company": company,
            "ratio_name": args.ratio,
            "year": year,
            "delta": delta,
            "display_delta": delta.map(|d| format_signed_value(&args.ratio, d)),
        }
    }))
}

/// KPI cards for the first selected company.
pub fn run_kpis(cache: &DatasetCache, data: &DataArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let session = open(cache, data)?;
    let company = match session.selection.companies.first() {
        Some(company) => company.clone(),
        None => return Err("no company selected".into()),
    };
    let cards = kpi_cards(&session.dataset.ratios, &company);
    Ok(serde_json::to_value(cards)?)
}

pub fn run_alerts(cache: &DatasetCache, data: &DataArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let session = open(cache, data)?;
    let report = alert_report(&session.dataset.ratios, &session.selection.companies);

    Ok(json!({
        "result": {
            "critical": AlertReport::messages(&report.critical),
            "strengths": AlertReport::messages(&report.strengths),
            "improvements": AlertReport::messages(&report.improvements),
        },
        "alerts": report,
    }))
}

pub fn run_groups(cache: &DatasetCache, data: &DataArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let session = open(cache, data)?;
    let ratios = &session.dataset.ratios;
    let companies = &session.selection.companies;

    let insights = if session.selection.show_insights {
        groups::profitability_insights(ratios, companies)
    } else {
        Vec::new()
    };

    Ok(json!({
        "profitability": groups::profitability_rows(ratios, companies, &session.selection.years),
        "profitability_insights": insights,
        "liquidity": groups::liquidity_rows(ratios, companies),
        "leverage": groups::leverage_rows(ratios, companies),
        "efficiency": groups::efficiency_gauges(ratios, companies),
        "asset_structure": groups::asset_structure_rows(ratios, companies),
        "financing_structure": groups::financing_structure_rows(ratios, companies),
    }))
}

/// Waterfalls are drawn for the first `--year` given, 2024 otherwise.
pub fn run_waterfall(cache: &DatasetCache, data: &DataArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let year = data.years.first().copied().unwrap_or(Year::Y2024);
    let session = open(cache, data)?;
    let rows = groups::cash_flow_rows(&session.dataset.inputs, &session.selection.companies);
    let series = groups::waterfall_series(&rows, &session.selection.companies, year);

    Ok(json!({
        "cash_flow": rows,
        "waterfalls": series,
    }))
}
