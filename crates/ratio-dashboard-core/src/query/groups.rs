//! Chart-shaped sub-tables.
//!
//! Each builder takes the prepared tables and a company list and emits only
//! the data points whose values are present. Nothing is padded with zeros.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::dataset::records::{InputTable, RatioTable};
use crate::query::format::format_percent;
use crate::query::lookup::{compute_delta, get_ratio_value};
use crate::ratio_names::{self, cash_flow};
use crate::types::{CompanyId, RatioValue, Year};

/// Cash-flow rows cover at most this many companies.
pub const CASH_FLOW_COMPANY_LIMIT: usize = 3;
/// Waterfall series are drawn for at most this many companies.
pub const WATERFALL_COMPANY_LIMIT: usize = 2;

// ---------------------------------------------------------------------------
// Profitability
// ---------------------------------------------------------------------------

/// Long-form profitability point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilityRow {
    pub company: CompanyId,
    pub ratio_name: String,
    pub year: Year,
    pub value: RatioValue,
}

pub fn profitability_rows(
    table: &RatioTable,
    companies: &[CompanyId],
    years: &[Year],
) -> Vec<ProfitabilityRow> {
    let mut rows = Vec::new();
    for company in companies {
        for ratio_name in ratio_names::PROFITABILITY {
            for &year in years {
                if let Some(value) = get_ratio_value(table, company, ratio_name, year) {
                    rows.push(ProfitabilityRow {
                        company: company.clone(),
                        ratio_name: ratio_name.to_string(),
                        year,
                        value,
                    });
                }
            }
        }
    }
    rows
}

/// Net margin relative to operating margin, per company with both 2024 values.
/// A ratio too large to represent leaves that company out.
pub fn profitability_insights(table: &RatioTable, companies: &[CompanyId]) -> Vec<String> {
    companies
        .iter()
        .filter_map(|company| {
            let npm = get_ratio_value(table, company, ratio_names::NET_PROFIT_MARGIN, Year::Y2024)?;
            let opm = get_ratio_value(table, company, ratio_names::OPERATING_MARGIN, Year::Y2024)?;
            let efficiency = if opm.is_zero() {
                Decimal::ZERO
            } else {
                npm.checked_div(opm)?
            };
            Some(format!(
                "{company}: Net margin is {} of operating margin (tax/interest efficiency: {})",
                format_percent(npm),
                format_percent(efficiency)
            ))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Metric groups (liquidity, leverage, structure)
// ---------------------------------------------------------------------------

/// One bar or point: a company's value for a named metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub company: CompanyId,
    pub metric: String,
    pub value: RatioValue,
}

/// `(ratio name, display label)` pairs making up a chart group.
pub type MetricGroup = [(&'static str, &'static str)];

pub const LIQUIDITY: [(&str, &str); 2] = [
    (ratio_names::CURRENT_RATIO, "Current Ratio"),
    (ratio_names::QUICK_RATIO, "Quick Ratio"),
];

pub const LEVERAGE: [(&str, &str); 2] = [
    (ratio_names::DEBT_TO_EQUITY_RATIO, "Debt to Equity"),
    (ratio_names::EQUITY_RATIO, "Equity Ratio"),
];

pub const ASSET_STRUCTURE: [(&str, &str); 2] = [
    (ratio_names::NON_CURRENT_ASSETS_RATIO, "Non-current Assets"),
    (ratio_names::CURRENT_ASSETS_RATIO, "Current Assets"),
];

pub const FINANCING_STRUCTURE: [(&str, &str); 3] = [
    (ratio_names::EQUITY_RATIO, "Equity"),
    (ratio_names::NON_CURRENT_LIABILITIES_RATIO, "Non-current Liabilities"),
    (ratio_names::CURRENT_LIABILITIES_RATIO, "Current Liabilities"),
];

/// Rows for every company that has all metrics of the group in `year`.
/// A company missing any one of them is left out entirely.
pub fn metric_group_rows(
    table: &RatioTable,
    companies: &[CompanyId],
    group: &MetricGroup,
    year: Year,
) -> Vec<MetricRow> {
    let mut rows = Vec::new();
    for company in companies {
        let values: Option<Vec<RatioValue>> = group
            .iter()
            .map(|(ratio_name, _)| get_ratio_value(table, company, ratio_name, year))
            .collect();
        if let Some(values) = values {
            rows.extend(group.iter().zip(values).map(|((_, label), value)| MetricRow {
                company: company.clone(),
                metric: label.to_string(),
                value,
            }));
        }
    }
    rows
}

pub fn liquidity_rows(table: &RatioTable, companies: &[CompanyId]) -> Vec<MetricRow> {
    metric_group_rows(table, companies, &LIQUIDITY, Year::Y2024)
}

pub fn leverage_rows(table: &RatioTable, companies: &[CompanyId]) -> Vec<MetricRow> {
    metric_group_rows(table, companies, &LEVERAGE, Year::Y2024)
}

pub fn asset_structure_rows(table: &RatioTable, companies: &[CompanyId]) -> Vec<MetricRow> {
    metric_group_rows(table, companies, &ASSET_STRUCTURE, Year::Y2024)
}

pub fn financing_structure_rows(table: &RatioTable, companies: &[CompanyId]) -> Vec<MetricRow> {
    metric_group_rows(table, companies, &FINANCING_STRUCTURE, Year::Y2024)
}

// ---------------------------------------------------------------------------
// Efficiency gauges
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GaugeUnit {
    Days,
    Ratio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandColor {
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeBand {
    pub from: Decimal,
    pub to: Decimal,
    pub color: BandColor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyGauge {
    pub company: CompanyId,
    pub ratio_name: String,
    pub label: String,
    pub unit: GaugeUnit,
    pub value: RatioValue,
    /// 2023 value, the gauge's reference point when present.
    pub reference: Option<RatioValue>,
    pub delta: Option<RatioValue>,
    pub gauge_max: Decimal,
    pub bands: Vec<GaugeBand>,
}

pub const EFFICIENCY: [(&str, &str, GaugeUnit); 5] = [
    (ratio_names::DAYS_SALES_OUTSTANDING, "DSO", GaugeUnit::Days),
    (ratio_names::DAYS_TO_SELL_INVENTORY, "Inventory Days", GaugeUnit::Days),
    (ratio_names::DAYS_PAYABLE_OUTSTANDING, "DPO", GaugeUnit::Days),
    (ratio_names::ASSET_TURNOVER_RATIO, "Asset Turnover", GaugeUnit::Ratio),
    (ratio_names::CASH_CONVERSION_CYCLE, "Cash Cycle", GaugeUnit::Days),
];

impl GaugeUnit {
    /// Scale upper bound: the unit's floor, or 1.5x the value if larger.
    /// Absent when 1.5x the value overflows.
    pub fn gauge_max(self, value: RatioValue) -> Option<Decimal> {
        let floor = match self {
            GaugeUnit::Days => dec!(150),
            GaugeUnit::Ratio => dec!(2.0),
        };
        Some(floor.max(value.checked_mul(dec!(1.5))?))
    }

    pub fn bands(self, gauge_max: Decimal) -> Vec<GaugeBand> {
        let band = |from, to, color| GaugeBand { from, to, color };
        match self {
            GaugeUnit::Days => vec![
                band(dec!(0), dec!(30), BandColor::Green),
                band(dec!(30), dec!(60), BandColor::Yellow),
                band(dec!(60), gauge_max, BandColor::Red),
            ],
            GaugeUnit::Ratio => vec![
                band(dec!(0), dec!(0.5), BandColor::Red),
                band(dec!(0.5), dec!(1.0), BandColor::Yellow),
                band(dec!(1.0), gauge_max, BandColor::Green),
            ],
        }
    }
}

/// Gauges for each company, skipping metrics without a 2024 value or whose
/// scale cannot be represented.
pub fn efficiency_gauges(table: &RatioTable, companies: &[CompanyId]) -> Vec<EfficiencyGauge> {
    let mut gauges = Vec::new();
    for company in companies {
        for (ratio_name, label, unit) in EFFICIENCY {
            let Some(value) = get_ratio_value(table, company, ratio_name, Year::Y2024) else {
                continue;
            };
            let Some(gauge_max) = unit.gauge_max(value) else {
                tracing::debug!(%company, ratio_name, "gauge scale overflows, skipping");
                continue;
            };
            let reference = get_ratio_value(table, company, ratio_name, Year::Y2023);
            gauges.push(EfficiencyGauge {
                company: company.clone(),
                ratio_name: ratio_name.to_string(),
                label: label.to_string(),
                unit,
                value,
                reference,
                delta: compute_delta(Some(value), reference),
                gauge_max,
                bands: unit.bands(gauge_max),
            });
        }
    }
    gauges
}

// ---------------------------------------------------------------------------
// Cash flow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowRow {
    pub company: CompanyId,
    pub item: String,
    /// Item name in title case, e.g. `Operating Cash Flow`.
    pub label: String,
    #[serde(rename = "2023")]
    pub year2023: Option<RatioValue>,
    #[serde(rename = "2024")]
    pub year2024: Option<RatioValue>,
}

impl CashFlowRow {
    pub fn value(&self, year: Year) -> Option<RatioValue> {
        match year {
            Year::Y2023 => self.year2023,
            Year::Y2024 => self.year2024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterfallMeasure {
    Relative,
    Total,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallStep {
    pub label: String,
    pub value: RatioValue,
    pub measure: WaterfallMeasure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallSeries {
    pub company: CompanyId,
    pub year: Year,
    pub steps: Vec<WaterfallStep>,
}

/// `operating_cash_flow` -> `Operating Cash Flow`.
pub fn item_label(item: &str) -> String {
    item.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Cash-flow items for the first few companies, in waterfall order.
pub fn cash_flow_rows(inputs: &InputTable, companies: &[CompanyId]) -> Vec<CashFlowRow> {
    let mut rows = Vec::new();
    for company in companies.iter().take(CASH_FLOW_COMPANY_LIMIT) {
        let mut company_rows: Vec<_> = inputs
            .for_company(company)
            .filter_map(|r| {
                let rank = cash_flow::WATERFALL_ORDER.iter().position(|i| *i == r.item)?;
                Some((rank, r))
            })
            .collect();
        company_rows.sort_by_key(|(rank, _)| *rank);

        rows.extend(company_rows.into_iter().map(|(_, r)| CashFlowRow {
            company: company.clone(),
            item: r.item.clone(),
            label: item_label(&r.item),
            year2023: r.year2023,
            year2024: r.year2024,
        }));
    }
    rows
}

/// Waterfall series for the first companies. Net cash flow is the total bar.
pub fn waterfall_series(rows: &[CashFlowRow], companies: &[CompanyId], year: Year) -> Vec<WaterfallSeries> {
    companies
        .iter()
        .take(WATERFALL_COMPANY_LIMIT)
        .filter_map(|company| {
            let steps: Vec<WaterfallStep> = rows
                .iter()
                .filter(|r| &r.company == company)
                .filter_map(|r| {
                    let value = r.value(year)?;
                    let measure = if r.item == cash_flow::NET {
                        WaterfallMeasure::Total
                    } else {
                        WaterfallMeasure::Relative
                    };
                    Some(WaterfallStep {
                        label: r.label.clone(),
                        value,
                        measure,
                    })
                })
                .collect();
            (!steps.is_empty()).then(|| WaterfallSeries {
                company: company.clone(),
                year,
                steps,
            })
        })
        .collect()
}
