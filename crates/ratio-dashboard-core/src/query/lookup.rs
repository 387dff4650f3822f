use serde::{Deserialize, Serialize};

use crate::dataset::records::RatioTable;
use crate::query::format::{format_fixed, format_percent, format_signed_fixed, format_signed_percent};
use crate::ratio_names::{ASSET_TURNOVER_RATIO, CURRENT_RATIO, DEBT_TO_EQUITY_RATIO, NET_PROFIT_MARGIN};
use crate::types::{CompanyId, RatioValue, Year};

// ---------------------------------------------------------------------------
// Point lookups
// ---------------------------------------------------------------------------

/// Value of the first `(company, ratio_name)` record at `year`.
///
/// Absent when no record matches or the cell holds no number. Callers treat
/// absent as "omit", never as zero.
pub fn get_ratio_value(
    table: &RatioTable,
    company: &str,
    ratio_name: &str,
    year: Year,
) -> Option<RatioValue> {
    table.find(company, ratio_name).and_then(|r| r.value(year))
}

/// `current - prior` when both are present and the difference is representable.
pub fn compute_delta(current: Option<RatioValue>, prior: Option<RatioValue>) -> Option<RatioValue> {
    current?.checked_sub(prior?)
}

/// 2024 versus 2023 change of one ratio.
pub fn year_over_year(table: &RatioTable, company: &str, ratio_name: &str) -> Option<RatioValue> {
    compute_delta(
        get_ratio_value(table, company, ratio_name, Year::Y2024),
        get_ratio_value(table, company, ratio_name, Year::Y2023),
    )
}

// ---------------------------------------------------------------------------
// KPI cards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiFormat {
    Fixed,
    Percentage,
}

#[derive(Debug, Clone, Copy)]
struct KpiSpec {
    label: &'static str,
    ratio_name: &'static str,
    format: KpiFormat,
    higher_is_better: bool,
}

const KPI_SPECS: [KpiSpec; 4] = [
    KpiSpec {
        label: "Current Ratio",
        ratio_name: CURRENT_RATIO,
        format: KpiFormat::Fixed,
        higher_is_better: true,
    },
    KpiSpec {
        label: "Debt to Equity",
        ratio_name: DEBT_TO_EQUITY_RATIO,
        format: KpiFormat::Fixed,
        higher_is_better: false,
    },
    KpiSpec {
        label: "Net Profit Margin",
        ratio_name: NET_PROFIT_MARGIN,
        format: KpiFormat::Percentage,
        higher_is_better: true,
    },
    KpiSpec {
        label: "Asset Turnover",
        ratio_name: ASSET_TURNOVER_RATIO,
        format: KpiFormat::Fixed,
        higher_is_better: true,
    },
];

/// A headline metric with its year-over-year movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiCard {
    pub company: CompanyId,
    pub label: String,
    pub ratio_name: String,
    pub format: KpiFormat,
    pub value_2024: Option<RatioValue>,
    pub value_2023: Option<RatioValue>,
    pub delta: Option<RatioValue>,
    /// `N/A` when the 2024 value is absent.
    pub display_value: String,
    pub display_delta: Option<String>,
    /// Whether the movement is good news; absent without a delta or when flat.
    pub favourable: Option<bool>,
}

/// The four headline cards for one company.
pub fn kpi_cards(table: &RatioTable, company: &str) -> Vec<KpiCard> {
    KPI_SPECS
        .iter()
        .map(|spec| {
            let value_2024 = get_ratio_value(table, company, spec.ratio_name, Year::Y2024);
            let value_2023 = get_ratio_value(table, company, spec.ratio_name, Year::Y2023);
            let delta = compute_delta(value_2024, value_2023);

            let (display_value, display_delta) = match spec.format {
                KpiFormat::Fixed => (
                    value_2024.map(format_fixed),
                    delta.map(format_signed_fixed),
                ),
                KpiFormat::Percentage => (
                    value_2024.map(format_percent),
                    delta.map(format_signed_percent),
                ),
            };

            let favourable = delta.filter(|d| !d.is_zero()).map(|d| {
                let rising = d.is_sign_positive();
                rising == spec.higher_is_better
            });

            KpiCard {
                company: company.to_string(),
                label: spec.label.to_string(),
                ratio_name: spec.ratio_name.to_string(),
                format: spec.format,
                value_2024,
                value_2023,
                delta,
                display_value: display_value.unwrap_or_else(|| "N/A".to_string()),
                display_delta,
                favourable,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::records::{RatioColumn, RatioRecord};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn record(name: &str, y23: Option<RatioValue>, y24: Option<RatioValue>) -> RatioRecord {
        RatioRecord {
            company: "FASING".to_string(),
            category: "x".to_string(),
            ratio_name: name.to_string(),
            year2023: y23,
            year2024: y24,
        }
    }

    fn table() -> RatioTable {
        RatioTable::new(
            RatioColumn::CANONICAL.to_vec(),
            vec![
                record(CURRENT_RATIO, Some(dec!(1.5)), Some(dec!(1.1))),
                record(DEBT_TO_EQUITY_RATIO, Some(dec!(0.8)), Some(dec!(0.6))),
                record(NET_PROFIT_MARGIN, None, Some(dec!(0.042))),
                record(CURRENT_RATIO, Some(dec!(9)), Some(dec!(9))),
            ],
        )
    }

    #[test]
    fn test_lookup_first_match_and_absent() {
        let t = table();
        assert_eq!(get_ratio_value(&t, "FASING", CURRENT_RATIO, Year::Y2024), Some(dec!(1.1)));
        assert_eq!(get_ratio_value(&t, "FASING", NET_PROFIT_MARGIN, Year::Y2023), None);
        assert_eq!(get_ratio_value(&t, "FASING", "Quick Ratio", Year::Y2024), None);
        assert_eq!(get_ratio_value(&t, "FEERUM", CURRENT_RATIO, Year::Y2024), None);
    }

    #[test]
    fn test_lookup_is_repeatable() {
        let t = table();
        let first = get_ratio_value(&t, "FASING", CURRENT_RATIO, Year::Y2023);
        for _ in 0..5 {
            assert_eq!(get_ratio_value(&t, "FASING", CURRENT_RATIO, Year::Y2023), first);
        }
    }

    #[test]
    fn test_delta_requires_both_values() {
        assert_eq!(compute_delta(Some(dec!(1.1)), Some(dec!(1.5))), Some(dec!(-0.4)));
        assert_eq!(compute_delta(Some(dec!(1.1)), None), None);
        assert_eq!(compute_delta(None, Some(dec!(1.5))), None);
        assert_eq!(compute_delta(Some(dec!(0)), Some(dec!(0))), Some(dec!(0)));
        assert_eq!(compute_delta(Some(Decimal::MAX), Some(dec!(-1))), None);
    }

    #[test]
    fn test_year_over_year() {
        let t = table();
        assert_eq!(year_over_year(&t, "FASING", DEBT_TO_EQUITY_RATIO), Some(dec!(-0.2)));
        assert_eq!(year_over_year(&t, "FASING", NET_PROFIT_MARGIN), None);
    }

    #[test]
    fn test_kpi_cards() {
        let cards = kpi_cards(&table(), "FASING");
        assert_eq!(cards.len(), 4);

        let current = &cards[0];
        assert_eq!(current.display_value, "1.10");
        assert_eq!(current.display_delta.as_deref(), Some("-0.40"));
        assert_eq!(current.favourable, Some(false));

        // Falling leverage is good news.
        let leverage = &cards[1];
        assert_eq!(leverage.display_delta.as_deref(), Some("-0.20"));
        assert_eq!(leverage.favourable, Some(true));

        let margin = &cards[2];
        assert_eq!(margin.display_value, "4.2%");
        assert_eq!(margin.delta, None);
        assert_eq!(margin.favourable, None);

        let turnover = &cards[3];
        assert_eq!(turnover.display_value, "N/A");
        assert_eq!(turnover.display_delta, None);
    }
}
