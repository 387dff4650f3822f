//! Fixed-threshold alert rules evaluated per company on 2024 values.
//!
//! Every rule uses the absent-tolerant lookup: a missing metric suppresses
//! that one rule for that one company and nothing else.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::dataset::records::RatioTable;
use crate::query::format::{format_fixed, format_percent};
use crate::query::lookup::get_ratio_value;
use crate::ratio_names::{
    CASH_HOLDINGS_RATIO, CURRENT_RATIO, EQUITY_RATIO, INTEREST_COVERAGE_RATIO, NET_PROFIT_MARGIN,
};
use crate::types::{CompanyId, RatioValue, Year};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Critical,
    Strength,
    Improvement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Below,
    Above,
}

/// How `{value}` is rendered in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueStyle {
    Fixed,
    Percentage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertRule {
    pub kind: AlertKind,
    pub ratio_name: &'static str,
    pub comparison: Comparison,
    pub threshold: Decimal,
    /// Message with `{company}` and optionally `{value}` placeholders.
    pub template: &'static str,
    pub value_style: ValueStyle,
}

pub static ALERT_RULES: [AlertRule; 9] = [
    // Critical
    AlertRule {
        kind: AlertKind::Critical,
        ratio_name: INTEREST_COVERAGE_RATIO,
        comparison: Comparison::Below,
        threshold: dec!(0),
        template: "{company}: Negative Interest Coverage ({value})",
        value_style: ValueStyle::Fixed,
    },
    AlertRule {
        kind: AlertKind::Critical,
        ratio_name: CURRENT_RATIO,
        comparison: Comparison::Below,
        threshold: dec!(1.2),
        template: "{company}: Low Current Ratio ({value})",
        value_style: ValueStyle::Fixed,
    },
    AlertRule {
        kind: AlertKind::Critical,
        ratio_name: NET_PROFIT_MARGIN,
        comparison: Comparison::Below,
        threshold: dec!(0),
        template: "{company}: Negative Net Margin ({value})",
        value_style: ValueStyle::Percentage,
    },
    // Strengths
    AlertRule {
        kind: AlertKind::Strength,
        ratio_name: EQUITY_RATIO,
        comparison: Comparison::Above,
        threshold: dec!(0.5),
        template: "{company}: Strong equity position ({value})",
        value_style: ValueStyle::Percentage,
    },
    AlertRule {
        kind: AlertKind::Strength,
        ratio_name: CURRENT_RATIO,
        comparison: Comparison::Above,
        threshold: dec!(2.0),
        template: "{company}: Excellent liquidity ({value})",
        value_style: ValueStyle::Fixed,
    },
    AlertRule {
        kind: AlertKind::Strength,
        ratio_name: INTEREST_COVERAGE_RATIO,
        comparison: Comparison::Above,
        threshold: dec!(2),
        template: "{company}: Strong interest coverage ({value})",
        value_style: ValueStyle::Fixed,
    },
    // Areas for improvement
    AlertRule {
        kind: AlertKind::Improvement,
        ratio_name: INTEREST_COVERAGE_RATIO,
        comparison: Comparison::Below,
        threshold: dec!(0),
        template: "{company}: Negative interest coverage indicates financial distress",
        value_style: ValueStyle::Fixed,
    },
    AlertRule {
        kind: AlertKind::Improvement,
        ratio_name: CASH_HOLDINGS_RATIO,
        comparison: Comparison::Below,
        threshold: dec!(0.05),
        template: "{company}: Low cash reserves ({value})",
        value_style: ValueStyle::Percentage,
    },
    AlertRule {
        kind: AlertKind::Improvement,
        ratio_name: NET_PROFIT_MARGIN,
        comparison: Comparison::Below,
        threshold: dec!(0),
        template: "{company}: Operating at a loss ({value})",
        value_style: ValueStyle::Percentage,
    },
];

/// A rule that fired for one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub company: CompanyId,
    pub ratio_name: String,
    pub value: RatioValue,
    pub threshold: RatioValue,
    pub message: String,
}

impl AlertRule {
    /// Strict comparison; a value equal to the threshold never fires.
    pub fn is_triggered(&self, value: RatioValue) -> bool {
        match self.comparison {
            Comparison::Below => value < self.threshold,
            Comparison::Above => value > self.threshold,
        }
    }

    pub fn render(&self, company: &str, value: RatioValue) -> String {
        let value_text = match self.value_style {
            ValueStyle::Fixed => format_fixed(value),
            ValueStyle::Percentage => format_percent(value),
        };
        self.template
            .replace("{company}", company)
            .replace("{value}", &value_text)
    }

    pub fn evaluate(&self, table: &RatioTable, company: &str) -> Option<Alert> {
        let value = get_ratio_value(table, company, self.ratio_name, Year::Y2024)?;
        self.is_triggered(value).then(|| Alert {
            kind: self.kind,
            company: company.to_string(),
            ratio_name: self.ratio_name.to_string(),
            value,
            threshold: self.threshold,
            message: self.render(company, value),
        })
    }
}

/// Alerts of one kind, company by company, rules in table order.
pub fn evaluate_kind(table: &RatioTable, companies: &[CompanyId], kind: AlertKind) -> Vec<Alert> {
    companies
        .iter()
        .flat_map(|company| {
            ALERT_RULES
                .iter()
                .filter(move |rule| rule.kind == kind)
                .filter_map(move |rule| rule.evaluate(table, company))
        })
        .collect()
}

/// The three alert lists shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertReport {
    pub critical: Vec<Alert>,
    pub strengths: Vec<Alert>,
    pub improvements: Vec<Alert>,
}

impl AlertReport {
    pub fn is_empty(&self) -> bool {
        self.critical.is_empty() && self.strengths.is_empty() && self.improvements.is_empty()
    }

    pub fn messages(alerts: &[Alert]) -> Vec<&str> {
        alerts.iter().map(|a| a.message.as_str()).collect()
    }
}

pub fn alert_report(table: &RatioTable, companies: &[CompanyId]) -> AlertReport {
    AlertReport {
        critical: evaluate_kind(table, companies, AlertKind::Critical),
        strengths: evaluate_kind(table, companies, AlertKind::Strength),
        improvements: evaluate_kind(table, companies, AlertKind::Improvement),
    }
}
