use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::{CompanyId, RatioValue, Year};

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

/// A recognised column of the ratio table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioColumn {
    Company,
    Category,
    RatioName,
    Year(Year),
}

impl RatioColumn {
    /// Canonical order, used when a source carries no header order of its own.
    pub const CANONICAL: [RatioColumn; 5] = [
        RatioColumn::Company,
        RatioColumn::Category,
        RatioColumn::RatioName,
        RatioColumn::Year(Year::Y2023),
        RatioColumn::Year(Year::Y2024),
    ];

    pub fn header(self) -> &'static str {
        match self {
            RatioColumn::Company => "company",
            RatioColumn::Category => "category",
            RatioColumn::RatioName => "ratio_name",
            RatioColumn::Year(year) => year.column(),
        }
    }

    /// Match an already-trimmed header.
    pub fn from_header(header: &str) -> Option<Self> {
        Self::CANONICAL.into_iter().find(|c| c.header() == header)
    }
}

/// A recognised column of the inputs (cash-flow line item) table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputColumn {
    Item,
    Company,
    Year(Year),
}

impl InputColumn {
    pub const CANONICAL: [InputColumn; 4] = [
        InputColumn::Item,
        InputColumn::Company,
        InputColumn::Year(Year::Y2023),
        InputColumn::Year(Year::Y2024),
    ];

    pub fn header(self) -> &'static str {
        match self {
            InputColumn::Item => "item",
            InputColumn::Company => "company",
            InputColumn::Year(year) => year.column(),
        }
    }

    pub fn from_header(header: &str) -> Option<Self> {
        Self::CANONICAL.into_iter().find(|c| c.header() == header)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One named ratio for one company with up to two yearly values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioRecord {
    pub company: CompanyId,
    pub category: String,
    pub ratio_name: String,
    #[serde(rename = "2023")]
    pub year2023: Option<RatioValue>,
    #[serde(rename = "2024")]
    pub year2024: Option<RatioValue>,
}

impl RatioRecord {
    pub fn value(&self, year: Year) -> Option<RatioValue> {
        match year {
            Year::Y2023 => self.year2023,
            Year::Y2024 => self.year2024,
        }
    }

    /// Text of a single cell, absent values rendering as an empty string.
    pub fn cell(&self, column: RatioColumn) -> String {
        match column {
            RatioColumn::Company => self.company.clone(),
            RatioColumn::Category => self.category.clone(),
            RatioColumn::RatioName => self.ratio_name.clone(),
            RatioColumn::Year(year) => self.value(year).map(|v| v.to_string()).unwrap_or_default(),
        }
    }
}

/// One cash-flow (or other input) line item for one company.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputRecord {
    pub item: String,
    pub company: CompanyId,
    #[serde(rename = "2023")]
    pub year2023: Option<RatioValue>,
    #[serde(rename = "2024")]
    pub year2024: Option<RatioValue>,
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Ratio rows in source order, plus the column order the source declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioTable {
    pub columns: Vec<RatioColumn>,
    pub records: Vec<RatioRecord>,
    /// Cells that held a number outside the decimal range and loaded as absent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl RatioTable {
    pub fn new(columns: Vec<RatioColumn>, records: Vec<RatioRecord>) -> Self {
        Self {
            columns,
            records,
            warnings: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record matching `(company, ratio_name)`, in table order.
    pub fn find(&self, company: &str, ratio_name: &str) -> Option<&RatioRecord> {
        self.records
            .iter()
            .find(|r| r.company == company && r.ratio_name == ratio_name)
    }

    /// Distinct companies, sorted.
    pub fn companies(&self) -> Vec<CompanyId> {
        self.records
            .iter()
            .map(|r| r.company.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct companies in order of first appearance.
    pub fn companies_in_order(&self) -> Vec<CompanyId> {
        let mut seen = BTreeSet::new();
        self.records
            .iter()
            .filter(|r| seen.insert(r.company.as_str()))
            .map(|r| r.company.clone())
            .collect()
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn has_company(&self, company: &str) -> bool {
        self.records.iter().any(|r| r.company == company)
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.records.iter().any(|r| r.category == category)
    }
}

/// Input rows in source order, plus the column order the source declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputTable {
    pub columns: Vec<InputColumn>,
    pub records: Vec<InputRecord>,
    /// Cells that held a number outside the decimal range and loaded as absent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl InputTable {
    pub fn new(columns: Vec<InputColumn>, records: Vec<InputRecord>) -> Self {
        Self {
            columns,
            records,
            warnings: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn for_company<'a>(&'a self, company: &'a str) -> impl Iterator<Item = &'a InputRecord> + 'a {
        self.records.iter().filter(move |r| r.company == company)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(company: &str, category: &str, name: &str, y24: Option<RatioValue>) -> RatioRecord {
        RatioRecord {
            company: company.to_string(),
            category: category.to_string(),
            ratio_name: name.to_string(),
            year2023: None,
            year2024: y24,
        }
    }

    #[test]
    fn test_find_returns_first_match() {
        let table = RatioTable::new(
            RatioColumn::CANONICAL.to_vec(),
            vec![
                record("FASING", "liquidity", "Current Ratio", Some(dec!(1.1))),
                record("FASING", "liquidity", "Current Ratio", Some(dec!(9.9))),
            ],
        );
        let found = table.find("FASING", "Current Ratio").unwrap();
        assert_eq!(found.year2024, Some(dec!(1.1)));
        assert!(table.find("FASING", "Quick Ratio").is_none());
    }

    #[test]
    fn test_companies_and_categories_sorted_distinct() {
        let table = RatioTable::new(
            RatioColumn::CANONICAL.to_vec(),
            vec![
                record("FEERUM", "profitability", "Gross Margin", None),
                record("BORYSZEW", "liquidity", "Current Ratio", None),
                record("FEERUM", "liquidity", "Quick Ratio", None),
            ],
        );
        assert_eq!(table.companies(), vec!["BORYSZEW", "FEERUM"]);
        assert_eq!(table.companies_in_order(), vec!["FEERUM", "BORYSZEW"]);
        assert_eq!(table.categories(), vec!["liquidity", "profitability"]);
    }

    #[test]
    fn test_cell_renders_absent_as_empty() {
        let r = record("FASING", "liquidity", "Current Ratio", Some(dec!(1.25)));
        assert_eq!(r.cell(RatioColumn::Year(Year::Y2023)), "");
        assert_eq!(r.cell(RatioColumn::Year(Year::Y2024)), "1.25");
        assert_eq!(r.cell(RatioColumn::RatioName), "Current Ratio");
    }

    #[test]
    fn test_column_from_header() {
        assert_eq!(RatioColumn::from_header("ratio_name"), Some(RatioColumn::RatioName));
        assert_eq!(RatioColumn::from_header("2024"), Some(RatioColumn::Year(Year::Y2024)));
        assert_eq!(RatioColumn::from_header("item"), None);
        assert_eq!(InputColumn::from_header("item"), Some(InputColumn::Item));
    }
}
