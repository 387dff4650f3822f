//! User-adjustable dashboard settings and their resolution against a dataset.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::dataset::PreparedDataset;
use crate::error::DashboardError;
use crate::types::{CompanyId, Year};
use crate::DashboardResult;

/// Companies the colour palettes are defined for.
pub const PALETTE_COMPANIES: [&str; 3] = ["BORYSZEW", "FASING", "FEERUM"];

// ---------------------------------------------------------------------------
// Colour schemes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Corporate,
    Bright,
    Pastel,
    Monochrome,
}

impl ColorScheme {
    pub const ALL: [ColorScheme; 4] = [
        ColorScheme::Corporate,
        ColorScheme::Bright,
        ColorScheme::Pastel,
        ColorScheme::Monochrome,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ColorScheme::Corporate => "corporate",
            ColorScheme::Bright => "bright",
            ColorScheme::Pastel => "pastel",
            ColorScheme::Monochrome => "monochrome",
        }
    }

    /// Hex colours for BORYSZEW, FASING, FEERUM in that order.
    pub fn colors(self) -> [&'static str; 3] {
        match self {
            ColorScheme::Corporate => ["#1f77b4", "#ff7f0e", "#2ca02c"],
            ColorScheme::Bright => ["#e41a1c", "#377eb8", "#4daf4a"],
            ColorScheme::Pastel => ["#a6cee3", "#b2df8a", "#fb9a99"],
            ColorScheme::Monochrome => ["#636363", "#969696", "#cccccc"],
        }
    }

    /// Colour for a company, absent for companies outside the palette.
    pub fn color_for(self, company: &str) -> Option<&'static str> {
        PALETTE_COMPANIES
            .iter()
            .position(|c| *c == company)
            .map(|i| self.colors()[i])
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorScheme {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ColorScheme::ALL
            .into_iter()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| {
                DashboardError::invalid_input(
                    "color_scheme",
                    format!("'{s}' is not one of corporate, bright, pastel, monochrome"),
                )
            })
    }
}

// ---------------------------------------------------------------------------
// Category filter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Category(String),
}

impl CategoryFilter {
    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Category(c) => c == category,
        }
    }
}

impl From<String> for CategoryFilter {
    fn from(s: String) -> Self {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") || trimmed.eq_ignore_ascii_case("all categories") {
            CategoryFilter::All
        } else {
            CategoryFilter::Category(trimmed.to_string())
        }
    }
}

impl From<CategoryFilter> for String {
    fn from(filter: CategoryFilter) -> Self {
        match filter {
            CategoryFilter::All => "all".to_string(),
            CategoryFilter::Category(c) => c,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Settings as written by a user. Nothing here is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Companies to show. Empty selects every company in the dataset.
    pub companies: Vec<CompanyId>,
    pub years: Vec<Year>,
    pub category: CategoryFilter,
    pub show_raw_data: bool,
    pub show_insights: bool,
    pub color_scheme: ColorScheme,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            companies: Vec::new(),
            years: Year::ALL.to_vec(),
            category: CategoryFilter::All,
            show_raw_data: false,
            show_insights: true,
            color_scheme: ColorScheme::Corporate,
        }
    }
}

/// A configuration checked against the companies and categories of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub companies: Vec<CompanyId>,
    pub years: Vec<Year>,
    pub category: CategoryFilter,
    pub show_raw_data: bool,
    pub show_insights: bool,
    pub color_scheme: ColorScheme,
}

impl Selection {
    pub fn color_for(&self, company: &str) -> Option<&'static str> {
        self.color_scheme.color_for(company)
    }
}

impl DashboardConfig {
    pub fn resolve(&self, dataset: &PreparedDataset) -> DashboardResult<Selection> {
        let companies = if self.companies.is_empty() {
            dataset.companies()
        } else {
            let mut picked: Vec<CompanyId> = Vec::with_capacity(self.companies.len());
            for company in &self.companies {
                if !dataset.ratios.has_company(company) {
                    return Err(DashboardError::invalid_input(
                        "companies",
                        format!(
                            "unknown company '{company}' (available: {})",
                            dataset.companies().join(", ")
                        ),
                    ));
                }
                if !picked.contains(company) {
                    picked.push(company.clone());
                }
            }
            picked
        };

        if self.years.is_empty() {
            return Err(DashboardError::invalid_input(
                "years",
                "at least one year must be selected",
            ));
        }
        let mut years = Vec::with_capacity(self.years.len());
        for year in &self.years {
            if !years.contains(year) {
                years.push(*year);
            }
        }

        if let CategoryFilter::Category(category) = &self.category {
            if !dataset.ratios.has_category(category) {
                return Err(DashboardError::invalid_input(
                    "category",
                    format!(
                        "unknown category '{category}' (available: {})",
                        dataset.categories().join(", ")
                    ),
                ));
            }
        }

        Ok(Selection {
            companies,
            years,
            category: self.category.clone(),
            show_raw_data: self.show_raw_data,
            show_insights: self.show_insights,
            color_scheme: self.color_scheme,
        })
    }
}
