pub mod export;
pub mod query;

use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

use ratio_dashboard_core::{
    CategoryFilter, ColorScheme, DashboardConfig, DatasetCache, PreparedDataset, Selection, Year,
};

use crate::input;

/// Data sources and selection overrides shared by every subcommand
#[derive(Args)]
pub struct DataArgs {
    /// Ratio table (CSV or JSON)
    #[arg(long, global = true, default_value = "pipeline/master_ratios.csv")]
    pub ratios: PathBuf,

    /// Cash-flow input table (CSV or JSON)
    #[arg(long, global = true, default_value = "pipeline/master_inputs.csv")]
    pub inputs: PathBuf,

    /// Dashboard configuration file (YAML or JSON)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Company to include (repeatable). Replaces the configured companies.
    #[arg(long = "company", global = true)]
    pub companies: Vec<String>,

    /// Year to include (repeatable). Replaces the configured years.
    #[arg(long = "year", global = true)]
    pub years: Vec<Year>,

    /// Category filter for the ratio table ("all" for every category)
    #[arg(long, global = true)]
    pub category: Option<String>,

    /// Include the raw data preview in the report
    #[arg(long, global = true)]
    pub raw: bool,

    /// Hide strengths, improvement areas and profitability insights
    #[arg(long, global = true)]
    pub no_insights: bool,

    /// Company colour palette
    #[arg(long, global = true)]
    pub color_scheme: Option<ColorScheme>,
}

impl DataArgs {
    /// The configuration file (or defaults) with command-line overrides applied.
    pub fn dashboard_config(&self) -> Result<DashboardConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => input::file::read_config(path)?,
            None => DashboardConfig::default(),
        };

        if !self.companies.is_empty() {
            config.companies = self.companies.clone();
        }
        if !self.years.is_empty() {
            config.years = self.years.clone();
        }
        if let Some(category) = &self.category {
            config.category = CategoryFilter::from(category.clone());
        }
        if self.raw {
            config.show_raw_data = true;
        }
        if self.no_insights {
            config.show_insights = false;
        }
        if let Some(scheme) = self.color_scheme {
            config.color_scheme = scheme;
        }
        Ok(config)
    }
}

/// Prepared dataset plus the selection resolved against it.
pub struct Session {
    pub dataset: Arc<PreparedDataset>,
    pub selection: Selection,
}

pub fn open(cache: &DatasetCache, data: &DataArgs) -> Result<Session, Box<dyn std::error::Error>> {
    let config = data.dashboard_config()?;
    let dataset = cache.get_or_prepare(&data.ratios, &data.inputs)?;
    let selection = config.resolve(&dataset)?;
    tracing::info!(
        companies = %selection.companies.join(","),
        "resolved selection"
    );
    Ok(Session {
        dataset,
        selection,
    })
}
