//! Preparation, lookup and insight logic behind a three-company financial
//! ratio dashboard.
//!
//! [`dataset`] loads the ratio and cash-flow input tables, removes duplicate
//! inputs and derives the Cash Conversion Cycle. [`query`] answers point
//! lookups, year-over-year deltas, threshold alerts and the grouped
//! sub-tables a chart layer draws from.

pub mod config;
pub mod dataset;
pub mod error;
pub mod query;
pub mod ratio_names;
pub mod types;

pub use config::{CategoryFilter, ColorScheme, DashboardConfig, Selection};
pub use dataset::{DatasetCache, PreparedDataset};
pub use error::DashboardError;
pub use types::*;

/// Standard result type for all dashboard operations
pub type DashboardResult<T> = Result<T, DashboardError>;
