use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::dataset::loader::{load_input_table, load_ratio_table};
use crate::dataset::records::{InputTable, RatioRecord, RatioTable};
use crate::ratio_names::{
    ACTIVITY_CATEGORY, CASH_CONVERSION_CYCLE, DAYS_PAYABLE_OUTSTANDING, DAYS_SALES_OUTSTANDING,
    DAYS_TO_SELL_INVENTORY,
};
use crate::types::{RatioValue, Year};
use crate::DashboardResult;

/// Both tables after preparation. Read-only for the lifetime of the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedDataset {
    pub ratios: RatioTable,
    pub inputs: InputTable,
    /// Per-company notes about derived metrics that could not be computed.
    pub warnings: Vec<String>,
}

impl PreparedDataset {
    pub fn companies(&self) -> Vec<String> {
        self.ratios.companies()
    }

    pub fn categories(&self) -> Vec<String> {
        self.ratios.categories()
    }
}

/// Load both sources and prepare them. Either source failing to load is fatal.
pub fn prepare(ratios_path: &Path, inputs_path: &Path) -> DashboardResult<PreparedDataset> {
    let start = Instant::now();
    let ratios = load_ratio_table(ratios_path)?;
    let inputs = load_input_table(inputs_path)?;
    let dataset = prepare_tables(ratios, inputs);

    tracing::info!(
        ratios = dataset.ratios.len(),
        inputs = dataset.inputs.len(),
        elapsed_us = start.elapsed().as_micros() as u64,
        "prepared dataset"
    );
    Ok(dataset)
}

/// Deduplicate inputs and append the derived Cash Conversion Cycle rows.
/// Load warnings from both tables move into the dataset's warnings.
pub fn prepare_tables(mut ratios: RatioTable, mut inputs: InputTable) -> PreparedDataset {
    let mut warnings = std::mem::take(&mut ratios.warnings);
    warnings.append(&mut inputs.warnings);
    let inputs = deduplicate_inputs(&inputs);
    warnings.extend(append_cash_conversion_cycles(&mut ratios));
    PreparedDataset {
        ratios,
        inputs,
        warnings,
    }
}

/// Drop repeated `(item, company, 2023, 2024)` rows, keeping the first.
pub fn deduplicate_inputs(table: &InputTable) -> InputTable {
    let mut seen = HashSet::with_capacity(table.len());
    let records: Vec<_> = table
        .records
        .iter()
        .filter(|r| seen.insert(*r))
        .cloned()
        .collect();

    let dropped = table.len() - records.len();
    if dropped > 0 {
        tracing::debug!(dropped, "removed duplicate input rows");
    }
    InputTable::new(table.columns.clone(), records)
}

/// Why a company gets no Cash Conversion Cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleGap {
    /// Names of the prerequisites without a 2024 value.
    Missing(Vec<&'static str>),
    /// The sum falls outside the decimal range.
    Overflow,
}

/// `DSO + inventory days - DPO` from a company's 2024 values.
pub fn cash_conversion_cycle(table: &RatioTable, company: &str) -> Result<RatioValue, CycleGap> {
    let lookup = |name: &'static str| {
        table
            .find(company, name)
            .and_then(|r| r.value(Year::Y2024))
            .ok_or(name)
    };

    let dso = lookup(DAYS_SALES_OUTSTANDING);
    let inventory_days = lookup(DAYS_TO_SELL_INVENTORY);
    let dpo = lookup(DAYS_PAYABLE_OUTSTANDING);

    match (dso, inventory_days, dpo) {
        (Ok(dso), Ok(inventory_days), Ok(dpo)) => dso
            .checked_add(inventory_days)
            .and_then(|sum| sum.checked_sub(dpo))
            .ok_or(CycleGap::Overflow),
        (dso, inventory_days, dpo) => Err(CycleGap::Missing(
            [dso, inventory_days, dpo]
                .into_iter()
                .filter_map(Result::err)
                .collect(),
        )),
    }
}

/// Append one derived record per company, in order of first appearance.
/// Companies missing a prerequisite are skipped and reported as warnings.
pub fn append_cash_conversion_cycles(table: &mut RatioTable) -> Vec<String> {
    let mut warnings = Vec::new();
    let mut derived = Vec::new();

    for company in table.companies_in_order() {
        match cash_conversion_cycle(table, &company) {
            Ok(cycle) => derived.push(RatioRecord {
                company,
                category: ACTIVITY_CATEGORY.to_string(),
                ratio_name: CASH_CONVERSION_CYCLE.to_string(),
                year2023: None,
                year2024: Some(cycle),
            }),
            Err(gap) => {
                tracing::debug!(%company, ?gap, "skipping cash conversion cycle");
                let reason = match gap {
                    CycleGap::Missing(missing) => format!("missing 2024 {}", missing.join(", ")),
                    CycleGap::Overflow => "result out of range".to_string(),
                };
                warnings.push(format!("{company}: {CASH_CONVERSION_CYCLE} not derived, {reason}"));
            }
        }
    }

    table.records.extend(derived);
    warnings
}
