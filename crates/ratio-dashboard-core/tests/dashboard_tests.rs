use std::path::PathBuf;

use pretty_assertions::assert_eq;
use ratio_dashboard_core::config::{CategoryFilter, DashboardConfig};
use ratio_dashboard_core::dataset::{prepare, DatasetCache, PreparedDataset};
use ratio_dashboard_core::query::alerts::AlertReport;
use ratio_dashboard_core::query::build_dashboard;
use ratio_dashboard_core::ratio_names::CASH_CONVERSION_CYCLE;
use ratio_dashboard_core::{DashboardError, Year};
use rust_decimal_macros::dec;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn dataset() -> PreparedDataset {
    prepare(&fixture("master_ratios.csv"), &fixture("master_inputs.csv")).unwrap()
}

// ===========================================================================
// Preparation
// ===========================================================================

#[test]
fn test_prepare_appends_cash_conversion_cycles() {
    let ds = dataset();
    assert_eq!(ds.ratios.len(), 58);

    let boryszew = ds.ratios.find("BORYSZEW", CASH_CONVERSION_CYCLE).unwrap();
    // 58 + 67 - 49
    assert_eq!(boryszew.year2024, Some(dec!(76)));
    assert_eq!(boryszew.year2023, None);
    assert_eq!(boryszew.category, "activity");

    let fasing = ds.ratios.find("FASING", CASH_CONVERSION_CYCLE).unwrap();
    assert_eq!(fasing.year2024, Some(dec!(109)));

    // FEERUM reports no Days Payable Outstanding.
    assert!(ds.ratios.find("FEERUM", CASH_CONVERSION_CYCLE).is_none());
    assert_eq!(ds.warnings.len(), 1);
    assert!(ds.warnings[0].starts_with("FEERUM:"));
}

#[test]
fn test_prepare_deduplicates_inputs() {
    let ds = dataset();
    assert_eq!(ds.inputs.len(), 18);
    let depreciation_rows = ds
        .inputs
        .records
        .iter()
        .filter(|r| r.item == "depreciation")
        .count();
    assert_eq!(depreciation_rows, 3);
}

#[test]
fn test_discovery_is_sorted() {
    let ds = dataset();
    assert_eq!(ds.companies(), vec!["BORYSZEW", "FASING", "FEERUM"]);
    assert_eq!(
        ds.categories(),
        vec!["activity", "leverage", "liquidity", "profitability", "structure"]
    );
}

#[test]
fn test_missing_source_is_fatal() {
    let err = prepare(&fixture("master_ratios.csv"), &fixture("nope.csv")).unwrap_err();
    match err {
        DashboardError::Load { source_name, reason } => {
            assert!(source_name.ends_with("nope.csv"));
            assert!(!reason.is_empty());
        }
        other => panic!("expected Load, got {other:?}"),
    }
}

#[test]
fn test_out_of_range_cell_loads_absent_with_warning() {
    let dir = tempfile::tempdir().unwrap();
    let ratios = dir.path().join("ratios.csv");
    std::fs::write(
        &ratios,
        "company,category,ratio_name, 2023 , 2024 \n\
         FASING,liquidity,Current Ratio,1e30,1.4\n",
    )
    .unwrap();

    let ds = prepare(&ratios, &fixture("master_inputs.csv")).unwrap();
    let row = ds.ratios.find("FASING", "Current Ratio").unwrap();
    assert_eq!(row.year2023, None);
    assert_eq!(row.year2024, Some(dec!(1.4)));
    assert!(ds
        .warnings
        .iter()
        .any(|w| w.contains("ratios.csv") && w.contains("'1e30'") && w.contains("2023")));
}

#[test]
fn test_cache_serves_one_snapshot() {
    let cache = DatasetCache::new();
    let a = cache
        .get_or_prepare(&fixture("master_ratios.csv"), &fixture("master_inputs.csv"))
        .unwrap();
    let b = cache
        .get_or_prepare(&fixture("master_ratios.csv"), &fixture("master_inputs.csv"))
        .unwrap();
    assert!(std::sync::Arc::ptr_eq(&a, &b));
    // Derived rows are appended exactly once.
    assert_eq!(b.ratios.len(), 58);
}

// ===========================================================================
// Full report
// ===========================================================================

#[test]
fn test_default_report_alerts() {
    let out = build_dashboard(&dataset(), &DashboardConfig::default()).unwrap();
    let alerts = &out.result.alerts;

    assert_eq!(
        AlertReport::messages(&alerts.critical),
        vec![
            "BORYSZEW: Negative Interest Coverage (-0.50)",
            "BORYSZEW: Low Current Ratio (1.10)",
            "BORYSZEW: Negative Net Margin (-2.1%)",
        ]
    );
    assert_eq!(
        AlertReport::messages(&alerts.strengths),
        vec![
            "FASING: Strong equity position (68.0%)",
            "FASING: Excellent liquidity (2.45)",
            "FASING: Strong interest coverage (7.90)",
        ]
    );
    assert_eq!(
        AlertReport::messages(&alerts.improvements),
        vec![
            "BORYSZEW: Negative interest coverage indicates financial distress",
            "BORYSZEW: Low cash reserves (3.0%)",
            "BORYSZEW: Operating at a loss (-2.1%)",
        ]
    );
}

#[test]
fn test_default_report_sections() {
    let out = build_dashboard(&dataset(), &DashboardConfig::default()).unwrap();
    let report = &out.result;

    assert_eq!(report.companies.len(), 3);
    assert_eq!(report.companies[0].color.as_deref(), Some("#1f77b4"));

    assert_eq!(report.kpis.len(), 4);
    assert_eq!(report.kpis[0].company, "BORYSZEW");
    assert_eq!(report.kpis[0].display_value, "1.10");
    assert_eq!(report.kpis[0].display_delta.as_deref(), Some("-0.25"));
    assert_eq!(report.kpis[1].favourable, Some(false));
    assert_eq!(report.kpis[2].display_value, "-2.1%");

    assert_eq!(report.profitability.len(), 24);
    assert_eq!(report.liquidity.len(), 6);
    assert_eq!(report.leverage.len(), 6);
    // FEERUM has no 2024 Non-current Assets Ratio.
    assert_eq!(report.asset_structure.len(), 4);
    assert_eq!(report.financing_structure.len(), 9);
    assert_eq!(report.efficiency.len(), 13);

    assert_eq!(report.cash_flow.len(), 12);
    assert_eq!(report.waterfalls.len(), 2);
    assert_eq!(report.waterfalls[1].company, "FASING");
    assert_eq!(report.waterfalls[1].steps[0].label, "Operating Cash Flow");
    assert_eq!(report.waterfalls[1].steps[3].label, "Net Cash Flow");

    assert!(report.profitability_insights.contains(
        &"FASING: Net margin is 8.3% of operating margin (tax/interest efficiency: 75.5%)".to_string()
    ));
    assert!(report.raw_preview.is_none());
    assert_eq!(out.warnings.len(), 1);
}

#[test]
fn test_hiding_insights_keeps_critical_alerts() {
    let config = DashboardConfig {
        show_insights: false,
        ..Default::default()
    };
    let out = build_dashboard(&dataset(), &config).unwrap();
    assert_eq!(out.result.alerts.critical.len(), 3);
    assert!(out.result.alerts.strengths.is_empty());
    assert!(out.result.alerts.improvements.is_empty());
    assert!(out.result.profitability_insights.is_empty());
}

#[test]
fn test_selection_drives_table_and_export() {
    let config = DashboardConfig {
        companies: vec!["FASING".to_string()],
        years: vec![Year::Y2024],
        category: CategoryFilter::Category("activity".to_string()),
        show_raw_data: true,
        ..Default::default()
    };
    let out = build_dashboard(&dataset(), &config).unwrap();
    let report = &out.result;

    assert_eq!(report.profitability.len(), 4);
    assert!(report.profitability.iter().all(|r| r.year == Year::Y2024));

    let table: Vec<_> = report
        .table
        .iter()
        .map(|r| (r.ratio_name.as_str(), r.year2023.as_str(), r.year2024.as_str()))
        .collect();
    assert_eq!(
        table,
        vec![
            ("Asset Turnover Ratio", "95.0%", "98.0%"),
            ("Days Sales Outstanding", "71", "66"),
            ("Days to Sell Inventory", "88", "84"),
            ("Days Payable Outstanding", "39", "41"),
            ("Cash Conversion Cycle", "", "109.00"),
        ]
    );

    let export = report.export.as_ref().unwrap();
    assert_eq!(export.file_name, "financial_ratios_FASING.csv");
    assert_eq!(export.rows, 20);
    let mut lines = export.csv.lines();
    assert_eq!(lines.next(), Some("company,category,ratio_name,2023,2024"));
    assert!(lines.all(|l| l.starts_with("FASING,")));

    let raw = report.raw_preview.as_ref().unwrap();
    assert_eq!(raw.ratios.len(), 30);
    assert_eq!(raw.inputs.len(), 18);
}

#[test]
fn test_unknown_company_is_rejected() {
    let config = DashboardConfig {
        companies: vec!["ACME".to_string()],
        ..Default::default()
    };
    let err = build_dashboard(&dataset(), &config).unwrap_err();
    assert!(matches!(err, DashboardError::InvalidInput { .. }));
}

#[test]
fn test_report_serializes_with_year_keys() {
    let out = build_dashboard(&dataset(), &DashboardConfig::default()).unwrap();
    let json = serde_json::to_value(&out).unwrap();
    let row = &json["result"]["cash_flow"][0];
    assert_eq!(row["item"], "operating_cash_flow");
    assert!(row.get("2024").is_some());
    assert_eq!(json["assumptions"]["color_scheme"], "corporate");
}
