//! Ratio names and cash-flow items the dashboard looks up by name.

// ── Liquidity ───────────────────────────────────────────────────────────────
pub const CURRENT_RATIO: &str = "Current Ratio";
pub const QUICK_RATIO: &str = "Quick Ratio";
pub const CASH_HOLDINGS_RATIO: &str = "Cash Holdings Ratio";

// ── Leverage / coverage ─────────────────────────────────────────────────────
pub const DEBT_TO_EQUITY_RATIO: &str = "Debt to Equity Ratio";
pub const EQUITY_RATIO: &str = "Equity Ratio";
pub const INTEREST_COVERAGE_RATIO: &str = "Interest Coverage Ratio";

// ── Profitability ───────────────────────────────────────────────────────────
pub const GROSS_MARGIN: &str = "Gross Margin";
pub const OPERATING_MARGIN: &str = "Operating Margin";
pub const EBIT_MARGIN: &str = "EBIT Margin";
pub const NET_PROFIT_MARGIN: &str = "Net Profit Margin";

pub const PROFITABILITY: [&str; 4] = [GROSS_MARGIN, OPERATING_MARGIN, EBIT_MARGIN, NET_PROFIT_MARGIN];

// ── Activity ────────────────────────────────────────────────────────────────
pub const DAYS_SALES_OUTSTANDING: &str = "Days Sales Outstanding";
pub const DAYS_TO_SELL_INVENTORY: &str = "Days to Sell Inventory";
pub const DAYS_PAYABLE_OUTSTANDING: &str = "Days Payable Outstanding";
pub const ASSET_TURNOVER_RATIO: &str = "Asset Turnover Ratio";
pub const CASH_CONVERSION_CYCLE: &str = "Cash Conversion Cycle";

/// Category given to derived activity metrics.
pub const ACTIVITY_CATEGORY: &str = "activity";

// ── Structure ───────────────────────────────────────────────────────────────
pub const NON_CURRENT_ASSETS_RATIO: &str = "Non-current Assets Ratio";
pub const CURRENT_ASSETS_RATIO: &str = "Current Assets Ratio";
pub const NON_CURRENT_LIABILITIES_RATIO: &str = "Non-current Liabilities Ratio";
pub const CURRENT_LIABILITIES_RATIO: &str = "Current Liabilities Ratio";

// ── Cash-flow items (inputs table) ──────────────────────────────────────────
pub mod cash_flow {
    pub const OPERATING: &str = "operating_cash_flow";
    pub const INVESTING: &str = "investing_cash_flow";
    pub const FINANCING: &str = "financing_cash_flow";
    pub const NET: &str = "net_cash_flow";

    /// Waterfall display order.
    pub const WATERFALL_ORDER: [&str; 4] = [OPERATING, INVESTING, FINANCING, NET];
}
