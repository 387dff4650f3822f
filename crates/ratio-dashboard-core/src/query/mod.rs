pub mod alerts;
pub mod dashboard;
pub mod export;
pub mod format;
pub mod groups;
pub mod lookup;

pub use alerts::{alert_report, Alert, AlertKind, AlertReport};
pub use dashboard::{build_dashboard, build_report, DashboardReport};
pub use format::format_value;
pub use lookup::{compute_delta, get_ratio_value};
