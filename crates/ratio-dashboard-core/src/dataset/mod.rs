pub mod cache;
pub mod loader;
pub mod prepare;
pub mod records;

pub use cache::DatasetCache;
pub use prepare::{prepare, prepare_tables, PreparedDataset};
pub use records::{InputRecord, InputTable, RatioRecord, RatioTable};
