use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// A whole source could not be turned into a table. Fatal for the session.
    #[error("Failed to load {source_name}: {reason}")]
    Load { source_name: String, reason: String },

    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DashboardError {
    pub fn load(source_name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        DashboardError::Load {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        DashboardError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(e: serde_json::Error) -> Self {
        DashboardError::SerializationError(e.to_string())
    }
}
