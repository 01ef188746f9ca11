//! Error types for view rendering.

use thiserror::Error;

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors that can occur while rendering a page.
#[derive(Error, Debug)]
pub enum ReportError {
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Missing required data.
    #[error("missing required data: {0}")]
    MissingData(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<ReportError> for pv_common::Error {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::JsonError(e) => pv_common::Error::Json(e),
            ReportError::InvalidConfig(msg) => pv_common::Error::Config(msg),
            ReportError::MissingData(msg) => pv_common::Error::Render(msg),
        }
    }
}
