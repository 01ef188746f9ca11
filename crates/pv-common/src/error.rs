//! Error types for the PAAD viewer.
//!
//! Two layers:
//! - [`DataFormatError`]: an artifact failed schema or invariant validation.
//!   The viewer treats it as "data unavailable" for the affected view only.
//! - [`Error`]: the unified error with stable codes and categories, used by
//!   the shell to pick exit codes and remediation hints.
//!
//! Selection problems are deliberately absent: an unavailable selection is
//! corrected to a default (see [`crate::selection`]) and never surfaces here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for viewer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Schema or invariant violation in a loaded artifact.
///
/// `line` is the 1-based data line (the header is line 0) when the violation
/// belongs to a single row.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataFormatError {
    #[error("{artifact}: missing required column '{column}'")]
    MissingColumn { artifact: String, column: String },

    #[error("{artifact} line {line}: column '{column}' has invalid value '{value}': {reason}")]
    InvalidValue {
        artifact: String,
        line: usize,
        column: String,
        value: String,
        reason: String,
    },

    #[error(
        "{artifact} line {line}: credible interval [{low}, {high}] does not contain effect size {effect}"
    )]
    IntervalOrder {
        artifact: String,
        line: usize,
        low: f64,
        effect: f64,
        high: f64,
    },

    #[error("{artifact} line {line}: r_hat {r_hat} is below 1.0")]
    RHatBelowOne {
        artifact: String,
        line: usize,
        r_hat: f64,
    },

    #[error("{artifact} line {line}: proportion {proportion} is outside [0, 1]")]
    ProportionOutOfRange {
        artifact: String,
        line: usize,
        proportion: f64,
    },

    #[error("{artifact}: proportions for sample '{sample_id}' sum to {sum}, expected 1 ± {tolerance}")]
    ProportionSum {
        artifact: String,
        sample_id: String,
        sum: f64,
        tolerance: f64,
    },

    #[error("{artifact} line {line}: duplicate row for key '{key}'")]
    DuplicateKey {
        artifact: String,
        line: usize,
        key: String,
    },

    #[error("{artifact} line {line}: hazard ratio {hazard_ratio} must be positive")]
    NonPositiveHazardRatio {
        artifact: String,
        line: usize,
        hazard_ratio: f64,
    },

    #[error("{artifact} line {line}: confidence interval [{low}, {high}] is not a positive ordered range")]
    ConfidenceInterval {
        artifact: String,
        line: usize,
        low: f64,
        high: f64,
    },

    #[error("{artifact}: malformed content: {message}")]
    Malformed { artifact: String, message: String },
}

impl DataFormatError {
    /// Artifact name the violation was found in.
    pub fn artifact(&self) -> &str {
        match self {
            DataFormatError::MissingColumn { artifact, .. }
            | DataFormatError::InvalidValue { artifact, .. }
            | DataFormatError::IntervalOrder { artifact, .. }
            | DataFormatError::RHatBelowOne { artifact, .. }
            | DataFormatError::ProportionOutOfRange { artifact, .. }
            | DataFormatError::ProportionSum { artifact, .. }
            | DataFormatError::DuplicateKey { artifact, .. }
            | DataFormatError::NonPositiveHazardRatio { artifact, .. }
            | DataFormatError::ConfidenceInterval { artifact, .. }
            | DataFormatError::Malformed { artifact, .. } => artifact,
        }
    }

    /// Short machine-readable kind, used in check reports and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            DataFormatError::MissingColumn { .. } => "missing_column",
            DataFormatError::InvalidValue { .. } => "invalid_value",
            DataFormatError::IntervalOrder { .. } => "interval_order",
            DataFormatError::RHatBelowOne { .. } => "r_hat_below_one",
            DataFormatError::ProportionOutOfRange { .. } => "proportion_out_of_range",
            DataFormatError::ProportionSum { .. } => "proportion_sum",
            DataFormatError::DuplicateKey { .. } => "duplicate_key",
            DataFormatError::NonPositiveHazardRatio { .. } => "non_positive_hazard_ratio",
            DataFormatError::ConfidenceInterval { .. } => "confidence_interval",
            DataFormatError::Malformed { .. } => "malformed",
        }
    }
}

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file errors.
    Config,
    /// Artifact content errors.
    Data,
    /// Rendering errors.
    Render,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Data => write!(f, "data"),
            ErrorCategory::Render => write!(f, "render"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for the viewer.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    // Data errors (20-29)
    #[error("invalid artifact data: {0}")]
    DataFormat(#[from] DataFormatError),

    #[error("required artifact missing: {path}")]
    MissingArtifact { path: String },

    // Render errors (30-39)
    #[error("render failed: {0}")]
    Render(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the stable error code for this error.
    ///
    /// - 10-19: Configuration errors
    /// - 20-29: Data errors
    /// - 30-39: Render errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::DataFormat(_) => 20,
            Error::MissingArtifact { .. } => 21,
            Error::Render(_) => 30,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) => ErrorCategory::Config,
            Error::DataFormat(_) | Error::MissingArtifact { .. } => ErrorCategory::Data,
            Error::Render(_) => ErrorCategory::Render,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Check viewer.json syntax, or run without --config to use built-in defaults."
            }
            Error::DataFormat(_) => {
                "Re-export the artifact from the analysis pipeline. Run 'paad-viewer check' for details."
            }
            Error::MissingArtifact { .. } => {
                "Point --data-dir at the exported results directory (one sub-directory per compartment)."
            }
            Error::Render(_) => "Report this as a bug together with the current selection.",
            Error::Io(_) => "Check that the data directory exists and is readable.",
            Error::Json(_) => "Invalid JSON in file. Check syntax with 'jq .' or re-export it.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_grouped() {
        assert_eq!(Error::Config("x".into()).code(), 10);
        assert_eq!(
            Error::MissingArtifact {
                path: "effects.csv".into()
            }
            .code(),
            21
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(Error::from(io).category(), ErrorCategory::Io);
    }

    #[test]
    fn test_data_format_error_display() {
        let err = DataFormatError::IntervalOrder {
            artifact: "effects.csv".into(),
            line: 3,
            low: 0.2,
            effect: 0.1,
            high: 0.4,
        };
        let msg = err.to_string();
        assert!(msg.contains("effects.csv line 3"));
        assert!(msg.contains("[0.2, 0.4]"));
        assert_eq!(err.kind(), "interval_order");
        assert_eq!(err.artifact(), "effects.csv");
    }

    #[test]
    fn test_data_format_error_converts_into_unified_error() {
        let err: Error = DataFormatError::MissingColumn {
            artifact: "survival.csv".into(),
            column: "p_value".into(),
        }
        .into();
        assert_eq!(err.code(), 20);
        assert_eq!(err.category(), ErrorCategory::Data);
        assert!(err.to_string().contains("p_value"));
    }
}
