//! Configuration validation errors and semantic validation.

use std::collections::HashSet;
use thiserror::Error;

use crate::viewer::ViewerConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

/// A name that is safe to join onto the data directory.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}

/// Validate the viewer configuration semantically.
pub fn validate_viewer(config: &ViewerConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    if config.compartments.is_empty() {
        return Err(ValidationError::SemanticError(
            "At least one compartment must be configured".to_string(),
        ));
    }

    let mut keys = HashSet::new();
    for (i, compartment) in config.compartments.iter().enumerate() {
        if !is_plain_file_name(&compartment.key) {
            return Err(invalid(
                format!("compartments[{}].key", i),
                format!(
                    "Must be a plain directory name, got '{}'",
                    compartment.key
                ),
            ));
        }
        if compartment.label.trim().is_empty() {
            return Err(invalid(
                format!("compartments[{}].label", i),
                "Must not be empty",
            ));
        }
        if !keys.insert(compartment.key.as_str()) {
            return Err(ValidationError::SemanticError(format!(
                "Duplicate compartment key '{}'",
                compartment.key
            )));
        }
    }

    for (field, name) in config.artifacts.entries() {
        if !is_plain_file_name(name) {
            return Err(invalid(
                format!("artifacts.{}", field),
                format!("Must be a plain file name, got '{}'", name),
            ));
        }
    }

    let limits = &config.limits;
    for (field, value) in [
        ("limits.max_heatmap_rows", limits.max_heatmap_rows),
        ("limits.max_forest_rows", limits.max_forest_rows),
        ("limits.max_energy_points", limits.max_energy_points),
        ("limits.max_trace_parameters", limits.max_trace_parameters),
        ("limits.max_acf_lag", limits.max_acf_lag),
        ("limits.rank_bins", limits.rank_bins),
    ] {
        if value == 0 {
            return Err(invalid(field, "Must be positive"));
        }
    }
    if limits.max_signature_name_len < 4 {
        return Err(invalid(
            "limits.max_signature_name_len",
            format!("Must be at least 4, got {}", limits.max_signature_name_len),
        ));
    }

    let tol = config.proportion_tolerance;
    if !tol.is_finite() || tol <= 0.0 || tol >= 0.5 {
        return Err(invalid(
            "proportion_tolerance",
            format!("Must be in (0, 0.5), got {}", tol),
        ));
    }

    if config.server.bind.trim().is_empty() {
        return Err(invalid("server.bind", "Must not be empty"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::CompartmentConfig;

    #[test]
    fn test_default_config_is_valid() {
        validate_viewer(&ViewerConfig::default()).unwrap();
    }

    #[test]
    fn test_rejects_version_mismatch() {
        let config = ViewerConfig {
            schema_version: "0.9".into(),
            ..Default::default()
        };
        let err = validate_viewer(&config).unwrap_err();
        assert_eq!(err.code(), 66);
    }

    #[test]
    fn test_rejects_duplicate_and_unsafe_keys() {
        let mut config = ViewerConfig::default();
        config.compartments.push(CompartmentConfig::new("immune_fine", "Again"));
        assert!(matches!(
            validate_viewer(&config).unwrap_err(),
            ValidationError::SemanticError(_)
        ));

        let mut config = ViewerConfig::default();
        config.compartments[0].key = "../etc".into();
        assert!(matches!(
            validate_viewer(&config).unwrap_err(),
            ValidationError::InvalidValue { .. }
        ));
    }

    #[test]
    fn test_rejects_bad_limits_and_tolerance() {
        let mut config = ViewerConfig::default();
        config.limits.max_forest_rows = 0;
        let err = validate_viewer(&config).unwrap_err();
        assert!(err.to_string().contains("limits.max_forest_rows"));

        let mut config = ViewerConfig::default();
        config.limits.rank_bins = 0;
        let err = validate_viewer(&config).unwrap_err();
        assert!(err.to_string().contains("limits.rank_bins"));

        let mut config = ViewerConfig::default();
        config.proportion_tolerance = f64::NAN;
        assert!(validate_viewer(&config).is_err());
    }

    #[test]
    fn test_rejects_nested_artifact_names() {
        let mut config = ViewerConfig::default();
        config.artifacts.survival = "cox/survival.csv".into();
        let err = validate_viewer(&config).unwrap_err();
        assert!(err.to_string().contains("artifacts.survival"));
    }
}
