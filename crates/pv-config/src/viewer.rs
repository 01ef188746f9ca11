//! viewer.json: data location, compartments, artifact names and display limits.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::resolve::ConfigSource;
use crate::validate::ValidationError;

/// One modelling compartment and the directory holding its artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompartmentConfig {
    /// Directory name under `data_dir`; also the `compartment=` query value.
    pub key: String,
    /// Display label.
    pub label: String,
}

impl CompartmentConfig {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// File names of the result artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactFiles {
    pub effects: String,
    pub proportions: String,
    pub survival: String,
    pub energy: String,
    /// Raw posterior draws for trace, rank and autocorrelation plots.
    pub draws: String,
    pub stabl: String,
    /// Global signature catalog, directly under `data_dir`.
    pub signatures: String,
}

impl Default for ArtifactFiles {
    fn default() -> Self {
        Self {
            effects: "effects.csv".to_string(),
            proportions: "proportions.csv".to_string(),
            survival: "survival.csv".to_string(),
            energy: "energy.csv".to_string(),
            draws: "posterior_draws.csv".to_string(),
            stabl: "stabl_selected.csv".to_string(),
            signatures: "signatures.json".to_string(),
        }
    }
}

impl ArtifactFiles {
    /// `(field name, file name)` pairs, for validation messages.
    pub fn entries(&self) -> [(&'static str, &str); 7] {
        [
            ("effects", self.effects.as_str()),
            ("proportions", self.proportions.as_str()),
            ("survival", self.survival.as_str()),
            ("energy", self.energy.as_str()),
            ("draws", self.draws.as_str()),
            ("stabl", self.stabl.as_str()),
            ("signatures", self.signatures.as_str()),
        ]
    }
}

/// Caps on how much each view shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayLimits {
    /// Signature rows in the cell-type heatmap.
    pub max_heatmap_rows: usize,
    /// Signature rows in the forest plot.
    pub max_forest_rows: usize,
    /// Points per chain in the energy trace.
    pub max_energy_points: usize,
    /// Characters of a signature name before truncation.
    pub max_signature_name_len: usize,
    /// Parameters with trace, rank and autocorrelation plots.
    pub max_trace_parameters: usize,
    pub max_acf_lag: usize,
    pub rank_bins: usize,
}

impl Default for DisplayLimits {
    fn default() -> Self {
        Self {
            max_heatmap_rows: 30,
            max_forest_rows: 20,
            max_energy_points: 1000,
            max_signature_name_len: 40,
            max_trace_parameters: 6,
            max_acf_lag: 40,
            rank_bins: 20,
        }
    }
}

/// Local HTTP viewer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8765,
        }
    }
}

/// Complete viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub schema_version: String,
    /// Root of the exported results.
    pub data_dir: PathBuf,
    /// Compartments in selector order; the first is the default.
    pub compartments: Vec<CompartmentConfig>,
    pub artifacts: ArtifactFiles,
    pub limits: DisplayLimits,
    /// Allowed deviation of per-sample proportion sums from 1.
    pub proportion_tolerance: f64,
    pub server: ServerConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            data_dir: PathBuf::from("results"),
            compartments: vec![
                CompartmentConfig::new("immune_fine", "Immune Fine"),
                CompartmentConfig::new("immune_coarse", "Immune Coarse"),
                CompartmentConfig::new("non_immune", "Non-Immune"),
            ],
            artifacts: ArtifactFiles::default(),
            limits: DisplayLimits::default(),
            proportion_tolerance: 1e-3,
            server: ServerConfig::default(),
        }
    }
}

impl ViewerConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        content.parse()
    }

    /// Pretty JSON, as written by `paad-viewer config --default`.
    pub fn to_json_pretty(&self) -> Result<String, ValidationError> {
        serde_json::to_string_pretty(self).map_err(|e| ValidationError::ParseError(e.to_string()))
    }

    /// Override the data directory (from `--data-dir`).
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn compartment(&self, key: &str) -> Option<&CompartmentConfig> {
        self.compartments.iter().find(|c| c.key == key)
    }
}

impl FromStr for ViewerConfig {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s).map_err(|e| ValidationError::ParseError(e.to_string()))
    }
}

/// A configuration together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: ViewerConfig,
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_compartments() {
        let config = ViewerConfig::default();
        let labels: Vec<_> = config.compartments.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Immune Fine", "Immune Coarse", "Non-Immune"]);
        assert_eq!(config.limits.max_heatmap_rows, 30);
        assert_eq!(config.limits.max_forest_rows, 20);
        assert_eq!(config.proportion_tolerance, 1e-3);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: ViewerConfig = r#"{"data_dir": "/srv/paad", "limits": {"max_forest_rows": 10}}"#
            .parse()
            .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/paad"));
        assert_eq!(config.limits.max_forest_rows, 10);
        assert_eq!(config.limits.max_heatmap_rows, 30);
        assert_eq!(config.compartments.len(), 3);
        assert_eq!(config.artifacts.effects, "effects.csv");
    }

    #[test]
    fn test_round_trip_through_json() {
        let config = ViewerConfig::default().with_data_dir("/data");
        let json = config.to_json_pretty().unwrap();
        let back: ViewerConfig = json.parse().unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        let err = "{ not json".parse::<ViewerConfig>().unwrap_err();
        assert!(matches!(err, ValidationError::ParseError(_)));
    }
}
