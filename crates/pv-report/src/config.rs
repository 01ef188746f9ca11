//! Page configuration types.

use pv_common::PlotKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ReportError, Result};

/// Page color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportTheme {
    Light,
    Dark,
    /// Follow the browser's preference.
    #[default]
    Auto,
}

impl ReportTheme {
    /// CSS class on the `<html>` element.
    pub fn css_class(&self) -> &'static str {
        match self {
            ReportTheme::Light => "light",
            ReportTheme::Dark => "dark",
            ReportTheme::Auto => "",
        }
    }

    /// ECharts theme name passed to `echarts.init`.
    pub fn echarts_theme(&self) -> Option<&'static str> {
        match self {
            ReportTheme::Dark => Some("dark"),
            ReportTheme::Light | ReportTheme::Auto => None,
        }
    }
}

/// A library loaded from the CDN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdnLibrary {
    /// Pinned version.
    pub version: String,
    /// Subresource integrity hash (SHA-384).
    pub sri: String,
    /// Path within the npm package.
    #[serde(default)]
    pub path: Option<String>,
}

impl CdnLibrary {
    pub fn new(version: impl Into<String>, sri: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            sri: sri.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Full CDN URL of the library file.
    pub fn url(&self, base_url: &str, package_name: &str) -> String {
        let path = self.path.as_deref().unwrap_or("dist/index.min.js");
        format!("{}/{}@{}/{}", base_url, package_name, self.version, path)
    }
}

/// Which views get a tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPanels {
    #[serde(default = "default_true")]
    pub heatmap: bool,
    #[serde(default = "default_true")]
    pub overview: bool,
    #[serde(default = "default_true")]
    pub forest: bool,
    #[serde(default = "default_true")]
    pub diagnostics: bool,
    #[serde(default = "default_true")]
    pub survival: bool,
    #[serde(default = "default_true")]
    pub proportions: bool,
    #[serde(default = "default_true")]
    pub signatures: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ReportPanels {
    fn default() -> Self {
        Self {
            heatmap: true,
            overview: true,
            forest: true,
            diagnostics: true,
            survival: true,
            proportions: true,
            signatures: true,
        }
    }
}

impl ReportPanels {
    pub fn is_enabled(&self, kind: PlotKind) -> bool {
        match kind {
            PlotKind::Heatmap => self.heatmap,
            PlotKind::Overview => self.overview,
            PlotKind::Forest => self.forest,
            PlotKind::Diagnostics => self.diagnostics,
            PlotKind::Survival => self.survival,
            PlotKind::Proportions => self.proportions,
            PlotKind::Signatures => self.signatures,
        }
    }

    pub fn set(&mut self, kind: PlotKind, enabled: bool) {
        let slot = match kind {
            PlotKind::Heatmap => &mut self.heatmap,
            PlotKind::Overview => &mut self.overview,
            PlotKind::Forest => &mut self.forest,
            PlotKind::Diagnostics => &mut self.diagnostics,
            PlotKind::Survival => &mut self.survival,
            PlotKind::Proportions => &mut self.proportions,
            PlotKind::Signatures => &mut self.signatures,
        };
        *slot = enabled;
    }

    /// Enabled views in tab order.
    pub fn enabled(&self) -> Vec<PlotKind> {
        PlotKind::ALL
            .into_iter()
            .filter(|k| self.is_enabled(*k))
            .collect()
    }
}

/// CDN configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdnConfig {
    #[serde(default = "default_cdn_base")]
    pub base_url: String,
    #[serde(default = "default_libraries")]
    pub libraries: HashMap<String, CdnLibrary>,
}

fn default_cdn_base() -> String {
    "https://cdn.jsdelivr.net/npm".to_string()
}

fn default_libraries() -> HashMap<String, CdnLibrary> {
    let mut libs = HashMap::new();

    libs.insert(
        "tailwindcss".to_string(),
        CdnLibrary::new(
            "3.4.1",
            "sha384-KyZXEAg3QhqLMpG8r+8fhAXLRk2vvoC2f3B09zVXn8CA5QIVfZOJ3BCsw2P0p/We",
        )
        .with_path("dist/tailwind.min.css"),
    );

    libs.insert(
        "echarts".to_string(),
        CdnLibrary::new(
            "5.5.0",
            "sha384-FGLEKkFq1MZrC7PkPPA6QPDh8S4tFZ0Dy0y+7yE7+Z9E9e3y7R7r5QlR6v1W7zE3",
        )
        .with_path("dist/echarts.min.js"),
    );

    libs
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            base_url: default_cdn_base(),
            libraries: default_libraries(),
        }
    }
}

/// Caps on how much each view shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLimits {
    /// Signature rows in the heatmaps.
    #[serde(default = "default_max_heatmap_rows")]
    pub max_heatmap_rows: usize,
    /// Signature rows in the forest plot.
    #[serde(default = "default_max_forest_rows")]
    pub max_forest_rows: usize,
    /// Points per chain in the energy trace.
    #[serde(default = "default_max_energy_points")]
    pub max_energy_points: usize,
    #[serde(default = "default_max_signature_name_len")]
    pub max_signature_name_len: usize,
    /// Parameters with trace, rank and autocorrelation plots.
    #[serde(default = "default_max_trace_parameters")]
    pub max_trace_parameters: usize,
    #[serde(default = "default_max_acf_lag")]
    pub max_acf_lag: usize,
    #[serde(default = "default_rank_bins")]
    pub rank_bins: usize,
}

fn default_max_heatmap_rows() -> usize {
    30
}

fn default_max_forest_rows() -> usize {
    20
}

fn default_max_energy_points() -> usize {
    1000
}

fn default_max_signature_name_len() -> usize {
    40
}

fn default_max_trace_parameters() -> usize {
    6
}

fn default_max_acf_lag() -> usize {
    40
}

fn default_rank_bins() -> usize {
    20
}

impl Default for ReportLimits {
    fn default() -> Self {
        Self {
            max_heatmap_rows: default_max_heatmap_rows(),
            max_forest_rows: default_max_forest_rows(),
            max_energy_points: default_max_energy_points(),
            max_signature_name_len: default_max_signature_name_len(),
            max_trace_parameters: default_max_trace_parameters(),
            max_acf_lag: default_max_acf_lag(),
            rank_bins: default_rank_bins(),
        }
    }
}

/// Complete page configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    /// Custom page title.
    pub title: Option<String>,
    #[serde(default)]
    pub theme: ReportTheme,
    #[serde(default)]
    pub panels: ReportPanels,
    #[serde(default)]
    pub cdn_config: CdnConfig,
    #[serde(default)]
    pub limits: ReportLimits,
    /// p-values below this are starred in the survival view.
    #[serde(default = "default_significance")]
    pub significance: f64,
}

fn default_schema_version() -> String {
    pv_common::SCHEMA_VERSION.to_string()
}

fn default_significance() -> f64 {
    0.05
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            title: None,
            theme: ReportTheme::default(),
            panels: ReportPanels::default(),
            cdn_config: CdnConfig::default(),
            limits: ReportLimits::default(),
            significance: default_significance(),
        }
    }
}

impl ReportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_theme(mut self, theme: ReportTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_limits(mut self, limits: ReportLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Show or hide one view.
    pub fn with_panel(mut self, kind: PlotKind, enabled: bool) -> Self {
        self.panels.set(kind, enabled);
        self
    }

    /// Reject limits the views cannot work with.
    pub fn validate(&self) -> Result<()> {
        let limits = &self.limits;
        for (field, value) in [
            ("max_heatmap_rows", limits.max_heatmap_rows),
            ("max_forest_rows", limits.max_forest_rows),
            ("max_energy_points", limits.max_energy_points),
            ("max_trace_parameters", limits.max_trace_parameters),
            ("max_acf_lag", limits.max_acf_lag),
            ("rank_bins", limits.rank_bins),
        ] {
            if value == 0 {
                return Err(ReportError::InvalidConfig(format!(
                    "limits.{} must be positive",
                    field
                )));
            }
        }
        if limits.max_signature_name_len < 4 {
            return Err(ReportError::InvalidConfig(
                "limits.max_signature_name_len must be at least 4".to_string(),
            ));
        }
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(ReportError::InvalidConfig(format!(
                "significance must be in (0, 1), got {}",
                self.significance
            )));
        }
        if self.panels.enabled().is_empty() {
            return Err(ReportError::InvalidConfig(
                "at least one panel must be enabled".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReportConfig::default();
        assert_eq!(config.schema_version, "1.0.0");
        assert_eq!(config.theme, ReportTheme::Auto);
        assert_eq!(config.panels.enabled(), PlotKind::ALL.to_vec());
        assert_eq!(config.limits.max_heatmap_rows, 30);
        config.validate().unwrap();
    }

    #[test]
    fn test_config_builder() {
        let config = ReportConfig::new()
            .with_title("Immune results")
            .with_theme(ReportTheme::Dark)
            .with_panel(PlotKind::Proportions, false);

        assert_eq!(config.title.as_deref(), Some("Immune results"));
        assert_eq!(config.theme.echarts_theme(), Some("dark"));
        assert!(!config.panels.is_enabled(PlotKind::Proportions));
        assert!(config.panels.is_enabled(PlotKind::Forest));
    }

    #[test]
    fn test_cdn_library_url() {
        let lib = CdnLibrary::new("5.5.0", "sha384-test").with_path("dist/echarts.min.js");
        assert_eq!(
            lib.url("https://cdn.jsdelivr.net/npm", "echarts"),
            "https://cdn.jsdelivr.net/npm/echarts@5.5.0/dist/echarts.min.js"
        );
    }

    #[test]
    fn test_validate_rejects_zero_limits_and_no_panels() {
        let mut config = ReportConfig::default();
        config.limits.max_forest_rows = 0;
        assert!(config.validate().is_err());

        let mut config = ReportConfig::default();
        for kind in PlotKind::ALL {
            config.panels.set(kind, false);
        }
        assert!(matches!(
            config.validate(),
            Err(ReportError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ReportConfig::from_json(r#"{"title": null, "panels": {"survival": false}}"#)
            .unwrap();
        assert!(!config.panels.survival);
        assert!(config.panels.heatmap);
        assert_eq!(config.significance, 0.05);
        let back = ReportConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }
}
