//! PAAD viewer rendering.
//!
//! Turns validated result tables and a selection into chart descriptions
//! and a self-contained HTML page.
//!
//! # Page Structure
//!
//! - Selector form: compartment, cell type, signature, BMI comparison
//! - One tab per enabled view (heatmap, overview, forest, diagnostics,
//!   survival, proportions, signature explorer)
//! - Embedded chart options rendered with ECharts from a pinned CDN
//!
//! # Example
//!
//! ```no_run
//! use pv_report::{ReportConfig, ReportGenerator};
//!
//! let generator = ReportGenerator::new(ReportConfig::default());
//! // let data = generator.build(&catalog, &selection, &[], &sources);
//! // let html = generator.generate(&data)?;
//! ```

pub mod chart;
pub mod color;
pub mod config;
pub mod error;
pub mod generator;
pub mod table;
pub mod views;

pub use chart::{ChartKind, ChartSpec, DataPoint, Series, SeriesKind};
pub use color::{DivergingScale, Rgb};
pub use config::{CdnConfig, CdnLibrary, ReportConfig, ReportLimits, ReportPanels, ReportTheme};
pub use error::{ReportError, Result};
pub use generator::{query_string, ReportData, ReportGenerator};
pub use table::TableSpec;
pub use views::{render_panel, render_panels, Panel, PanelView, RhatStatus, Source, ViewSources};
