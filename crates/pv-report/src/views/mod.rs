//! Views: validated tables plus a selection in, chart descriptions out.
//!
//! Views only reshape and aggregate for display. A view whose artifact could
//! not be loaded becomes [`Panel::Unavailable`]; the other views are unaffected.

pub mod diagnostics;
pub mod draws;
pub mod forest;
pub mod heatmap;
pub mod proportions;
pub mod signatures;
pub mod survival;

use pv_common::{
    EffectTable, EnergyTable, PlotKind, PosteriorDrawTable, ProportionTable, Selection,
    SignatureCatalog, StablSelection, SurvivalTable,
};
use serde::Serialize;

use crate::chart::ChartSpec;
use crate::config::ReportConfig;
use crate::table::TableSpec;

pub use diagnostics::RhatStatus;

/// A loaded table, or why it is not available.
pub type Source<'a, T> = std::result::Result<&'a T, String>;

/// Everything the views may draw from for one compartment.
#[derive(Debug, Clone)]
pub struct ViewSources<'a> {
    pub effects: Source<'a, EffectTable>,
    pub proportions: Source<'a, ProportionTable>,
    pub survival: Source<'a, SurvivalTable>,
    pub energy: Source<'a, EnergyTable>,
    pub draws: Source<'a, PosteriorDrawTable>,
    pub signatures: Source<'a, SignatureCatalog>,
    /// STABL markers are decoration; absence just means no stars.
    pub stabl: Option<&'a StablSelection>,
}

/// Rendered content of one view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Panel {
    Ready {
        charts: Vec<ChartSpec>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        tables: Vec<TableSpec>,
        /// Short remarks shown under the charts.
        #[serde(skip_serializing_if = "Vec::is_empty")]
        notes: Vec<String>,
    },
    Unavailable {
        reason: String,
    },
}

impl Panel {
    pub fn ready(charts: Vec<ChartSpec>, notes: Vec<String>) -> Self {
        Panel::Ready {
            charts,
            tables: Vec::new(),
            notes,
        }
    }

    /// Attach tables to a ready panel.
    pub fn with_tables(self, tables: Vec<TableSpec>) -> Self {
        match self {
            Panel::Ready { charts, notes, .. } => Panel::Ready {
                charts,
                tables,
                notes,
            },
            unavailable => unavailable,
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Panel::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Panel::Ready { .. })
    }

    pub fn charts(&self) -> &[ChartSpec] {
        match self {
            Panel::Ready { charts, .. } => charts,
            Panel::Unavailable { .. } => &[],
        }
    }

    pub fn tables(&self) -> &[TableSpec] {
        match self {
            Panel::Ready { tables, .. } => tables,
            Panel::Unavailable { .. } => &[],
        }
    }
}

/// One tab of the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelView {
    pub kind: PlotKind,
    pub title: String,
    #[serde(flatten)]
    pub panel: Panel,
}

/// Render one view.
pub fn render_panel(
    kind: PlotKind,
    sources: &ViewSources<'_>,
    selection: &Selection,
    config: &ReportConfig,
) -> PanelView {
    let limits = &config.limits;
    let panel = match kind {
        PlotKind::Heatmap => match sources.effects {
            Ok(effects) => heatmap::cell_type_heatmap(effects, sources.stabl, selection, limits),
            Err(ref reason) => Panel::unavailable(reason.clone()),
        },
        PlotKind::Overview => match sources.effects {
            Ok(effects) => heatmap::overview_heatmap(effects, sources.stabl, selection, limits),
            Err(ref reason) => Panel::unavailable(reason.clone()),
        },
        PlotKind::Forest => match sources.effects {
            Ok(effects) => forest::forest_plot(effects, selection, limits),
            Err(ref reason) => Panel::unavailable(reason.clone()),
        },
        PlotKind::Diagnostics => match sources.effects {
            Ok(effects) => {
                diagnostics::diagnostics_panel(
                    effects,
                    sources.energy.clone(),
                    sources.draws.clone(),
                    selection,
                    limits,
                )
            }
            Err(ref reason) => Panel::unavailable(reason.clone()),
        },
        PlotKind::Survival => match sources.survival {
            Ok(survival) => survival::survival_panel(survival, selection, config),
            Err(ref reason) => Panel::unavailable(reason.clone()),
        },
        PlotKind::Proportions => match sources.proportions {
            Ok(proportions) => proportions::proportions_panel(proportions),
            Err(ref reason) => Panel::unavailable(reason.clone()),
        },
        PlotKind::Signatures => match sources.signatures {
            Ok(catalog) => signatures::signature_explorer(catalog, selection, limits),
            Err(ref reason) => Panel::unavailable(reason.clone()),
        },
    };
    PanelView {
        kind,
        title: kind.label().to_string(),
        panel,
    }
}

/// Render every enabled view, in tab order.
pub fn render_panels(
    sources: &ViewSources<'_>,
    selection: &Selection,
    config: &ReportConfig,
) -> Vec<PanelView> {
    config
        .panels
        .enabled()
        .into_iter()
        .map(|kind| render_panel(kind, sources, selection, config))
        .collect()
}

/// Escape HTML special characters.
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
