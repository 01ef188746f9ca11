//! Viewer session: one data directory, one selection, one render per interaction.
//!
//! Each call to [`ViewerSession::handle`] folds user input into the
//! selection, loads whatever the views need (from cache when possible) and
//! renders once. A view whose artifact is missing or invalid is rendered as
//! unavailable; the rest of the page is unaffected.

use pv_common::{Catalog, Result, Selection, SelectionCorrection, SelectionInput};
use pv_config::ViewerConfig;
use pv_loader::{ArtifactKind, CompartmentSpec, LoadError, ParseOptions, ResultStore, StoreLayout};
use pv_report::{Panel, ReportConfig, ReportData, ReportGenerator, ReportLimits, ViewSources};
use tracing::{debug, info, warn};

use crate::logging::{event_names, Stage};

/// Store layout described by a viewer configuration.
pub fn store_layout(config: &ViewerConfig) -> StoreLayout {
    let compartments = config
        .compartments
        .iter()
        .map(|c| CompartmentSpec::new(c.key.clone(), c.label.clone()))
        .collect();
    let files = &config.artifacts;
    StoreLayout::new(config.data_dir.clone(), compartments)
        .with_file_name(ArtifactKind::Effects, files.effects.clone())
        .with_file_name(ArtifactKind::Proportions, files.proportions.clone())
        .with_file_name(ArtifactKind::Survival, files.survival.clone())
        .with_file_name(ArtifactKind::Energy, files.energy.clone())
        .with_file_name(ArtifactKind::Draws, files.draws.clone())
        .with_file_name(ArtifactKind::Stabl, files.stabl.clone())
        .with_file_name(ArtifactKind::Signatures, files.signatures.clone())
        .with_options(ParseOptions {
            proportion_tolerance: config.proportion_tolerance,
        })
}

/// Page configuration carrying the configured display limits.
pub fn report_config(config: &ViewerConfig) -> ReportConfig {
    let limits = &config.limits;
    ReportConfig::default().with_limits(ReportLimits {
        max_heatmap_rows: limits.max_heatmap_rows,
        max_forest_rows: limits.max_forest_rows,
        max_energy_points: limits.max_energy_points,
        max_signature_name_len: limits.max_signature_name_len,
        max_trace_parameters: limits.max_trace_parameters,
        max_acf_lag: limits.max_acf_lag,
        rank_bins: limits.rank_bins,
    })
}

/// A running viewer.
pub struct ViewerSession {
    run_id: String,
    store: ResultStore,
    catalog: Catalog,
    selection: Selection,
    generator: ReportGenerator,
}

impl ViewerSession {
    /// Open the data directory of a configuration.
    pub fn open(config: &ViewerConfig, report: ReportConfig, run_id: impl Into<String>) -> Result<Self> {
        Self::with_store(ResultStore::new(store_layout(config)), report, run_id)
    }

    /// Start a session over a store.
    ///
    /// Fails when a required artifact is missing; nothing is rendered then.
    pub fn with_store(mut store: ResultStore, report: ReportConfig, run_id: impl Into<String>) -> Result<Self> {
        let run_id = run_id.into();
        report.validate()?;

        if let Err(e) = store.require_startup_artifacts() {
            warn!(
                event = event_names::ARTIFACTS_MISSING,
                stage = %Stage::Load,
                run_id = %run_id,
                error = %e,
                "Required artifacts missing"
            );
            return Err(e.into());
        }

        let catalog = store.catalog();
        let selection = Selection::initial(&catalog);
        info!(
            stage = %Stage::Load,
            run_id = %run_id,
            compartments = catalog.compartments().len(),
            compartment = %selection.compartment,
            "Session opened"
        );

        Ok(Self {
            run_id,
            store,
            catalog,
            selection,
            generator: ReportGenerator::new(report),
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Fold input into the selection and render every view once.
    pub fn handle(&mut self, input: SelectionInput) -> ReportData {
        let transition = self.selection.apply(&self.catalog, input);
        for correction in &transition.corrections {
            warn!(
                event = event_names::SELECTION_CORRECTED,
                stage = %Stage::Select,
                run_id = %self.run_id,
                field = ?correction.field,
                requested = %correction.requested,
                fallback = ?correction.fallback,
                "{}",
                correction
            );
        }
        if transition.changed {
            debug!(
                event = event_names::SELECTION_CHANGED,
                stage = %Stage::Select,
                run_id = %self.run_id,
                compartment = %transition.selection.compartment,
                cell_type = ?transition.selection.cell_type,
                signature = ?transition.selection.signature,
                comparison = %transition.selection.comparison.slug(),
                plot = %transition.selection.plot_kind,
                "Selection changed"
            );
        }
        self.selection = transition.selection;
        self.render(&transition.corrections)
    }

    /// Handle input and generate the HTML page.
    pub fn page(&mut self, input: SelectionInput) -> Result<(ReportData, String)> {
        let data = self.handle(input);
        let html = self.generator.generate(&data)?;
        Ok((data, html))
    }

    fn render(&mut self, corrections: &[SelectionCorrection]) -> ReportData {
        let compartment = self.selection.compartment.clone();
        let data_dir = self.store.layout().data_dir.clone();
        let reason = |e: LoadError| e.display_relative(&data_dir);

        let effects = self.store.load_effects(&compartment).map_err(reason);
        let proportions = self.store.load_proportions(&compartment).map_err(reason);
        let survival = self.store.load_survival(&compartment).map_err(reason);
        let energy = self.store.load_energy(&compartment).map_err(reason);
        let draws = self.store.load_draws(&compartment).map_err(reason);
        let stabl = self.store.load_stabl(&compartment).ok();
        let signatures = self.store.load_signatures().map_err(reason);

        let sources = ViewSources {
            effects: effects.as_ref().map(|a| &a.table).map_err(Clone::clone),
            proportions: proportions.as_ref().map(|a| &a.table).map_err(Clone::clone),
            survival: survival.as_ref().map(|a| &a.table).map_err(Clone::clone),
            energy: energy.as_ref().map(|a| &a.table).map_err(Clone::clone),
            draws: draws.as_ref().map(|a| &a.table).map_err(Clone::clone),
            signatures: signatures.as_ref().map(|a| &a.table).map_err(Clone::clone),
            stabl: stabl.as_ref().map(|a| &a.table),
        };

        let data = self
            .generator
            .build(&self.catalog, &self.selection, corrections, &sources);
        for view in &data.panels {
            if let Panel::Unavailable { reason } = &view.panel {
                debug!(
                    event = event_names::VIEW_UNAVAILABLE,
                    stage = %Stage::Render,
                    run_id = %self.run_id,
                    view = %view.kind,
                    reason = %reason,
                    "View unavailable"
                );
            }
        }
        data
    }
}
