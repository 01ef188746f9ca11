//! PAAD viewer common types and errors.
//!
//! This crate provides the data model shared by the loader, the renderer and
//! the viewer shell:
//! - Result record types and their validated tables
//! - Cell type / signature name matching
//! - The selectable catalog and the pure selection reducer
//! - Common error types

pub mod catalog;
pub mod error;
pub mod names;
pub mod records;
pub mod selection;
pub mod tables;

pub use catalog::{Catalog, CellTypeEntry, CompartmentEntry};
pub use error::{DataFormatError, Error, ErrorCategory, Result};
pub use records::{
    BmiComparison, BmiGroup, CellProportionRecord, EnergyDraw, PosteriorDraw,
    SignatureDefinition, SignatureEffectRecord, StablFeatureRecord, SurvivalRecord,
};
pub use selection::{
    PlotKind, Selection, SelectionCorrection, SelectionField, SelectionInput, Transition,
};
pub use tables::{
    ChainEnergySummary, EffectTable, EnergyTable, ParameterDraws, PosteriorDrawTable,
    ProportionTable, SignatureCatalog, StablSelection, SurvivalTable, PROPORTION_SUM_TOLERANCE,
};

/// Version of the JSON documents the viewer emits (`/api/view`, `check`).
pub const SCHEMA_VERSION: &str = "1.0.0";
