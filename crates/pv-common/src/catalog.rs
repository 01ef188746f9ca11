//! What can be selected.
//!
//! The catalog lists compartments, their cell types and the signatures
//! measured for each cell type. It is derived from the effect tables and is
//! the only input the selection reducer needs.

use serde::Serialize;

use crate::names::canonical_key;
use crate::tables::EffectTable;

/// A cell type and its signatures (sorted).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellTypeEntry {
    pub name: String,
    pub signatures: Vec<String>,
}

impl CellTypeEntry {
    /// Spelling of a signature as stored, if this cell type has it.
    pub fn signature(&self, name: &str) -> Option<&str> {
        let key = canonical_key(name);
        self.signatures
            .iter()
            .find(|s| canonical_key(s) == key)
            .map(String::as_str)
    }
}

/// One modelling compartment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompartmentEntry {
    /// Directory / query key, e.g. `immune_fine`.
    pub key: String,
    /// Display label, e.g. `Immune Fine`.
    pub label: String,
    /// Cell types (sorted). Empty when the effects artifact is unavailable.
    pub cell_types: Vec<CellTypeEntry>,
}

impl CompartmentEntry {
    /// Build an entry from the compartment's effect table.
    pub fn from_effects(key: impl Into<String>, label: impl Into<String>, effects: Option<&EffectTable>) -> Self {
        let cell_types = effects
            .map(|table| {
                table
                    .cell_types()
                    .into_iter()
                    .map(|name| CellTypeEntry {
                        signatures: table.signatures_for(&name),
                        name,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            key: key.into(),
            label: label.into(),
            cell_types,
        }
    }

    pub fn cell_type(&self, name: &str) -> Option<&CellTypeEntry> {
        let key = canonical_key(name);
        self.cell_types.iter().find(|c| canonical_key(&c.name) == key)
    }

    /// True when the key or the label names this compartment.
    pub fn matches(&self, name: &str) -> bool {
        let key = canonical_key(name);
        canonical_key(&self.key) == key || canonical_key(&self.label) == key
    }
}

/// Every selectable compartment, cell type and signature.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Catalog {
    compartments: Vec<CompartmentEntry>,
}

impl Catalog {
    pub fn new(compartments: Vec<CompartmentEntry>) -> Self {
        Self { compartments }
    }

    pub fn compartments(&self) -> &[CompartmentEntry] {
        &self.compartments
    }

    pub fn compartment(&self, name: &str) -> Option<&CompartmentEntry> {
        self.compartments.iter().find(|c| c.matches(name))
    }

    /// First configured compartment.
    pub fn first_compartment(&self) -> Option<&CompartmentEntry> {
        self.compartments.first()
    }

    pub fn is_empty(&self) -> bool {
        self.compartments.is_empty()
    }
}
