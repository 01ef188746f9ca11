//! Selection state.
//!
//! A [`Selection`] is a plain value. User input is folded in by
//! [`Selection::apply`], a pure function returning the next selection and the
//! corrections made on the way. An unavailable choice never errors: it falls
//! back to the default for that field and is reported as a
//! [`SelectionCorrection`].
//!
//! Defaults, applied field by field in dependency order:
//! - compartment: first configured compartment
//! - cell type: first cell type (sorted) of the compartment
//! - signature: first signature (sorted) of the cell type
//! - comparison: Obese vs Normal
//! - plot kind: heatmap
//!
//! A field that is not part of the input keeps its current value while that
//! value remains available, and silently takes the default otherwise.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::catalog::Catalog;
use crate::records::BmiComparison;

/// Which view is in front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotKind {
    /// Signature × BMI group heatmap of the selected cell type.
    #[default]
    Heatmap,
    /// Cell type × signature heatmap for one BMI group.
    Overview,
    Forest,
    Diagnostics,
    Survival,
    Proportions,
    /// Gene sets behind the selected cell type's signatures.
    Signatures,
}

impl PlotKind {
    pub const ALL: [PlotKind; 7] = [
        PlotKind::Heatmap,
        PlotKind::Overview,
        PlotKind::Forest,
        PlotKind::Diagnostics,
        PlotKind::Survival,
        PlotKind::Proportions,
        PlotKind::Signatures,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            PlotKind::Heatmap => "heatmap",
            PlotKind::Overview => "overview",
            PlotKind::Forest => "forest",
            PlotKind::Diagnostics => "diagnostics",
            PlotKind::Survival => "survival",
            PlotKind::Proportions => "proportions",
            PlotKind::Signatures => "signatures",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlotKind::Heatmap => "Effect Heatmap",
            PlotKind::Overview => "Overview",
            PlotKind::Forest => "Forest Plot",
            PlotKind::Diagnostics => "Diagnostics",
            PlotKind::Survival => "Survival",
            PlotKind::Proportions => "Proportions",
            PlotKind::Signatures => "Signature Explorer",
        }
    }
}

impl fmt::Display for PlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for PlotKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        PlotKind::ALL
            .into_iter()
            .find(|k| k.slug() == wanted)
            .ok_or_else(|| format!("unknown plot kind: {}", s))
    }
}

/// The user's current choice.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    /// Compartment key.
    pub compartment: String,
    /// `None` only when the compartment has no cell types.
    pub cell_type: Option<String>,
    /// `None` only when the cell type has no signatures.
    pub signature: Option<String>,
    pub comparison: BmiComparison,
    pub plot_kind: PlotKind,
}

/// Raw user input. Every field is optional so one interaction can change
/// several fields at once.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionInput {
    pub compartment: Option<String>,
    pub cell_type: Option<String>,
    pub signature: Option<String>,
    pub comparison: Option<String>,
    pub plot_kind: Option<String>,
}

impl SelectionInput {
    pub fn with_compartment(mut self, value: impl Into<String>) -> Self {
        self.compartment = Some(value.into());
        self
    }

    pub fn with_cell_type(mut self, value: impl Into<String>) -> Self {
        self.cell_type = Some(value.into());
        self
    }

    pub fn with_signature(mut self, value: impl Into<String>) -> Self {
        self.signature = Some(value.into());
        self
    }

    pub fn with_comparison(mut self, value: impl Into<String>) -> Self {
        self.comparison = Some(value.into());
        self
    }

    pub fn with_plot_kind(mut self, value: impl Into<String>) -> Self {
        self.plot_kind = Some(value.into());
        self
    }

    /// Build from query-string pairs. Unknown keys are ignored; `plot` is
    /// accepted as an alias of `plot_kind`.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut input = SelectionInput::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "compartment" => &mut input.compartment,
                "cell_type" | "cell" => &mut input.cell_type,
                "signature" => &mut input.signature,
                "comparison" => &mut input.comparison,
                "plot" | "plot_kind" => &mut input.plot_kind,
                _ => continue,
            };
            *slot = Some(value.into());
        }
        input
    }

    pub fn is_empty(&self) -> bool {
        *self == SelectionInput::default()
    }

    /// Blank values count as "not provided".
    fn normalized(self) -> Self {
        fn keep(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }
        Self {
            compartment: keep(self.compartment),
            cell_type: keep(self.cell_type),
            signature: keep(self.signature),
            comparison: keep(self.comparison),
            plot_kind: keep(self.plot_kind),
        }
    }
}

/// Selection field a correction applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionField {
    Compartment,
    CellType,
    Signature,
    Comparison,
    PlotKind,
}

impl SelectionField {
    fn label(&self) -> &'static str {
        match self {
            SelectionField::Compartment => "compartment",
            SelectionField::CellType => "cell type",
            SelectionField::Signature => "signature",
            SelectionField::Comparison => "comparison",
            SelectionField::PlotKind => "plot kind",
        }
    }
}

/// A requested value that was not available and the value used instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionCorrection {
    pub field: SelectionField,
    pub requested: String,
    pub fallback: Option<String>,
}

impl fmt::Display for SelectionCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fallback {
            Some(fallback) => write!(
                f,
                "{} '{}' is not available; showing '{}'",
                self.field.label(),
                self.requested,
                fallback
            ),
            None => write!(
                f,
                "{} '{}' is not available and there is nothing to show instead",
                self.field.label(),
                self.requested
            ),
        }
    }
}

/// Result of applying input to a selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transition {
    pub selection: Selection,
    pub corrections: Vec<SelectionCorrection>,
    /// False when the input left the selection as it was.
    pub changed: bool,
}

fn resolve<'a>(
    field: SelectionField,
    requested: Option<&str>,
    current: Option<&str>,
    lookup: impl Fn(&str) -> Option<&'a str>,
    default: Option<&'a str>,
    corrections: &mut Vec<SelectionCorrection>,
) -> Option<&'a str> {
    if let Some(req) = requested {
        if let Some(found) = lookup(req) {
            return Some(found);
        }
        corrections.push(SelectionCorrection {
            field,
            requested: req.to_string(),
            fallback: default.map(str::to_string),
        });
        return default;
    }
    current.and_then(&lookup).or(default)
}

fn parse_or_default<T>(
    field: SelectionField,
    requested: Option<&str>,
    current: T,
    corrections: &mut Vec<SelectionCorrection>,
) -> T
where
    T: FromStr + Default + fmt::Display,
{
    match requested {
        None => current,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            let fallback = T::default();
            corrections.push(SelectionCorrection {
                field,
                requested: raw.to_string(),
                fallback: Some(fallback.to_string()),
            });
            fallback
        }),
    }
}

impl Selection {
    /// The default selection for a catalog.
    pub fn initial(catalog: &Catalog) -> Self {
        Selection::default()
            .apply(catalog, SelectionInput::default())
            .selection
    }

    /// Fold user input into the selection.
    pub fn apply(&self, catalog: &Catalog, input: SelectionInput) -> Transition {
        let input = input.normalized();
        let mut corrections = Vec::new();

        let compartment = resolve(
            SelectionField::Compartment,
            input.compartment.as_deref(),
            Some(self.compartment.as_str()),
            |name| catalog.compartment(name).map(|c| c.key.as_str()),
            catalog.first_compartment().map(|c| c.key.as_str()),
            &mut corrections,
        );
        let entry = compartment.and_then(|key| catalog.compartment(key));

        let cell_type = entry.and_then(|entry| {
            resolve(
                SelectionField::CellType,
                input.cell_type.as_deref(),
                self.cell_type.as_deref(),
                move |name| entry.cell_type(name).map(|c| c.name.as_str()),
                entry.cell_types.first().map(|c| c.name.as_str()),
                &mut corrections,
            )
        });
        let cell_entry = match (entry, cell_type) {
            (Some(entry), Some(cell)) => entry.cell_type(cell),
            _ => None,
        };

        let signature = cell_entry.and_then(|cell| {
            resolve(
                SelectionField::Signature,
                input.signature.as_deref(),
                self.signature.as_deref(),
                move |name| cell.signature(name),
                cell.signatures.first().map(String::as_str),
                &mut corrections,
            )
        });

        let comparison = parse_or_default(
            SelectionField::Comparison,
            input.comparison.as_deref(),
            self.comparison,
            &mut corrections,
        );
        let plot_kind = parse_or_default(
            SelectionField::PlotKind,
            input.plot_kind.as_deref(),
            self.plot_kind,
            &mut corrections,
        );

        let selection = Selection {
            compartment: compartment.unwrap_or_default().to_string(),
            cell_type: cell_type.map(str::to_string),
            signature: signature.map(str::to_string),
            comparison,
            plot_kind,
        };
        let changed = selection != *self;
        Transition {
            selection,
            corrections,
            changed,
        }
    }

    /// True when every field names something the catalog offers.
    pub fn is_valid_for(&self, catalog: &Catalog) -> bool {
        let Some(entry) = catalog.compartment(&self.compartment) else {
            return catalog.is_empty() && self.cell_type.is_none();
        };
        match (&self.cell_type, &self.signature) {
            (None, None) => entry.cell_types.is_empty(),
            (Some(cell), sig) => match entry.cell_type(cell) {
                Some(c) => match sig {
                    Some(sig) => c.signature(sig).is_some(),
                    None => c.signatures.is_empty(),
                },
                None => false,
            },
            (None, Some(_)) => false,
        }
    }

    /// Query-string pairs that reproduce this selection.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("compartment", self.compartment.clone())];
        if let Some(cell) = &self.cell_type {
            pairs.push(("cell_type", cell.clone()));
        }
        if let Some(sig) = &self.signature {
            pairs.push(("signature", sig.clone()));
        }
        pairs.push(("comparison", self.comparison.slug().to_string()));
        pairs.push(("plot", self.plot_kind.slug().to_string()));
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CellTypeEntry, CompartmentEntry};
    use proptest::prelude::*;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            CompartmentEntry {
                key: "immune_fine".into(),
                label: "Immune Fine".into(),
                cell_types: vec![
                    CellTypeEntry {
                        name: "CD8 T effector".into(),
                        signatures: vec!["Exhaustion".into(), "Glycolysis".into()],
                    },
                    CellTypeEntry {
                        name: "Macrophage".into(),
                        signatures: vec!["Glycolysis".into(), "OXPHOS".into()],
                    },
                ],
            },
            CompartmentEntry {
                key: "non_immune".into(),
                label: "Non-Immune".into(),
                cell_types: vec![CellTypeEntry {
                    name: "Fibroblasts".into(),
                    signatures: vec!["ECM".into()],
                }],
            },
        ])
    }

    #[test]
    fn test_initial_selection_uses_defaults() {
        let sel = Selection::initial(&catalog());
        assert_eq!(sel.compartment, "immune_fine");
        assert_eq!(sel.cell_type.as_deref(), Some("CD8 T effector"));
        assert_eq!(sel.signature.as_deref(), Some("Exhaustion"));
        assert_eq!(sel.comparison, BmiComparison::ObeseVsNormal);
        assert_eq!(sel.plot_kind, PlotKind::Heatmap);
    }

    #[test]
    fn test_valid_pair_round_trips() {
        let cat = catalog();
        let t = Selection::initial(&cat).apply(
            &cat,
            SelectionInput::default()
                .with_cell_type("Macrophage")
                .with_signature("OXPHOS"),
        );
        assert!(t.corrections.is_empty());
        assert!(t.changed);
        assert_eq!(t.selection.cell_type.as_deref(), Some("Macrophage"));
        assert_eq!(t.selection.signature.as_deref(), Some("OXPHOS"));
    }

    #[test]
    fn test_absent_signature_falls_back_to_default() {
        let cat = catalog();
        let t = Selection::initial(&cat).apply(
            &cat,
            SelectionInput::default()
                .with_cell_type("Macrophage")
                .with_signature("Exhaustion"),
        );
        assert_eq!(t.selection.cell_type.as_deref(), Some("Macrophage"));
        assert_eq!(t.selection.signature.as_deref(), Some("Glycolysis"));
        assert_eq!(t.corrections.len(), 1);
        assert_eq!(t.corrections[0].field, SelectionField::Signature);
        assert_eq!(t.corrections[0].fallback.as_deref(), Some("Glycolysis"));
    }

    #[test]
    fn test_names_match_loosely_and_keep_stored_spelling() {
        let cat = catalog();
        let t = Selection::initial(&cat).apply(
            &cat,
            SelectionInput::default()
                .with_cell_type("cd8_t-effector")
                .with_signature("glycolysis"),
        );
        assert!(t.corrections.is_empty());
        assert_eq!(t.selection.cell_type.as_deref(), Some("CD8 T effector"));
        assert_eq!(t.selection.signature.as_deref(), Some("Glycolysis"));
    }

    #[test]
    fn test_compartment_change_resets_dependent_fields_silently() {
        let cat = catalog();
        let t = Selection::initial(&cat).apply(&cat, SelectionInput::default().with_compartment("Non-Immune"));
        assert!(t.corrections.is_empty());
        assert_eq!(t.selection.compartment, "non_immune");
        assert_eq!(t.selection.cell_type.as_deref(), Some("Fibroblasts"));
        assert_eq!(t.selection.signature.as_deref(), Some("ECM"));
    }

    #[test]
    fn test_bad_comparison_and_plot_fall_back() {
        let cat = catalog();
        let start = Selection::initial(&cat)
            .apply(&cat, SelectionInput::default().with_plot_kind("forest"))
            .selection;
        let t = start.apply(
            &cat,
            SelectionInput::default()
                .with_comparison("obese_vs_underweight")
                .with_plot_kind("ridge"),
        );
        assert_eq!(t.selection.comparison, BmiComparison::ObeseVsNormal);
        assert_eq!(t.selection.plot_kind, PlotKind::Heatmap);
        assert_eq!(t.corrections.len(), 2);
    }

    #[test]
    fn test_empty_input_is_a_no_op() {
        let cat = catalog();
        let sel = Selection::initial(&cat);
        let t = sel.apply(&cat, SelectionInput::default().with_cell_type("  "));
        assert!(!t.changed);
        assert_eq!(t.selection, sel);
    }

    #[test]
    fn test_from_pairs_and_query_pairs_agree() {
        let cat = catalog();
        let sel = Selection::initial(&cat)
            .apply(
                &cat,
                SelectionInput::default()
                    .with_compartment("immune_fine")
                    .with_cell_type("Macrophage")
                    .with_comparison("obese_vs_overweight")
                    .with_plot_kind("survival"),
            )
            .selection;
        let input = SelectionInput::from_pairs(sel.query_pairs());
        let again = Selection::default().apply(&cat, input);
        assert!(again.corrections.is_empty());
        assert_eq!(again.selection, sel);
    }

    #[test]
    fn test_correction_message() {
        let c = SelectionCorrection {
            field: SelectionField::CellType,
            requested: "NK".into(),
            fallback: Some("Macrophage".into()),
        };
        assert_eq!(c.to_string(), "cell type 'NK' is not available; showing 'Macrophage'");
    }

    fn name_strategy() -> impl Strategy<Value = Option<String>> {
        prop::option::of(prop::sample::select(vec![
            "Macrophage".to_string(),
            "CD8 T effector".to_string(),
            "Fibroblasts".to_string(),
            "Glycolysis".to_string(),
            "OXPHOS".to_string(),
            "ECM".to_string(),
            "NK cells".to_string(),
            "".to_string(),
        ]))
    }

    proptest! {
        #[test]
        fn prop_apply_always_yields_valid_selection(
            compartment in prop::option::of(prop::sample::select(vec![
                "immune_fine".to_string(),
                "non_immune".to_string(),
                "stroma".to_string(),
            ])),
            cell_type in name_strategy(),
            signature in name_strategy(),
            comparison in prop::option::of("[a-z_]{0,20}"),
        ) {
            let cat = catalog();
            let input = SelectionInput {
                compartment,
                cell_type,
                signature,
                comparison,
                plot_kind: None,
            };
            let t = Selection::initial(&cat).apply(&cat, input);
            prop_assert!(t.selection.is_valid_for(&cat));
        }

        #[test]
        fn prop_valid_pairs_round_trip(
            idx in 0usize..2,
            sig_idx in 0usize..2,
        ) {
            let cat = catalog();
            let cell = &cat.compartments()[0].cell_types[idx];
            let sig = &cell.signatures[sig_idx];
            let t = Selection::initial(&cat).apply(
                &cat,
                SelectionInput::default().with_cell_type(cell.name.clone()).with_signature(sig.clone()),
            );
            prop_assert!(t.corrections.is_empty());
            prop_assert_eq!(t.selection.cell_type.as_deref(), Some(cell.name.as_str()));
            prop_assert_eq!(t.selection.signature.as_deref(), Some(sig.as_str()));
        }
    }
}
