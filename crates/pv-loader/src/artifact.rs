//! Artifact kinds and their on-disk schema.

use pv_common::{
    CellProportionRecord, EnergyDraw, PosteriorDraw, SignatureDefinition,
    SignatureEffectRecord, StablFeatureRecord, SurvivalRecord,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kinds of result artifact the viewer reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Effects,
    Proportions,
    Survival,
    Energy,
    Draws,
    Stabl,
    Signatures,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 7] = [
        ArtifactKind::Effects,
        ArtifactKind::Proportions,
        ArtifactKind::Survival,
        ArtifactKind::Energy,
        ArtifactKind::Draws,
        ArtifactKind::Stabl,
        ArtifactKind::Signatures,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ArtifactKind::Effects => "effects",
            ArtifactKind::Proportions => "proportions",
            ArtifactKind::Survival => "survival",
            ArtifactKind::Energy => "energy",
            ArtifactKind::Draws => "draws",
            ArtifactKind::Stabl => "stabl",
            ArtifactKind::Signatures => "signatures",
        }
    }

    /// File name used when the configuration does not override it.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            ArtifactKind::Effects => "effects.csv",
            ArtifactKind::Proportions => "proportions.csv",
            ArtifactKind::Survival => "survival.csv",
            ArtifactKind::Energy => "energy.csv",
            ArtifactKind::Draws => "posterior_draws.csv",
            ArtifactKind::Stabl => "stabl_selected.csv",
            ArtifactKind::Signatures => "signatures.json",
        }
    }

    /// Columns that must be present in the header.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            ArtifactKind::Effects => &[
                "cell_type",
                "signature",
                "bmi_group",
                "effect_size",
                "ci_low",
                "ci_high",
                "r_hat",
                "ess",
            ],
            ArtifactKind::Proportions => &["sample_id", "cell_type", "proportion"],
            ArtifactKind::Survival => &["feature", "hazard_ratio", "p_value", "ci_low", "ci_high"],
            ArtifactKind::Energy => &["chain", "draw", "energy"],
            ArtifactKind::Draws => &["chain", "draw", "parameter", "value"],
            ArtifactKind::Stabl => &["feature"],
            ArtifactKind::Signatures => &["cell_type", "signature", "genes"],
        }
    }

    /// Per-compartment artifacts live under `<data_dir>/<compartment>/`;
    /// the rest directly under `<data_dir>/`.
    pub fn per_compartment(&self) -> bool {
        !matches!(self, ArtifactKind::Signatures)
    }

    /// Only the effects table is required for the viewer to start.
    pub fn required_at_startup(&self) -> bool {
        matches!(self, ArtifactKind::Effects)
    }

    /// JSON Schema of one artifact row.
    pub fn row_schema(&self) -> serde_json::Value {
        let schema = match self {
            ArtifactKind::Effects => schemars::schema_for!(SignatureEffectRecord),
            ArtifactKind::Proportions => schemars::schema_for!(CellProportionRecord),
            ArtifactKind::Survival => schemars::schema_for!(SurvivalRecord),
            ArtifactKind::Energy => schemars::schema_for!(EnergyDraw),
            ArtifactKind::Draws => schemars::schema_for!(PosteriorDraw),
            ArtifactKind::Stabl => schemars::schema_for!(StablFeatureRecord),
            ArtifactKind::Signatures => schemars::schema_for!(SignatureDefinition),
        };
        schema.into()
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ArtifactKind::ALL
            .into_iter()
            .find(|k| k.name() == wanted || k.default_file_name() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown artifact '{}' (expected one of: effects, proportions, survival, energy, draws, stabl, signatures)",
                    s
                )
            })
    }
}
