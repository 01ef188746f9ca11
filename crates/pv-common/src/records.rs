//! Result record types.
//!
//! One record per artifact row. Field names mirror the artifact columns so the
//! JSON Schema printed by `paad-viewer schema` documents the on-disk format.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::names::split_feature;

/// BMI category of a patient group.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum BmiGroup {
    /// BMI < 25.
    Normal,
    /// 25 ≤ BMI < 30.
    Overweight,
    /// BMI ≥ 30.
    Obese,
}

impl BmiGroup {
    /// All groups in display order.
    pub const ALL: [BmiGroup; 3] = [BmiGroup::Normal, BmiGroup::Overweight, BmiGroup::Obese];

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            BmiGroup::Normal => "Normal",
            BmiGroup::Overweight => "Overweight",
            BmiGroup::Obese => "Obese",
        }
    }

    /// Series colour used by the forest and survival views.
    pub fn color(&self) -> &'static str {
        match self {
            BmiGroup::Normal => "#7a7a7a",
            BmiGroup::Overweight => "#5b8fa3",
            BmiGroup::Obese => "#a44a4a",
        }
    }

    /// Position in [`BmiGroup::ALL`].
    pub fn index(&self) -> usize {
        match self {
            BmiGroup::Normal => 0,
            BmiGroup::Overweight => 1,
            BmiGroup::Obese => 2,
        }
    }
}

impl fmt::Display for BmiGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BmiGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(BmiGroup::Normal),
            "overweight" => Ok(BmiGroup::Overweight),
            "obese" => Ok(BmiGroup::Obese),
            _ => Err(format!(
                "unknown BMI group '{}' (expected Normal, Overweight or Obese)",
                s
            )),
        }
    }
}

/// Pairwise BMI comparison shown by the forest plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiComparison {
    OverweightVsNormal,
    #[default]
    ObeseVsNormal,
    ObeseVsOverweight,
}

impl BmiComparison {
    /// All comparisons in selector order.
    pub const ALL: [BmiComparison; 3] = [
        BmiComparison::OverweightVsNormal,
        BmiComparison::ObeseVsNormal,
        BmiComparison::ObeseVsOverweight,
    ];

    /// `(test, reference)` groups of the comparison.
    pub fn groups(&self) -> (BmiGroup, BmiGroup) {
        match self {
            BmiComparison::OverweightVsNormal => (BmiGroup::Overweight, BmiGroup::Normal),
            BmiComparison::ObeseVsNormal => (BmiGroup::Obese, BmiGroup::Normal),
            BmiComparison::ObeseVsOverweight => (BmiGroup::Obese, BmiGroup::Overweight),
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            BmiComparison::OverweightVsNormal => "Overweight vs Normal",
            BmiComparison::ObeseVsNormal => "Obese vs Normal",
            BmiComparison::ObeseVsOverweight => "Obese vs Overweight",
        }
    }

    /// Query-string value.
    pub fn slug(&self) -> &'static str {
        match self {
            BmiComparison::OverweightVsNormal => "overweight_vs_normal",
            BmiComparison::ObeseVsNormal => "obese_vs_normal",
            BmiComparison::ObeseVsOverweight => "obese_vs_overweight",
        }
    }
}

impl fmt::Display for BmiComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for BmiComparison {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "overweight_vs_normal" | "overweight" => Ok(BmiComparison::OverweightVsNormal),
            "obese_vs_normal" | "obese" => Ok(BmiComparison::ObeseVsNormal),
            "obese_vs_overweight" => Ok(BmiComparison::ObeseVsOverweight),
            _ => Err(format!("unknown BMI comparison: {}", s)),
        }
    }
}

/// Posterior summary of one signature's BMI effect in one cell type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SignatureEffectRecord {
    /// Cell type the signature was scored in.
    pub cell_type: String,
    /// Gene signature name.
    #[serde(rename = "signature")]
    pub signature_name: String,
    /// BMI group the effect belongs to.
    pub bmi_group: BmiGroup,
    /// Posterior mean effect size.
    pub effect_size: f64,
    /// Lower bound of the 95% credible interval.
    #[serde(rename = "ci_low")]
    pub credible_interval_low: f64,
    /// Upper bound of the 95% credible interval.
    #[serde(rename = "ci_high")]
    pub credible_interval_high: f64,
    /// Potential scale reduction factor.
    pub r_hat: f64,
    /// Effective sample size.
    pub ess: f64,
}

impl SignatureEffectRecord {
    /// Width of the credible interval.
    pub fn interval_width(&self) -> f64 {
        self.credible_interval_high - self.credible_interval_low
    }

    /// True when the credible interval excludes zero.
    pub fn excludes_zero(&self) -> bool {
        self.credible_interval_low > 0.0 || self.credible_interval_high < 0.0
    }
}

/// Deconvolved proportion of one cell type in one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CellProportionRecord {
    /// Sample identifier.
    pub sample_id: String,
    /// Cell type.
    pub cell_type: String,
    /// Fraction of the sample, in [0, 1].
    pub proportion: f64,
}

/// Survival association of one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SurvivalRecord {
    /// Cell type, signature, or `"CellType||Signature"` feature key.
    pub feature: String,
    /// Cox hazard ratio.
    pub hazard_ratio: f64,
    /// Wald p-value.
    pub p_value: f64,
    /// Lower bound of the 95% confidence interval.
    pub ci_low: f64,
    /// Upper bound of the 95% confidence interval.
    pub ci_high: f64,
    /// BMI group the model was fitted in, if stratified.
    #[serde(default)]
    pub stratum: Option<BmiGroup>,
    /// Patients in the model.
    #[serde(default)]
    pub n: Option<u32>,
    /// Observed events.
    #[serde(default)]
    pub events: Option<u32>,
}

impl SurvivalRecord {
    /// Confidence interval as `(low, high)`.
    pub fn confidence_interval(&self) -> (f64, f64) {
        (self.ci_low, self.ci_high)
    }

    /// Cell type part of the feature.
    pub fn cell_type(&self) -> &str {
        split_feature(&self.feature).0
    }

    /// Signature part of the feature, if the feature is a cell/signature pair.
    pub fn signature(&self) -> Option<&str> {
        split_feature(&self.feature).1
    }

    /// True when `p_value < alpha`.
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// One HMC energy draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EnergyDraw {
    /// Chain index.
    pub chain: u32,
    /// Draw index within the chain.
    pub draw: u32,
    /// Hamiltonian energy.
    pub energy: f64,
}

/// One posterior draw of one model parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PosteriorDraw {
    /// Chain index.
    pub chain: u32,
    /// Draw index within the chain.
    pub draw: u32,
    /// Parameter name, e.g. `effect[Macrophage, Obese]`.
    pub parameter: String,
    pub value: f64,
}

/// One STABL-selected feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StablFeatureRecord {
    /// `"CellType||Signature"` feature key.
    pub feature: String,
}

/// One signature definition from the signature catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SignatureDefinition {
    /// Cell type the signature belongs to.
    pub cell_type: String,
    /// Signature name.
    pub signature: String,
    /// Member genes.
    #[serde(default)]
    pub genes: Vec<String>,
}
