//! Validated result tables.
//!
//! Tables are only constructed through validating constructors, so every
//! table in memory satisfies the record invariants. The first violation is
//! reported as a [`DataFormatError`]; `line` in those errors is the 1-based
//! position of the record in the artifact.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::error::DataFormatError;
use crate::names::{canonical_feature, canonical_key, split_feature};
use crate::records::{
    BmiGroup, CellProportionRecord, EnergyDraw, PosteriorDraw, SignatureDefinition,
    SignatureEffectRecord,
    StablFeatureRecord, SurvivalRecord,
};

/// Default tolerance for per-sample proportion sums.
pub const PROPORTION_SUM_TOLERANCE: f64 = 1e-3;

fn invalid(artifact: &str, line: usize, column: &str, value: impl ToString, reason: &str) -> DataFormatError {
    DataFormatError::InvalidValue {
        artifact: artifact.to_string(),
        line,
        column: column.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn require_finite(artifact: &str, line: usize, column: &str, value: f64) -> Result<(), DataFormatError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(artifact, line, column, value, "must be a finite number"))
    }
}

fn require_name(artifact: &str, line: usize, column: &str, value: &str) -> Result<(), DataFormatError> {
    if value.trim().is_empty() {
        Err(invalid(artifact, line, column, value, "must not be empty"))
    } else {
        Ok(())
    }
}

/// Unique names by canonical key, keeping the first spelling, sorted.
fn unique_sorted<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out: Vec<String> = names
        .filter(|n| seen.insert(canonical_key(n)))
        .map(str::to_string)
        .collect();
    out.sort();
    out
}

// ============================================================================
// Effects
// ============================================================================

/// (canonical cell type, canonical signature, BMI group).
type EffectKey = (String, String, BmiGroup);

/// Signature effect sizes for one compartment.
///
/// Canonical keys are computed once at construction; lookups by cell type
/// or by (cell type, signature, group) go through the indexes.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectTable {
    artifact: String,
    records: Vec<SignatureEffectRecord>,
    /// Canonical cell type -> record positions, in artifact order.
    by_cell: HashMap<String, Vec<usize>>,
    by_key: HashMap<EffectKey, usize>,
}

impl EffectTable {
    /// Validate records into a table.
    pub fn new(
        artifact: impl Into<String>,
        records: Vec<SignatureEffectRecord>,
    ) -> Result<Self, DataFormatError> {
        let artifact = artifact.into();
        let mut by_cell: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_key = HashMap::with_capacity(records.len());

        for (idx, rec) in records.iter().enumerate() {
            let line = idx + 1;
            validate_effect(&artifact, line, rec)?;

            let cell = canonical_key(&rec.cell_type);
            let key = (cell.clone(), canonical_key(&rec.signature_name), rec.bmi_group);
            if by_key.insert(key, idx).is_some() {
                return Err(DataFormatError::DuplicateKey {
                    artifact: artifact.clone(),
                    line,
                    key: format!("{}/{}/{}", rec.cell_type, rec.signature_name, rec.bmi_group),
                });
            }
            by_cell.entry(cell).or_default().push(idx);
        }

        Ok(Self {
            artifact,
            records,
            by_cell,
            by_key,
        })
    }

    /// Artifact name the table was loaded from.
    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn records(&self) -> &[SignatureEffectRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct cell types, sorted.
    pub fn cell_types(&self) -> Vec<String> {
        unique_sorted(self.records.iter().map(|r| r.cell_type.as_str()))
    }

    /// Distinct signatures measured for a cell type, sorted.
    pub fn signatures_for(&self, cell_type: &str) -> Vec<String> {
        unique_sorted(self.for_cell_type(cell_type).map(|r| r.signature_name.as_str()))
    }

    /// Distinct signatures across all cell types, sorted.
    pub fn signatures(&self) -> Vec<String> {
        unique_sorted(self.records.iter().map(|r| r.signature_name.as_str()))
    }

    /// Records for one cell type, in artifact order.
    pub fn for_cell_type(&self, cell_type: &str) -> impl Iterator<Item = &SignatureEffectRecord> + '_ {
        let positions = self
            .by_cell
            .get(&canonical_key(cell_type))
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        positions.iter().map(move |&idx| &self.records[idx])
    }

    /// Look up a single record.
    pub fn get(&self, cell_type: &str, signature: &str, group: BmiGroup) -> Option<&SignatureEffectRecord> {
        let key = (canonical_key(cell_type), canonical_key(signature), group);
        self.by_key.get(&key).map(|&idx| &self.records[idx])
    }
}

fn validate_effect(artifact: &str, line: usize, rec: &SignatureEffectRecord) -> Result<(), DataFormatError> {
    require_name(artifact, line, "cell_type", &rec.cell_type)?;
    require_name(artifact, line, "signature", &rec.signature_name)?;
    require_finite(artifact, line, "effect_size", rec.effect_size)?;
    require_finite(artifact, line, "ci_low", rec.credible_interval_low)?;
    require_finite(artifact, line, "ci_high", rec.credible_interval_high)?;
    require_finite(artifact, line, "r_hat", rec.r_hat)?;
    require_finite(artifact, line, "ess", rec.ess)?;

    if !(rec.credible_interval_low <= rec.effect_size && rec.effect_size <= rec.credible_interval_high) {
        return Err(DataFormatError::IntervalOrder {
            artifact: artifact.to_string(),
            line,
            low: rec.credible_interval_low,
            effect: rec.effect_size,
            high: rec.credible_interval_high,
        });
    }
    if rec.r_hat < 1.0 {
        return Err(DataFormatError::RHatBelowOne {
            artifact: artifact.to_string(),
            line,
            r_hat: rec.r_hat,
        });
    }
    if rec.ess < 0.0 {
        return Err(invalid(artifact, line, "ess", rec.ess, "must not be negative"));
    }
    Ok(())
}

// ============================================================================
// Proportions
// ============================================================================

/// Deconvolved cell-type proportions per sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ProportionTable {
    artifact: String,
    records: Vec<CellProportionRecord>,
}

impl ProportionTable {
    /// Validate records into a table.
    ///
    /// Every proportion must lie in [0, 1] and the proportions of each
    /// sample must sum to 1 within `tolerance`.
    pub fn new(
        artifact: impl Into<String>,
        records: Vec<CellProportionRecord>,
        tolerance: f64,
    ) -> Result<Self, DataFormatError> {
        let artifact = artifact.into();
        let mut keys = HashSet::with_capacity(records.len());
        let mut sums: BTreeMap<&str, f64> = BTreeMap::new();

        for (idx, rec) in records.iter().enumerate() {
            let line = idx + 1;
            require_name(&artifact, line, "sample_id", &rec.sample_id)?;
            require_name(&artifact, line, "cell_type", &rec.cell_type)?;
            require_finite(&artifact, line, "proportion", rec.proportion)?;

            if !(0.0..=1.0).contains(&rec.proportion) {
                return Err(DataFormatError::ProportionOutOfRange {
                    artifact: artifact.clone(),
                    line,
                    proportion: rec.proportion,
                });
            }
            if !keys.insert((rec.sample_id.as_str(), canonical_key(&rec.cell_type))) {
                return Err(DataFormatError::DuplicateKey {
                    artifact: artifact.clone(),
                    line,
                    key: format!("{}/{}", rec.sample_id, rec.cell_type),
                });
            }
            *sums.entry(rec.sample_id.as_str()).or_insert(0.0) += rec.proportion;
        }

        if let Some((sample_id, sum)) = sums.iter().find(|(_, sum)| (**sum - 1.0).abs() > tolerance) {
            return Err(DataFormatError::ProportionSum {
                artifact: artifact.clone(),
                sample_id: sample_id.to_string(),
                sum: *sum,
                tolerance,
            });
        }

        Ok(Self { artifact, records })
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn records(&self) -> &[CellProportionRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sample ids in first-appearance order.
    pub fn samples(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.sample_id.as_str())
            .filter(|s| seen.insert(*s))
            .collect()
    }

    /// Distinct cell types, sorted.
    pub fn cell_types(&self) -> Vec<String> {
        unique_sorted(self.records.iter().map(|r| r.cell_type.as_str()))
    }

    /// Proportion of a cell type in a sample (0 when absent).
    pub fn proportion(&self, sample_id: &str, cell_type: &str) -> f64 {
        let key = canonical_key(cell_type);
        self.records
            .iter()
            .find(|r| r.sample_id == sample_id && canonical_key(&r.cell_type) == key)
            .map(|r| r.proportion)
            .unwrap_or(0.0)
    }

    /// Sum of proportions per sample.
    pub fn sample_sums(&self) -> BTreeMap<String, f64> {
        let mut sums = BTreeMap::new();
        for rec in &self.records {
            *sums.entry(rec.sample_id.clone()).or_insert(0.0) += rec.proportion;
        }
        sums
    }

    /// Mean proportion of each cell type across samples, sorted by mean descending.
    pub fn mean_by_cell_type(&self) -> Vec<(String, f64)> {
        let n_samples = self.samples().len();
        if n_samples == 0 {
            return Vec::new();
        }
        let mut totals: HashMap<String, (String, f64)> = HashMap::new();
        for rec in &self.records {
            let entry = totals
                .entry(canonical_key(&rec.cell_type))
                .or_insert_with(|| (rec.cell_type.clone(), 0.0));
            entry.1 += rec.proportion;
        }
        let mut means: Vec<(String, f64)> = totals
            .into_values()
            .map(|(name, total)| (name, total / n_samples as f64))
            .collect();
        means.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        means
    }
}

// ============================================================================
// Survival
// ============================================================================

/// Survival associations.
#[derive(Debug, Clone, PartialEq)]
pub struct SurvivalTable {
    artifact: String,
    records: Vec<SurvivalRecord>,
}

impl SurvivalTable {
    /// Validate records into a table.
    pub fn new(artifact: impl Into<String>, records: Vec<SurvivalRecord>) -> Result<Self, DataFormatError> {
        let artifact = artifact.into();
        for (idx, rec) in records.iter().enumerate() {
            let line = idx + 1;
            require_name(&artifact, line, "feature", &rec.feature)?;
            require_finite(&artifact, line, "hazard_ratio", rec.hazard_ratio)?;
            require_finite(&artifact, line, "p_value", rec.p_value)?;
            require_finite(&artifact, line, "ci_low", rec.ci_low)?;
            require_finite(&artifact, line, "ci_high", rec.ci_high)?;

            if rec.hazard_ratio <= 0.0 {
                return Err(DataFormatError::NonPositiveHazardRatio {
                    artifact,
                    line,
                    hazard_ratio: rec.hazard_ratio,
                });
            }
            if !(0.0..=1.0).contains(&rec.p_value) {
                return Err(invalid(&artifact, line, "p_value", rec.p_value, "must be in [0, 1]"));
            }
            if rec.ci_low <= 0.0 || rec.ci_low > rec.ci_high {
                return Err(DataFormatError::ConfidenceInterval {
                    artifact,
                    line,
                    low: rec.ci_low,
                    high: rec.ci_high,
                });
            }
        }
        Ok(Self { artifact, records })
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn records(&self) -> &[SurvivalRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose feature belongs to a cell type.
    pub fn for_cell_type(&self, cell_type: &str) -> Vec<&SurvivalRecord> {
        let key = canonical_key(cell_type);
        self.records
            .iter()
            .filter(|r| canonical_key(r.cell_type()) == key)
            .collect()
    }
}

// ============================================================================
// Energy
// ============================================================================

/// Per-chain energy summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainEnergySummary {
    pub chain: u32,
    pub draws: usize,
    pub mean: f64,
    /// Energy Bayesian fraction of missing information.
    pub bfmi: Option<f64>,
}

/// HMC energy draws for one compartment's model.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyTable {
    artifact: String,
    chains: BTreeMap<u32, Vec<(u32, f64)>>,
}

impl EnergyTable {
    /// Validate draws into a table. Draws are re-ordered by (chain, draw).
    pub fn new(artifact: impl Into<String>, draws: Vec<EnergyDraw>) -> Result<Self, DataFormatError> {
        let artifact = artifact.into();
        let mut chains: BTreeMap<u32, Vec<(u32, f64)>> = BTreeMap::new();
        let mut keys = HashSet::with_capacity(draws.len());

        for (idx, d) in draws.iter().enumerate() {
            let line = idx + 1;
            require_finite(&artifact, line, "energy", d.energy)?;
            if !keys.insert((d.chain, d.draw)) {
                return Err(DataFormatError::DuplicateKey {
                    artifact,
                    line,
                    key: format!("chain {} draw {}", d.chain, d.draw),
                });
            }
            chains.entry(d.chain).or_default().push((d.draw, d.energy));
        }
        for series in chains.values_mut() {
            series.sort_by_key(|(draw, _)| *draw);
        }

        Ok(Self { artifact, chains })
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    /// Draws per chain, ordered by draw index.
    pub fn chains(&self) -> &BTreeMap<u32, Vec<(u32, f64)>> {
        &self.chains
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// E-BFMI of one chain: mean squared energy transition over energy variance.
    ///
    /// `None` for chains with fewer than two draws or constant energy.
    pub fn bfmi(&self, chain: u32) -> Option<f64> {
        let series = self.chains.get(&chain)?;
        if series.len() < 2 {
            return None;
        }
        let n = series.len() as f64;
        let mean = series.iter().map(|(_, e)| e).sum::<f64>() / n;
        let variance = series.iter().map(|(_, e)| (e - mean).powi(2)).sum::<f64>() / n;
        if variance <= 0.0 {
            return None;
        }
        let transitions = series
            .windows(2)
            .map(|w| (w[1].1 - w[0].1).powi(2))
            .sum::<f64>()
            / (n - 1.0);
        Some(transitions / variance)
    }

    /// Summary of every chain.
    pub fn summaries(&self) -> Vec<ChainEnergySummary> {
        self.chains
            .iter()
            .map(|(chain, series)| ChainEnergySummary {
                chain: *chain,
                draws: series.len(),
                mean: if series.is_empty() {
                    0.0
                } else {
                    series.iter().map(|(_, e)| e).sum::<f64>() / series.len() as f64
                },
                bfmi: self.bfmi(*chain),
            })
            .collect()
    }
}

// ============================================================================
// Posterior draws
// ============================================================================

/// Draws of one parameter, split by chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDraws {
    pub name: String,
    /// Values per chain, ordered by draw index.
    pub chains: BTreeMap<u32, Vec<f64>>,
}

impl ParameterDraws {
    /// Draws in the shortest chain.
    pub fn draws_per_chain(&self) -> usize {
        self.chains.values().map(Vec::len).min().unwrap_or(0)
    }

    /// Histogram of pooled ranks per chain.
    ///
    /// All draws are ranked together (ties get their average rank) and each
    /// chain's ranks are counted into `bins` equal-width bins. Well-mixed
    /// chains give roughly flat histograms.
    pub fn rank_histograms(&self, bins: usize) -> BTreeMap<u32, Vec<usize>> {
        let bins = bins.max(1);
        let mut pooled: Vec<(f64, u32)> = self
            .chains
            .iter()
            .flat_map(|(chain, values)| values.iter().map(move |v| (*v, *chain)))
            .collect();
        pooled.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total = pooled.len() as f64;
        let mut hist: BTreeMap<u32, Vec<usize>> =
            self.chains.keys().map(|c| (*c, vec![0; bins])).collect();
        let mut start = 0;
        while start < pooled.len() {
            let mut end = start + 1;
            while end < pooled.len() && pooled[end].0 == pooled[start].0 {
                end += 1;
            }
            // 1-based average rank of the tie group
            let rank = (start + end + 1) as f64 / 2.0;
            let bin = (((rank - 1.0) / total) * bins as f64).floor() as usize;
            for (_, chain) in &pooled[start..end] {
                if let Some(counts) = hist.get_mut(chain) {
                    counts[bin.min(bins - 1)] += 1;
                }
            }
            start = end;
        }
        hist
    }

    /// Autocorrelation of one chain for lags `0..=max_lag`.
    ///
    /// Lag `k` is the Pearson correlation of the chain with itself shifted by
    /// `k`. Lags with fewer than two overlapping draws or a constant window
    /// are left out.
    pub fn autocorrelation(&self, chain: u32, max_lag: usize) -> Vec<(usize, f64)> {
        let Some(values) = self.chains.get(&chain) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if !values.is_empty() {
            out.push((0, 1.0));
        }
        for lag in 1..=max_lag {
            if values.len() < lag + 2 {
                break;
            }
            if let Some(r) = pearson(&values[..values.len() - lag], &values[lag..]) {
                out.push((lag, r));
            }
        }
        out
    }
}

fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        cov += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a).powi(2);
        var_b += (y - mean_b).powi(2);
    }
    let denom = (var_a * var_b).sqrt();
    (denom > 0.0).then(|| cov / denom)
}

/// Raw posterior draws for one compartment's model.
#[derive(Debug, Clone, PartialEq)]
pub struct PosteriorDrawTable {
    artifact: String,
    parameters: Vec<ParameterDraws>,
}

impl PosteriorDrawTable {
    /// Validate draws into a table. Parameters keep their first-seen order;
    /// draws are re-ordered by draw index within each chain.
    pub fn new(artifact: impl Into<String>, draws: Vec<PosteriorDraw>) -> Result<Self, DataFormatError> {
        let artifact = artifact.into();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut staged: Vec<(String, BTreeMap<u32, Vec<(u32, f64)>>)> = Vec::new();
        let mut keys = HashSet::with_capacity(draws.len());

        for (idx, d) in draws.into_iter().enumerate() {
            let line = idx + 1;
            require_name(&artifact, line, "parameter", &d.parameter)?;
            require_finite(&artifact, line, "value", d.value)?;
            let name = d.parameter.trim().to_string();
            if !keys.insert((name.clone(), d.chain, d.draw)) {
                return Err(DataFormatError::DuplicateKey {
                    artifact,
                    line,
                    key: format!("{} chain {} draw {}", name, d.chain, d.draw),
                });
            }
            let slot = *index.entry(name.clone()).or_insert_with(|| {
                staged.push((name, BTreeMap::new()));
                staged.len() - 1
            });
            staged[slot].1.entry(d.chain).or_default().push((d.draw, d.value));
        }

        let parameters = staged
            .into_iter()
            .map(|(name, chains)| ParameterDraws {
                name,
                chains: chains
                    .into_iter()
                    .map(|(chain, mut series)| {
                        series.sort_by_key(|(draw, _)| *draw);
                        (chain, series.into_iter().map(|(_, v)| v).collect())
                    })
                    .collect(),
            })
            .collect();
        Ok(Self { artifact, parameters })
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn parameters(&self) -> &[ParameterDraws] {
        &self.parameters
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Parameters whose name mentions `cell_type` (separator-insensitive),
    /// falling back to every parameter when none does.
    pub fn for_cell_type(&self, cell_type: &str) -> Vec<&ParameterDraws> {
        let wanted = canonical_key(cell_type);
        let matching: Vec<_> = self
            .parameters
            .iter()
            .filter(|p| !wanted.is_empty() && canonical_key(&p.name).contains(&wanted))
            .collect();
        if matching.is_empty() {
            self.parameters.iter().collect()
        } else {
            matching
        }
    }
}

// ============================================================================
// STABL selection and signature catalog
// ============================================================================

/// Features selected by stability selection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StablSelection {
    features: BTreeSet<String>,
}

impl StablSelection {
    /// Validate feature keys into a selection set.
    pub fn new(artifact: &str, records: Vec<StablFeatureRecord>) -> Result<Self, DataFormatError> {
        let mut features = BTreeSet::new();
        for (idx, rec) in records.iter().enumerate() {
            let line = idx + 1;
            match split_feature(&rec.feature) {
                (cell, Some(sig)) if !cell.is_empty() && !sig.is_empty() => {
                    features.insert(canonical_feature(cell, sig));
                }
                _ => {
                    return Err(invalid(
                        artifact,
                        line,
                        "feature",
                        &rec.feature,
                        "expected 'CellType||Signature'",
                    ))
                }
            }
        }
        Ok(Self { features })
    }

    /// True when the cell/signature pair was selected.
    pub fn contains(&self, cell_type: &str, signature: &str) -> bool {
        self.features.contains(&canonical_feature(cell_type, signature))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Signature definitions with their member genes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureCatalog {
    entries: Vec<SignatureDefinition>,
}

impl SignatureCatalog {
    /// Validate definitions into a catalog.
    pub fn new(artifact: &str, entries: Vec<SignatureDefinition>) -> Result<Self, DataFormatError> {
        for (idx, entry) in entries.iter().enumerate() {
            require_name(artifact, idx + 1, "cell_type", &entry.cell_type)?;
            require_name(artifact, idx + 1, "signature", &entry.signature)?;
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[SignatureDefinition] {
        &self.entries
    }

    /// Number of genes in a signature, if the catalog defines it.
    pub fn gene_count(&self, cell_type: &str, signature: &str) -> Option<usize> {
        let cell = canonical_key(cell_type);
        let sig = canonical_key(signature);
        self.entries
            .iter()
            .find(|e| canonical_key(&e.cell_type) == cell && canonical_key(&e.signature) == sig)
            .map(|e| e.genes.len())
    }

    /// Definitions for one cell type, in artifact order.
    pub fn for_cell_type(&self, cell_type: &str) -> Vec<&SignatureDefinition> {
        let cell = canonical_key(cell_type);
        self.entries
            .iter()
            .filter(|e| canonical_key(&e.cell_type) == cell)
            .collect()
    }

    /// Number of distinct cell types with at least one signature.
    pub fn cell_type_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| canonical_key(&e.cell_type))
            .collect::<HashSet<_>>()
            .len()
    }

    /// Mean genes per signature; zero for an empty catalog.
    pub fn mean_gene_count(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let total: usize = self.entries.iter().map(|e| e.genes.len()).sum();
        total as f64 / self.entries.len() as f64
    }
}
