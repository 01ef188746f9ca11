//! Result store for one data directory.
//!
//! Layout: `<data_dir>/<compartment_key>/<artifact file>` for per-compartment
//! artifacts, `<data_dir>/<artifact file>` for global ones.

use pv_common::{
    Catalog, CompartmentEntry, EffectTable, EnergyTable, PosteriorDrawTable, ProportionTable,
    SignatureCatalog, StablSelection, SurvivalTable,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::artifact::ArtifactKind;
use crate::cache::{Artifact, ArtifactCache};
use crate::error::{LoadError, Result};
use crate::parse::{ParseOptions, ResultTable};

/// A configured compartment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompartmentSpec {
    /// Directory name under the data directory.
    pub key: String,
    pub label: String,
}

impl CompartmentSpec {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// Where artifacts live and how they are validated.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreLayout {
    pub data_dir: PathBuf,
    pub compartments: Vec<CompartmentSpec>,
    file_names: BTreeMap<ArtifactKind, String>,
    pub options: ParseOptions,
}

impl StoreLayout {
    /// Layout with the default artifact file names.
    pub fn new(data_dir: impl Into<PathBuf>, compartments: Vec<CompartmentSpec>) -> Self {
        let file_names = ArtifactKind::ALL
            .iter()
            .map(|k| (*k, k.default_file_name().to_string()))
            .collect();
        Self {
            data_dir: data_dir.into(),
            compartments,
            file_names,
            options: ParseOptions::default(),
        }
    }

    /// Override the file name of one artifact kind.
    pub fn with_file_name(mut self, kind: ArtifactKind, name: impl Into<String>) -> Self {
        self.file_names.insert(kind, name.into());
        self
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn file_name(&self, kind: ArtifactKind) -> &str {
        self.file_names
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_file_name())
    }

    /// Path of an artifact. `compartment` is ignored for global artifacts.
    pub fn path(&self, kind: ArtifactKind, compartment: &str) -> PathBuf {
        if kind.per_compartment() {
            self.data_dir.join(compartment).join(self.file_name(kind))
        } else {
            self.data_dir.join(self.file_name(kind))
        }
    }
}

/// Outcome of checking one artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckStatus {
    Ok { rows: usize, fingerprint: String },
    Missing { required: bool },
    Invalid { error_kind: String, message: String },
    Unreadable { message: String },
}

/// Check result for one artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactCheck {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compartment: Option<String>,
    pub kind: ArtifactKind,
    pub path: String,
    #[serde(flatten)]
    pub status: CheckStatus,
}

impl ArtifactCheck {
    /// True for invalid or unreadable artifacts and missing required ones.
    pub fn is_problem(&self) -> bool {
        match &self.status {
            CheckStatus::Ok { .. } => false,
            CheckStatus::Missing { required } => *required,
            CheckStatus::Invalid { .. } | CheckStatus::Unreadable { .. } => true,
        }
    }
}

/// Check results for a whole data directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckReport {
    pub data_dir: String,
    pub artifacts: Vec<ArtifactCheck>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        !self.artifacts.iter().any(ArtifactCheck::is_problem)
    }

    pub fn problems(&self) -> impl Iterator<Item = &ArtifactCheck> {
        self.artifacts.iter().filter(|a| a.is_problem())
    }

    /// True when a required artifact is missing.
    pub fn missing_required(&self) -> bool {
        self.artifacts
            .iter()
            .any(|a| matches!(a.status, CheckStatus::Missing { required: true }))
    }
}

/// Loads and caches the artifacts of one data directory.
#[derive(Debug)]
pub struct ResultStore {
    layout: StoreLayout,
    cache: ArtifactCache,
}

impl ResultStore {
    pub fn new(layout: StoreLayout) -> Self {
        Self {
            layout,
            cache: ArtifactCache::new(),
        }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    /// Load one table, from cache when possible.
    pub fn load<T: ResultTable>(&mut self, compartment: &str) -> Result<Arc<Artifact<T>>> {
        let path = self.layout.path(T::KIND, compartment);
        let options = self.layout.options;
        self.cache.get_or_load::<T>(&path, &options)
    }

    pub fn load_effects(&mut self, compartment: &str) -> Result<Arc<Artifact<EffectTable>>> {
        self.load(compartment)
    }

    pub fn load_proportions(&mut self, compartment: &str) -> Result<Arc<Artifact<ProportionTable>>> {
        self.load(compartment)
    }

    pub fn load_survival(&mut self, compartment: &str) -> Result<Arc<Artifact<SurvivalTable>>> {
        self.load(compartment)
    }

    pub fn load_energy(&mut self, compartment: &str) -> Result<Arc<Artifact<EnergyTable>>> {
        self.load(compartment)
    }

    pub fn load_draws(&mut self, compartment: &str) -> Result<Arc<Artifact<PosteriorDrawTable>>> {
        self.load(compartment)
    }

    pub fn load_stabl(&mut self, compartment: &str) -> Result<Arc<Artifact<StablSelection>>> {
        self.load(compartment)
    }

    pub fn load_signatures(&mut self) -> Result<Arc<Artifact<SignatureCatalog>>> {
        self.load("")
    }

    /// Fail when any artifact the viewer cannot start without is missing.
    ///
    /// Only existence is checked; content problems surface per view.
    pub fn require_startup_artifacts(&self) -> Result<()> {
        if self.layout.compartments.is_empty() {
            return Err(LoadError::MissingRequired {
                paths: vec![self.layout.data_dir.clone()],
            });
        }

        let missing: Vec<PathBuf> = self
            .layout
            .compartments
            .iter()
            .flat_map(|c| {
                ArtifactKind::ALL
                    .iter()
                    .filter(|k| k.required_at_startup())
                    .map(move |k| self.layout.path(*k, &c.key))
            })
            .filter(|p| !p.is_file())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(LoadError::MissingRequired { paths: missing })
        }
    }

    /// Build the selectable catalog from the effect tables.
    ///
    /// A compartment whose effects cannot be loaded is listed without cell types.
    pub fn catalog(&mut self) -> Catalog {
        let specs = self.layout.compartments.clone();
        let entries = specs
            .iter()
            .map(|spec| match self.load_effects(&spec.key) {
                Ok(effects) => CompartmentEntry::from_effects(&spec.key, &spec.label, Some(&effects.table)),
                Err(e) => {
                    warn!(
                        event = "catalog.compartment_unavailable",
                        compartment = %spec.key,
                        error = %e,
                        "Compartment has no usable effects table"
                    );
                    CompartmentEntry::from_effects(&spec.key, &spec.label, None)
                }
            })
            .collect();
        Catalog::new(entries)
    }

    /// Validate every artifact of every compartment.
    pub fn check_all(&mut self) -> CheckReport {
        let mut artifacts = Vec::new();
        let specs = self.layout.compartments.clone();

        for spec in &specs {
            for kind in ArtifactKind::ALL.iter().filter(|k| k.per_compartment()) {
                artifacts.push(self.check_kind(*kind, Some(&spec.key)));
            }
        }
        for kind in ArtifactKind::ALL.iter().filter(|k| !k.per_compartment()) {
            artifacts.push(self.check_kind(*kind, None));
        }

        let report = CheckReport {
            data_dir: self.layout.data_dir.display().to_string(),
            artifacts,
        };
        info!(
            event = "check.finished",
            artifacts = report.artifacts.len(),
            problems = report.problems().count(),
            "Artifact check finished"
        );
        report
    }

    fn check_kind(&mut self, kind: ArtifactKind, compartment: Option<&str>) -> ArtifactCheck {
        match kind {
            ArtifactKind::Effects => self.check::<EffectTable>(compartment),
            ArtifactKind::Proportions => self.check::<ProportionTable>(compartment),
            ArtifactKind::Survival => self.check::<SurvivalTable>(compartment),
            ArtifactKind::Energy => self.check::<EnergyTable>(compartment),
            ArtifactKind::Draws => self.check::<PosteriorDrawTable>(compartment),
            ArtifactKind::Stabl => self.check::<StablSelection>(compartment),
            ArtifactKind::Signatures => self.check::<SignatureCatalog>(compartment),
        }
    }

    fn check<T: ResultTable>(&mut self, compartment: Option<&str>) -> ArtifactCheck {
        let path = self.layout.path(T::KIND, compartment.unwrap_or_default());
        let status = match self.load::<T>(compartment.unwrap_or_default()) {
            Ok(artifact) => CheckStatus::Ok {
                rows: artifact.rows,
                fingerprint: artifact.fingerprint.clone(),
            },
            Err(LoadError::Missing { .. }) | Err(LoadError::MissingRequired { .. }) => CheckStatus::Missing {
                required: T::KIND.required_at_startup(),
            },
            Err(LoadError::Format(e)) => CheckStatus::Invalid {
                error_kind: e.kind().to_string(),
                message: e.to_string(),
            },
            Err(e @ LoadError::Io { .. }) => CheckStatus::Unreadable {
                message: e.to_string(),
            },
        };
        ArtifactCheck {
            compartment: compartment.map(str::to_string),
            kind: T::KIND,
            path: path.display().to_string(),
            status,
        }
    }
}
