//! Artifact cache.
//!
//! Tables are cached by artifact identity (kind + path) and handed out as
//! `Arc`s. Cached tables are immutable, so sharing them needs no locking.
//!
//! A missing or invalid artifact is remembered together with the file's size
//! and modification time. It is not re-read (or re-reported) until the file
//! appears or changes. Unreadable files are always retried.

use sha2::{Digest, Sha256};
use std::any::Any;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, warn};

use pv_common::DataFormatError;

use crate::artifact::ArtifactKind;
use crate::error::{LoadError, Result};
use crate::parse::{ParseOptions, ResultTable};

/// Identity of a loaded artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

/// A validated table together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact<T> {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    /// Hex SHA-256 of the bytes the table was parsed from.
    pub fingerprint: String,
    pub rows: usize,
    pub table: T,
}

/// Compute the SHA-256 fingerprint of artifact bytes.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Read, parse and validate one artifact without caching.
pub fn load_artifact<T: ResultTable>(path: &Path, options: &ParseOptions) -> Result<Artifact<T>> {
    let bytes = std::fs::read(path).map_err(|e| LoadError::from_io(path, e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let table = T::parse(&name, &bytes, options).map_err(|e| {
        warn!(
            event = "artifact.invalid",
            kind = %T::KIND,
            path = %path.display(),
            error = %e,
            "Artifact failed validation"
        );
        LoadError::Format(e)
    })?;

    let artifact = Artifact {
        kind: T::KIND,
        path: path.to_path_buf(),
        fingerprint: fingerprint(&bytes),
        rows: table.row_count(),
        table,
    };
    info!(
        event = "artifact.loaded",
        kind = %artifact.kind,
        path = %path.display(),
        rows = artifact.rows,
        fingerprint = %&artifact.fingerprint[..12],
        "Artifact loaded"
    );
    Ok(artifact)
}

/// Size and modification time of a file; `None` when it does not exist.
type FileStamp = Option<(u64, Option<SystemTime>)>;

fn file_stamp(path: &Path) -> FileStamp {
    std::fs::metadata(path)
        .ok()
        .map(|meta| (meta.len(), meta.modified().ok()))
}

/// A failed load that stays valid while the file is unchanged.
#[derive(Debug, Clone)]
struct Failure {
    stamp: FileStamp,
    /// `None` when the file was missing.
    format: Option<DataFormatError>,
}

impl Failure {
    fn from_error(stamp: FileStamp, err: &LoadError) -> Option<Self> {
        match err {
            LoadError::Missing { .. } => Some(Failure { stamp, format: None }),
            LoadError::Format(e) => Some(Failure {
                stamp,
                format: Some(e.clone()),
            }),
            LoadError::Io { .. } | LoadError::MissingRequired { .. } => None,
        }
    }

    fn to_error(&self, path: &Path) -> LoadError {
        match &self.format {
            Some(e) => LoadError::Format(e.clone()),
            None => LoadError::Missing {
                path: path.to_path_buf(),
            },
        }
    }
}

/// Cache of loaded artifacts, keyed by [`ArtifactKey`].
#[derive(Default)]
pub struct ArtifactCache {
    entries: HashMap<ArtifactKey, Arc<dyn Any + Send + Sync>>,
    failures: HashMap<ArtifactKey, Failure>,
    hits: u64,
    misses: u64,
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `path`, loading it on first use.
    pub fn get_or_load<T: ResultTable>(&mut self, path: &Path, options: &ParseOptions) -> Result<Arc<Artifact<T>>> {
        let key = ArtifactKey {
            kind: T::KIND,
            path: path.to_path_buf(),
        };

        if let Some(entry) = self.entries.get(&key) {
            if let Ok(artifact) = Arc::clone(entry).downcast::<Artifact<T>>() {
                self.hits += 1;
                debug!(event = "artifact.cache_hit", kind = %key.kind, path = %path.display());
                return Ok(artifact);
            }
        }

        let stamp = file_stamp(path);
        if let Some(failure) = self.failures.get(&key) {
            if failure.stamp == stamp {
                self.hits += 1;
                debug!(
                    event = "artifact.cache_hit",
                    kind = %key.kind,
                    path = %path.display(),
                    failed = true
                );
                return Err(failure.to_error(path));
            }
        }

        self.misses += 1;
        match load_artifact::<T>(path, options) {
            Ok(artifact) => {
                let artifact = Arc::new(artifact);
                let erased: Arc<dyn Any + Send + Sync> = artifact.clone();
                self.failures.remove(&key);
                self.entries.insert(key, erased);
                Ok(artifact)
            }
            Err(e) => {
                match Failure::from_error(stamp, &e) {
                    Some(failure) => {
                        self.failures.insert(key, failure);
                    }
                    None => {
                        self.failures.remove(&key);
                    }
                }
                Err(e)
            }
        }
    }

    pub fn contains(&self, kind: ArtifactKind, path: &Path) -> bool {
        self.entries.contains_key(&ArtifactKey {
            kind,
            path: path.to_path_buf(),
        })
    }

    /// Number of loaded tables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of remembered failures.
    pub fn failed_len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.failures.clear();
    }
}

impl std::fmt::Debug for ArtifactCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactCache")
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .field("failures", &self.failures.keys().collect::<Vec<_>>())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}
