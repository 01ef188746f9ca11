//! Error types for artifact loading.

use pv_common::DataFormatError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading a result artifact.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The artifact file does not exist.
    #[error("artifact not found: {}", .path.display())]
    Missing { path: PathBuf },

    /// Required startup artifacts do not exist.
    #[error("required artifacts missing: {}", display_paths(.paths))]
    MissingRequired { paths: Vec<PathBuf> },

    /// The file exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The content failed schema or invariant validation.
    #[error(transparent)]
    Format(#[from] DataFormatError),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl LoadError {
    /// Classify an I/O error for `path`, mapping "not found" to [`LoadError::Missing`].
    pub fn from_io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::Missing {
                path: path.to_path_buf(),
            }
        } else {
            LoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, LoadError::Missing { .. } | LoadError::MissingRequired { .. })
    }

    /// Message with paths shown relative to `base`, for display to users.
    pub fn display_relative(&self, base: &Path) -> String {
        let rel = |p: &Path| p.strip_prefix(base).unwrap_or(p).display().to_string();
        match self {
            LoadError::Missing { path } => format!("artifact not found: {}", rel(path)),
            LoadError::MissingRequired { paths } => format!(
                "required artifacts missing: {}",
                paths.iter().map(|p| rel(p)).collect::<Vec<_>>().join(", ")
            ),
            LoadError::Io { path, source } => format!("failed to read {}: {}", rel(path), source),
            LoadError::Format(e) => e.to_string(),
        }
    }
}

impl From<LoadError> for pv_common::Error {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Missing { path } => pv_common::Error::MissingArtifact {
                path: path.display().to_string(),
            },
            LoadError::MissingRequired { paths } => pv_common::Error::MissingArtifact {
                path: display_paths(&paths),
            },
            LoadError::Io { source, .. } => pv_common::Error::Io(source),
            LoadError::Format(e) => pv_common::Error::DataFormat(e),
        }
    }
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoadError>;
