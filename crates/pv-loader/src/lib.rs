//! Result loader for the PAAD viewer.
//!
//! Turns the static artifacts exported by the analysis pipeline into
//! validated, shared, read-only tables:
//! - [`artifact`]: artifact kinds, file names and row schemas
//! - [`parse`]: CSV/JSON parsing through the validating table constructors
//! - [`cache`]: per-identity cache handing out `Arc`s
//! - [`store`]: one data directory, startup checks and full validation

pub mod artifact;
pub mod cache;
pub mod error;
pub mod parse;
pub mod store;

pub use artifact::ArtifactKind;
pub use cache::{fingerprint, load_artifact, Artifact, ArtifactCache, ArtifactKey};
pub use error::{LoadError, Result};
pub use parse::{ParseOptions, ResultTable};
pub use store::{ArtifactCheck, CheckReport, CheckStatus, CompartmentSpec, ResultStore, StoreLayout};
