//! PAAD viewer configuration loading and validation.
//!
//! This crate provides:
//! - Typed structs for viewer.json
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation

pub mod resolve;
pub mod validate;
pub mod viewer;

pub use resolve::{resolve_config, ConfigPath, ConfigSource};
pub use validate::{validate_viewer, ValidationError, ValidationResult};
pub use viewer::{
    ArtifactFiles, CompartmentConfig, DisplayLimits, LoadedConfig, ServerConfig, ViewerConfig,
};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// Resolve, read and validate the viewer configuration.
///
/// Falls back to built-in defaults when no file is found.
pub fn load_config(cli_path: Option<&std::path::Path>) -> ValidationResult<LoadedConfig> {
    let resolved = resolve_config(cli_path);
    let config = match &resolved.path {
        Some(path) => ViewerConfig::from_file(path)?,
        None => ViewerConfig::default(),
    };
    validate_viewer(&config)?;
    Ok(LoadedConfig {
        config,
        path: resolved.path,
        source: resolved.source,
    })
}
