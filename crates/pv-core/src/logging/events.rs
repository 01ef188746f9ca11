//! Stable event names and processing stages.
//!
//! Every log line carries an `event` field so JSONL output can be filtered
//! without parsing messages.

use serde::{Deserialize, Serialize};

/// Processing stages of one viewer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Artifact loading and validation.
    Load,
    /// Folding user input into the selection.
    Select,
    /// Chart and page generation.
    Render,
    /// HTTP viewer.
    Serve,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Load => "load",
            Stage::Select => "select",
            Stage::Render => "render",
            Stage::Serve => "serve",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Config
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_ERROR: &str = "config.error";

    // Load stage (emitted by pv-loader)
    pub const ARTIFACT_LOADED: &str = "artifact.loaded";
    pub const ARTIFACT_INVALID: &str = "artifact.invalid";
    pub const ARTIFACT_CACHE_HIT: &str = "artifact.cache_hit";
    pub const ARTIFACTS_MISSING: &str = "artifacts.missing";
    pub const CATALOG_COMPARTMENT_UNAVAILABLE: &str = "catalog.compartment_unavailable";
    pub const CHECK_FINISHED: &str = "check.finished";

    // Select stage
    pub const SELECTION_CHANGED: &str = "selection.changed";
    pub const SELECTION_CORRECTED: &str = "selection.corrected";

    // Render stage
    pub const VIEW_UNAVAILABLE: &str = "view.unavailable";
    pub const VIEW_RENDERED: &str = "view.rendered";
    pub const PAGE_WRITTEN: &str = "page.written";

    // Serve stage
    pub const SERVER_STARTED: &str = "server.started";
    pub const SERVER_REQUEST: &str = "server.request";
    pub const SERVER_ERROR: &str = "server.error";

    pub const INTERNAL_ERROR: &str = "internal_error";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_serialization() {
        assert_eq!(serde_json::to_string(&Stage::Select).unwrap(), "\"select\"");
        assert_eq!(Stage::Render.to_string(), "render");
    }

    #[test]
    fn test_event_names_are_dotted() {
        for name in [
            event_names::RUN_STARTED,
            event_names::SELECTION_CORRECTED,
            event_names::VIEW_RENDERED,
            event_names::SERVER_REQUEST,
        ] {
            let (stage, what) = name.split_once('.').unwrap();
            assert!(!stage.is_empty() && !what.is_empty());
        }
    }
}
