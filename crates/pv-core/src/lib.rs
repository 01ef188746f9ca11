//! PAAD Obesity Results Viewer
//!
//! This library wires the loader, the selection state and the renderer into
//! a running viewer:
//! - Exit codes for CLI operations
//! - Structured logging setup and event names
//! - The viewer session (load + render cycle)
//! - The local HTTP viewer
//!
//! The binary entry point is in `main.rs`.

pub mod exit_codes;
pub mod logging;
pub mod server;
pub mod session;

pub use exit_codes::ExitCode;
pub use session::ViewerSession;
