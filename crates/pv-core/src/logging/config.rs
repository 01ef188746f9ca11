//! Logging configuration.
//!
//! The filter is resolved once, highest priority first:
//! 1. `-v`/`-q` on the command line
//! 2. `PAAD_LOG`: a level name, or a full filter directive
//! 3. `RUST_LOG`: passed through as a filter directive
//! 4. `info` for the workspace crates
//!
//! The output format comes from `--log-format`, then `PAAD_LOG_FORMAT`.

/// Crates whose events are shown at the configured level.
pub const LOG_TARGETS: [&str; 5] = ["pv_core", "paad_viewer", "pv_loader", "pv_report", "pv_config"];

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable console format (default).
    #[default]
    Human,
    /// Machine-parseable JSON lines.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "console" | "pretty" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            _ => Err(format!("unknown log format: {} (expected human or jsonl)", s)),
        }
    }
}

/// Verbosity of the workspace crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    /// Level implied by `-v`/`-q` counts.
    pub fn from_verbosity(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return LogLevel::Error;
        }
        match verbose {
            0 => LogLevel::Info,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// Parse a bare level name; anything else is `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            "off" | "quiet" => Some(LogLevel::Off),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }

    /// Filter directive for this level, e.g. `pv_core=debug,paad_viewer=debug,…`.
    pub fn directive(self) -> String {
        LOG_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, self.as_str()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            filter: LogLevel::Info.directive(),
        }
    }
}

impl LogConfig {
    /// Create config from environment and CLI overrides.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        Self::from_vars(
            std::env::var("PAAD_LOG").ok().as_deref(),
            std::env::var("RUST_LOG").ok().as_deref(),
            std::env::var("PAAD_LOG_FORMAT").ok().as_deref(),
            cli_level,
            cli_format,
        )
    }

    fn from_vars(
        paad_log: Option<&str>,
        rust_log: Option<&str>,
        log_format: Option<&str>,
        cli_level: Option<LogLevel>,
        cli_format: Option<LogFormat>,
    ) -> Self {
        let env_filter = paad_log
            .or(rust_log)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| LogLevel::from_name(v).map_or_else(|| v.to_string(), LogLevel::directive));

        let filter = match cli_level {
            Some(level) => level.directive(),
            None => env_filter.unwrap_or_else(|| LogLevel::Info.directive()),
        };
        let format = cli_format
            .or_else(|| log_format.and_then(|v| v.parse().ok()))
            .unwrap_or_default();

        LogConfig { format, filter }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("jsonl".parse::<LogFormat>().unwrap(), LogFormat::Jsonl);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Jsonl);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(LogLevel::from_verbosity(0, false), LogLevel::Info);
        assert_eq!(LogLevel::from_verbosity(1, false), LogLevel::Debug);
        assert_eq!(LogLevel::from_verbosity(3, false), LogLevel::Trace);
        assert_eq!(LogLevel::from_verbosity(2, true), LogLevel::Error);
    }

    #[test]
    fn test_directive_covers_workspace_crates() {
        let directive = LogLevel::Debug.directive();
        assert!(directive.starts_with("pv_core=debug,"));
        assert!(directive.contains("pv_loader=debug"));
        assert_eq!(LogConfig::default().filter, LogLevel::Info.directive());
    }

    #[test]
    fn test_paad_log_level_name_wins_over_rust_log() {
        let config = LogConfig::from_vars(Some("Warning"), Some("debug"), None, None, None);
        assert_eq!(config.filter, LogLevel::Warn.directive());
    }

    #[test]
    fn test_directives_pass_through() {
        let config = LogConfig::from_vars(Some("pv_loader=trace"), None, None, None, None);
        assert_eq!(config.filter, "pv_loader=trace");

        let config = LogConfig::from_vars(None, Some("tiny_http=debug"), Some("jsonl"), None, None);
        assert_eq!(config.filter, "tiny_http=debug");
        assert_eq!(config.format, LogFormat::Jsonl);
    }

    #[test]
    fn test_cli_overrides_env() {
        let config = LogConfig::from_vars(
            Some("trace"),
            None,
            Some("jsonl"),
            Some(LogLevel::Error),
            Some(LogFormat::Human),
        );
        assert_eq!(config.filter, LogLevel::Error.directive());
        assert_eq!(config.format, LogFormat::Human);
    }

    #[test]
    fn test_blank_env_falls_back_to_info() {
        let config = LogConfig::from_vars(Some("  "), None, Some("yaml"), None, None);
        assert_eq!(config, LogConfig::default());
    }
}
