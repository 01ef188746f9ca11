//! PAAD Obesity Results Viewer
//!
//! The main entry point for paad-viewer, handling:
//! - One-shot page rendering for a selection
//! - The local HTTP viewer
//! - Artifact validation and row schemas
//! - Configuration display

use clap::{Args, Parser, Subcommand, ValueEnum};
use pv_common::{SelectionInput, SCHEMA_VERSION};
use pv_config::{load_config, LoadedConfig, ViewerConfig};
use pv_core::exit_codes::ExitCode;
use pv_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogFormat, LogLevel, Stage,
};
use pv_core::server;
use pv_core::session::{report_config, store_layout, ViewerSession};
use pv_loader::{ArtifactKind, ResultStore};
use pv_report::{ReportConfig, ReportTheme};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{error, info};

/// PAAD Obesity Results Viewer - browse BMI effects on tumour-microenvironment signatures
#[derive(Parser)]
#[command(name = "paad-viewer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to viewer.json (must exist when given)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the results directory
    #[arg(long, global = true, env = "PAAD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one page for a selection
    Render(RenderArgs),

    /// Serve the interactive viewer over HTTP
    Serve(ServeArgs),

    /// Validate every artifact and print a JSON report
    Check,

    /// Print the JSON Schema of one artifact's rows
    Schema(SchemaArgs),

    /// Print the effective configuration
    Config(ConfigArgs),

    /// Print version information
    Version,
}

// ============================================================================
// Command argument structs
// ============================================================================

/// Initial selection; anything unavailable falls back to defaults.
#[derive(Args, Debug, Default)]
struct SelectionArgs {
    /// Compartment key or label
    #[arg(long)]
    compartment: Option<String>,

    /// Cell type
    #[arg(long)]
    cell_type: Option<String>,

    /// Signature
    #[arg(long)]
    signature: Option<String>,

    /// BMI comparison (overweight_vs_normal, obese_vs_normal, obese_vs_overweight)
    #[arg(long)]
    comparison: Option<String>,

    /// View in front (heatmap, overview, forest, diagnostics, survival, proportions, signatures)
    #[arg(long)]
    plot: Option<String>,
}

impl SelectionArgs {
    fn to_input(&self) -> SelectionInput {
        SelectionInput {
            compartment: self.compartment.clone(),
            cell_type: self.cell_type.clone(),
            signature: self.signature.clone(),
            comparison: self.comparison.clone(),
            plot_kind: self.plot.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ThemeArg {
    Light,
    Dark,
    Auto,
}

impl From<ThemeArg> for ReportTheme {
    fn from(theme: ThemeArg) -> Self {
        match theme {
            ThemeArg::Light => ReportTheme::Light,
            ThemeArg::Dark => ReportTheme::Dark,
            ThemeArg::Auto => ReportTheme::Auto,
        }
    }
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Output file (stdout when omitted)
    #[arg(long, short = 'o')]
    out: Option<PathBuf>,

    #[command(flatten)]
    selection: SelectionArgs,

    /// Page title
    #[arg(long)]
    title: Option<String>,

    /// Colour theme
    #[arg(long, value_enum)]
    theme: Option<ThemeArg>,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to bind (overrides config)
    #[arg(long)]
    bind: Option<String>,

    /// Port (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Colour theme
    #[arg(long, value_enum)]
    theme: Option<ThemeArg>,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Artifact kind (effects, proportions, survival, energy, draws, stabl, signatures)
    artifact: String,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Print built-in defaults instead of the resolved configuration
    #[arg(long)]
    default: bool,
}

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(
        (cli.global.verbose > 0 || cli.global.quiet)
            .then(|| LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet)),
        cli.global.log_format,
    );
    init_logging(&log_config);

    let run_id = generate_run_id();
    info!(
        event = event_names::RUN_STARTED,
        stage = %Stage::Init,
        run_id = %run_id,
        version = env!("CARGO_PKG_VERSION"),
        "paad-viewer started"
    );

    let exit_code = match &cli.command {
        Commands::Render(args) => run_render(&cli.global, args, &run_id),
        Commands::Serve(args) => run_serve(&cli.global, args, &run_id),
        Commands::Check => run_check(&cli.global, &run_id),
        Commands::Schema(args) => run_schema(args),
        Commands::Config(args) => run_config(&cli.global, args),
        Commands::Version => {
            print_version();
            ExitCode::Clean
        }
    };

    info!(
        event = event_names::RUN_FINISHED,
        stage = %Stage::Init,
        run_id = %run_id,
        exit_code = exit_code.as_i32(),
        "paad-viewer finished"
    );
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Helpers
// ============================================================================

/// Resolve, read and validate the configuration, then apply `--data-dir`.
fn load_viewer_config(global: &GlobalOpts) -> Result<LoadedConfig, ExitCode> {
    match load_config(global.config.as_deref()) {
        Ok(mut loaded) => {
            if let Some(dir) = &global.data_dir {
                loaded.config = loaded.config.with_data_dir(dir);
            }
            info!(
                event = event_names::CONFIG_LOADED,
                stage = %Stage::Init,
                source = %loaded.source,
                path = ?loaded.path,
                data_dir = %loaded.config.data_dir.display(),
                "Configuration loaded"
            );
            Ok(loaded)
        }
        Err(e) => {
            error!(
                event = event_names::CONFIG_ERROR,
                stage = %Stage::Init,
                code = e.code(),
                error = %e,
                "Configuration error"
            );
            eprintln!("paad-viewer: configuration error: {}", e);
            Err(ExitCode::ConfigError)
        }
    }
}

/// Report an error on stderr and map it to an exit code.
fn fail(err: &pv_common::Error, run_id: &str) -> ExitCode {
    error!(
        event = event_names::INTERNAL_ERROR,
        run_id = %run_id,
        code = err.code(),
        category = %err.category(),
        error = %err,
        "Command failed"
    );
    eprintln!("paad-viewer: {}", err);
    eprintln!("hint: {}", err.remediation());
    ExitCode::from(err)
}

fn page_config(config: &ViewerConfig, title: Option<&String>, theme: Option<ThemeArg>) -> ReportConfig {
    let mut report = report_config(config);
    if let Some(title) = title {
        report = report.with_title(title.clone());
    }
    if let Some(theme) = theme {
        report = report.with_theme(theme.into());
    }
    report
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_render(global: &GlobalOpts, args: &RenderArgs, run_id: &str) -> ExitCode {
    let loaded = match load_viewer_config(global) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let report = page_config(&loaded.config, args.title.as_ref(), args.theme);

    let mut session = match ViewerSession::open(&loaded.config, report, run_id) {
        Ok(session) => session,
        Err(e) => return fail(&e, run_id),
    };
    let html = match session.page(args.selection.to_input()) {
        Ok((_, html)) => html,
        Err(e) => return fail(&e, run_id),
    };

    match &args.out {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &html) {
                return fail(&pv_common::Error::Io(e), run_id);
            }
            info!(
                event = event_names::PAGE_WRITTEN,
                stage = %Stage::Render,
                run_id = %run_id,
                path = %path.display(),
                bytes = html.len(),
                "Page written"
            );
        }
        None => println!("{}", html),
    }
    ExitCode::Clean
}

fn run_serve(global: &GlobalOpts, args: &ServeArgs, run_id: &str) -> ExitCode {
    let loaded = match load_viewer_config(global) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let bind = args
        .bind
        .clone()
        .unwrap_or_else(|| loaded.config.server.bind.clone());
    let port = args.port.unwrap_or(loaded.config.server.port);
    let addr: SocketAddr = match format!("{}:{}", bind, port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("paad-viewer: invalid bind address {}:{}: {}", bind, port, e);
            return ExitCode::ArgsError;
        }
    };

    let report = page_config(&loaded.config, None, args.theme);
    let session = match ViewerSession::open(&loaded.config, report, run_id) {
        Ok(session) => session,
        Err(e) => return fail(&e, run_id),
    };

    eprintln!("Serving PAAD results on http://{}/ (Ctrl-C to stop)", addr);
    match server::serve(session, addr) {
        Ok(()) => ExitCode::Clean,
        Err(e) => {
            error!(event = event_names::SERVER_ERROR, stage = %Stage::Serve, error = %e, "Server failed");
            eprintln!("paad-viewer: {}", e);
            ExitCode::IoError
        }
    }
}

fn run_check(global: &GlobalOpts, run_id: &str) -> ExitCode {
    let loaded = match load_viewer_config(global) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let mut store = ResultStore::new(store_layout(&loaded.config));
    let report = store.check_all();

    let response = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "run_id": run_id,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "status": if report.is_ok() { "ok" } else { "error" },
        "config_source": loaded.source.to_string(),
        "report": report,
    });
    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{}", json),
        Err(e) => return fail(&pv_common::Error::Json(e), run_id),
    }

    if report.missing_required() {
        ExitCode::DataMissing
    } else if !report.is_ok() {
        ExitCode::DataInvalid
    } else {
        ExitCode::Clean
    }
}

fn run_schema(args: &SchemaArgs) -> ExitCode {
    let kind: ArtifactKind = match args.artifact.parse() {
        Ok(kind) => kind,
        Err(e) => {
            eprintln!("paad-viewer: {}", e);
            return ExitCode::ArgsError;
        }
    };
    match serde_json::to_string_pretty(&kind.row_schema()) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::Clean
        }
        Err(e) => {
            eprintln!("paad-viewer: {}", e);
            ExitCode::InternalError
        }
    }
}

fn run_config(global: &GlobalOpts, args: &ConfigArgs) -> ExitCode {
    let config = if args.default {
        ViewerConfig::default()
    } else {
        match load_viewer_config(global) {
            Ok(loaded) => loaded.config,
            Err(code) => return code,
        }
    };
    match config.to_json_pretty() {
        Ok(json) => {
            println!("{}", json);
            ExitCode::Clean
        }
        Err(e) => {
            eprintln!("paad-viewer: {}", e);
            ExitCode::InternalError
        }
    }
}

fn print_version() {
    println!("paad-viewer {}", env!("CARGO_PKG_VERSION"));
    println!("schema {}", SCHEMA_VERSION);
}
