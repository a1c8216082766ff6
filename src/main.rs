// ZoneLens - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading and CLI overrides
// 3. Logging initialisation (debug mode support)
// 4. Backend selection and command dispatch

mod cli;

pub use zonelens::app;
pub use zonelens::core;
pub use zonelens::platform;
pub use zonelens::util;

use clap::{Parser, Subcommand, ValueEnum};
use platform::config::{self, BackendKind, PlatformPaths};
use std::path::PathBuf;

/// ZoneLens - zone annotation engine for project source trees.
///
/// Resolves which files and directories belong to which named zones (explicit
/// path lists plus regex patterns) and evaluates patterns live against a
/// project tree.
#[derive(Parser, Debug)]
#[command(name = "zonelens", version, about)]
struct Cli {
    /// Backend serving trees and zones (overrides config.toml).
    #[arg(short = 'b', long, value_enum)]
    backend: Option<BackendArg>,

    /// Base URL of the http backend.
    #[arg(long)]
    url: Option<String>,

    /// Project root: a local directory (implies --backend local), or the
    /// server-side root when --backend http is given.
    #[arg(short = 'r', long)]
    root: Option<PathBuf>,

    /// Project id (default: the backend's first project).
    #[arg(short = 'p', long, default_value = "")]
    project: String,

    /// Path to config.toml (default: platform config directory).
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    Mock,
    Local,
    Http,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Mock => BackendKind::Mock,
            BackendArg::Local => BackendKind::Local,
            BackendArg::Http => BackendKind::Http,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    Light,
    Dark,
    Toggle,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List projects.
    Projects,
    /// List agents.
    Agents,
    /// Print the project tree annotated with zone membership.
    Tree {
        /// Include paths the project ignores.
        #[arg(long)]
        all: bool,
        /// Print only the subtree at this path.
        #[arg(long)]
        at: Option<String>,
    },
    /// List the project's zones.
    Zones,
    /// List paths matching a pattern.
    Match { pattern: String },
    /// Resolve every zone and print path-to-zone membership.
    Resolve,
    /// Create a zone.
    CreateZone {
        name: String,
        #[arg(long, default_value = "")]
        pattern: String,
        #[arg(long, default_value = "")]
        purpose: String,
        /// Constraint line (repeatable).
        #[arg(long = "constraint")]
        constraints: Vec<String>,
        #[arg(long, default_value = "")]
        agent: String,
    },
    /// Add a path to a zone's explicit paths.
    Assign { zone_id: String, path: String },
    /// Hide a path and its subtree from the tree view.
    Ignore { path: String },
    /// Show a previously ignored path again.
    Unignore { path: String },
    /// Read patterns line by line from stdin and evaluate them debounced.
    Playground,
    /// Show or change the persisted colour theme.
    Theme {
        #[arg(value_enum)]
        value: Option<ThemeArg>,
    },
}

fn main() {
    let cli = Cli::parse();

    let paths = PlatformPaths::resolve();
    let config_path = cli.config.clone().unwrap_or_else(|| paths.config_file());
    let (mut app_config, warnings) = config::load_config(&config_path);

    // Logging comes after config so [logging] can take effect; config
    // warnings are re-emitted once a subscriber exists.
    util::logging::init(
        cli.debug,
        app_config.log_level.as_deref(),
        app_config.log_file.as_deref(),
    );
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    // CLI overrides
    if let Some(root) = &cli.root {
        app_config.root_dir = Some(root.clone());
        app_config.backend = BackendKind::Local;
    }
    if let Some(backend) = cli.backend {
        app_config.backend = backend.into();
    }
    if let Some(url) = &cli.url {
        app_config.backend_url = url.clone();
    }

    tracing::info!(
        version = util::constants::APP_VERSION,
        backend = app_config.backend.as_str(),
        debug = cli.debug,
        "ZoneLens starting"
    );

    let options = cli::Options {
        project: cli.project,
        json: cli.json,
    };

    if let Err(e) = cli::run(cli.command, &app_config, &paths, &options) {
        tracing::error!(error = %e, "Command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
