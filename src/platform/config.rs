// ZoneLens - platform/config.rs
//
// Platform-specific configuration, data directory resolution, and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for ZoneLens data and configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/zonelens/ or %APPDATA%\ZoneLens\config\)
    pub config_dir: PathBuf,

    /// Data directory for persisted settings.
    pub data_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();

            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                data_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            let fallback = PathBuf::from(".");
            Self {
                config_dir: fallback.clone(),
                data_dir: fallback,
            }
        }
    }

    /// Default location of `config.toml`.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility -- a newer
/// config file can be used with an older binary without crashing.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[backend]` section.
    pub backend: BackendSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
    /// `[[zones]]` seed entries for the in-memory catalog.
    pub zones: Vec<ZoneSeed>,
    /// `[[agents]]` seed entries for the in-memory catalog.
    pub agents: Vec<AgentSeed>,
}

/// `[backend]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct BackendSection {
    /// Backend kind: "mock", "local", or "http".
    pub kind: Option<String>,
    /// Base URL for the http backend.
    pub url: Option<String>,
    /// Project root for the local backend.
    pub root_dir: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Paths hidden from the default project's tree view.
    pub ignored_paths: Vec<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
    /// Log file path (empty = stderr only).
    pub file: Option<String>,
}

/// A zone preloaded into the mock or local backend's catalog at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct ZoneSeed {
    pub name: String,
    pub pattern: String,
    pub purpose: String,
    pub paths: Vec<String>,
}

/// An agent preloaded into the mock or local backend's catalog. An empty id
/// is generated by the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct AgentSeed {
    pub id: String,
    pub name: String,
    pub description: String,
    pub prompt: String,
}

/// Which backend serves trees, zones, and matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// Canned in-memory tree.
    #[default]
    Mock,
    /// Walk a directory on this machine.
    Local,
    /// Remote designer server.
    Http,
}

impl BackendKind {
    /// Parse a case-insensitive backend name.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "mock" => Some(Self::Mock),
            "local" => Some(Self::Local),
            "http" => Some(Self::Http),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Local => "local",
            Self::Http => "http",
        }
    }
}

/// Validated application configuration derived from `config.toml`.
///
/// All values are validated against named constants at load time.
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Backend --
    pub backend: BackendKind,
    pub backend_url: String,
    /// Local backend root; `None` means the current directory.
    pub root_dir: Option<PathBuf>,
    pub timeout_secs: u64,
    /// Ignored paths of the mock/local default project.
    pub ignored_paths: Vec<String>,

    // -- Seeds --
    pub zones: Vec<ZoneSeed>,
    pub agents: Vec<AgentSeed>,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
    /// Log file path.
    pub log_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            backend_url: constants::DEFAULT_BACKEND_URL.to_string(),
            root_dir: None,
            timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT_SECS,
            ignored_paths: Vec::new(),
            zones: Vec::new(),
            agents: Vec::new(),
            log_level: None,
            log_file: None,
        }
    }
}

/// Load and validate the config file at `config_path`.
///
/// Returns `AppConfig` with validated values and a list of non-fatal problems.
/// If the file does not exist, returns defaults with no warnings (first-run).
/// If the file is unreadable or unparseable, returns defaults with one
/// warning; the application still starts but the user is informed.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<ConfigError>) {
    let mut warnings: Vec<ConfigError> = Vec::new();

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), warnings);
    }

    let content = match std::fs::read_to_string(config_path) {
        Ok(c) => c,
        Err(e) => {
            warnings.push(ConfigError::Read {
                path: config_path.to_path_buf(),
                source: e,
            });
            return (AppConfig::default(), warnings);
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(e) => {
            warnings.push(ConfigError::Parse {
                path: config_path.to_path_buf(),
                source: e,
            });
            return (AppConfig::default(), warnings);
        }
    };

    tracing::info!(path = %config_path.display(), "Loaded config.toml");

    let config = validate(raw, &mut warnings);

    if !warnings.is_empty() {
        tracing::debug!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    (config, warnings)
}

/// Validate each field against named constants, accumulating all warnings.
fn validate(raw: RawConfig, warnings: &mut Vec<ConfigError>) -> AppConfig {
    let mut config = AppConfig::default();

    // -- Backend: kind --
    if let Some(ref kind) = raw.backend.kind {
        match BackendKind::parse(kind) {
            Some(k) => config.backend = k,
            None => warnings.push(ConfigError::InvalidValue {
                key: "[backend] kind",
                value: format!("\"{kind}\""),
                expected: "\"mock\", \"local\", or \"http\"".to_string(),
                fallback: BackendKind::default().as_str().to_string(),
            }),
        }
    }

    // -- Backend: url --
    if let Some(ref url) = raw.backend.url {
        let url = url.trim();
        if url.starts_with("http://") || url.starts_with("https://") {
            config.backend_url = url.to_string();
        } else {
            warnings.push(ConfigError::InvalidValue {
                key: "[backend] url",
                value: format!("\"{url}\""),
                expected: "an http:// or https:// URL".to_string(),
                fallback: constants::DEFAULT_BACKEND_URL.to_string(),
            });
        }
    }

    // -- Backend: root_dir --
    if let Some(ref root) = raw.backend.root_dir {
        if !root.is_empty() {
            config.root_dir = Some(PathBuf::from(root));
        }
    }

    // -- Backend: timeout_secs --
    if let Some(secs) = raw.backend.timeout_secs {
        if (constants::MIN_REQUEST_TIMEOUT_SECS..=constants::MAX_REQUEST_TIMEOUT_SECS)
            .contains(&secs)
        {
            config.timeout_secs = secs;
        } else {
            warnings.push(ConfigError::InvalidValue {
                key: "[backend] timeout_secs",
                value: secs.to_string(),
                expected: format!(
                    "{}-{}",
                    constants::MIN_REQUEST_TIMEOUT_SECS,
                    constants::MAX_REQUEST_TIMEOUT_SECS
                ),
                fallback: constants::DEFAULT_REQUEST_TIMEOUT_SECS.to_string(),
            });
        }
    }

    // -- Backend: ignored_paths --
    config.ignored_paths = raw
        .backend
        .ignored_paths
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect();

    // -- Zones --
    for (i, seed) in raw.zones.into_iter().enumerate() {
        if seed.name.trim().is_empty() {
            warnings.push(ConfigError::UnnamedSeed {
                table: "zones",
                index: i + 1,
            });
        } else {
            config.zones.push(seed);
        }
    }

    // -- Agents --
    for (i, seed) in raw.agents.into_iter().enumerate() {
        if seed.name.trim().is_empty() {
            warnings.push(ConfigError::UnnamedSeed {
                table: "agents",
                index: i + 1,
            });
        } else {
            config.agents.push(seed);
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.clone());
        } else {
            warnings.push(ConfigError::InvalidValue {
                key: "[logging] level",
                value: format!("\"{level}\""),
                expected: "error, warn, info, debug, or trace".to_string(),
                fallback: constants::DEFAULT_LOG_LEVEL.to_string(),
            });
        }
    }

    // -- Logging: file --
    if let Some(ref file) = raw.logging.file {
        if !file.is_empty() {
            config.log_file = Some(file.clone());
        }
    }

    config
}
