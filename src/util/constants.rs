// ZoneLens - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "ZoneLens";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "ZoneLens";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Pattern playground
// =============================================================================

/// Quiescence window for pattern edits (ms). Keystrokes arriving within this
/// window of each other collapse into a single evaluation of the final value.
pub const PATTERN_DEBOUNCE_MS: u64 = 400;

/// Marker token a backend embeds in an error message to flag a malformed
/// pattern explicitly.
pub const INVALID_PATTERN_MARKER: &str = "INVALID_PATTERN";

/// Case-insensitive keywords that mark a free-text failure as a pattern
/// problem rather than a transport problem.
pub const PATTERN_ERROR_KEYWORDS: &[&str] = &["invalid", "regex", "syntax"];

/// Maximum number of evaluation results drained from the channel per poll.
pub const MAX_EVAL_MESSAGES_PER_POLL: usize = 64;

/// Event-loop tick of the interactive playground when no timer is pending (ms).
pub const PLAYGROUND_TICK_MS: u64 = 25;

/// Upper bound a one-shot command waits for a background load (seconds).
pub const COMMAND_WAIT_SECS: u64 = 600;

// =============================================================================
// Tree model
// =============================================================================

/// Display name given to the root node of a project tree.
pub const ROOT_NODE_NAME: &str = ".";

/// Path separator used in all relative tree paths regardless of platform.
pub const PATH_SEPARATOR: char = '/';

/// Hard upper bound on directory recursion when walking a local project root.
pub const MAX_TREE_DEPTH: usize = 64;

/// How long a local directory walk is reused for pattern matches (ms).
pub const TREE_REUSE_MS: u64 = 2_000;

// =============================================================================
// Backend
// =============================================================================

/// Default HTTP backend base URL (the designer server's default listen address).
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8080";

/// Path prefix under which the backend mounts its API routes.
pub const API_PREFIX: &str = "/api";

/// Default per-request timeout for the HTTP backend (seconds).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Minimum user-configurable request timeout (seconds).
pub const MIN_REQUEST_TIMEOUT_SECS: u64 = 1;

/// Maximum user-configurable request timeout (seconds).
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Identifier of the implicit project the local and mock backends expose.
pub const DEFAULT_PROJECT_ID: &str = "default";

// =============================================================================
// Files
// =============================================================================

/// Configuration file name, resolved next to the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Persisted UI settings file name inside the data directory.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Temp file suffix used for atomic writes.
pub const TEMP_FILE_SUFFIX: &str = ".tmp";

// =============================================================================
// Logging
// =============================================================================

/// Default log level when neither RUST_LOG, --debug, nor config set one.
pub const DEFAULT_LOG_LEVEL: &str = "info";
