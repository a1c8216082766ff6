// ZoneLens - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation between layers; every error keeps its
// causal chain for diagnostic logging.

use crate::util::constants::{INVALID_PATTERN_MARKER, PATTERN_ERROR_KEYWORDS};
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all ZoneLens operations.
#[derive(Debug)]
pub enum ZoneLensError {
    /// A backend (mock, local filesystem, or HTTP) call failed.
    Provider(ProviderError),

    /// Persisted UI settings could not be written.
    Settings(SettingsError),

    /// A one-shot pattern evaluation failed.
    Eval(EvalError),

    /// Command output could not be rendered as JSON.
    Render(serde_json::Error),
}

impl fmt::Display for ZoneLensError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider(e) => write!(f, "Backend error: {e}"),
            Self::Settings(e) => write!(f, "Settings error: {e}"),
            Self::Eval(e) => write!(f, "{e}"),
            Self::Render(e) => write!(f, "Cannot render output: {e}"),
        }
    }
}

impl std::error::Error for ZoneLensError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Provider(e) => Some(e),
            Self::Settings(e) => Some(e),
            Self::Eval(e) => Some(e),
            Self::Render(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Provider errors
// ---------------------------------------------------------------------------

/// Errors reported by a `BlueprintProvider` implementation.
#[derive(Debug)]
pub enum ProviderError {
    /// The pattern was rejected as a malformed regular expression.
    InvalidPattern { pattern: String, message: String },

    /// A project or zone id did not resolve.
    NotFound { kind: &'static str, id: String },

    /// A mutation was rejected because a field is missing or malformed.
    InvalidInput { field: &'static str, reason: String },

    /// The project root is missing, unreadable, or not a directory.
    RootUnreadable { path: PathBuf, reason: String },

    /// The backend answered with a non-success status and a free-text message.
    Status { status: u16, message: String },

    /// The request never produced a response (connect, TLS, timeout).
    Transport { url: String, source: Box<ureq::Error> },

    /// The response body was not the expected JSON shape.
    Decode {
        context: &'static str,
        source: serde_json::Error,
    },

    /// The backend has no way to perform the operation.
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPattern { pattern, message } => {
                write!(f, "{INVALID_PATTERN_MARKER}: '{pattern}': {message}")
            }
            Self::NotFound { kind, id } => write!(f, "{kind} '{id}' not found"),
            Self::InvalidInput { field, reason } => write!(f, "Field '{field}': {reason}"),
            Self::RootUnreadable { path, reason } => {
                write!(f, "Root '{}' is unreadable: {reason}", path.display())
            }
            Self::Status { status, message } => {
                write!(f, "Backend returned {status}: {message}")
            }
            Self::Transport { url, source } => {
                write!(f, "Request to '{url}' failed: {source}")
            }
            Self::Decode { context, source } => {
                write!(f, "Malformed {context} response: {source}")
            }
            Self::Unsupported { backend, operation } => {
                write!(f, "The {backend} backend does not support {operation}")
            }
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport { source, .. } => Some(source.as_ref()),
            Self::Decode { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ProviderError> for ZoneLensError {
    fn from(e: ProviderError) -> Self {
        Self::Provider(e)
    }
}

// ---------------------------------------------------------------------------
// Pattern evaluation errors
// ---------------------------------------------------------------------------

/// Outcome of a failed pattern evaluation, bucketed into exactly two kinds.
///
/// Only `Pattern` is a user-correctable input problem; `Transport` is an
/// environment problem that may succeed on retry with the same pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// The pattern is not a valid regular expression.
    Pattern { pattern: String, reason: String },

    /// The evaluation could not be completed for any other reason.
    Transport { reason: String },
}

impl EvalError {
    /// Returns true for the user-correctable kind.
    pub fn is_pattern(&self) -> bool {
        matches!(self, Self::Pattern { .. })
    }

    /// Classify a free-text failure message for `pattern`.
    pub fn from_message(pattern: &str, message: &str) -> Self {
        if looks_like_pattern_error(message) {
            Self::Pattern {
                pattern: pattern.to_string(),
                reason: message.to_string(),
            }
        } else {
            Self::Transport {
                reason: message.to_string(),
            }
        }
    }

    /// Classify a provider failure for `pattern`.
    ///
    /// Typed failures map directly; a backend status message is free text
    /// and goes through the keyword heuristic.
    pub fn from_provider(pattern: &str, err: ProviderError) -> Self {
        match err {
            ProviderError::InvalidPattern { message, .. } => Self::Pattern {
                pattern: pattern.to_string(),
                reason: message,
            },
            ProviderError::Status { message, .. } => Self::from_message(pattern, &message),
            other => Self::Transport {
                reason: other.to_string(),
            },
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern { pattern, reason } => {
                write!(f, "Invalid pattern '{pattern}': {reason}")
            }
            Self::Transport { reason } => write!(f, "Failed to get matching paths: {reason}"),
        }
    }
}

impl std::error::Error for EvalError {}

impl From<EvalError> for ZoneLensError {
    fn from(e: EvalError) -> Self {
        Self::Eval(e)
    }
}

/// True if `message` reads as an invalid-pattern report.
pub fn looks_like_pattern_error(message: &str) -> bool {
    if message.contains(INVALID_PATTERN_MARKER) {
        return true;
    }
    let lower = message.to_lowercase();
    PATTERN_ERROR_KEYWORDS.iter().any(|k| lower.contains(k))
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// A problem found while loading config.toml.
///
/// None of these stop startup: the affected value (or the whole file) falls
/// back to its default and the error is reported as a warning.
#[derive(Debug)]
pub enum ConfigError {
    /// The file exists but could not be read.
    Read { path: PathBuf, source: io::Error },

    /// The file is not valid TOML for the expected sections.
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A key holds a value outside what it accepts.
    InvalidValue {
        key: &'static str,
        value: String,
        expected: String,
        fallback: String,
    },

    /// A `[[zones]]` or `[[agents]]` seed (1-based `index`) lacks a name.
    UnnamedSeed { table: &'static str, index: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => write!(
                f,
                "Could not read config file '{}': {source}. Using defaults.",
                path.display()
            ),
            Self::Parse { path, source } => write!(
                f,
                "Failed to parse config file '{}': {source}. Using defaults.",
                path.display()
            ),
            Self::InvalidValue {
                key,
                value,
                expected,
                fallback,
            } => write!(
                f,
                "{key} = {value} is not valid. Expected {expected}. Using default ({fallback})."
            ),
            Self::UnnamedSeed { table, index } => {
                write!(f, "[[{table}]] entry {index} has no name. Skipped.")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Settings errors
// ---------------------------------------------------------------------------

/// Errors writing persisted UI settings. Reads never fail (defaults are used).
#[derive(Debug)]
pub enum SettingsError {
    /// Serialisation to JSON failed.
    Serialise { source: serde_json::Error },

    /// I/O error creating the data directory or writing the file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialise { source } => write!(f, "Cannot serialise settings: {source}"),
            Self::Io { path, source } => {
                write!(f, "Cannot write settings '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Serialise { source } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<SettingsError> for ZoneLensError {
    fn from(e: SettingsError) -> Self {
        Self::Settings(e)
    }
}

/// Convenience type alias for ZoneLens results.
pub type Result<T> = std::result::Result<T, ZoneLensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_token_is_pattern_error() {
        assert!(looks_like_pattern_error("INVALID_PATTERN: missing ]"));
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert!(looks_like_pattern_error("error parsing REGEXP: missing ]"));
        assert!(looks_like_pattern_error("Syntax error near position 3"));
        assert!(looks_like_pattern_error("Invalid escape"));
    }

    #[test]
    fn test_generic_failure_is_transport() {
        let err = EvalError::from_message("src", "connection refused");
        assert!(!err.is_pattern());
        assert_eq!(
            err,
            EvalError::Transport {
                reason: "connection refused".to_string()
            }
        );
    }

    #[test]
    fn test_status_message_goes_through_heuristic() {
        let err = EvalError::from_provider(
            "[abc",
            ProviderError::Status {
                status: 400,
                message: "error parsing regexp: missing closing ]: `[abc`".to_string(),
            },
        );
        assert!(err.is_pattern());

        let err = EvalError::from_provider(
            "src",
            ProviderError::Status {
                status: 500,
                message: "database is locked".to_string(),
            },
        );
        assert!(!err.is_pattern());
    }

    #[test]
    fn test_typed_not_found_is_transport_even_with_keyword_free_text() {
        let err = EvalError::from_provider(
            "src",
            ProviderError::NotFound {
                kind: "project",
                id: "invalid-id".to_string(),
            },
        );
        assert!(!err.is_pattern());
    }
}
