//! Error types for fleettally.
//!
//! Library crates use [`FleetError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all fleettally operations.
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Transport or auth failure while reading a source.
    #[error("source {source_id} unavailable: {message}")]
    SourceUnavailable { source_id: String, message: String },

    /// The upstream row source asked us to slow down.
    #[error("source {source_id} throttled by upstream")]
    Throttled { source_id: String },

    /// A region key that is not in the configured registry.
    #[error("unknown source: {0}")]
    UnknownSource(String),

    /// Malformed upstream payload (e.g. unreadable CSV).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Every source attempted by a combined refresh failed.
    #[error("all {attempted} sources failed to load")]
    AllSourcesFailed { attempted: usize },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FleetError>;

impl FleetError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Transport failure for the named source.
    pub fn unavailable(source_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_id: source_id.into(),
            message: msg.into(),
        }
    }

    /// Throttling signal for the named source.
    pub fn throttled(source_id: impl Into<String>) -> Self {
        Self::Throttled {
            source_id: source_id.into(),
        }
    }

    /// Whether this error is the upstream throttling signal (retryable once).
    pub fn is_throttle(&self) -> bool {
        matches!(self, Self::Throttled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = FleetError::config("missing region name");
        assert_eq!(err.to_string(), "config error: missing region name");

        let err = FleetError::unavailable("Андижон", "HTTP 403");
        assert!(err.to_string().contains("Андижон"));
        assert!(err.to_string().contains("HTTP 403"));
    }

    #[test]
    fn throttle_is_distinguished() {
        assert!(FleetError::throttled("X").is_throttle());
        assert!(!FleetError::unavailable("X", "boom").is_throttle());
        assert!(!FleetError::AllSourcesFailed { attempted: 3 }.is_throttle());
    }
}
