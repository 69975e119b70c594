//! Error types for pdblink.
//!
//! Library crates use [`PdbLinkError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all pdblink operations.
#[derive(Debug, thiserror::Error)]
pub enum PdbLinkError {
    /// Configuration loading or validation error (bad template, bad override).
    #[error("config error: {message}")]
    Config { message: String },

    /// Something the link needs could not be found (repository, commit, files).
    #[error("discovery error: {message}")]
    Discovery { message: String },

    /// No hosting provider matched the candidate remote URLs.
    #[error("provider error: {0}")]
    Provider(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The symbol reader could not open or read the debug-symbol data.
    #[error("symbol error: {0}")]
    Symbols(String),

    /// A version-control command failed.
    #[error("repository error: {0}")]
    Repository(String),

    /// The external stream-injection tool failed.
    #[error("embed error: {0}")]
    Embed(String),

    /// Data validation error (malformed manifest, invalid revision, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PdbLinkError>;

impl PdbLinkError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a discovery error from any displayable message.
    pub fn discovery(msg: impl Into<String>) -> Self {
        Self::Discovery {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
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

    /// True for errors that mean "not a checkout" rather than "broken checkout".
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            Self::Discovery { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = PdbLinkError::config("template has only a revision placeholder");
        assert_eq!(
            err.to_string(),
            "config error: template has only a revision placeholder"
        );

        let err = PdbLinkError::Provider("no provider for ftp://example.com".into());
        assert!(err.to_string().contains("ftp://example.com"));
    }

    #[test]
    fn not_found_classification() {
        let err = PdbLinkError::io(
            "/nope",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_not_found());
        assert!(PdbLinkError::discovery("no .git").is_not_found());
        assert!(!PdbLinkError::Embed("exit 1".into()).is_not_found());
    }
}
