//! User-facing reporting sink.
//!
//! The link pipeline reports through a [`Reporter`] it is handed instead of a
//! process-wide logger, so callers decide where messages go.

/// Severity-leveled message sink.
pub trait Reporter: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards every message to `tracing` at the matching level.
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn debug(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warning(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }
}

/// No-op reporter for headless/test usage.
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn debug(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn warning(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}
