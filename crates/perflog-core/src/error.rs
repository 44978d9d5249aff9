//! Error types for the performance logger

use perflog_telemetry::SessionId;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, PerfError>;

#[derive(Debug, thiserror::Error)]
pub enum PerfError {
    #[error("session {0} is not active")]
    SessionNotFound(SessionId),

    #[error("operation '{operation}' timed out after {after:?}")]
    TimedOut { operation: String, after: Duration },

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outcome of a measured unit of work that failed
///
/// `Operation` carries the work's own error untouched; `Perf` is raised by
/// the timing layer itself.
#[derive(Debug, thiserror::Error)]
pub enum MeasureError<E> {
    #[error(transparent)]
    Perf(#[from] PerfError),

    #[error("{0}")]
    Operation(E),
}

impl<E> MeasureError<E> {
    /// The work's own error, if that is what failed
    pub fn into_operation(self) -> Option<E> {
        match self {
            MeasureError::Operation(e) => Some(e),
            MeasureError::Perf(_) => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, MeasureError::Perf(PerfError::TimedOut { .. }))
    }

    pub fn is_session_not_found(&self) -> bool {
        matches!(self, MeasureError::Perf(PerfError::SessionNotFound(_)))
    }
}
