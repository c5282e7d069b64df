use thiserror::Error;

use crate::report::RestoreReport;

pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Failures surfaced by snapshot operations.
///
/// Individual windows that fail to restore are not errors; they are collected
/// in [`RestoreReport::failures`].
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot not found: {0}")]
    NotFound(String),

    #[error("capture failed: {step}: {cause:#}")]
    Capture {
        step: &'static str,
        cause: anyhow::Error,
    },

    #[error("cannot restore: missing applications: {}", .missing.join(", "))]
    MissingApplications {
        missing: Vec<String>,
        report: Box<RestoreReport>,
    },

    #[error("failed to {step}: {cause:#}")]
    Persistence {
        step: &'static str,
        cause: anyhow::Error,
    },

    #[error("failed to {operation}: {cause:#}")]
    Repository {
        operation: &'static str,
        cause: anyhow::Error,
    },

    #[error("platform error: {operation}: {cause:#}")]
    Platform {
        operation: &'static str,
        cause: anyhow::Error,
    },

    #[error("operation cancelled")]
    Cancelled,
}

impl SnapshotError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SnapshotError::NotFound(_))
    }
}
