//! Restore reporting.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::matcher::MatchResult;

/// One window that could not be restored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowFailure {
    pub title: String,
    pub app_name: String,
    pub error: String,
}

/// What a restore would do for one stored window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedRestore {
    pub title: String,
    pub app_name: String,
    /// Live window that would be moved, if any cleared the threshold.
    pub matched: Option<MatchResult>,
}

/// Structured outcome of a restore.
///
/// A returned report with a non-empty `failures` list is a partial success;
/// total failure is reported through an error instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestoreReport {
    pub snapshot_id: String,
    pub total_windows: usize,
    pub restored_windows: usize,
    pub failures: Vec<WindowFailure>,
    pub missing_apps: Vec<String>,
    pub planned: Vec<PlannedRestore>,
    pub success: bool,
    pub dry_run: bool,
    pub cancelled: bool,
    pub message: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl RestoreReport {
    pub fn start(snapshot_id: impl Into<String>, total_windows: usize) -> Self {
        let now = Utc::now();
        Self {
            snapshot_id: snapshot_id.into(),
            total_windows,
            restored_windows: 0,
            failures: Vec::new(),
            missing_apps: Vec::new(),
            planned: Vec::new(),
            success: false,
            dry_run: false,
            cancelled: false,
            message: String::new(),
            started_at: now,
            finished_at: now,
            duration_ms: 0,
        }
    }

    pub fn record_failure(&mut self, title: &str, app_name: &str, error: impl ToString) {
        self.failures.push(WindowFailure {
            title: title.to_string(),
            app_name: app_name.to_string(),
            error: error.to_string(),
        });
    }

    /// Stamp the end time and duration.
    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
        self.duration_ms = (self.finished_at - self.started_at).num_milliseconds();
    }

    /// Success and summary for a completed (or cancelled) window loop.
    pub fn summarize(&mut self) {
        self.success = self.restored_windows > 0;
        self.message = if self.cancelled {
            format!(
                "Restore cancelled after {}/{} windows",
                self.restored_windows, self.total_windows
            )
        } else if self.total_windows == 0 {
            "No windows to restore".to_string()
        } else if self.restored_windows == self.total_windows {
            "All windows restored successfully".to_string()
        } else {
            format!(
                "Restored {}/{} windows",
                self.restored_windows, self.total_windows
            )
        };
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_partial() {
        let mut report = RestoreReport::start("s1", 3);
        report.restored_windows = 2;
        report.record_failure("b", "code", "no suitable window found");
        report.summarize();
        assert!(report.success);
        assert_eq!(report.message, "Restored 2/3 windows");
        assert_eq!(report.failures.len(), 1);
        assert!(report.finished_at >= report.started_at);
        assert!(report.duration_ms >= 0);
    }

    #[test]
    fn test_summary_all_and_none() {
        let mut all = RestoreReport::start("s1", 2);
        all.restored_windows = 2;
        all.summarize();
        assert!(all.success);
        assert_eq!(all.message, "All windows restored successfully");

        let mut none = RestoreReport::start("s1", 2);
        none.summarize();
        assert!(!none.success);
        assert_eq!(none.message, "Restored 0/2 windows");
    }

    #[test]
    fn test_summary_empty_snapshot() {
        let mut report = RestoreReport::start("s1", 0);
        report.summarize();
        assert!(!report.success);
        assert_eq!(report.message, "No windows to restore");
    }

    #[test]
    fn test_summary_cancelled() {
        let mut report = RestoreReport::start("s1", 4);
        report.restored_windows = 1;
        report.cancelled = true;
        report.summarize();
        assert!(report.success);
        assert_eq!(report.message, "Restore cancelled after 1/4 windows");
    }
}
