//! Pre-persistence filtering of captured text.

use crate::models::Snapshot;

/// Strips sensitive substrings from a snapshot in place.
///
/// Runs after capture and before anything reaches the repository. The
/// orchestrator does not know which fields an implementation touches.
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, snapshot: &mut Snapshot);
}

/// Leaves snapshots untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSanitizer;

impl Sanitizer for NoopSanitizer {
    fn sanitize(&self, _snapshot: &mut Snapshot) {}
}
