//! Source-control context detection.

use std::path::Path;

use anyhow::Result;

use crate::models::GitContext;

/// Supplies the ambient branch / dirty / head fields of a snapshot.
///
/// `Ok(None)` means `path` is not inside a repository; that is not an error.
pub trait GitDetector: Send + Sync {
    fn detect_context(&self, path: &Path) -> Result<Option<GitContext>>;
}

/// Detector that never finds a repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGit;

impl GitDetector for NoGit {
    fn detect_context(&self, _path: &Path) -> Result<Option<GitContext>> {
        Ok(None)
    }
}
