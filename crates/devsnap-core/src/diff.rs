//! Snapshot comparison.
//!
//! Windows are compared by title only: two windows with identical titles are
//! indistinguishable here. Output lists are sorted so the result does not
//! depend on capture order.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::{Snapshot, Window};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    pub source_id: String,
    pub target_id: String,
    /// Branch or repository path differs (including one side having no
    /// git context at all).
    pub git_changed: bool,
    /// Titles present only in the target.
    pub added_windows: Vec<String>,
    /// Titles present only in the source.
    pub removed_windows: Vec<String>,
    /// Number of distinct titles present in both.
    pub common_windows: usize,
}

impl DiffResult {
    pub fn is_unchanged(&self) -> bool {
        !self.git_changed && self.added_windows.is_empty() && self.removed_windows.is_empty()
    }
}

/// Compare two snapshots and their window lists. Pure; no I/O.
pub fn diff_snapshots(
    source: &Snapshot,
    target: &Snapshot,
    source_windows: &[Window],
    target_windows: &[Window],
) -> DiffResult {
    let source_titles: BTreeSet<&str> = source_windows.iter().map(|w| w.title.as_str()).collect();
    let target_titles: BTreeSet<&str> = target_windows.iter().map(|w| w.title.as_str()).collect();

    let added_windows = target_titles
        .difference(&source_titles)
        .map(|t| t.to_string())
        .collect();
    let removed_windows = source_titles
        .difference(&target_titles)
        .map(|t| t.to_string())
        .collect();
    let common_windows = source_titles.intersection(&target_titles).count();

    let git_changed =
        source.git_branch() != target.git_branch() || source.git_repo() != target.git_repo();

    DiffResult {
        source_id: source.id.clone(),
        target_id: target.id.clone(),
        git_changed,
        added_windows,
        removed_windows,
        common_windows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GitContext;

    fn titled(titles: &[&str]) -> Vec<Window> {
        titles.iter().map(|t| Window::new("app", *t)).collect()
    }

    fn git(repo: &str, branch: &str) -> Option<GitContext> {
        Some(GitContext {
            repo_path: repo.to_string(),
            branch: branch.to_string(),
            is_dirty: false,
            head_hash: None,
        })
    }

    #[test]
    fn test_added_removed_common() {
        let a = Snapshot::new("a");
        let b = Snapshot::new("b");
        let result = diff_snapshots(&a, &b, &titled(&["A", "B"]), &titled(&["B", "C"]));
        assert_eq!(result.added_windows, vec!["C"]);
        assert_eq!(result.removed_windows, vec!["A"]);
        assert_eq!(result.common_windows, 1);
        assert_eq!(result.source_id, a.id);
        assert_eq!(result.target_id, b.id);
        assert!(!result.git_changed);
    }

    #[test]
    fn test_symmetry() {
        let a = Snapshot::new("a");
        let b = Snapshot::new("b");
        let wa = titled(&["one", "two", "three", "two"]);
        let wb = titled(&["three", "four", "five"]);
        let ab = diff_snapshots(&a, &b, &wa, &wb);
        let ba = diff_snapshots(&b, &a, &wb, &wa);
        assert_eq!(ab.added_windows, ba.removed_windows);
        assert_eq!(ab.removed_windows, ba.added_windows);
        assert_eq!(ab.common_windows, ba.common_windows);
    }

    #[test]
    fn test_duplicate_titles_count_once() {
        let a = Snapshot::new("a");
        let result = diff_snapshots(&a, &a, &titled(&["x", "x"]), &titled(&["x"]));
        assert_eq!(result.common_windows, 1);
        assert!(result.is_unchanged());
    }

    #[test]
    fn test_git_changed() {
        let mut a = Snapshot::new("a");
        let mut b = Snapshot::new("b");
        assert!(!diff_snapshots(&a, &b, &[], &[]).git_changed);

        a.git = git("/src/p", "main");
        assert!(diff_snapshots(&a, &b, &[], &[]).git_changed);

        b.git = git("/src/p", "main");
        assert!(!diff_snapshots(&a, &b, &[], &[]).git_changed);

        b.git = git("/src/p", "feature");
        assert!(diff_snapshots(&a, &b, &[], &[]).git_changed);

        b.git = git("/src/other", "main");
        assert!(diff_snapshots(&a, &b, &[], &[]).git_changed);

        // Dirty flag and hash are not part of the comparison.
        b.git = Some(GitContext {
            is_dirty: true,
            head_hash: Some("abc".into()),
            ..git("/src/p", "main").unwrap()
        });
        assert!(!diff_snapshots(&a, &b, &[], &[]).git_changed);
    }
}
