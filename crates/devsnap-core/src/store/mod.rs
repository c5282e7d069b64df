//! Storage abstraction for snapshots.
//!
//! The [`Repository`] trait defines every persistence operation the
//! orchestrator needs, enabling pluggable backends (SQLite, in-memory).
//!
//! A capture is persisted as several independent writes: the snapshot
//! record first, then one call per non-empty component list. A failure part
//! way through leaves the earlier writes in place; nothing here rolls them
//! back.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{BrowserTab, IdeFile, Snapshot, SnapshotFilter, Terminal, Window};

/// Abstract storage backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`create_snapshot`](Repository::create_snapshot) | Insert snapshot metadata |
/// | [`get_snapshot`](Repository::get_snapshot) | Fetch snapshot metadata by id |
/// | [`list_snapshots`](Repository::list_snapshots) | Filtered listing, newest first |
/// | [`delete_snapshot`](Repository::delete_snapshot) | Remove a snapshot and its components |
/// | `save_*` / `get_*` | Component lists for one snapshot |
#[async_trait]
pub trait Repository: Send + Sync {
    /// Insert the snapshot record. Component lists on `snapshot` are ignored.
    async fn create_snapshot(&self, snapshot: &Snapshot) -> Result<()>;

    /// Snapshot metadata with empty component lists, or `None` if unknown.
    async fn get_snapshot(&self, id: &str) -> Result<Option<Snapshot>>;

    async fn list_snapshots(&self, filter: &SnapshotFilter) -> Result<Vec<Snapshot>>;

    /// Returns `true` if a snapshot was removed.
    async fn delete_snapshot(&self, id: &str) -> Result<bool>;

    async fn save_windows(&self, snapshot_id: &str, windows: &[Window]) -> Result<()>;

    async fn save_terminals(&self, snapshot_id: &str, terminals: &[Terminal]) -> Result<()>;

    async fn save_browser_tabs(&self, snapshot_id: &str, tabs: &[BrowserTab]) -> Result<()>;

    async fn save_ide_files(&self, snapshot_id: &str, files: &[IdeFile]) -> Result<()>;

    /// Stored windows in capture order.
    async fn get_windows(&self, snapshot_id: &str) -> Result<Vec<Window>>;

    async fn get_terminals(&self, snapshot_id: &str) -> Result<Vec<Terminal>>;

    async fn get_browser_tabs(&self, snapshot_id: &str) -> Result<Vec<BrowserTab>>;

    async fn get_ide_files(&self, snapshot_id: &str) -> Result<Vec<IdeFile>>;
}
