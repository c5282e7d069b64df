//! In-memory [`Repository`] implementation for testing.
//!
//! Uses `HashMap`s behind `std::sync::RwLock`. Listing semantics mirror the
//! SQLite store: newest first, then [`SnapshotFilter`] criteria, then
//! offset/limit.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::models::{BrowserTab, IdeFile, Snapshot, SnapshotFilter, Terminal, Window};

use super::Repository;

#[derive(Default)]
struct Components {
    windows: Vec<Window>,
    terminals: Vec<Terminal>,
    browser_tabs: Vec<BrowserTab>,
    ide_files: Vec<IdeFile>,
}

/// In-memory store for tests.
#[derive(Default)]
pub struct InMemoryRepository {
    snapshots: RwLock<HashMap<String, Snapshot>>,
    components: RwLock<HashMap<String, Components>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn ensure_exists(&self, snapshot_id: &str) -> Result<()> {
        let snapshots = self.snapshots.read().unwrap_or_else(PoisonError::into_inner);
        if !snapshots.contains_key(snapshot_id) {
            bail!("snapshot {} does not exist", snapshot_id);
        }
        Ok(())
    }

    fn update_components(&self, snapshot_id: &str, f: impl FnOnce(&mut Components)) -> Result<()> {
        self.ensure_exists(snapshot_id)?;
        let mut components = self.components.write().unwrap_or_else(PoisonError::into_inner);
        f(components.entry(snapshot_id.to_string()).or_default());
        Ok(())
    }

    fn read_components<T>(&self, snapshot_id: &str, f: impl FnOnce(&Components) -> T) -> Option<T> {
        let components = self.components.read().unwrap_or_else(PoisonError::into_inner);
        components.get(snapshot_id).map(f)
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let mut snapshots = self.snapshots.write().unwrap_or_else(PoisonError::into_inner);
        if snapshots.contains_key(&snapshot.id) {
            bail!("snapshot {} already exists", snapshot.id);
        }
        snapshots.insert(snapshot.id.clone(), snapshot.metadata());
        Ok(())
    }

    async fn get_snapshot(&self, id: &str) -> Result<Option<Snapshot>> {
        let snapshots = self.snapshots.read().unwrap_or_else(PoisonError::into_inner);
        Ok(snapshots.get(id).cloned())
    }

    async fn list_snapshots(&self, filter: &SnapshotFilter) -> Result<Vec<Snapshot>> {
        let snapshots = self.snapshots.read().unwrap_or_else(PoisonError::into_inner);
        let mut matching: Vec<Snapshot> = snapshots
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(filter.paginate(matching))
    }

    async fn delete_snapshot(&self, id: &str) -> Result<bool> {
        let removed = self
            .snapshots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some();
        self.components
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        Ok(removed)
    }

    async fn save_windows(&self, snapshot_id: &str, windows: &[Window]) -> Result<()> {
        self.update_components(snapshot_id, |c| c.windows.extend_from_slice(windows))
    }

    async fn save_terminals(&self, snapshot_id: &str, terminals: &[Terminal]) -> Result<()> {
        self.update_components(snapshot_id, |c| c.terminals.extend_from_slice(terminals))
    }

    async fn save_browser_tabs(&self, snapshot_id: &str, tabs: &[BrowserTab]) -> Result<()> {
        self.update_components(snapshot_id, |c| c.browser_tabs.extend_from_slice(tabs))
    }

    async fn save_ide_files(&self, snapshot_id: &str, files: &[IdeFile]) -> Result<()> {
        self.update_components(snapshot_id, |c| c.ide_files.extend_from_slice(files))
    }

    async fn get_windows(&self, snapshot_id: &str) -> Result<Vec<Window>> {
        Ok(self
            .read_components(snapshot_id, |c| c.windows.clone())
            .unwrap_or_default())
    }

    async fn get_terminals(&self, snapshot_id: &str) -> Result<Vec<Terminal>> {
        Ok(self
            .read_components(snapshot_id, |c| c.terminals.clone())
            .unwrap_or_default())
    }

    async fn get_browser_tabs(&self, snapshot_id: &str) -> Result<Vec<BrowserTab>> {
        Ok(self
            .read_components(snapshot_id, |c| c.browser_tabs.clone())
            .unwrap_or_default())
    }

    async fn get_ide_files(&self, snapshot_id: &str) -> Result<Vec<IdeFile>> {
        Ok(self
            .read_components(snapshot_id, |c| c.ide_files.clone())
            .unwrap_or_default())
    }
}
