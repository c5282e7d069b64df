//! Platform abstraction: enumerating live windows and moving them.
//!
//! Each call is a complete, blocking unit of work from the caller's point of
//! view: `get_windows` returns the full current window list or fails, never a
//! partial one. OS handles used during enumeration live only for the duration
//! of the call.

pub mod mock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{BrowserTab, IdeFile, Terminal, Window};

/// Operating-system window adapter.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_windows`](PlatformAdapter::get_windows) | Enumerate live windows |
/// | [`restore_window`](PlatformAdapter::restore_window) | Match a captured window against live ones and reposition it |
/// | [`get_terminals`](PlatformAdapter::get_terminals) | Enumerate terminal sessions (best-effort) |
/// | [`get_browser_tabs`](PlatformAdapter::get_browser_tabs) | Enumerate browser tabs (best-effort) |
/// | [`get_ide_files`](PlatformAdapter::get_ide_files) | Enumerate editor files (best-effort) |
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// Short adapter name, e.g. `"wmctrl"` or `"mock"`.
    fn name(&self) -> &str;

    async fn get_windows(&self) -> Result<Vec<Window>>;

    /// Locate the live window best matching `window` and apply its stored
    /// position, size and state. Fails when no live window clears the
    /// matching threshold.
    async fn restore_window(&self, window: &Window) -> Result<()>;

    async fn get_terminals(&self) -> Result<Vec<Terminal>>;

    async fn get_browser_tabs(&self) -> Result<Vec<BrowserTab>>;

    async fn get_ide_files(&self) -> Result<Vec<IdeFile>>;
}
