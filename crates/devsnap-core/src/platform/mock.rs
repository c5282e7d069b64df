//! In-memory [`PlatformAdapter`] for tests and headless use.
//!
//! Holds a scripted set of live windows and auxiliary components, can be told
//! to fail any enumeration or the restore of specific titles, and records
//! every restore request it receives.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::matcher::WindowMatcher;
use crate::models::{BrowserTab, IdeFile, Terminal, Window};

use super::PlatformAdapter;

#[derive(Default)]
struct MockState {
    windows: Vec<Window>,
    terminals: Vec<Terminal>,
    browser_tabs: Vec<BrowserTab>,
    ide_files: Vec<IdeFile>,
    fail_windows: bool,
    fail_terminals: bool,
    fail_browser_tabs: bool,
    fail_ide_files: bool,
    fail_restore_titles: HashSet<String>,
    restored: Vec<String>,
    get_windows_calls: usize,
}

/// Scriptable platform adapter.
pub struct MockPlatform {
    state: RwLock<MockState>,
    matcher: WindowMatcher,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::with_matcher(WindowMatcher::default())
    }

    pub fn with_matcher(matcher: WindowMatcher) -> Self {
        Self {
            state: RwLock::new(MockState::default()),
            matcher,
        }
    }

    pub fn with_windows(windows: Vec<Window>) -> Self {
        let platform = Self::new();
        platform.set_windows(windows);
        platform
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MockState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MockState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_windows(&self, windows: Vec<Window>) {
        self.write().windows = windows;
    }

    pub fn set_terminals(&self, terminals: Vec<Terminal>) {
        self.write().terminals = terminals;
    }

    pub fn set_browser_tabs(&self, tabs: Vec<BrowserTab>) {
        self.write().browser_tabs = tabs;
    }

    pub fn set_ide_files(&self, files: Vec<IdeFile>) {
        self.write().ide_files = files;
    }

    pub fn fail_windows(&self, fail: bool) {
        self.write().fail_windows = fail;
    }

    pub fn fail_terminals(&self, fail: bool) {
        self.write().fail_terminals = fail;
    }

    pub fn fail_browser_tabs(&self, fail: bool) {
        self.write().fail_browser_tabs = fail;
    }

    pub fn fail_ide_files(&self, fail: bool) {
        self.write().fail_ide_files = fail;
    }

    /// Make `restore_window` fail for any target with this title.
    pub fn fail_restore_of(&self, title: impl Into<String>) {
        self.write().fail_restore_titles.insert(title.into());
    }

    /// Titles passed to `restore_window` that succeeded, in call order.
    pub fn restored_titles(&self) -> Vec<String> {
        self.read().restored.clone()
    }

    pub fn get_windows_calls(&self) -> usize {
        self.read().get_windows_calls
    }

    pub fn windows(&self) -> Vec<Window> {
        self.read().windows.clone()
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformAdapter for MockPlatform {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get_windows(&self) -> Result<Vec<Window>> {
        let mut state = self.write();
        state.get_windows_calls += 1;
        if state.fail_windows {
            bail!("window enumeration unavailable");
        }
        Ok(state.windows.clone())
    }

    async fn restore_window(&self, window: &Window) -> Result<()> {
        let mut state = self.write();
        if state.fail_restore_titles.contains(&window.title) {
            bail!("failed to reposition '{}'", window.title);
        }

        let found = match self.matcher.find_best_match(window, &state.windows) {
            Some(found) => found,
            None => bail!(
                "no suitable window found for: {} (app: {})",
                window.title,
                window.app_name
            ),
        };

        log::debug!(
            "mock restore matched '{}' with '{}' (score {})",
            window.title,
            found.window.title,
            found.score
        );

        if let Some(live) = state.windows.iter_mut().find(|w| **w == found.window) {
            live.x = window.x;
            live.y = window.y;
            live.width = window.width;
            live.height = window.height;
            live.state = window.state;
        }
        state.restored.push(window.title.clone());
        Ok(())
    }

    async fn get_terminals(&self) -> Result<Vec<Terminal>> {
        let state = self.read();
        if state.fail_terminals {
            bail!("terminal enumeration unavailable");
        }
        Ok(state.terminals.clone())
    }

    async fn get_browser_tabs(&self) -> Result<Vec<BrowserTab>> {
        let state = self.read();
        if state.fail_browser_tabs {
            bail!("browser tab enumeration unavailable");
        }
        Ok(state.browser_tabs.clone())
    }

    async fn get_ide_files(&self) -> Result<Vec<IdeFile>> {
        let state = self.read();
        if state.fail_ide_files {
            bail!("editor file enumeration unavailable");
        }
        Ok(state.ide_files.clone())
    }
}
