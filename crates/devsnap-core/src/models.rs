//! Core data models shared by the matcher, the diff engine, the stores and
//! the platform adapters.
//!
//! A [`Snapshot`] bundles everything captured at one point in time. Only its
//! [`Window`] list takes part in matching and restoration; terminals, browser
//! tabs and editor files are carried as opaque payload.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Visual state of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    #[default]
    Normal,
    Maximized,
    Minimized,
    Fullscreen,
}

impl WindowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowState::Normal => "normal",
            WindowState::Maximized => "maximized",
            WindowState::Minimized => "minimized",
            WindowState::Fullscreen => "fullscreen",
        }
    }
}

impl fmt::Display for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindowState {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "normal" | "" => Ok(WindowState::Normal),
            "maximized" => Ok(WindowState::Maximized),
            "minimized" => Ok(WindowState::Minimized),
            "fullscreen" => Ok(WindowState::Fullscreen),
            other => bail!("unknown window state '{}'", other),
        }
    }
}

/// A captured description of one on-screen application surface.
///
/// There is no stable cross-session key: at restore time the live window is
/// re-derived by [`WindowMatcher`](crate::matcher::WindowMatcher) from the
/// title, the owning application and the size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Window {
    /// Owning application identifier (executable or WM class name).
    pub app_name: String,
    #[serde(default)]
    pub app_path: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub state: WindowState,
    /// Workspace / virtual desktop index.
    #[serde(default)]
    pub workspace: i32,
    /// Stacking order, 0 = frontmost.
    #[serde(default)]
    pub z_index: i32,
    /// Opaque launch arguments, stored as-is.
    #[serde(default)]
    pub launch_args: Option<serde_json::Value>,
}

impl Window {
    pub fn new(app_name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            app_path: None,
            title: title.into(),
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            state: WindowState::Normal,
            workspace: 0,
            z_index: 0,
            launch_args: None,
        }
    }

    pub fn with_geometry(mut self, x: i32, y: i32, width: u32, height: u32) -> Self {
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_state(mut self, state: WindowState) -> Self {
        self.state = state;
        self
    }

    /// Title + application + width: the closest thing to an identity a
    /// window has within one candidate pool.
    pub fn same_identity(&self, other: &Window) -> bool {
        self.title == other.title && self.app_name == other.app_name && self.width == other.width
    }
}

/// A terminal session. Opaque to matching.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Terminal {
    pub terminal_app: String,
    #[serde(default)]
    pub working_directory: String,
    #[serde(default)]
    pub active_command: String,
    #[serde(default)]
    pub shell_type: String,
    #[serde(default)]
    pub env_vars: BTreeMap<String, String>,
}

/// A browser tab. Opaque to matching.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BrowserTab {
    pub browser_name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tab_index: i32,
    #[serde(default)]
    pub window_index: i32,
    #[serde(default)]
    pub is_pinned: bool,
}

/// A file open in an editor. Opaque to matching.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IdeFile {
    pub ide_name: String,
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub cursor_line: i32,
    #[serde(default)]
    pub cursor_column: i32,
    #[serde(default)]
    pub is_active: bool,
}

/// Ambient source-control context attached to a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GitContext {
    pub repo_path: String,
    pub branch: String,
    pub is_dirty: bool,
    pub head_hash: Option<String>,
}

/// A named, timestamped bundle of captured components.
///
/// Created by the orchestrator during capture, persisted once, and
/// immutable afterwards except for deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub git: Option<GitContext>,
    pub windows: Vec<Window>,
    pub terminals: Vec<Terminal>,
    pub browser_tabs: Vec<BrowserTab>,
    pub ide_files: Vec<IdeFile>,
}

impl Snapshot {
    /// A fresh, empty snapshot with a random UUID and `now` timestamps.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            created_at: now,
            updated_at: now,
            tags: Vec::new(),
            git: None,
            windows: Vec::new(),
            terminals: Vec::new(),
            browser_tabs: Vec::new(),
            ide_files: Vec::new(),
        }
    }

    pub fn git_branch(&self) -> Option<&str> {
        self.git.as_ref().map(|g| g.branch.as_str())
    }

    pub fn git_repo(&self) -> Option<&str> {
        self.git.as_ref().map(|g| g.repo_path.as_str())
    }

    /// Copy of this snapshot with every component list emptied.
    pub fn metadata(&self) -> Snapshot {
        Snapshot {
            windows: Vec::new(),
            terminals: Vec::new(),
            browser_tabs: Vec::new(),
            ide_files: Vec::new(),
            ..self.clone()
        }
    }
}

/// Criteria for listing snapshots. Results are newest first.
#[derive(Debug, Clone, Default)]
pub struct SnapshotFilter {
    /// Substring of the git repository path.
    pub project: Option<String>,
    /// Exact git branch.
    pub branch: Option<String>,
    /// Every listed tag must be present.
    pub tags: Vec<String>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl SnapshotFilter {
    pub fn matches(&self, snapshot: &Snapshot) -> bool {
        if let Some(project) = &self.project {
            match snapshot.git_repo() {
                Some(repo) if repo.contains(project.as_str()) => {}
                _ => return false,
            }
        }
        if let Some(branch) = &self.branch {
            if snapshot.git_branch() != Some(branch.as_str()) {
                return false;
            }
        }
        self.tags.iter().all(|t| snapshot.tags.contains(t))
    }

    /// Apply `offset` and `limit` to an already filtered, ordered list.
    pub fn paginate<T>(&self, items: Vec<T>) -> Vec<T> {
        let iter = items.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}
