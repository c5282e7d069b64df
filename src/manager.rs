//! Capture / restore / diff orchestration.
//!
//! [`SnapshotManager`] drives the collaborators (platform adapter,
//! repository, sanitizer, git detector) and the window matcher. It keeps no
//! state between calls; each operation runs to completion or returns an
//! error, and every operation takes a [`CancellationToken`] that is checked
//! before work starts and, during restore, between windows.
//!
//! # Restore policy
//!
//! One window failing to restore never aborts the batch. Failures are
//! collected in the [`RestoreReport`], and the restore counts as a success
//! when at least one window was moved. Only an unknown snapshot, a storage
//! read failure or the missing-application gate produce an error.
//!
//! # Persistence
//!
//! A capture is written as one snapshot record followed by one write per
//! non-empty component list. When a later write fails the earlier ones stay
//! in place, so a failed capture can leave a partial snapshot behind.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use devsnap_core::diff::{diff_snapshots, DiffResult};
use devsnap_core::error::{Result, SnapshotError};
use devsnap_core::git::{GitDetector, NoGit};
use devsnap_core::matcher::WindowMatcher;
use devsnap_core::models::{Snapshot, SnapshotFilter, Window};
use devsnap_core::platform::PlatformAdapter;
use devsnap_core::report::{PlannedRestore, RestoreReport};
use devsnap_core::sanitize::{NoopSanitizer, Sanitizer};
use devsnap_core::store::Repository;

use crate::config::{CaptureConfig, RestoreConfig};

/// What to capture and how.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Terminal enumeration failing aborts the capture when this is set.
    pub include_terminals: bool,
    pub include_browser_tabs: bool,
    pub include_ide_files: bool,
    pub sanitize: bool,
    /// Look in this directory for git context instead of the manager's default.
    pub git_path: Option<PathBuf>,
}

impl CaptureOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_config(name, &CaptureConfig::default())
    }

    pub fn from_config(name: impl Into<String>, config: &CaptureConfig) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            tags: Vec::new(),
            include_terminals: config.include_terminals,
            include_browser_tabs: config.include_browser_tabs,
            include_ide_files: config.include_ide_files,
            sanitize: config.sanitize,
            git_path: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RestoreOptions {
    /// Check that every application in the snapshot is running first.
    pub validate_before_restore: bool,
    /// With validation on, continue despite missing applications.
    pub skip_missing_apps: bool,
    /// Report what would happen without moving any window.
    pub dry_run: bool,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self::from_config(&RestoreConfig::default())
    }
}

impl RestoreOptions {
    pub fn from_config(config: &RestoreConfig) -> Self {
        Self {
            validate_before_restore: config.validate_before_restore,
            skip_missing_apps: config.skip_missing_apps,
            dry_run: false,
        }
    }
}

pub struct SnapshotManager {
    repo: Arc<dyn Repository>,
    platform: Arc<dyn PlatformAdapter>,
    sanitizer: Arc<dyn Sanitizer>,
    git: Arc<dyn GitDetector>,
    git_path: PathBuf,
    matcher: WindowMatcher,
}

impl SnapshotManager {
    /// Manager with no sanitization, no git detection and default matching.
    pub fn new(repo: Arc<dyn Repository>, platform: Arc<dyn PlatformAdapter>) -> Self {
        Self {
            repo,
            platform,
            sanitizer: Arc::new(NoopSanitizer),
            git: Arc::new(NoGit),
            git_path: PathBuf::from("."),
            matcher: WindowMatcher::default(),
        }
    }

    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn Sanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn with_git_detector(mut self, git: Arc<dyn GitDetector>, path: impl Into<PathBuf>) -> Self {
        self.git = git;
        self.git_path = path.into();
        self
    }

    /// Matcher used for dry-run plans and previews.
    pub fn with_matcher(mut self, matcher: WindowMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn platform_name(&self) -> &str {
        self.platform.name()
    }

    /// Enumerate the current state, attach git context, sanitize if asked,
    /// and persist the result.
    pub async fn capture(
        &self,
        options: CaptureOptions,
        cancel: &CancellationToken,
    ) -> Result<Snapshot> {
        ensure_active(cancel)?;

        let mut snapshot = Snapshot::new(options.name);
        snapshot.description = options.description;
        snapshot.tags = options.tags;

        snapshot.windows =
            self.platform
                .get_windows()
                .await
                .map_err(|cause| SnapshotError::Capture {
                    step: "enumerate windows",
                    cause,
                })?;

        if options.include_terminals {
            snapshot.terminals =
                self.platform
                    .get_terminals()
                    .await
                    .map_err(|cause| SnapshotError::Capture {
                        step: "enumerate terminals",
                        cause,
                    })?;
        }

        if options.include_browser_tabs {
            match self.platform.get_browser_tabs().await {
                Ok(tabs) => snapshot.browser_tabs = tabs,
                Err(e) => log::warn!("skipping browser tabs: {:#}", e),
            }
        }

        if options.include_ide_files {
            match self.platform.get_ide_files().await {
                Ok(files) => snapshot.ide_files = files,
                Err(e) => log::warn!("skipping editor files: {:#}", e),
            }
        }

        // Detection shells out to git, so it runs on the blocking pool.
        let git_path = options.git_path.unwrap_or_else(|| self.git_path.clone());
        let git = self.git.clone();
        let path = git_path.clone();
        match tokio::task::spawn_blocking(move || git.detect_context(&path)).await {
            Ok(Ok(context)) => snapshot.git = context,
            Ok(Err(e)) => log::warn!(
                "git context unavailable for {}: {:#}",
                git_path.display(),
                e
            ),
            Err(e) => log::warn!("git detection task failed: {}", e),
        }

        if options.sanitize {
            self.sanitizer.sanitize(&mut snapshot);
        }

        ensure_active(cancel)?;
        self.persist(&snapshot).await?;

        log::info!(
            "captured snapshot {} '{}': {} windows, {} terminals, {} tabs, {} files",
            snapshot.id,
            snapshot.name,
            snapshot.windows.len(),
            snapshot.terminals.len(),
            snapshot.browser_tabs.len(),
            snapshot.ide_files.len()
        );
        Ok(snapshot)
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        let id = snapshot.id.as_str();
        let persistence =
            |step: &'static str| move |cause: anyhow::Error| SnapshotError::Persistence { step, cause };

        self.repo
            .create_snapshot(snapshot)
            .await
            .map_err(persistence("create snapshot"))?;
        if !snapshot.windows.is_empty() {
            self.repo
                .save_windows(id, &snapshot.windows)
                .await
                .map_err(persistence("save windows"))?;
        }
        if !snapshot.terminals.is_empty() {
            self.repo
                .save_terminals(id, &snapshot.terminals)
                .await
                .map_err(persistence("save terminals"))?;
        }
        if !snapshot.browser_tabs.is_empty() {
            self.repo
                .save_browser_tabs(id, &snapshot.browser_tabs)
                .await
                .map_err(persistence("save browser tabs"))?;
        }
        if !snapshot.ide_files.is_empty() {
            self.repo
                .save_ide_files(id, &snapshot.ide_files)
                .await
                .map_err(persistence("save editor files"))?;
        }
        Ok(())
    }

    /// Move every stored window of snapshot `id` back into place.
    pub async fn restore(
        &self,
        id: &str,
        options: RestoreOptions,
        cancel: &CancellationToken,
    ) -> Result<RestoreReport> {
        ensure_active(cancel)?;

        self.require_snapshot(id).await?;
        let windows = self.stored_windows(id).await?;
        let mut report = RestoreReport::start(id, windows.len());

        let mut live = None;
        if options.validate_before_restore {
            let current = self.current_windows("enumerate windows for validation").await?;
            report.missing_apps = missing_applications(&windows, &current);

            if !report.missing_apps.is_empty() {
                if !options.skip_missing_apps {
                    report.success = false;
                    report.message =
                        format!("Missing applications: {}", report.missing_apps.join(", "));
                    report.finish();
                    return Err(SnapshotError::MissingApplications {
                        missing: report.missing_apps.clone(),
                        report: Box::new(report),
                    });
                }
                log::warn!(
                    "restoring {} despite missing applications: {}",
                    id,
                    report.missing_apps.join(", ")
                );
            }
            live = Some(current);
        }

        if options.dry_run {
            if let Some(live) = &live {
                report.planned = self.plan(&windows, live);
            }
            report.dry_run = true;
            report.success = true;
            report.message = "Dry run completed - no changes made".to_string();
            report.finish();
            return Ok(report);
        }

        for window in &windows {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            match self.platform.restore_window(window).await {
                Ok(()) => {
                    report.restored_windows += 1;
                    log::debug!("restored '{}' ({})", window.title, window.app_name);
                }
                Err(e) => {
                    log::warn!("failed to restore '{}': {:#}", window.title, e);
                    report.record_failure(&window.title, &window.app_name, format!("{:#}", e));
                }
            }
        }

        report.summarize();
        log::info!("restore {}: {}", id, report.message);
        Ok(report)
    }

    /// Match every stored window against the live set without moving
    /// anything. Stored windows with no acceptable match have `matched: None`.
    pub async fn preview(&self, id: &str, cancel: &CancellationToken) -> Result<Vec<PlannedRestore>> {
        ensure_active(cancel)?;
        self.require_snapshot(id).await?;
        let windows = self.stored_windows(id).await?;
        let live = self.current_windows("enumerate live windows").await?;
        Ok(self.plan(&windows, &live))
    }

    fn plan(&self, windows: &[Window], live: &[Window]) -> Vec<PlannedRestore> {
        let matches = self.matcher.match_all(windows, live);
        windows
            .iter()
            .map(|w| {
                let matched = matches.get(&w.title).cloned();
                if let Some(m) = &matched {
                    log::debug!("'{}' matches '{}' (score {})", w.title, m.window.title, m.score);
                }
                PlannedRestore {
                    title: w.title.clone(),
                    app_name: w.app_name.clone(),
                    matched,
                }
            })
            .collect()
    }

    pub async fn list(
        &self,
        filter: &SnapshotFilter,
        cancel: &CancellationToken,
    ) -> Result<Vec<Snapshot>> {
        ensure_active(cancel)?;
        self.repo
            .list_snapshots(filter)
            .await
            .map_err(|cause| SnapshotError::Repository {
                operation: "list snapshots",
                cause,
            })
    }

    /// Snapshot `id` with every component list loaded.
    pub async fn show(&self, id: &str, cancel: &CancellationToken) -> Result<Snapshot> {
        ensure_active(cancel)?;
        let mut snapshot = self.require_snapshot(id).await?;
        let read = |operation: &'static str| {
            move |cause: anyhow::Error| SnapshotError::Repository { operation, cause }
        };

        snapshot.windows = self.stored_windows(id).await?;
        snapshot.terminals = self
            .repo
            .get_terminals(id)
            .await
            .map_err(read("load terminals"))?;
        snapshot.browser_tabs = self
            .repo
            .get_browser_tabs(id)
            .await
            .map_err(read("load browser tabs"))?;
        snapshot.ide_files = self
            .repo
            .get_ide_files(id)
            .await
            .map_err(read("load editor files"))?;
        Ok(snapshot)
    }

    pub async fn delete(&self, id: &str, cancel: &CancellationToken) -> Result<()> {
        ensure_active(cancel)?;
        let deleted = self
            .repo
            .delete_snapshot(id)
            .await
            .map_err(|cause| SnapshotError::Persistence {
                step: "delete snapshot",
                cause,
            })?;
        if !deleted {
            return Err(SnapshotError::NotFound(id.to_string()));
        }
        log::info!("deleted snapshot {}", id);
        Ok(())
    }

    pub async fn diff(
        &self,
        source_id: &str,
        target_id: &str,
        cancel: &CancellationToken,
    ) -> Result<DiffResult> {
        ensure_active(cancel)?;
        let source = self.require_snapshot(source_id).await?;
        let target = self.require_snapshot(target_id).await?;
        let source_windows = self.stored_windows(source_id).await?;
        let target_windows = self.stored_windows(target_id).await?;
        Ok(diff_snapshots(
            &source,
            &target,
            &source_windows,
            &target_windows,
        ))
    }

    /// Windows currently on screen, as the platform reports them.
    pub async fn live_windows(&self, cancel: &CancellationToken) -> Result<Vec<Window>> {
        ensure_active(cancel)?;
        self.current_windows("enumerate live windows").await
    }

    async fn require_snapshot(&self, id: &str) -> Result<Snapshot> {
        self.repo
            .get_snapshot(id)
            .await
            .map_err(|cause| SnapshotError::Repository {
                operation: "load snapshot",
                cause,
            })?
            .ok_or_else(|| SnapshotError::NotFound(id.to_string()))
    }

    async fn stored_windows(&self, id: &str) -> Result<Vec<Window>> {
        self.repo
            .get_windows(id)
            .await
            .map_err(|cause| SnapshotError::Repository {
                operation: "load windows",
                cause,
            })
    }

    async fn current_windows(&self, operation: &'static str) -> Result<Vec<Window>> {
        self.platform
            .get_windows()
            .await
            .map_err(|cause| SnapshotError::Platform { operation, cause })
    }
}

fn ensure_active(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(SnapshotError::Cancelled);
    }
    Ok(())
}

/// Applications referenced by `stored` with no live window, in first-seen
/// order without duplicates.
fn missing_applications(stored: &[Window], live: &[Window]) -> Vec<String> {
    let running: HashSet<&str> = live.iter().map(|w| w.app_name.as_str()).collect();
    let mut seen = HashSet::new();
    stored
        .iter()
        .map(|w| w.app_name.as_str())
        .filter(|app| seen.insert(*app) && !running.contains(app))
        .map(str::to_string)
        .collect()
}
