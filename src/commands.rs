//! CLI entry points.
//!
//! Each `run_*` function opens the database, builds a [`SnapshotManager`]
//! from the config, performs one operation and prints the result to stdout,
//! either as human-readable text or, where offered, as pretty JSON.

use anyhow::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use devsnap_core::matcher::WindowMatcher;
use devsnap_core::models::{Snapshot, SnapshotFilter};

use crate::config::Config;
use crate::db;
use crate::git::GitCli;
use crate::manager::{CaptureOptions, RestoreOptions, SnapshotManager};
use crate::migrate;
use crate::platform::create_platform;
use crate::sanitize::RedactingSanitizer;
use crate::sqlite_store::SqliteRepository;

/// Connect, ensure the schema, and wire every collaborator from `config`.
pub async fn open_manager(config: &Config) -> Result<(SnapshotManager, SqlitePool)> {
    let pool = db::connect(config).await?;
    migrate::apply_schema(&pool).await?;

    let manager = SnapshotManager::new(
        Arc::new(SqliteRepository::new(pool.clone())),
        create_platform(config)?,
    )
    .with_sanitizer(Arc::new(RedactingSanitizer::new(config.sanitize.clone())?))
    .with_git_detector(Arc::new(GitCli::new()), config.git.path.clone())
    .with_matcher(WindowMatcher::new(config.matching));

    log::debug!("using platform adapter '{}'", manager.platform_name());
    Ok((manager, pool))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_time(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub async fn run_init(config: &Config) -> Result<()> {
    migrate::run_migrations(config).await?;
    println!("Database initialized at {}", config.db.path.display());
    Ok(())
}

pub async fn run_capture(
    config: &Config,
    options: CaptureOptions,
    cancel: &CancellationToken,
) -> Result<()> {
    let (manager, pool) = open_manager(config).await?;
    let result = manager.capture(options, cancel).await;
    pool.close().await;
    let snapshot = result?;

    println!("Captured snapshot {}", snapshot.id);
    println!("  name:         {}", snapshot.name);
    println!("  windows:      {}", snapshot.windows.len());
    println!("  terminals:    {}", snapshot.terminals.len());
    println!("  browser tabs: {}", snapshot.browser_tabs.len());
    println!("  editor files: {}", snapshot.ide_files.len());
    if let Some(git) = &snapshot.git {
        println!(
            "  git:          {} @ {}{}",
            git.branch,
            git.repo_path,
            if git.is_dirty { " (dirty)" } else { "" }
        );
    }
    Ok(())
}

pub async fn run_restore(
    config: &Config,
    id: &str,
    options: RestoreOptions,
    json: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let (manager, pool) = open_manager(config).await?;
    let result = manager.restore(id, options, cancel).await;
    pool.close().await;
    let report = result?;

    if json {
        return print_json(&report);
    }

    println!("{}", report.message);
    println!(
        "Restored {}/{} windows in {} ms",
        report.restored_windows, report.total_windows, report.duration_ms
    );
    if !report.missing_apps.is_empty() {
        println!("Missing applications: {}", report.missing_apps.join(", "));
    }
    for failure in &report.failures {
        println!("  FAILED {} ({}): {}", failure.title, failure.app_name, failure.error);
    }
    for planned in &report.planned {
        match &planned.matched {
            Some(m) => println!(
                "  {} -> {} (score {})",
                planned.title, m.window.title, m.score
            ),
            None => println!("  {} -> no match", planned.title),
        }
    }
    Ok(())
}

pub async fn run_list(
    config: &Config,
    filter: SnapshotFilter,
    json: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let (manager, pool) = open_manager(config).await?;
    let result = manager.list(&filter, cancel).await;
    pool.close().await;
    let snapshots = result?;

    if json {
        return print_json(&snapshots);
    }

    if snapshots.is_empty() {
        println!("No snapshots found.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<24}  {:<19}  {:<16}  TAGS",
        "ID", "NAME", "CREATED", "BRANCH"
    );
    for s in &snapshots {
        println!(
            "{:<36}  {:<24}  {:<19}  {:<16}  {}",
            s.id,
            s.name,
            format_time(&s.created_at),
            s.git_branch().unwrap_or("-"),
            s.tags.join(",")
        );
    }
    Ok(())
}

fn print_snapshot(snapshot: &Snapshot) {
    println!("--- Snapshot ---");
    println!("id:           {}", snapshot.id);
    println!("name:         {}", snapshot.name);
    if !snapshot.description.is_empty() {
        println!("description:  {}", snapshot.description);
    }
    println!("created_at:   {}", format_time(&snapshot.created_at));
    if !snapshot.tags.is_empty() {
        println!("tags:         {}", snapshot.tags.join(", "));
    }
    if let Some(git) = &snapshot.git {
        println!("git_repo:     {}", git.repo_path);
        println!("git_branch:   {}", git.branch);
        println!("git_dirty:    {}", git.is_dirty);
        if let Some(hash) = &git.head_hash {
            println!("git_head:     {}", hash);
        }
    }

    println!();
    println!("--- Windows ({}) ---", snapshot.windows.len());
    for w in &snapshot.windows {
        println!(
            "  [{}] {} ({}) {}x{} at {},{} {}",
            w.workspace, w.title, w.app_name, w.width, w.height, w.x, w.y, w.state
        );
    }
    if !snapshot.terminals.is_empty() {
        println!("--- Terminals ({}) ---", snapshot.terminals.len());
        for t in &snapshot.terminals {
            println!("  {} {} {}", t.terminal_app, t.working_directory, t.active_command);
        }
    }
    if !snapshot.browser_tabs.is_empty() {
        println!("--- Browser tabs ({}) ---", snapshot.browser_tabs.len());
        for tab in &snapshot.browser_tabs {
            println!("  {} {} {}", tab.browser_name, tab.title, tab.url);
        }
    }
    if !snapshot.ide_files.is_empty() {
        println!("--- Editor files ({}) ---", snapshot.ide_files.len());
        for f in &snapshot.ide_files {
            println!("  {} {}:{}", f.ide_name, f.file_path, f.cursor_line);
        }
    }
}

pub async fn run_show(
    config: &Config,
    id: &str,
    json: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let (manager, pool) = open_manager(config).await?;
    let result = manager.show(id, cancel).await;
    pool.close().await;
    let snapshot = result?;

    if json {
        return print_json(&snapshot);
    }
    print_snapshot(&snapshot);
    Ok(())
}

pub async fn run_delete(config: &Config, id: &str, cancel: &CancellationToken) -> Result<()> {
    let (manager, pool) = open_manager(config).await?;
    let result = manager.delete(id, cancel).await;
    pool.close().await;
    result?;

    println!("Deleted snapshot {}", id);
    Ok(())
}

pub async fn run_diff(
    config: &Config,
    source: &str,
    target: &str,
    json: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let (manager, pool) = open_manager(config).await?;
    let result = manager.diff(source, target, cancel).await;
    pool.close().await;
    let diff = result?;

    if json {
        return print_json(&diff);
    }

    println!("{} -> {}", diff.source_id, diff.target_id);
    println!("git changed:    {}", diff.git_changed);
    println!("common windows: {}", diff.common_windows);
    for title in &diff.added_windows {
        println!("  + {}", title);
    }
    for title in &diff.removed_windows {
        println!("  - {}", title);
    }
    if diff.is_unchanged() {
        println!("No differences.");
    }
    Ok(())
}

pub async fn run_preview(
    config: &Config,
    id: &str,
    json: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let (manager, pool) = open_manager(config).await?;
    let result = manager.preview(id, cancel).await;
    pool.close().await;
    let plan = result?;

    if json {
        return print_json(&plan);
    }

    let matched = plan.iter().filter(|p| p.matched.is_some()).count();
    println!("{}/{} windows have a live match", matched, plan.len());
    for p in &plan {
        match &p.matched {
            Some(m) => println!("  {} -> {} (score {})", p.title, m.window.title, m.score),
            None => println!("  {} -> no match", p.title),
        }
    }
    Ok(())
}

pub async fn run_windows(config: &Config, json: bool, cancel: &CancellationToken) -> Result<()> {
    let (manager, pool) = open_manager(config).await?;
    let result = manager.live_windows(cancel).await;
    pool.close().await;
    let windows = result?;

    if json {
        return print_json(&windows);
    }

    println!("{:<20}  {:<11}  {:<16}  TITLE", "APP", "STATE", "GEOMETRY");
    for w in &windows {
        println!(
            "{:<20}  {:<11}  {:<16}  {}",
            w.app_name,
            w.state.as_str(),
            format!("{}x{}+{}+{}", w.width, w.height, w.x, w.y),
            w.title
        );
    }
    Ok(())
}
