//! SQLite-backed [`Repository`] implementation.
//!
//! Snapshot metadata lives in `snapshots`; each component list has its own
//! table keyed by `snapshot_id` with an autoincrement id that preserves
//! capture order. Every `save_*` call runs in one transaction, but a capture
//! spans several calls and is not atomic as a whole.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use devsnap_core::models::{
    BrowserTab, GitContext, IdeFile, Snapshot, SnapshotFilter, Terminal, Window, WindowState,
};
use devsnap_core::store::Repository;

/// SQLite implementation of the [`Repository`] trait.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn millis_to_datetime(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| anyhow!("invalid timestamp: {}", ms))
}

fn to_u32(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

fn row_to_snapshot(row: &SqliteRow) -> Result<Snapshot> {
    let tags_json: String = row.get("tags_json");
    let tags: Vec<String> =
        serde_json::from_str(&tags_json).with_context(|| "Failed to decode snapshot tags")?;

    let git_branch: Option<String> = row.get("git_branch");
    let git_repo: Option<String> = row.get("git_repo");
    let git = if git_branch.is_some() || git_repo.is_some() {
        Some(GitContext {
            repo_path: git_repo.unwrap_or_default(),
            branch: git_branch.unwrap_or_default(),
            is_dirty: row.get("git_dirty"),
            head_hash: row.get("git_head_hash"),
        })
    } else {
        None
    };

    Ok(Snapshot {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        created_at: millis_to_datetime(row.get("created_at"))?,
        updated_at: millis_to_datetime(row.get("updated_at"))?,
        tags,
        git,
        windows: Vec::new(),
        terminals: Vec::new(),
        browser_tabs: Vec::new(),
        ide_files: Vec::new(),
    })
}

fn row_to_window(row: &SqliteRow) -> Result<Window> {
    let state: String = row.get("state");
    let launch_args: Option<String> = row.get("launch_args_json");
    let launch_args = launch_args
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .with_context(|| "Failed to decode window launch args")?;

    Ok(Window {
        app_name: row.get("app_name"),
        app_path: row.get("app_path"),
        title: row.get("title"),
        x: row.get::<i64, _>("x") as i32,
        y: row.get::<i64, _>("y") as i32,
        width: to_u32(row.get("width")),
        height: to_u32(row.get("height")),
        state: state.parse::<WindowState>()?,
        workspace: row.get::<i64, _>("workspace") as i32,
        z_index: row.get::<i64, _>("z_index") as i32,
        launch_args,
    })
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn create_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let tags_json = serde_json::to_string(&snapshot.tags)?;
        let git = snapshot.git.as_ref();

        sqlx::query(
            r#"
            INSERT INTO snapshots (id, name, description, created_at, updated_at, tags_json,
                                   git_branch, git_repo, git_dirty, git_head_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&snapshot.id)
        .bind(&snapshot.name)
        .bind(&snapshot.description)
        .bind(snapshot.created_at.timestamp_millis())
        .bind(snapshot.updated_at.timestamp_millis())
        .bind(&tags_json)
        .bind(git.map(|g| g.branch.clone()))
        .bind(git.map(|g| g.repo_path.clone()))
        .bind(git.map(|g| g.is_dirty).unwrap_or(false))
        .bind(git.and_then(|g| g.head_hash.clone()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_snapshot(&self, id: &str) -> Result<Option<Snapshot>> {
        let row = sqlx::query("SELECT * FROM snapshots WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_snapshot).transpose()
    }

    async fn list_snapshots(&self, filter: &SnapshotFilter) -> Result<Vec<Snapshot>> {
        let mut sql = String::from("SELECT * FROM snapshots WHERE 1 = 1");
        if filter.project.is_some() {
            sql.push_str(" AND instr(git_repo, ?) > 0");
        }
        if filter.branch.is_some() {
            sql.push_str(" AND git_branch = ?");
        }
        sql.push_str(" ORDER BY created_at DESC, id ASC");

        let mut query = sqlx::query(&sql);
        if let Some(project) = &filter.project {
            query = query.bind(project);
        }
        if let Some(branch) = &filter.branch {
            query = query.bind(branch);
        }
        let rows = query.fetch_all(&self.pool).await?;

        // Tags are stored as JSON, so the tag criterion and paging run here.
        let mut snapshots = Vec::with_capacity(rows.len());
        for row in &rows {
            let snapshot = row_to_snapshot(row)?;
            if filter.matches(&snapshot) {
                snapshots.push(snapshot);
            }
        }
        Ok(filter.paginate(snapshots))
    }

    async fn delete_snapshot(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM snapshots WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn save_windows(&self, snapshot_id: &str, windows: &[Window]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for window in windows {
            let launch_args = window
                .launch_args
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            sqlx::query(
                r#"
                INSERT INTO windows (snapshot_id, app_name, app_path, title, x, y, width, height,
                                     state, workspace, z_index, launch_args_json)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(snapshot_id)
            .bind(&window.app_name)
            .bind(&window.app_path)
            .bind(&window.title)
            .bind(i64::from(window.x))
            .bind(i64::from(window.y))
            .bind(i64::from(window.width))
            .bind(i64::from(window.height))
            .bind(window.state.as_str())
            .bind(i64::from(window.workspace))
            .bind(i64::from(window.z_index))
            .bind(launch_args)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn save_terminals(&self, snapshot_id: &str, terminals: &[Terminal]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for terminal in terminals {
            let env_json = serde_json::to_string(&terminal.env_vars)?;
            sqlx::query(
                r#"
                INSERT INTO terminals (snapshot_id, terminal_app, working_directory,
                                       active_command, shell_type, env_vars_json)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(snapshot_id)
            .bind(&terminal.terminal_app)
            .bind(&terminal.working_directory)
            .bind(&terminal.active_command)
            .bind(&terminal.shell_type)
            .bind(&env_json)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn save_browser_tabs(&self, snapshot_id: &str, tabs: &[BrowserTab]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for tab in tabs {
            sqlx::query(
                r#"
                INSERT INTO browser_tabs (snapshot_id, browser_name, url, title, tab_index,
                                          window_index, is_pinned)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(snapshot_id)
            .bind(&tab.browser_name)
            .bind(&tab.url)
            .bind(&tab.title)
            .bind(i64::from(tab.tab_index))
            .bind(i64::from(tab.window_index))
            .bind(tab.is_pinned)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn save_ide_files(&self, snapshot_id: &str, files: &[IdeFile]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for file in files {
            sqlx::query(
                r#"
                INSERT INTO ide_files (snapshot_id, ide_name, file_path, cursor_line,
                                       cursor_column, is_active)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(snapshot_id)
            .bind(&file.ide_name)
            .bind(&file.file_path)
            .bind(i64::from(file.cursor_line))
            .bind(i64::from(file.cursor_column))
            .bind(file.is_active)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_windows(&self, snapshot_id: &str) -> Result<Vec<Window>> {
        let rows = sqlx::query("SELECT * FROM windows WHERE snapshot_id = ? ORDER BY id")
            .bind(snapshot_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_window).collect()
    }

    async fn get_terminals(&self, snapshot_id: &str) -> Result<Vec<Terminal>> {
        let rows = sqlx::query("SELECT * FROM terminals WHERE snapshot_id = ? ORDER BY id")
            .bind(snapshot_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<Terminal> {
                let env_json: String = row.get("env_vars_json");
                Ok(Terminal {
                    terminal_app: row.get("terminal_app"),
                    working_directory: row.get("working_directory"),
                    active_command: row.get("active_command"),
                    shell_type: row.get("shell_type"),
                    env_vars: serde_json::from_str(&env_json)
                        .with_context(|| "Failed to decode terminal env vars")?,
                })
            })
            .collect()
    }

    async fn get_browser_tabs(&self, snapshot_id: &str) -> Result<Vec<BrowserTab>> {
        let rows = sqlx::query("SELECT * FROM browser_tabs WHERE snapshot_id = ? ORDER BY id")
            .bind(snapshot_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| BrowserTab {
                browser_name: row.get("browser_name"),
                url: row.get("url"),
                title: row.get("title"),
                tab_index: row.get::<i64, _>("tab_index") as i32,
                window_index: row.get::<i64, _>("window_index") as i32,
                is_pinned: row.get("is_pinned"),
            })
            .collect())
    }

    async fn get_ide_files(&self, snapshot_id: &str) -> Result<Vec<IdeFile>> {
        let rows = sqlx::query("SELECT * FROM ide_files WHERE snapshot_id = ? ORDER BY id")
            .bind(snapshot_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| IdeFile {
                ide_name: row.get("ide_name"),
                file_path: row.get("file_path"),
                cursor_line: row.get::<i64, _>("cursor_line") as i32,
                cursor_column: row.get::<i64, _>("cursor_column") as i32,
                is_active: row.get("is_active"),
            })
            .collect())
    }
}
