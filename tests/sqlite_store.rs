use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use tempfile::TempDir;

use devsnap::config::Config;
use devsnap::sqlite_store::SqliteRepository;
use devsnap::{db, migrate};
use devsnap_core::models::{
    BrowserTab, GitContext, IdeFile, Snapshot, SnapshotFilter, Terminal, Window, WindowState,
};
use devsnap_core::store::Repository;

async fn setup() -> (TempDir, Config, SqliteRepository) {
    let tmp = TempDir::new().unwrap();
    let mut config = Config::minimal();
    config.db.path = tmp.path().join("data").join("devsnap.sqlite");

    migrate::run_migrations(&config).await.unwrap();
    let pool = db::connect(&config).await.unwrap();
    (tmp, config, SqliteRepository::new(pool))
}

fn snapshot(name: &str, minutes_ago: i64, tags: &[&str], git: Option<(&str, &str)>) -> Snapshot {
    let mut snap = Snapshot::new(name);
    snap.created_at = Utc::now() - Duration::minutes(minutes_ago);
    snap.updated_at = snap.created_at;
    snap.tags = tags.iter().map(|t| t.to_string()).collect();
    snap.git = git.map(|(repo, branch)| GitContext {
        repo_path: repo.to_string(),
        branch: branch.to_string(),
        is_dirty: false,
        head_hash: None,
    });
    snap
}

async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let (_tmp, config, repo) = setup().await;
    migrate::run_migrations(&config).await.unwrap();
    migrate::apply_schema(repo.pool()).await.unwrap();
    assert_eq!(count(repo.pool(), "snapshots").await, 0);
}

#[tokio::test]
async fn test_snapshot_metadata_round_trip() {
    let (_tmp, _config, repo) = setup().await;
    let mut snap = snapshot("auth refactor", 0, &["work", "rust"], None);
    snap.description = "before lunch".into();
    snap.git = Some(GitContext {
        repo_path: "/src/devsnap".into(),
        branch: "feature/auth".into(),
        is_dirty: true,
        head_hash: Some("0123abcd".into()),
    });
    repo.create_snapshot(&snap).await.unwrap();

    let loaded = repo.get_snapshot(&snap.id).await.unwrap().unwrap();
    assert_eq!(loaded.name, "auth refactor");
    assert_eq!(loaded.description, "before lunch");
    assert_eq!(loaded.tags, vec!["work", "rust"]);
    assert_eq!(loaded.git, snap.git);
    assert_eq!(
        loaded.created_at.timestamp_millis(),
        snap.created_at.timestamp_millis()
    );
    assert!(loaded.windows.is_empty());

    assert!(repo.get_snapshot("does-not-exist").await.unwrap().is_none());
}

#[tokio::test]
async fn test_snapshot_without_git() {
    let (_tmp, _config, repo) = setup().await;
    let snap = snapshot("plain", 0, &[], None);
    repo.create_snapshot(&snap).await.unwrap();
    let loaded = repo.get_snapshot(&snap.id).await.unwrap().unwrap();
    assert!(loaded.git.is_none());
    assert!(loaded.tags.is_empty());
}

#[tokio::test]
async fn test_duplicate_id_is_rejected() {
    let (_tmp, _config, repo) = setup().await;
    let snap = snapshot("once", 0, &[], None);
    repo.create_snapshot(&snap).await.unwrap();
    assert!(repo.create_snapshot(&snap).await.is_err());
}

#[tokio::test]
async fn test_components_round_trip_in_order() {
    let (_tmp, _config, repo) = setup().await;
    let snap = snapshot("full", 0, &[], None);
    repo.create_snapshot(&snap).await.unwrap();

    let mut editor = Window::new("code", "main.rs - devsnap")
        .with_geometry(-10, 20, 1200, 800)
        .with_state(WindowState::Maximized);
    editor.app_path = Some("/usr/share/code/code".into());
    editor.workspace = 2;
    editor.z_index = 0;
    editor.launch_args = Some(serde_json::json!(["--new-window", "/src/devsnap"]));
    let mut browser = Window::new("firefox", "Docs").with_geometry(1200, 0, 720, 1080);
    browser.z_index = 1;
    let windows = vec![editor, browser, Window::new("kitty", "")];
    repo.save_windows(&snap.id, &windows).await.unwrap();

    let mut env = BTreeMap::new();
    env.insert("EDITOR".to_string(), "nvim".to_string());
    let terminals = vec![
        Terminal {
            terminal_app: "kitty".into(),
            working_directory: "/src/devsnap".into(),
            active_command: "cargo watch".into(),
            shell_type: "zsh".into(),
            env_vars: env,
        },
        Terminal {
            terminal_app: "alacritty".into(),
            ..Default::default()
        },
    ];
    repo.save_terminals(&snap.id, &terminals).await.unwrap();

    let tabs = vec![
        BrowserTab {
            browser_name: "firefox".into(),
            url: "https://docs.rs".into(),
            title: "Docs.rs".into(),
            tab_index: 0,
            window_index: 0,
            is_pinned: true,
        },
        BrowserTab {
            browser_name: "firefox".into(),
            url: "https://crates.io".into(),
            tab_index: 1,
            ..Default::default()
        },
    ];
    repo.save_browser_tabs(&snap.id, &tabs).await.unwrap();

    let files = vec![IdeFile {
        ide_name: "code".into(),
        file_path: "src/lib.rs".into(),
        cursor_line: 42,
        cursor_column: 7,
        is_active: true,
    }];
    repo.save_ide_files(&snap.id, &files).await.unwrap();

    assert_eq!(repo.get_windows(&snap.id).await.unwrap(), windows);
    assert_eq!(repo.get_terminals(&snap.id).await.unwrap(), terminals);
    assert_eq!(repo.get_browser_tabs(&snap.id).await.unwrap(), tabs);
    assert_eq!(repo.get_ide_files(&snap.id).await.unwrap(), files);
}

#[tokio::test]
async fn test_components_for_unknown_snapshot() {
    let (_tmp, _config, repo) = setup().await;
    assert!(repo.get_windows("missing").await.unwrap().is_empty());
    assert!(repo
        .save_windows("missing", &[Window::new("code", "x")])
        .await
        .is_err());
}

#[tokio::test]
async fn test_list_order_filters_and_paging() {
    let (_tmp, _config, repo) = setup().await;
    let oldest = snapshot("oldest", 30, &["work"], Some(("/src/devsnap", "main")));
    let middle = snapshot("middle", 20, &["home"], Some(("/src/dotfiles", "main")));
    let newest = snapshot("newest", 10, &["work", "rust"], Some(("/src/devsnap", "feature")));
    let bare = snapshot("bare", 5, &[], None);
    for s in [&oldest, &middle, &newest, &bare] {
        repo.create_snapshot(s).await.unwrap();
    }

    let names = |list: Vec<Snapshot>| list.into_iter().map(|s| s.name).collect::<Vec<_>>();

    let all = repo.list_snapshots(&SnapshotFilter::default()).await.unwrap();
    assert_eq!(names(all), vec!["bare", "newest", "middle", "oldest"]);

    let project = SnapshotFilter {
        project: Some("devsnap".into()),
        ..Default::default()
    };
    assert_eq!(
        names(repo.list_snapshots(&project).await.unwrap()),
        vec!["newest", "oldest"]
    );

    let branch = SnapshotFilter {
        branch: Some("main".into()),
        ..Default::default()
    };
    assert_eq!(
        names(repo.list_snapshots(&branch).await.unwrap()),
        vec!["middle", "oldest"]
    );

    let tags = SnapshotFilter {
        tags: vec!["work".into(), "rust".into()],
        ..Default::default()
    };
    assert_eq!(names(repo.list_snapshots(&tags).await.unwrap()), vec!["newest"]);

    let page = SnapshotFilter {
        limit: Some(2),
        offset: 1,
        ..Default::default()
    };
    assert_eq!(
        names(repo.list_snapshots(&page).await.unwrap()),
        vec!["newest", "middle"]
    );

    let past_end = SnapshotFilter {
        offset: 10,
        ..Default::default()
    };
    assert!(repo.list_snapshots(&past_end).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_cascades_to_components() {
    let (_tmp, _config, repo) = setup().await;
    let keep = snapshot("keep", 1, &[], None);
    let doomed = snapshot("doomed", 0, &[], None);
    for s in [&keep, &doomed] {
        repo.create_snapshot(s).await.unwrap();
        repo.save_windows(&s.id, &[Window::new("code", &s.name)])
            .await
            .unwrap();
        repo.save_terminals(
            &s.id,
            &[Terminal {
                terminal_app: "kitty".into(),
                ..Default::default()
            }],
        )
        .await
        .unwrap();
    }

    assert!(repo.delete_snapshot(&doomed.id).await.unwrap());
    assert!(!repo.delete_snapshot(&doomed.id).await.unwrap());
    assert!(repo.get_snapshot(&doomed.id).await.unwrap().is_none());
    assert!(repo.get_windows(&doomed.id).await.unwrap().is_empty());

    assert_eq!(count(repo.pool(), "snapshots").await, 1);
    assert_eq!(count(repo.pool(), "windows").await, 1);
    assert_eq!(count(repo.pool(), "terminals").await, 1);
    assert_eq!(repo.get_windows(&keep.id).await.unwrap()[0].title, "keep");
}
