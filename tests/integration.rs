use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn devsnap_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("devsnap");
    path
}

const DESKTOP: &str = r#"
[[platform.mock_windows]]
app_name = "code"
title = "main.rs - devsnap - Visual Studio Code"
x = 0
y = 0
width = 1200
height = 800
state = "maximized"

[[platform.mock_windows]]
app_name = "firefox"
title = "Pull requests - Mozilla Firefox"
x = 1200
y = 0
width = 720
height = 1080

[[platform.mock_windows]]
app_name = "alacritty"
title = "cargo test"
x = 0
y = 800
width = 1200
height = 280
"#;

fn write_config(root: &Path, file: &str, windows: &str) -> PathBuf {
    let config_content = format!(
        r#"[db]
path = "{root}/data/devsnap.sqlite"

[git]
path = "{root}"

[platform]
kind = "mock"
{windows}"#,
        root = root.display(),
        windows = windows,
    );

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_path = config_dir.join(file);
    fs::write(&config_path, config_content).unwrap();
    config_path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(tmp.path(), "devsnap.toml", DESKTOP);
    (tmp, config_path)
}

fn run_devsnap(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = devsnap_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run devsnap binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

/// Capture a snapshot and return its id.
fn capture(config_path: &Path, name: &str, extra: &[&str]) -> String {
    let mut args = vec!["capture", "--name", name];
    args.extend_from_slice(extra);
    let (stdout, stderr, success) = run_devsnap(config_path, &args);
    assert!(success, "capture failed: stdout={}, stderr={}", stdout, stderr);
    stdout
        .lines()
        .next()
        .and_then(|line| line.strip_prefix("Captured snapshot "))
        .unwrap_or_else(|| panic!("unexpected capture output: {}", stdout))
        .trim()
        .to_string()
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_devsnap(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Database initialized"));
    assert!(tmp.path().join("data/devsnap.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_devsnap(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_devsnap(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_capture_and_show() {
    let (_tmp, config_path) = setup_test_env();
    let id = capture(&config_path, "morning", &["--tag", "work", "--description", "standup"]);

    let (stdout, stderr, success) = run_devsnap(&config_path, &["show", &id]);
    assert!(success, "show failed: {}", stderr);
    assert!(stdout.contains("name:         morning"));
    assert!(stdout.contains("--- Windows (3) ---"));
    assert!(stdout.contains("main.rs - devsnap - Visual Studio Code"));

    let (stdout, _, success) = run_devsnap(&config_path, &["show", &id, "--json"]);
    assert!(success);
    let snap: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(snap["id"], id.as_str());
    assert_eq!(snap["description"], "standup");
    assert_eq!(snap["tags"][0], "work");
    assert_eq!(snap["windows"].as_array().unwrap().len(), 3);
    assert_eq!(snap["windows"][0]["state"], "maximized");
    assert!(snap["git"].is_null());
}

#[test]
fn test_list() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_devsnap(&config_path, &["list"]);
    assert!(success);
    assert!(stdout.contains("No snapshots found."));

    let tagged = capture(&config_path, "tagged", &["--tag", "work"]);
    let plain = capture(&config_path, "plain", &[]);

    let (stdout, _, success) = run_devsnap(&config_path, &["list"]);
    assert!(success);
    assert!(stdout.contains(&tagged));
    assert!(stdout.contains(&plain));

    let (stdout, _, success) = run_devsnap(&config_path, &["list", "--tag", "work", "--json"]);
    assert!(success);
    let list: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], tagged.as_str());

    let (stdout, _, success) = run_devsnap(&config_path, &["list", "--limit", "1", "--json"]);
    assert!(success);
    let list: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(list.len(), 1);
}

#[test]
fn test_restore() {
    let (_tmp, config_path) = setup_test_env();
    let id = capture(&config_path, "layout", &[]);

    let (stdout, stderr, success) = run_devsnap(&config_path, &["restore", &id]);
    assert!(success, "restore failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("All windows restored successfully"));
    assert!(stdout.contains("Restored 3/3 windows"));

    let (stdout, _, success) = run_devsnap(&config_path, &["restore", &id, "--json"]);
    assert!(success);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["restored_windows"], 3);
    assert_eq!(report["success"], true);
}

#[test]
fn test_restore_dry_run() {
    let (_tmp, config_path) = setup_test_env();
    let id = capture(&config_path, "layout", &[]);

    let (stdout, _, success) =
        run_devsnap(&config_path, &["restore", &id, "--dry-run", "--validate", "--json"]);
    assert!(success);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["dry_run"], true);
    assert_eq!(report["restored_windows"], 0);
    assert_eq!(report["message"], "Dry run completed - no changes made");
    assert_eq!(report["planned"].as_array().unwrap().len(), 3);
}

#[test]
fn test_restore_strict_missing_applications() {
    let (tmp, config_path) = setup_test_env();
    let id = capture(&config_path, "layout", &[]);

    // Same database, but firefox is no longer running.
    let reduced = DESKTOP
        .split("[[platform.mock_windows]]")
        .filter(|block| !block.contains("firefox"))
        .collect::<Vec<_>>()
        .join("[[platform.mock_windows]]");
    let reduced_config = write_config(tmp.path(), "reduced.toml", &reduced);

    let (_, stderr, success) = run_devsnap(&reduced_config, &["restore", &id, "--strict"]);
    assert!(!success);
    assert!(stderr.contains("missing applications: firefox"), "stderr: {}", stderr);

    let (stdout, _, success) =
        run_devsnap(&reduced_config, &["restore", &id, "--validate", "--json"]);
    assert!(success);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["missing_apps"][0], "firefox");
    assert_eq!(report["restored_windows"], 2);
    assert_eq!(report["failures"][0]["app_name"], "firefox");
}

#[test]
fn test_preview_and_windows() {
    let (_tmp, config_path) = setup_test_env();
    let id = capture(&config_path, "layout", &[]);

    let (stdout, _, success) = run_devsnap(&config_path, &["preview", &id]);
    assert!(success);
    assert!(stdout.contains("3/3 windows have a live match"));

    let (stdout, _, success) = run_devsnap(&config_path, &["windows", "--json"]);
    assert!(success);
    let windows: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(windows.len(), 3);
    assert_eq!(windows[1]["app_name"], "firefox");
}

#[test]
fn test_diff() {
    let (tmp, config_path) = setup_test_env();
    let before = capture(&config_path, "before", &[]);

    let without_firefox = DESKTOP
        .split("[[platform.mock_windows]]")
        .filter(|block| !block.contains("firefox"))
        .collect::<Vec<_>>()
        .join("[[platform.mock_windows]]");
    let later = write_config(tmp.path(), "later.toml", &without_firefox);
    let after = capture(&later, "after", &[]);

    let (stdout, stderr, success) = run_devsnap(&config_path, &["diff", &before, &after, "--json"]);
    assert!(success, "diff failed: {}", stderr);
    let diff: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(diff["removed_windows"][0], "Pull requests - Mozilla Firefox");
    assert!(diff["added_windows"].as_array().unwrap().is_empty());
    assert_eq!(diff["common_windows"], 2);

    let (stdout, _, success) = run_devsnap(&config_path, &["diff", &before, &before]);
    assert!(success);
    assert!(stdout.contains("No differences."));
}

#[test]
fn test_delete() {
    let (_tmp, config_path) = setup_test_env();
    let id = capture(&config_path, "short lived", &[]);

    let (stdout, _, success) = run_devsnap(&config_path, &["delete", &id]);
    assert!(success);
    assert!(stdout.contains(&format!("Deleted snapshot {}", id)));

    let (_, stderr, success) = run_devsnap(&config_path, &["delete", &id]);
    assert!(!success);
    assert!(stderr.contains("snapshot not found"));

    let (_, _, success) = run_devsnap(&config_path, &["show", &id]);
    assert!(!success);
}

#[test]
fn test_unknown_snapshot() {
    let (_tmp, config_path) = setup_test_env();
    for args in [
        vec!["restore", "nope"],
        vec!["preview", "nope"],
        vec!["show", "nope"],
        vec!["diff", "nope", "nada"],
    ] {
        let (_, stderr, success) = run_devsnap(&config_path, &args);
        assert!(!success, "{:?} should fail", args);
        assert!(stderr.contains("snapshot not found"), "{:?}: {}", args, stderr);
    }
}

#[test]
fn test_invalid_config() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("bad.toml");
    fs::write(
        &config_path,
        format!(
            "[db]\npath = \"{}/db.sqlite\"\n\n[platform]\nkind = \"quartz\"\n",
            tmp.path().display()
        ),
    )
    .unwrap();

    let (_, stderr, success) = run_devsnap(&config_path, &["list"]);
    assert!(!success);
    assert!(stderr.contains("Unknown platform kind"), "stderr: {}", stderr);
}
