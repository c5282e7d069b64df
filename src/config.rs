//! TOML configuration.
//!
//! Only `[db]` is required; every other section falls back to its defaults.
//! A missing config file is not an error for the CLI, which then runs on
//! [`Config::minimal`].

use anyhow::{Context, Result};
use devsnap_core::matcher::MatchConfig;
use devsnap_core::models::Window;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub matching: MatchConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub restore: RestoreConfig,
    #[serde(default)]
    pub sanitize: SanitizeConfig,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Defaults for `devsnap capture`.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CaptureConfig {
    pub include_terminals: bool,
    pub include_browser_tabs: bool,
    pub include_ide_files: bool,
    pub sanitize: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            include_terminals: true,
            include_browser_tabs: true,
            include_ide_files: true,
            sanitize: true,
        }
    }
}

/// Defaults for `devsnap restore`.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RestoreConfig {
    pub validate_before_restore: bool,
    pub skip_missing_apps: bool,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self {
            validate_before_restore: false,
            skip_missing_apps: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SanitizeConfig {
    pub mask_url_tokens: bool,
    /// Terminal env var names (or fragments of names) whose values are redacted.
    pub filter_env_vars: Vec<String>,
    pub redact_window_titles: bool,
    pub mask_paths: bool,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            mask_url_tokens: true,
            filter_env_vars: default_filter_env_vars(),
            redact_window_titles: false,
            mask_paths: true,
        }
    }
}

fn default_filter_env_vars() -> Vec<String> {
    [
        "API_KEY",
        "APIKEY",
        "SECRET",
        "PASSWORD",
        "PASSWD",
        "TOKEN",
        "AUTH",
        "CREDENTIALS",
        "AWS_SECRET_ACCESS_KEY",
        "GITHUB_TOKEN",
        "SLACK_TOKEN",
        "OPENAI_API_KEY",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GitConfig {
    /// Directory checked for ambient git context during capture.
    pub path: PathBuf,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PlatformConfig {
    /// `wmctrl` or `mock`.
    pub kind: String,
    /// Live windows the mock adapter starts with.
    pub mock_windows: Vec<Window>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            kind: "wmctrl".to_string(),
            mock_windows: Vec::new(),
        }
    }
}

impl Config {
    /// Built-in defaults, used when no config file exists.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/devsnap.sqlite"),
            },
            matching: MatchConfig::default(),
            capture: CaptureConfig::default(),
            restore: RestoreConfig::default(),
            sanitize: SanitizeConfig::default(),
            git: GitConfig::default(),
            platform: PlatformConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Like [`load_config`], but a file that does not exist yields
/// [`Config::minimal`].
pub fn load_or_default(path: &Path) -> Result<Config> {
    if !path.exists() {
        log::debug!(
            "config file {} not found, using built-in defaults",
            path.display()
        );
        return Ok(Config::minimal());
    }
    load_config(path)
}

fn validate(config: &Config) -> Result<()> {
    if config.db.path.as_os_str().is_empty() {
        anyhow::bail!("db.path must not be empty");
    }

    let m = &config.matching;
    for (name, value) in [
        ("exact_title_score", m.exact_title_score),
        ("partial_title_score", m.partial_title_score),
        ("same_app_score", m.same_app_score),
        ("same_size_score", m.same_size_score),
    ] {
        if value < 0 {
            anyhow::bail!("matching.{} must be >= 0", name);
        }
    }
    if m.minimum_score <= 0 {
        anyhow::bail!("matching.minimum_score must be > 0");
    }

    match config.platform.kind.as_str() {
        "wmctrl" | "mock" => {}
        other => anyhow::bail!(
            "Unknown platform kind: '{}'. Must be wmctrl or mock.",
            other
        ),
    }

    Ok(())
}
