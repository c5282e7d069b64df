//! Regex-based redaction of captured snapshot text.
//!
//! Runs in place on a freshly captured [`Snapshot`] before it is persisted:
//!
//! - sensitive query parameters in browser tab URLs,
//! - terminal environment values whose key names look secret,
//! - emails, IPv4 addresses and long hex tokens in window titles (opt-in),
//! - the user segment of home-directory paths.

use anyhow::Result;
use regex::Regex;

use devsnap_core::models::Snapshot;
use devsnap_core::sanitize::Sanitizer;

use crate::config::SanitizeConfig;

pub const REDACTED: &str = "***REDACTED***";

const SENSITIVE_URL_PARAMS: &str =
    "token|key|secret|apikey|api_key|access_token|auth|password|passwd|credentials|session|jwt";

/// [`Sanitizer`] driven by the `[sanitize]` config section.
pub struct RedactingSanitizer {
    config: SanitizeConfig,
    url_param: Regex,
    email: Regex,
    ipv4: Regex,
    hex_token: Regex,
    user_path: Regex,
}

impl RedactingSanitizer {
    pub fn new(config: SanitizeConfig) -> Result<Self> {
        Ok(Self {
            url_param: Regex::new(&format!(
                r"([?&](?:{})=)[^&#\s]+",
                SENSITIVE_URL_PARAMS
            ))?,
            email: Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}")?,
            ipv4: Regex::new(r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b")?,
            hex_token: Regex::new(r"\b[a-fA-F0-9]{32,}\b")?,
            user_path: Regex::new(r"(?i)(C:\\Users\\|/home/|/Users/)([^\\/]+)")?,
            config,
        })
    }

    fn mask_url(&self, url: &str) -> String {
        self.url_param
            .replace_all(url, format!("${{1}}{}", REDACTED).as_str())
            .into_owned()
    }

    fn is_sensitive_key(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.config
            .filter_env_vars
            .iter()
            .any(|s| key.contains(&s.to_lowercase()))
    }

    fn mask_title(&self, title: &str) -> String {
        let title = self.email.replace_all(title, "***EMAIL***");
        let title = self.ipv4.replace_all(&title, "***IP***");
        self.hex_token.replace_all(&title, "***TOKEN***").into_owned()
    }

    fn mask_path(&self, path: &str) -> String {
        self.user_path
            .replace_all(path, "${1}***USER***")
            .into_owned()
    }
}

impl Sanitizer for RedactingSanitizer {
    fn sanitize(&self, snapshot: &mut Snapshot) {
        if self.config.mask_url_tokens {
            for tab in &mut snapshot.browser_tabs {
                tab.url = self.mask_url(&tab.url);
            }
        }

        if !self.config.filter_env_vars.is_empty() {
            for terminal in &mut snapshot.terminals {
                for (key, value) in terminal.env_vars.iter_mut() {
                    if self.is_sensitive_key(key) {
                        *value = REDACTED.to_string();
                    }
                }
            }
        }

        if self.config.redact_window_titles {
            for window in &mut snapshot.windows {
                window.title = self.mask_title(&window.title);
            }
        }

        if self.config.mask_paths {
            for window in &mut snapshot.windows {
                if let Some(path) = &window.app_path {
                    window.app_path = Some(self.mask_path(path));
                }
            }
            for terminal in &mut snapshot.terminals {
                terminal.working_directory = self.mask_path(&terminal.working_directory);
            }
            for file in &mut snapshot.ide_files {
                file.file_path = self.mask_path(&file.file_path);
            }
            if let Some(git) = &mut snapshot.git {
                git.repo_path = self.mask_path(&git.repo_path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devsnap_core::models::{BrowserTab, GitContext, IdeFile, Terminal, Window};

    fn sanitizer() -> RedactingSanitizer {
        RedactingSanitizer::new(SanitizeConfig::default()).unwrap()
    }

    #[test]
    fn test_url_tokens_masked() {
        let s = sanitizer();
        assert_eq!(
            s.mask_url("https://x.io/cb?code=1&access_token=abc123&page=2"),
            "https://x.io/cb?code=1&access_token=***REDACTED***&page=2"
        );
        assert_eq!(
            s.mask_url("https://x.io/?token=t#frag"),
            "https://x.io/?token=***REDACTED***#frag"
        );
        assert_eq!(s.mask_url("https://x.io/keys?monkey=1"), "https://x.io/keys?monkey=1");
        assert_eq!(s.mask_url(""), "");
    }

    #[test]
    fn test_env_vars_redacted_by_key_fragment() {
        let mut snap = Snapshot::new("s");
        let mut terminal = Terminal {
            terminal_app: "alacritty".into(),
            ..Default::default()
        };
        terminal.env_vars.insert("GITHUB_TOKEN".into(), "ghp_x".into());
        terminal.env_vars.insert("my_api_key".into(), "k".into());
        terminal.env_vars.insert("EDITOR".into(), "vim".into());
        snap.terminals.push(terminal);

        sanitizer().sanitize(&mut snap);

        let env = &snap.terminals[0].env_vars;
        assert_eq!(env["GITHUB_TOKEN"], REDACTED);
        assert_eq!(env["my_api_key"], REDACTED);
        assert_eq!(env["EDITOR"], "vim");
    }

    #[test]
    fn test_titles_only_masked_when_enabled() {
        let title = "mail to dev@example.com from 10.0.0.12";
        let mut snap = Snapshot::new("s");
        snap.windows.push(Window::new("thunderbird", title));
        sanitizer().sanitize(&mut snap);
        assert_eq!(snap.windows[0].title, title);

        let config = SanitizeConfig {
            redact_window_titles: true,
            ..Default::default()
        };
        RedactingSanitizer::new(config).unwrap().sanitize(&mut snap);
        assert_eq!(snap.windows[0].title, "mail to ***EMAIL*** from ***IP***");

        let hex = "d41d8cd98f00b204e9800998ecf8427e";
        let masked = sanitizer().mask_title(&format!("build {}", hex));
        assert_eq!(masked, "build ***TOKEN***");
    }

    #[test]
    fn test_user_paths_masked() {
        let mut snap = Snapshot::new("s");
        let mut window = Window::new("code", "main.rs");
        window.app_path = Some("/home/alice/.local/bin/code".into());
        snap.windows.push(window);
        snap.terminals.push(Terminal {
            terminal_app: "kitty".into(),
            working_directory: "/Users/bob/src".into(),
            ..Default::default()
        });
        snap.ide_files.push(IdeFile {
            ide_name: "code".into(),
            file_path: r"C:\Users\carol\proj\main.rs".into(),
            ..Default::default()
        });
        snap.browser_tabs.push(BrowserTab {
            browser_name: "firefox".into(),
            url: "https://example.com/?session=s1".into(),
            ..Default::default()
        });
        snap.git = Some(GitContext {
            repo_path: "/home/alice/src/devsnap".into(),
            branch: "main".into(),
            ..Default::default()
        });

        sanitizer().sanitize(&mut snap);

        assert_eq!(
            snap.windows[0].app_path.as_deref(),
            Some("/home/***USER***/.local/bin/code")
        );
        assert_eq!(snap.terminals[0].working_directory, "/Users/***USER***/src");
        assert_eq!(snap.ide_files[0].file_path, r"C:\Users\***USER***\proj\main.rs");
        assert_eq!(snap.browser_tabs[0].url, "https://example.com/?session=***REDACTED***");
        assert_eq!(snap.git.unwrap().repo_path, "/home/***USER***/src/devsnap");
    }
}
