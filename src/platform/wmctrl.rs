//! X11 [`PlatformAdapter`] built on `wmctrl` and `xprop`.
//!
//! Window enumeration is a single `wmctrl -lpGx` call; its output is the full
//! client list at that instant, so a call returns every window or fails.
//! Window ids from that listing are only used within the call that produced
//! them and are never stored.
//!
//! Terminals, browser tabs and editor files are derived from the live window
//! list by WM class. Only what the title reveals is recorded: URLs, working
//! directories and cursor positions are not available through X11.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

use devsnap_core::matcher::WindowMatcher;
use devsnap_core::models::{BrowserTab, IdeFile, Terminal, Window, WindowState};
use devsnap_core::platform::PlatformAdapter;

const TERMINAL_CLASSES: &[&str] = &[
    "gnome-terminal",
    "gnome-terminal-server",
    "konsole",
    "alacritty",
    "kitty",
    "xterm",
    "urxvt",
    "terminator",
    "tilix",
    "wezterm",
    "foot",
    "xfce4-terminal",
];

const BROWSER_CLASSES: &[&str] = &[
    "firefox",
    "chromium",
    "chromium-browser",
    "google-chrome",
    "brave-browser",
    "vivaldi-stable",
    "opera",
    "librewolf",
];

const IDE_CLASSES: &[&str] = &[
    "code",
    "code-oss",
    "vscodium",
    "sublime_text",
    "zed",
    "gedit",
    "kate",
    "emacs",
];

/// One row of `wmctrl -lpGx`, with the handle needed to act on it.
#[derive(Debug, Clone, PartialEq)]
struct LiveWindow {
    id: String,
    pid: u32,
    window: Window,
}

pub struct WmctrlPlatform {
    matcher: WindowMatcher,
}

impl WmctrlPlatform {
    pub fn new(matcher: WindowMatcher) -> Self {
        Self { matcher }
    }

    async fn list(&self) -> Result<Vec<LiveWindow>> {
        let stdout = run("wmctrl", &["-lpGx"]).await?;
        let mut live = parse_wmctrl_list(&stdout);

        for entry in &mut live {
            // Both lookups are best-effort; a window that vanished mid-scan
            // keeps its defaults.
            if let Ok(props) = run("xprop", &["-id", &entry.id, "_NET_WM_STATE"]).await {
                entry.window.state = parse_net_wm_state(&props);
            }
            if entry.pid > 0 {
                let exe = format!("/proc/{}/exe", entry.pid);
                if let Ok(path) = tokio::fs::read_link(&exe).await {
                    entry.window.app_path = Some(path.display().to_string());
                }
            }
        }

        Ok(live)
    }

    async fn apply(&self, id: &str, window: &Window) -> Result<()> {
        run(
            "wmctrl",
            &["-i", "-r", id, "-b", "remove,maximized_vert,maximized_horz"],
        )
        .await?;
        run("wmctrl", &["-i", "-r", id, "-b", "remove,fullscreen,hidden"]).await?;

        if window.workspace >= 0 {
            run("wmctrl", &["-i", "-r", id, "-t", &window.workspace.to_string()]).await?;
        }

        let geometry = format!(
            "0,{},{},{},{}",
            window.x, window.y, window.width, window.height
        );
        run("wmctrl", &["-i", "-r", id, "-e", &geometry]).await?;

        match window.state {
            WindowState::Normal => {}
            WindowState::Maximized => {
                run(
                    "wmctrl",
                    &["-i", "-r", id, "-b", "add,maximized_vert,maximized_horz"],
                )
                .await?;
            }
            WindowState::Fullscreen => {
                run("wmctrl", &["-i", "-r", id, "-b", "add,fullscreen"]).await?;
            }
            WindowState::Minimized => {
                run("wmctrl", &["-i", "-r", id, "-b", "add,hidden"]).await?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl PlatformAdapter for WmctrlPlatform {
    fn name(&self) -> &str {
        "wmctrl"
    }

    async fn get_windows(&self) -> Result<Vec<Window>> {
        Ok(self.list().await?.into_iter().map(|l| l.window).collect())
    }

    async fn restore_window(&self, window: &Window) -> Result<()> {
        let live = self.list().await?;
        let candidates: Vec<Window> = live.iter().map(|l| l.window.clone()).collect();

        let found = match self.matcher.find_best_match(window, &candidates) {
            Some(found) => found,
            None => bail!(
                "no suitable window found for: {} (app: {})",
                window.title,
                window.app_name
            ),
        };

        let id = live
            .iter()
            .find(|l| l.window == found.window)
            .map(|l| l.id.clone())
            .with_context(|| format!("matched window vanished: {}", found.window.title))?;

        log::debug!(
            "moving {} '{}' to {},{} {}x{} ({})",
            id,
            found.window.title,
            window.x,
            window.y,
            window.width,
            window.height,
            window.state
        );
        self.apply(&id, window).await
    }

    async fn get_terminals(&self) -> Result<Vec<Terminal>> {
        Ok(terminals_from(&self.get_windows().await?))
    }

    async fn get_browser_tabs(&self) -> Result<Vec<BrowserTab>> {
        Ok(browser_tabs_from(&self.get_windows().await?))
    }

    async fn get_ide_files(&self) -> Result<Vec<IdeFile>> {
        Ok(ide_files_from(&self.get_windows().await?))
    }
}

async fn run(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .with_context(|| format!("Failed to execute '{}'", program))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{} {} failed: {}", program, args.join(" "), stderr.trim());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Split off `n` whitespace-separated fields and return them with the
/// untouched remainder of the line.
fn split_fields(line: &str, n: usize) -> Option<(Vec<&str>, &str)> {
    let mut fields = Vec::with_capacity(n);
    let mut rest = line.trim_start();
    for _ in 0..n {
        if rest.is_empty() {
            return None;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    Some((fields, rest))
}

/// WM class `instance.Class` → lowercase class name.
fn app_name_from_class(wm_class: &str) -> String {
    match wm_class.split_once('.') {
        Some((_, class)) if !class.is_empty() => class.to_lowercase(),
        _ => wm_class.to_lowercase(),
    }
}

/// Parse `wmctrl -lpGx` output:
/// `id desktop pid x y w h instance.Class host title...`.
/// Malformed rows are skipped. List position becomes `z_index`.
fn parse_wmctrl_list(stdout: &str) -> Vec<LiveWindow> {
    let mut windows = Vec::new();

    for line in stdout.lines() {
        let Some((f, title)) = split_fields(line, 9) else {
            continue;
        };
        let parsed = (
            f[1].parse::<i32>(),
            f[2].parse::<u32>(),
            f[3].parse::<i32>(),
            f[4].parse::<i32>(),
            f[5].parse::<u32>(),
            f[6].parse::<u32>(),
        );
        let (Ok(desktop), Ok(pid), Ok(x), Ok(y), Ok(width), Ok(height)) = parsed else {
            log::debug!("skipping unparsable wmctrl row: {}", line);
            continue;
        };

        let mut window = Window::new(app_name_from_class(f[7]), title.trim_end())
            .with_geometry(x, y, width, height);
        window.workspace = desktop;
        window.z_index = windows.len() as i32;

        windows.push(LiveWindow {
            id: f[0].to_string(),
            pid,
            window,
        });
    }

    windows
}

/// Map `xprop _NET_WM_STATE` output to a [`WindowState`].
fn parse_net_wm_state(props: &str) -> WindowState {
    if props.contains("_NET_WM_STATE_FULLSCREEN") {
        WindowState::Fullscreen
    } else if props.contains("_NET_WM_STATE_HIDDEN") {
        WindowState::Minimized
    } else if props.contains("_NET_WM_STATE_MAXIMIZED_VERT")
        && props.contains("_NET_WM_STATE_MAXIMIZED_HORZ")
    {
        WindowState::Maximized
    } else {
        WindowState::Normal
    }
}

fn is_terminal(app_name: &str) -> bool {
    TERMINAL_CLASSES.contains(&app_name)
}

fn is_browser(app_name: &str) -> bool {
    BROWSER_CLASSES.contains(&app_name)
}

fn is_ide(app_name: &str) -> bool {
    IDE_CLASSES.contains(&app_name) || app_name.starts_with("jetbrains-")
}

fn guess_shell(terminal_app: &str) -> &'static str {
    match terminal_app {
        "konsole" | "gnome-terminal" | "gnome-terminal-server" | "tilix" | "terminator" => "bash",
        _ => "",
    }
}

fn terminals_from(windows: &[Window]) -> Vec<Terminal> {
    windows
        .iter()
        .filter(|w| is_terminal(&w.app_name))
        .map(|w| Terminal {
            terminal_app: w.app_name.clone(),
            active_command: w.title.clone(),
            shell_type: guess_shell(&w.app_name).to_string(),
            ..Default::default()
        })
        .collect()
}

fn browser_tabs_from(windows: &[Window]) -> Vec<BrowserTab> {
    windows
        .iter()
        .filter(|w| is_browser(&w.app_name))
        .enumerate()
        .map(|(idx, w)| BrowserTab {
            browser_name: w.app_name.clone(),
            title: w.title.clone(),
            window_index: idx as i32,
            ..Default::default()
        })
        .collect()
}

/// Editors put the active file first: `● main.rs - devsnap - Visual Studio Code`.
fn file_from_title(title: &str) -> String {
    let title = title.trim_start_matches(['●', '*', ' ']);
    title
        .split(" - ")
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn ide_files_from(windows: &[Window]) -> Vec<IdeFile> {
    windows
        .iter()
        .filter(|w| is_ide(&w.app_name))
        .map(|w| IdeFile {
            ide_name: w.app_name.clone(),
            file_path: file_from_title(&w.title),
            is_active: true,
            ..Default::default()
        })
        .collect()
}
