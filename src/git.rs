//! Git context detection by shelling out to the `git` binary.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use devsnap_core::git::GitDetector;
use devsnap_core::models::GitContext;

/// Branch name recorded when HEAD does not point at a branch.
pub const DETACHED_BRANCH: &str = "HEAD (detached)";

/// [`GitDetector`] backed by the `git` CLI.
#[derive(Debug, Clone, Default)]
pub struct GitCli {
    program: Option<PathBuf>,
}

impl GitCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific git executable instead of `git` on `PATH`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: Some(program.into()),
        }
    }

    fn git(&self, dir: &Path, args: &[&str]) -> Result<Output> {
        let program = self
            .program
            .clone()
            .unwrap_or_else(|| PathBuf::from("git"));
        Command::new(&program)
            .args(args)
            .current_dir(dir)
            .output()
            .with_context(|| format!("Failed to execute 'git {}'", args.join(" ")))
    }
}

impl GitDetector for GitCli {
    fn detect_context(&self, path: &Path) -> Result<Option<GitContext>> {
        let dir = if path.as_os_str().is_empty() {
            std::env::current_dir()?
        } else {
            path.to_path_buf()
        };
        if !dir.is_dir() {
            bail!("git path is not a directory: {}", dir.display());
        }

        let output = self.git(&dir, &["rev-parse", "--show-toplevel"])?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("not a git repository") {
                return Ok(None);
            }
            bail!("git rev-parse --show-toplevel failed: {}", stderr.trim());
        }
        let repo_path = String::from_utf8_lossy(&output.stdout).trim().to_string();

        // Fails on an unborn branch, prints "HEAD" when detached.
        let output = self.git(&dir, &["rev-parse", "--abbrev-ref", "HEAD"])?;
        let branch = if output.status.success() {
            branch_name(&String::from_utf8_lossy(&output.stdout))
        } else {
            return Ok(Some(GitContext {
                repo_path,
                branch: DETACHED_BRANCH.to_string(),
                is_dirty: false,
                head_hash: None,
            }));
        };

        let output = self.git(&dir, &["rev-parse", "HEAD"])?;
        if !output.status.success() {
            bail!("git rev-parse HEAD failed");
        }
        let head_hash = String::from_utf8_lossy(&output.stdout).trim().to_string();

        let output = self.git(&dir, &["status", "--porcelain"])?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("git status failed: {}", stderr.trim());
        }

        Ok(Some(GitContext {
            repo_path,
            branch,
            is_dirty: is_dirty(&String::from_utf8_lossy(&output.stdout)),
            head_hash: Some(head_hash),
        }))
    }
}

fn branch_name(abbrev_ref: &str) -> String {
    match abbrev_ref.trim() {
        "" | "HEAD" => DETACHED_BRANCH.to_string(),
        name => name.to_string(),
    }
}

fn is_dirty(porcelain: &str) -> bool {
    porcelain.lines().any(|line| !line.trim().is_empty())
}
