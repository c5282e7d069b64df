//! # devsnap CLI
//!
//! The `devsnap` binary captures the current desktop (windows, terminals,
//! browser tabs, editor files, git context) into a named snapshot and puts
//! windows back where a snapshot left them.
//!
//! ## Usage
//!
//! ```bash
//! devsnap --config ./config/devsnap.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `devsnap init` | Create the SQLite database and schema |
//! | `devsnap capture --name <name>` | Capture and store a snapshot |
//! | `devsnap restore <id>` | Move windows back to their captured layout |
//! | `devsnap list` | List snapshots, newest first |
//! | `devsnap show <id>` | Print a snapshot with all its components |
//! | `devsnap delete <id>` | Delete a snapshot |
//! | `devsnap diff <source> <target>` | Compare the windows of two snapshots |
//! | `devsnap preview <id>` | Show which live window each stored one would move |
//! | `devsnap windows` | List live windows |
//!
//! ## Examples
//!
//! ```bash
//! devsnap capture --name "auth refactor" --tag work
//! devsnap list --branch main --tag work
//! devsnap restore 6f1c0e1e-... --validate --dry-run
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use devsnap::commands;
use devsnap::config;
use devsnap::manager::{CaptureOptions, RestoreOptions};
use devsnap_core::models::SnapshotFilter;

/// devsnap: capture and restore development environment snapshots.
#[derive(Parser)]
#[command(
    name = "devsnap",
    about = "Capture, compare and restore development environment snapshots",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/devsnap.toml`. Built-in defaults are used when
    /// the file does not exist.
    #[arg(long, global = true, default_value = "./config/devsnap.toml")]
    config: PathBuf,

    /// Debug logging on stderr.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Capture the current environment into a new snapshot.
    Capture {
        /// Snapshot name.
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Tag to attach; repeatable.
        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        no_terminals: bool,

        #[arg(long)]
        no_browser_tabs: bool,

        #[arg(long)]
        no_ide_files: bool,

        /// Store captured text without redaction.
        #[arg(long)]
        no_sanitize: bool,

        /// Directory to read git context from (overrides `[git].path`).
        #[arg(long)]
        git_path: Option<PathBuf>,
    },

    /// Restore the window layout of a snapshot.
    ///
    /// Windows that cannot be found or moved are reported and skipped; the
    /// restore succeeds if at least one window was restored.
    Restore {
        id: String,

        /// Check that every application in the snapshot is running first.
        #[arg(long)]
        validate: bool,

        /// With validation, abort when any application is missing.
        #[arg(long)]
        strict: bool,

        /// Report what would be restored without moving anything.
        #[arg(long)]
        dry_run: bool,

        #[arg(long)]
        json: bool,
    },

    /// List snapshots, newest first.
    List {
        /// Substring of the git repository path.
        #[arg(long)]
        project: Option<String>,

        /// Exact git branch.
        #[arg(long)]
        branch: Option<String>,

        /// Required tag; repeatable, all must match.
        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        limit: Option<usize>,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        #[arg(long)]
        json: bool,
    },

    /// Print a snapshot and all of its components.
    Show {
        id: String,

        #[arg(long)]
        json: bool,
    },

    /// Delete a snapshot and everything captured with it.
    Delete { id: String },

    /// Compare the windows and git context of two snapshots.
    Diff {
        source: String,
        target: String,

        #[arg(long)]
        json: bool,
    },

    /// Match a snapshot's windows against the live ones without moving them.
    Preview {
        id: String,

        #[arg(long)]
        json: bool,
    },

    /// List the windows currently on screen.
    Windows {
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Error);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let cfg = config::load_or_default(&cli.config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupted, stopping after the current step");
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Commands::Init => {
            commands::run_init(&cfg).await?;
        }
        Commands::Capture {
            name,
            description,
            tags,
            no_terminals,
            no_browser_tabs,
            no_ide_files,
            no_sanitize,
            git_path,
        } => {
            let mut options = CaptureOptions::from_config(name, &cfg.capture);
            options.description = description;
            options.tags = tags;
            options.include_terminals &= !no_terminals;
            options.include_browser_tabs &= !no_browser_tabs;
            options.include_ide_files &= !no_ide_files;
            options.sanitize &= !no_sanitize;
            options.git_path = git_path;
            commands::run_capture(&cfg, options, &cancel).await?;
        }
        Commands::Restore {
            id,
            validate,
            strict,
            dry_run,
            json,
        } => {
            let mut options = RestoreOptions::from_config(&cfg.restore);
            options.validate_before_restore |= validate || strict;
            if strict {
                options.skip_missing_apps = false;
            }
            options.dry_run = dry_run;
            commands::run_restore(&cfg, &id, options, json, &cancel).await?;
        }
        Commands::List {
            project,
            branch,
            tags,
            limit,
            offset,
            json,
        } => {
            let filter = SnapshotFilter {
                project,
                branch,
                tags,
                limit,
                offset,
            };
            commands::run_list(&cfg, filter, json, &cancel).await?;
        }
        Commands::Show { id, json } => {
            commands::run_show(&cfg, &id, json, &cancel).await?;
        }
        Commands::Delete { id } => {
            commands::run_delete(&cfg, &id, &cancel).await?;
        }
        Commands::Diff {
            source,
            target,
            json,
        } => {
            commands::run_diff(&cfg, &source, &target, json, &cancel).await?;
        }
        Commands::Preview { id, json } => {
            commands::run_preview(&cfg, &id, json, &cancel).await?;
        }
        Commands::Windows { json } => {
            commands::run_windows(&cfg, json, &cancel).await?;
        }
    }

    Ok(())
}
