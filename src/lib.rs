//! # devsnap
//!
//! Capture, compare and restore development environment snapshots: the
//! layout of on-screen windows plus terminals, browser tabs, open editor
//! files and the current git context.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌──────────┐
//! │   Platform   │──▶│ SnapshotManager  │──▶│  SQLite  │
//! │ wmctrl/mock  │◀──│ match · diff     │◀──│ snapshots│
//! └──────────────┘   └────────┬─────────┘   └──────────┘
//!                             │
//!                        ┌────▼────┐
//!                        │   CLI   │
//!                        │(devsnap)│
//!                        └─────────┘
//! ```
//!
//! Pure logic (models, matcher, diff, reports, collaborator traits) lives in
//! the `devsnap-core` crate. This crate supplies the I/O-bound collaborator
//! implementations and the orchestrator.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite snapshot repository |
//! | [`git`] | Git context via the `git` CLI |
//! | [`sanitize`] | Redaction of secrets and user paths |
//! | [`platform`] | Platform adapters (X11 `wmctrl`, mock) |
//! | [`manager`] | Capture / restore / diff orchestration |
//! | [`commands`] | CLI command implementations |

pub mod commands;
pub mod config;
pub mod db;
pub mod git;
pub mod manager;
pub mod migrate;
pub mod platform;
pub mod sanitize;
pub mod sqlite_store;
