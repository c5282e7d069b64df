//! # devsnap core
//!
//! Platform-independent logic for devsnap: window and snapshot models, the
//! window identity matcher, snapshot diffing, restore reports, and the
//! collaborator traits (platform adapter, repository, sanitizer, git
//! detector) that the orchestrator in the `devsnap` crate is written against.
//!
//! This crate contains no tokio, sqlx, process spawning or filesystem I/O.
//! In-memory implementations of the platform and repository traits live here
//! so orchestrator tests need nothing else.

pub mod diff;
pub mod error;
pub mod git;
pub mod matcher;
pub mod models;
pub mod platform;
pub mod report;
pub mod sanitize;
pub mod store;
