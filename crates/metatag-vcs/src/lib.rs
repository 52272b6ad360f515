//! Versioned content store and remote hosting capabilities.
//!
//! The registry workflow only needs a narrow slice of a version-control
//! client: ancestry, tags, diffs, blob reads, fetch and push. This crate
//! expresses that slice as the [`ContentStore`] trait and implements it on
//! top of the `git` command-line tool.
//!
//! # Architecture
//!
//! - **[`ContentStore`]**: the capability interface consumed by the registry
//! - **[`GitRepo`]**: `git -C <dir>` backed implementation
//! - **[`Transaction`]**: scoped stage/commit with rollback on drop
//! - **[`HostingApi`]**: forking and identity lookup on the hosting provider

pub mod error;
pub mod git;
pub mod hosting;
pub mod store;
pub mod transaction;

// Re-exports for convenience.
pub use error::{Result, StoreError};
pub use git::GitRepo;
pub use hosting::{normalize_url, parse_github_url, Fork, GhCli, HostingApi, HostingError, RepoSlug, User};
pub use store::ContentStore;
pub use transaction::Transaction;
