//! Version tagging and metadata synchronization for a git-backed package
//! registry.
//!
//! Each package lives in its own repository and marks releases with `v<version>`
//! tags. The registry repository records, per package, its URL and for every
//! version the commit it was released at plus its requirements. This crate
//! keeps the two sides consistent: tags are only created together with their
//! registry entries, published pointers are never rewritten, and publishing
//! refuses to push anything the registry and the package tags disagree on.
//!
//! # Architecture
//!
//! - **[`version`]**: version grammar, numbering rules and selectors
//! - **[`writer`]**: writing one version entry inside a registry transaction
//! - **[`register`]**: adding a package with all of its tagged versions
//! - **[`tag`]**: tagging a version and recording it, with tag rollback
//! - **[`check`]**: registry-wide dependency consistency checks
//! - **[`publish`]**: pushing verified tags and preparing a pull request
//!
//! Registry layout:
//!
//! ```text
//! <pkg>/url
//! <pkg>/versions/<version>/sha1
//! <pkg>/versions/<version>/requires
//! ```

pub mod check;
pub mod error;
pub mod graph;
pub mod layout;
pub mod metadata;
pub mod publish;
pub mod pull_request;
pub mod register;
pub mod requirements;
pub mod tag;
pub mod version;
pub mod writer;

// Re-exports for convenience.
pub use check::check_metadata;
pub use error::{RegistryError, Result};
pub use graph::{Dangling, DependencyGraph, Problem, RegistryGraph};
pub use layout::Workspace;
pub use metadata::{Availability, Available};
pub use publish::{publish, PackagePush, PublishReport};
pub use pull_request::{open_pull_request, submit, PullRequest};
pub use register::{register, Registration};
pub use requirements::Requirement;
pub use tag::{tag, TagOutcome};
pub use version::{Selector, Version, VersionSpec};
pub use writer::write_entry;
