//! Registry error types.

use std::path::PathBuf;

use metatag_vcs::{HostingError, StoreError};

use crate::graph::Problem;

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The package directory is not a repository.
    #[error("{package} is not a git repo ({path})")]
    NotAGitRepo { package: String, path: PathBuf },

    /// The package already has a url file in the registry.
    #[error("{package} is already registered")]
    AlreadyRegistered { package: String },

    /// No URL was given and the repository has no configured remote URL.
    #[error("{package}: no URL configured")]
    NoURLConfigured { package: String },

    /// The remote URL is not one the hosting provider understands.
    #[error("not a GitHub repo URL, can't make a pull request: {url}")]
    NotAGitHubRemote { url: String },

    /// Forking on the hosting provider failed.
    #[error("forking {repository} failed: {source}")]
    RemoteForkFailed {
        repository: String,
        #[source]
        source: HostingError,
    },

    /// The registry checkout is on another branch than the one being published.
    #[error("registry must be on {expected} to publish changes (currently on {actual})")]
    WrongBranch { expected: String, actual: String },

    /// The upstream branch has commits the local branch lacks.
    #[error("registry is behind {upstream} by {commits} commit(s); update before publishing")]
    BehindUpstream { upstream: String, commits: usize },

    /// The local branch has no commits beyond its upstream.
    #[error("there are no registry changes to publish on {branch}")]
    NothingToPublish { branch: String },

    /// A published pointer was edited locally.
    #[error("{package} v{version} pointer changed in the registry ({old} -> {new}); refusing to publish")]
    PointerDivergence {
        package: String,
        version: String,
        old: String,
        new: String,
    },

    /// The package tag points somewhere else than the registry pointer.
    #[error("{package} v{version} is incorrectly tagged: tag points at {actual}, {expected} expected")]
    TagMismatch {
        package: String,
        version: String,
        expected: String,
        actual: String,
    },

    /// A registry entry has no matching tag in the package repository.
    #[error("{package} v{version} is registered at {pointer} but the package has no tag v{version}")]
    UntaggedEntry {
        package: String,
        version: String,
        pointer: String,
    },

    /// Two tags naming the same version resolve to different commits.
    #[error("{package} has conflicting tags for v{version}: {first} and {second} point at different commits")]
    MistaggedVersion {
        package: String,
        version: String,
        first: String,
        second: String,
    },

    /// A requirement names a package absent from the registry.
    #[error("package {package} v{version} requires a non-registered package: {dependency}")]
    UnregisteredDependency {
        package: String,
        version: String,
        dependency: String,
    },

    /// Some package versions can never be installed.
    #[error("packages with unsatisfiable requirements found:\n{}", format_problems(.problems))]
    UnsatisfiableRequirements { problems: Vec<Problem> },

    /// Uncommitted changes block tagging.
    #[error("{path} is dirty; commit or stash changes to tag")]
    DirtyWorkingTree { path: PathBuf },

    /// Unknown version selector.
    #[error("invalid version selector: {selector} (expected bump, patch, minor or major)")]
    InvalidSelector { selector: String },

    /// Malformed version string.
    #[error("invalid version: {input}")]
    InvalidVersion { input: String },

    /// The candidate version breaks the numbering rules.
    #[error("cannot tag v{version}: {reason}")]
    VersionConflict { version: String, reason: String },

    /// The registry already records a different pointer for this version.
    #[error("{package} v{version} is already registered as {existing}, bailing")]
    PointerConflict {
        package: String,
        version: String,
        existing: String,
        attempted: String,
    },

    /// Creating or moving a tag failed.
    #[error("failed to create tag {tag}: {source}")]
    TagCreationError {
        tag: String,
        #[source]
        source: StoreError,
    },

    /// Restoring a tag after a failed registry update failed too.
    #[error("{cause}; additionally, rolling back tag {tag} failed: {source}")]
    TagRollbackFailed {
        tag: String,
        cause: Box<RegistryError>,
        #[source]
        source: StoreError,
    },

    /// A commit reference does not resolve.
    #[error("cannot find commit {reference} in {path}")]
    UnknownCommit { reference: String, path: PathBuf },

    /// A requirements line could not be parsed.
    #[error("invalid requirement `{line}`: {detail}")]
    InvalidRequirement { line: String, detail: String },

    /// Pushing a package's tags was rejected.
    #[error("pushing tags of {package} failed (already pushed: {}): {source}", list_or_none(.pushed))]
    PushFailed {
        package: String,
        pushed: Vec<String>,
        #[source]
        source: StoreError,
    },

    /// Content store error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_problems(problems: &[Problem]) -> String {
    problems
        .iter()
        .map(|p| {
            format!(
                "    {} v{}: no valid versions exist for package {}",
                p.package, p.version, p.requirement
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
