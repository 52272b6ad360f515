//! Remote hosting capability: identity lookup and repository forking.
//!
//! [`GhCli`] talks to GitHub through the `gh` command-line tool, decoding its
//! JSON responses into typed structures.

use std::process::Command;

use serde::{Deserialize, Serialize};

/// Errors surfaced by the hosting provider.
#[derive(Debug, thiserror::Error)]
pub enum HostingError {
    /// The hosting tool exited unsuccessfully.
    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// The response could not be decoded.
    #[error("malformed response from `{command}`: {source}")]
    Decode {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    /// I/O error (including failure to spawn the tool).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An `owner/repository` pair on the hosting provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl std::fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// The authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
}

/// A fork created (or found) under the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fork {
    /// URL used to push to the fork.
    pub ssh_url: String,
    /// Browser URL of the fork.
    pub html_url: String,
}

/// Operations the pull-request flow needs from the hosting provider.
pub trait HostingApi {
    /// The identity requests are made as.
    fn current_user(&self) -> Result<User, HostingError>;

    /// Fork `slug` under the current user. Forking an already-forked
    /// repository returns the existing fork.
    fn fork(&self, slug: &RepoSlug) -> Result<Fork, HostingError>;

    /// Split a remote URL into its owner and repository.
    fn parse_remote(&self, url: &str) -> Option<RepoSlug> {
        parse_github_url(url)
    }
}

/// Parse the ssh, git and https forms of a GitHub repository URL.
///
/// User info embedded in the URL (`https://user@github.com/...`) is accepted
/// and ignored.
pub fn parse_github_url(url: &str) -> Option<RepoSlug> {
    let path = strip_github_host(url.trim())?;
    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let (owner, repo) = path.split_once('/')?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some(RepoSlug {
        owner: owner.to_string(),
        repo: repo.to_string(),
    })
}

fn strip_github_host(url: &str) -> Option<&str> {
    if let Some(rest) = strip_prefix_ignore_case(url, "git@github.com:") {
        return Some(rest);
    }
    for scheme in ["ssh://", "git://", "https://", "http://"] {
        if let Some(rest) = strip_prefix_ignore_case(url, scheme) {
            let rest = match rest.split_once('/') {
                Some((authority, _)) => match authority.rfind('@') {
                    Some(at) => &rest[at + 1..],
                    None => rest,
                },
                None => rest,
            };
            return strip_prefix_ignore_case(rest, "github.com/");
        }
    }
    None
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

/// Rewrite any recognised GitHub URL to its canonical https clone form.
///
/// Other URLs are returned unchanged.
pub fn normalize_url(url: &str) -> String {
    match parse_github_url(url) {
        Some(slug) => format!("https://github.com/{}/{}.git", slug.owner, slug.repo),
        None => url.trim().to_string(),
    }
}

/// GitHub access through the `gh` command-line tool.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: String,
}

impl GhCli {
    /// Use the `gh` program found on `PATH`.
    pub fn new() -> Self {
        GhCli::with_program("gh")
    }

    /// Use a specific executable.
    pub fn with_program(program: impl Into<String>) -> Self {
        GhCli {
            program: program.into(),
        }
    }

    fn api<T: for<'de> Deserialize<'de>>(&self, args: &[&str]) -> Result<T, HostingError> {
        let command = format!("{} api {}", self.program, args.join(" "));
        let output = Command::new(&self.program).arg("api").args(args).output()?;
        if !output.status.success() {
            return Err(HostingError::CommandFailed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        serde_json::from_slice(&output.stdout).map_err(|source| HostingError::Decode { command, source })
    }
}

impl Default for GhCli {
    fn default() -> Self {
        GhCli::new()
    }
}

impl HostingApi for GhCli {
    fn current_user(&self) -> Result<User, HostingError> {
        self.api(&["user"])
    }

    fn fork(&self, slug: &RepoSlug) -> Result<Fork, HostingError> {
        let endpoint = format!("repos/{}/{}/forks", slug.owner, slug.repo);
        self.api(&["--method", "POST", &endpoint])
    }
}
