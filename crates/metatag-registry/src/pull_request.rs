//! Preparing pull requests: fork the upstream repository, push a branch to
//! the fork and report the comparison URL. The pull request itself is left
//! for the user to open.

use metatag_vcs::{ContentStore, HostingApi, RepoSlug};

use crate::error::{RegistryError, Result};
use crate::layout::Workspace;
use crate::metadata;

/// A branch pushed to a fork, ready to be opened as a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub repository: RepoSlug,
    pub user: String,
    pub branch: String,
    pub commit: String,
    pub fork_url: String,
    pub compare_url: String,
}

/// Branch name used when none is given.
pub fn default_branch(commit: &str) -> String {
    let short: String = commit.chars().take(8).collect();
    format!("pull-request/{short}")
}

/// Fork the repository at `url` and push `commit` to a branch on the fork.
///
/// `commit` defaults to `HEAD`, `url` to the URL of `remote`, and `branch`
/// to `pull-request/<first 8 hex digits>`.
pub fn open_pull_request<S: ContentStore + ?Sized>(
    repo: &S,
    hosting: &dyn HostingApi,
    remote: &str,
    commit: Option<&str>,
    url: Option<&str>,
    branch: Option<&str>,
) -> Result<PullRequest> {
    let reference = commit.unwrap_or("HEAD");
    let commit = repo
        .resolve_ref(reference)?
        .ok_or_else(|| RegistryError::UnknownCommit {
            reference: reference.to_string(),
            path: repo.work_dir().to_path_buf(),
        })?;

    let url = match url {
        Some(url) => url.to_string(),
        None => repo
            .config(&format!("remote.{remote}.url"))?
            .ok_or_else(|| RegistryError::NoURLConfigured {
                package: repo.work_dir().display().to_string(),
            })?,
    };
    let repository = hosting
        .parse_remote(&url)
        .ok_or_else(|| RegistryError::NotAGitHubRemote { url: url.clone() })?;

    let fork_failed = |source| RegistryError::RemoteForkFailed {
        repository: repository.to_string(),
        source,
    };
    let user = hosting.current_user().map_err(fork_failed)?;
    let fork = hosting.fork(&repository).map_err(fork_failed)?;

    let branch = branch
        .map(str::to_string)
        .unwrap_or_else(|| default_branch(&commit));
    repo.push(&fork.ssh_url, &[format!("{commit}:refs/heads/{branch}")], false)?;

    let compare_url = format!("{}/compare/{}", fork.html_url.trim_end_matches('/'), branch);
    Ok(PullRequest {
        repository,
        user: user.login,
        branch,
        commit,
        fork_url: fork.html_url,
        compare_url,
    })
}

/// Open a pull request from a package repository against its registered URL.
pub fn submit(
    ws: &Workspace,
    package: &str,
    commit: Option<&str>,
    hosting: &dyn HostingApi,
) -> Result<PullRequest> {
    let repo = ws.open_package(package)?;
    let url = metadata::read_url(ws.registry_dir(), package)?.ok_or_else(|| {
        RegistryError::NoURLConfigured {
            package: package.to_string(),
        }
    })?;
    open_pull_request(&repo, hosting, ws.package_remote(), commit, Some(&url), None)
}
