//! Publishing local registry commits.
//!
//! Publishing checks that the registry branch is strictly ahead of its
//! upstream, verifies every changed version entry against the package's
//! tags, runs the consistency checks, pushes the package tags and finally
//! prepares a pull request for the registry branch. Nothing is pushed until
//! every check has passed.

use std::collections::{BTreeMap, BTreeSet};

use metatag_vcs::{ContentStore, GitRepo, HostingApi};

use crate::check::check_metadata;
use crate::error::{RegistryError, Result};
use crate::graph::DependencyGraph;
use crate::layout::{self, Workspace};
use crate::pull_request::{open_pull_request, PullRequest};
use crate::version::Version;

/// Tags pushed for one package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackagePush {
    pub package: String,
    /// Tags of rewritable versions, pushed with force.
    pub forced: Vec<String>,
    /// Tags of immutable versions.
    pub unforced: Vec<String>,
}

/// The outcome of a successful publish.
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub branch: String,
    pub pushes: Vec<PackagePush>,
    pub pull_request: PullRequest,
}

/// Publish the registry `branch`, pushing to the branch `pr_branch` on the
/// fork (default `pull-request/<short commit>`).
pub fn publish(
    ws: &Workspace,
    branch: &str,
    pr_branch: Option<&str>,
    graph: &dyn DependencyGraph,
    hosting: &dyn HostingApi,
) -> Result<PublishReport> {
    let registry = ws.open_registry()?;
    let current = registry.current_branch()?;
    if current.as_deref() != Some(branch) {
        return Err(RegistryError::WrongBranch {
            expected: branch.to_string(),
            actual: current.unwrap_or_else(|| "detached HEAD".to_string()),
        });
    }

    let remote = ws.registry_remote();
    registry.fetch(remote)?;
    let upstream = format!("{remote}/{branch}");
    let (behind, ahead) = registry.rev_count(&upstream, branch)?;
    if behind > 0 {
        return Err(RegistryError::BehindUpstream {
            upstream,
            commits: behind,
        });
    }
    if ahead == 0 {
        return Err(RegistryError::NothingToPublish {
            branch: branch.to_string(),
        });
    }

    let changed = changed_entries(&registry, &upstream, branch)?;
    let mut repos = BTreeMap::new();
    let mut pushes = Vec::new();
    for (package, versions) in &changed {
        let repo = ws.open_package(package)?;
        pushes.push(verify_tags(&repo, package, versions)?);
        repos.insert(package.clone(), repo);
    }

    let touched: BTreeSet<String> = changed.keys().cloned().collect();
    check_metadata(ws.registry_dir(), &touched, graph)?;

    let mut pushed = Vec::new();
    for push in &pushes {
        let Some(repo) = repos.get(&push.package) else {
            continue;
        };
        push_tags(repo, ws.package_remote(), push).map_err(|source| RegistryError::PushFailed {
            package: push.package.clone(),
            pushed: pushed.clone(),
            source,
        })?;
        pushed.push(push.package.clone());
    }

    let pull_request = open_pull_request(&registry, hosting, remote, Some(branch), None, pr_branch)?;
    Ok(PublishReport {
        branch: branch.to_string(),
        pushes,
        pull_request,
    })
}

/// Version pointers added or changed on `branch` since `upstream`. A pointer
/// that already existed upstream must not have changed.
fn changed_entries(
    registry: &GitRepo,
    upstream: &str,
    branch: &str,
) -> Result<BTreeMap<String, BTreeMap<Version, String>>> {
    let mut changed: BTreeMap<String, BTreeMap<Version, String>> = BTreeMap::new();
    for path in registry.diff(upstream, branch)? {
        let Some((package, version)) = layout::parse_sha1_path(&path) else {
            continue;
        };
        let Some(new) = read_pointer(registry, branch, &path)? else {
            continue;
        };
        if let Some(old) = read_pointer(registry, upstream, &path)? {
            if old != new {
                return Err(RegistryError::PointerDivergence {
                    package,
                    version: version.to_string(),
                    old,
                    new,
                });
            }
        }
        changed.entry(package).or_default().insert(version, new);
    }
    Ok(changed)
}

fn read_pointer(registry: &GitRepo, reference: &str, path: &str) -> Result<Option<String>> {
    Ok(registry
        .read_blob_at(reference, path)?
        .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string()))
}

/// Check each version's tag against its registry pointer and sort the tags
/// into forced and unforced pushes.
fn verify_tags(
    repo: &GitRepo,
    package: &str,
    versions: &BTreeMap<Version, String>,
) -> Result<PackagePush> {
    let mut push = PackagePush {
        package: package.to_string(),
        ..PackagePush::default()
    };
    for (version, pointer) in versions {
        let tag = version.tag_name();
        let Some(commit) = repo.resolve_ref(&format!("refs/tags/{tag}"))? else {
            return Err(RegistryError::UntaggedEntry {
                package: package.to_string(),
                version: version.to_string(),
                pointer: pointer.clone(),
            });
        };
        if &commit != pointer {
            return Err(RegistryError::TagMismatch {
                package: package.to_string(),
                version: version.to_string(),
                expected: pointer.clone(),
                actual: commit,
            });
        }
        if version.is_rewritable() {
            push.forced.push(tag);
        } else {
            push.unforced.push(tag);
        }
    }
    Ok(push)
}

fn push_tags(repo: &GitRepo, remote: &str, push: &PackagePush) -> metatag_vcs::Result<()> {
    let refspecs = |tags: &[String]| -> Vec<String> {
        tags.iter()
            .map(|tag| format!("refs/tags/{tag}:refs/tags/{tag}"))
            .collect()
    };
    if !push.forced.is_empty() {
        repo.push(remote, &refspecs(&push.forced), true)?;
    }
    if !push.unforced.is_empty() {
        repo.push(remote, &refspecs(&push.unforced), false)?;
    }
    Ok(())
}
