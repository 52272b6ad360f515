//! Tagging package versions and recording them in the registry.
//!
//! A tag is created (or moved) first; if the package is registered, the
//! registry entry is then written in its own transaction. When that fails the
//! tag is put back the way it was, so a tag never exists without its entry.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use metatag_vcs::{ContentStore, Transaction};

use crate::error::{RegistryError, Result};
use crate::layout::Workspace;
use crate::metadata;
use crate::register::{requires_at, version_tags};
use crate::version::{check_new_version, Version, VersionSpec};
use crate::writer;

/// The outcome of tagging a version.
#[derive(Debug, Clone)]
pub struct TagOutcome {
    pub package: String,
    pub version: Version,
    pub commit: String,
    /// Rewritable versions get lightweight tags that may be moved later.
    pub rewritable: bool,
    /// Registry commit, `None` for unregistered packages or unchanged entries.
    pub registry_commit: Option<String>,
}

/// Tag `package` at `commit_ref` (default `HEAD`).
///
/// A selector is applied to the highest existing version that is an ancestor
/// of the commit, falling back to the highest version overall. Existing
/// versions are those in the registry for a registered package, otherwise
/// the package's own version tags. Unless `force` is set, the selected
/// version is then checked against them. Explicit versions are taken as
/// given; the registry entry still refuses to move an immutable pointer.
pub fn tag(
    ws: &Workspace,
    package: &str,
    spec: &VersionSpec,
    commit_ref: Option<&str>,
    force: bool,
) -> Result<TagOutcome> {
    let pkg_repo = ws.open_package(package)?;
    let registry = ws.open_registry()?;

    if registry.is_dirty(Some(package))? {
        return Err(RegistryError::DirtyWorkingTree {
            path: ws.registry_dir().join(package),
        });
    }
    if pkg_repo.is_dirty(None)? {
        return Err(RegistryError::DirtyWorkingTree {
            path: pkg_repo.work_dir().to_path_buf(),
        });
    }

    let reference = commit_ref.unwrap_or("HEAD");
    let commit = pkg_repo
        .resolve_ref(reference)?
        .ok_or_else(|| RegistryError::UnknownCommit {
            reference: reference.to_string(),
            path: pkg_repo.work_dir().to_path_buf(),
        })?;

    let registered = metadata::is_registered(ws.registry_dir(), package);
    let version = target_version(
        &pkg_repo,
        ws.registry_dir(),
        package,
        registered,
        spec,
        &commit,
        force,
    )?;

    let tag_name = version.tag_name();
    let previous = pkg_repo.resolve_ref(&format!("refs/tags/{tag_name}"))?;
    let rewritable = version.is_rewritable();
    pkg_repo
        .tag_create(
            &tag_name,
            &commit,
            &tag_message(package, &version, &commit),
            force || rewritable,
        )
        .map_err(|source| RegistryError::TagCreationError {
            tag: tag_name.clone(),
            source,
        })?;

    let registry_commit = if registered {
        match record(&registry, &pkg_repo, package, &version, &commit, force) {
            Ok(id) => id,
            Err(cause) => {
                return Err(rollback(
                    &pkg_repo,
                    package,
                    &version,
                    previous.as_deref(),
                    cause,
                ))
            }
        }
    } else {
        None
    };

    Ok(TagOutcome {
        package: package.to_string(),
        version,
        commit,
        rewritable,
        registry_commit,
    })
}

/// Annotation for immutable tags; rewritable tags stay lightweight.
fn tag_message(package: &str, version: &Version, commit: &str) -> String {
    if version.is_rewritable() {
        return String::new();
    }
    let short = commit.get(..10).unwrap_or(commit);
    format!("{package} v{version} [{short}]")
}

fn target_version<S: ContentStore + ?Sized>(
    pkg_repo: &S,
    registry_dir: &Path,
    package: &str,
    registered: bool,
    spec: &VersionSpec,
    commit: &str,
    force: bool,
) -> Result<Version> {
    let selector = match spec {
        VersionSpec::Exact(version) => return Ok(version.clone()),
        VersionSpec::Select(selector) => selector,
    };

    let existing: BTreeMap<Version, String> = if registered {
        metadata::available_for(registry_dir, package)?
            .into_iter()
            .map(|(version, avail)| (version, avail.pointer))
            .collect()
    } else {
        version_tags(pkg_repo, package)?
    };

    let mut ancestors = Vec::new();
    for (version, pointer) in &existing {
        if pkg_repo.is_commit(pointer)? && pkg_repo.is_ancestor(pointer, commit)? {
            ancestors.push(version);
        }
    }
    let zero = Version::ZERO;
    let base = ancestors
        .last()
        .copied()
        .or_else(|| existing.keys().next_back())
        .unwrap_or(&zero);
    let version = selector.next(base)?;
    if force {
        return Ok(version);
    }

    let mut versions: BTreeSet<Version> = existing.into_keys().collect();
    if version.is_rewritable() {
        versions.remove(&version);
    }
    check_new_version(&versions, &version)?;
    Ok(version)
}

/// Write the registry entry for a freshly created tag and commit it.
fn record<R, P>(
    registry: &R,
    pkg_repo: &P,
    package: &str,
    version: &Version,
    commit: &str,
    force: bool,
) -> Result<Option<String>>
where
    R: ContentStore + ?Sized,
    P: ContentStore + ?Sized,
{
    let requires = requires_at(pkg_repo, commit)?;
    let mut tx = Transaction::begin(registry);
    writer::write_entry(&mut tx, package, version, commit, &requires, force)?;
    Ok(tx.commit(&format!("Tag {package} v{version}"))?)
}

/// Undo a tag after `cause` aborted the registry update: restore the tag's
/// previous target, or delete it if it did not exist before.
fn rollback<S: ContentStore + ?Sized>(
    pkg_repo: &S,
    package: &str,
    version: &Version,
    previous: Option<&str>,
    cause: RegistryError,
) -> RegistryError {
    let tag_name = version.tag_name();
    let undone = match previous {
        Some(prev) => pkg_repo.tag_create(&tag_name, prev, &tag_message(package, version, prev), true),
        None => pkg_repo.tag_delete(&tag_name),
    };
    match undone {
        Ok(()) => cause,
        Err(source) => RegistryError::TagRollbackFailed {
            tag: tag_name,
            cause: Box::new(cause),
            source,
        },
    }
}
