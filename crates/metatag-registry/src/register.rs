//! First-time registration of a package.

use std::collections::BTreeMap;

use metatag_vcs::{normalize_url, ContentStore, Transaction};

use crate::error::{RegistryError, Result};
use crate::layout::{self, Workspace};
use crate::metadata;
use crate::requirements::{self, Requirement};
use crate::version::Version;
use crate::writer;

/// The outcome of registering a package.
#[derive(Debug, Clone)]
pub struct Registration {
    pub package: String,
    pub url: String,
    /// Versions recorded, ascending.
    pub versions: Vec<Version>,
    /// Registry commit, `None` when nothing changed.
    pub commit: Option<String>,
}

/// Map every `v<version>` tag of `repo` to the commit it resolves to.
///
/// Tags that are not versions are ignored. Two tags spelling the same version
/// (`v1.0` and `v1.0.0`) must agree on the commit.
pub fn version_tags<S: ContentStore + ?Sized>(
    repo: &S,
    package: &str,
) -> Result<BTreeMap<Version, String>> {
    let mut found: BTreeMap<Version, (String, String)> = BTreeMap::new();
    for tag in repo.tag_list()? {
        let Some(version) = Version::from_tag(&tag) else {
            continue;
        };
        let Some(commit) = repo.resolve_ref(&format!("refs/tags/{tag}"))? else {
            continue;
        };
        if let Some((first, existing)) = found.get(&version) {
            if *existing != commit {
                return Err(RegistryError::MistaggedVersion {
                    package: package.to_string(),
                    version: version.to_string(),
                    first: first.clone(),
                    second: tag,
                });
            }
            continue;
        }
        found.insert(version, (tag, commit));
    }
    Ok(found
        .into_iter()
        .map(|(version, (_, commit))| (version, commit))
        .collect())
}

/// Requirements recorded in `REQUIRE` at `commit`, empty if there is none.
pub fn requires_at<S: ContentStore + ?Sized>(repo: &S, commit: &str) -> Result<Vec<Requirement>> {
    match repo.read_blob_at(commit, layout::REQUIRE_FILE)? {
        Some(bytes) => requirements::parse(&String::from_utf8_lossy(&bytes)),
        None => Ok(Vec::new()),
    }
}

/// Register `package`, recording its URL and every existing version tag.
///
/// Without an explicit `url`, the package's configured remote URL is used.
/// GitHub URLs are normalised to their https form.
pub fn register(ws: &Workspace, package: &str, url: Option<&str>) -> Result<Registration> {
    let pkg_repo = ws.open_package(package)?;
    let url = match url {
        Some(url) => url.trim().to_string(),
        None => {
            let key = format!("remote.{}.url", ws.package_remote());
            pkg_repo
                .config(&key)?
                .filter(|u| !u.is_empty())
                .ok_or_else(|| RegistryError::NoURLConfigured {
                    package: package.to_string(),
                })?
        }
    };
    let url = normalize_url(&url);

    if metadata::is_registered(ws.registry_dir(), package) {
        return Err(RegistryError::AlreadyRegistered {
            package: package.to_string(),
        });
    }
    let registry = ws.open_registry()?;
    let tags = version_tags(&pkg_repo, package)?;

    let mut tx = Transaction::begin(&registry);
    tx.write(&layout::url_path(package), &format!("{url}\n"))?;
    for (version, commit) in &tags {
        let requires = requires_at(&pkg_repo, commit)?;
        writer::write_entry(&mut tx, package, version, commit, &requires, true)?;
    }

    let versions: Vec<Version> = tags.keys().cloned().collect();
    let mut message = format!("Register {package}");
    if !versions.is_empty() {
        let listed: Vec<String> = versions.iter().map(Version::tag_name).collect();
        message.push_str(&format!(": {}", listed.join(", ")));
    }
    let commit = tx.commit(&message)?;

    Ok(Registration {
        package: package.to_string(),
        url,
        versions,
        commit,
    })
}
