//! Reading registry entries from a registry working tree.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;
use crate::layout;
use crate::requirements::{self, Requirement};
use crate::version::Version;

/// A registered package version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Available {
    /// Commit the version was registered at.
    pub pointer: String,
    pub requires: Vec<Requirement>,
}

/// Every registered version of every package.
pub type Availability = BTreeMap<String, BTreeMap<Version, Available>>;

/// Whether `package` has a url file in the registry.
pub fn is_registered(registry: &Path, package: &str) -> bool {
    registry.join(layout::url_path(package)).is_file()
}

/// The registered URL of `package`, if any.
pub fn read_url(registry: &Path, package: &str) -> Result<Option<String>> {
    let path = registry.join(layout::url_path(package));
    if !path.is_file() {
        return Ok(None);
    }
    let url = std::fs::read_to_string(path)?.trim().to_string();
    Ok(if url.is_empty() { None } else { Some(url) })
}

/// Registered versions of one package. Version directories whose name is not
/// a version, or which lack a pointer file, are skipped.
pub fn available_for(registry: &Path, package: &str) -> Result<BTreeMap<Version, Available>> {
    let mut versions = BTreeMap::new();
    let dir = registry.join(layout::versions_path(package));
    if !dir.is_dir() {
        return Ok(versions);
    }

    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        let Some(version) = entry
            .file_name()
            .to_str()
            .and_then(|name| name.parse::<Version>().ok())
        else {
            continue;
        };
        let sha1 = entry.path().join("sha1");
        if !sha1.is_file() {
            continue;
        }
        let pointer = std::fs::read_to_string(&sha1)?.trim().to_string();
        let requires_path = entry.path().join("requires");
        let requires = if requires_path.is_file() {
            requirements::parse(&std::fs::read_to_string(&requires_path)?)?
        } else {
            Vec::new()
        };
        versions.insert(version, Available { pointer, requires });
    }
    Ok(versions)
}

/// Registered versions of every package with a url file.
pub fn available(registry: &Path) -> Result<Availability> {
    let mut avail = Availability::new();
    if !registry.is_dir() {
        return Ok(avail);
    }
    for entry in std::fs::read_dir(registry)? {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with('.') || !entry.path().is_dir() || !is_registered(registry, &name) {
            continue;
        }
        let versions = available_for(registry, &name)?;
        avail.insert(name, versions);
    }
    Ok(avail)
}
