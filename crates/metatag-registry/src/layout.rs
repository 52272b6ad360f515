//! Registry layout and workspace handles.
//!
//! ```text
//! <registry>/
//!   <package>/
//!     url
//!     versions/
//!       <version>/
//!         sha1
//!         requires
//! ```

use std::path::{Path, PathBuf};

use metatag_vcs::{GitRepo, StoreError};

use crate::error::{RegistryError, Result};
use crate::version::Version;

/// Requirements file at the root of a package repository.
pub const REQUIRE_FILE: &str = "REQUIRE";

pub fn url_path(package: &str) -> String {
    format!("{package}/url")
}

pub fn versions_path(package: &str) -> String {
    format!("{package}/versions")
}

pub fn sha1_path(package: &str, version: &Version) -> String {
    format!("{package}/versions/{version}/sha1")
}

pub fn requires_path(package: &str, version: &Version) -> String {
    format!("{package}/versions/{version}/requires")
}

/// Recognise `<package>/versions/<version>/sha1` with a valid version.
pub fn parse_sha1_path(path: &str) -> Option<(String, Version)> {
    let parts: Vec<&str> = path.split('/').collect();
    match parts.as_slice() {
        [package, "versions", version, "sha1"] if !package.is_empty() => {
            let version = version.parse().ok()?;
            Some((package.to_string(), version))
        }
        _ => None,
    }
}

/// Where the registry and package checkouts live, and which remotes to use.
#[derive(Debug, Clone)]
pub struct Workspace {
    registry: PathBuf,
    packages: PathBuf,
    registry_remote: String,
    package_remote: String,
}

impl Workspace {
    /// A workspace using `origin` for both registry and packages.
    pub fn new(registry: impl Into<PathBuf>, packages: impl Into<PathBuf>) -> Self {
        Workspace {
            registry: registry.into(),
            packages: packages.into(),
            registry_remote: "origin".to_string(),
            package_remote: "origin".to_string(),
        }
    }

    pub fn with_remotes(mut self, registry: impl Into<String>, package: impl Into<String>) -> Self {
        self.registry_remote = registry.into();
        self.package_remote = package.into();
        self
    }

    pub fn registry_dir(&self) -> &Path {
        &self.registry
    }

    pub fn package_dir(&self, package: &str) -> PathBuf {
        self.packages.join(package)
    }

    pub fn registry_remote(&self) -> &str {
        &self.registry_remote
    }

    pub fn package_remote(&self) -> &str {
        &self.package_remote
    }

    pub fn open_registry(&self) -> Result<GitRepo> {
        GitRepo::open(&self.registry).map_err(|e| not_a_repo("registry", e))
    }

    pub fn open_package(&self, package: &str) -> Result<GitRepo> {
        GitRepo::open(self.package_dir(package)).map_err(|e| not_a_repo(package, e))
    }
}

fn not_a_repo(package: &str, err: StoreError) -> RegistryError {
    match err {
        StoreError::NotARepository { path } => RegistryError::NotAGitRepo {
            package: package.to_string(),
            path,
        },
        other => RegistryError::Store(other),
    }
}
