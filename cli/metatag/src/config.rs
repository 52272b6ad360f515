//! `metatag.toml` parsing and workspace configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use metatag_registry::Workspace;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "metatag.toml";

/// The top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetatagConfig {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub packages: PackagesConfig,
    #[serde(default)]
    pub hosting: HostingConfig,
}

/// Registry checkout section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry working copy, relative to the config file.
    #[serde(default = "default_registry_path")]
    pub path: String,
    /// Remote fetched and compared against by `publish`.
    #[serde(default = "default_remote")]
    pub remote: String,
    /// Default publish branch.
    #[serde(default = "default_branch")]
    pub branch: String,
}

/// Package checkouts section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagesConfig {
    /// Directory holding one checkout per package.
    #[serde(default = "default_packages_root")]
    pub root: String,
    /// Remote package tags are pushed to.
    #[serde(default = "default_remote")]
    pub remote: String,
}

/// Hosting provider section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostingConfig {
    /// Command used to reach the hosting API.
    #[serde(default = "default_tool")]
    pub tool: String,
}

fn default_registry_path() -> String {
    "METADATA".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_packages_root() -> String {
    ".".to_string()
}

fn default_tool() -> String {
    "gh".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            path: default_registry_path(),
            remote: default_remote(),
            branch: default_branch(),
        }
    }
}

impl Default for PackagesConfig {
    fn default() -> Self {
        PackagesConfig {
            root: default_packages_root(),
            remote: default_remote(),
        }
    }
}

impl Default for HostingConfig {
    fn default() -> Self {
        HostingConfig {
            tool: default_tool(),
        }
    }
}

impl MetatagConfig {
    /// Search upward from `start_dir` for a `metatag.toml` file, parse and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let config: MetatagConfig = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((config, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Load the nearest configuration, falling back to defaults relative to
    /// `cwd` when there is none.
    pub fn load_or_default(cwd: &Path) -> Result<(Self, PathBuf)> {
        Ok(Self::find_and_load(cwd)?.unwrap_or_else(|| (Self::default(), cwd.to_path_buf())))
    }

    /// The registry and package locations, resolved against `base_dir`.
    pub fn workspace(&self, base_dir: &Path) -> Workspace {
        Workspace::new(
            base_dir.join(&self.registry.path),
            base_dir.join(&self.packages.root),
        )
        .with_remotes(self.registry.remote.as_str(), self.packages.remote.as_str())
    }

    /// Parse a configuration from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing metatag.toml")
    }
}
