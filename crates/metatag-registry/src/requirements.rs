//! Requirement lists: a package's `REQUIRE` file and the registry's
//! per-version `requires` file share one line-oriented format.
//!
//! ```text
//! # comment
//! Bar ^0.3
//! Baz >=1.0.0, <3.0.0
//! Qux
//! ```

use std::fmt;

use semver::VersionReq;

use crate::error::{RegistryError, Result};
use crate::version::Version;

/// A dependency on a package, constrained by a version requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub package: String,
    pub req: VersionReq,
}

impl Requirement {
    pub fn new(package: impl Into<String>, req: VersionReq) -> Self {
        Requirement {
            package: package.into(),
            req,
        }
    }

    /// Whether `version` satisfies this requirement.
    pub fn matches(&self, version: &Version) -> bool {
        self.req.matches(&version.to_semver())
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.req == VersionReq::STAR {
            f.write_str(&self.package)
        } else {
            write!(f, "{} {}", self.package, self.req)
        }
    }
}

/// Parse requirement lines. Blank lines and `#` comments are ignored; a
/// package without a requirement accepts any version.
pub fn parse(text: &str) -> Result<Vec<Requirement>> {
    let mut reqs = Vec::new();
    for raw in text.lines() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let (package, constraint) = match line.split_once(char::is_whitespace) {
            Some((package, rest)) => (package, rest.trim()),
            None => (line, ""),
        };
        let req = if constraint.is_empty() {
            VersionReq::STAR
        } else {
            VersionReq::parse(constraint).map_err(|e| RegistryError::InvalidRequirement {
                line: raw.trim().to_string(),
                detail: e.to_string(),
            })?
        };
        reqs.push(Requirement::new(package, req));
    }
    Ok(reqs)
}

/// Render requirements one per line, sorted by package name.
pub fn serialize(reqs: &[Requirement]) -> String {
    let mut sorted: Vec<&Requirement> = reqs.iter().collect();
    sorted.sort_by(|a, b| a.package.cmp(&b.package));
    sorted.iter().map(|r| format!("{r}\n")).collect()
}
