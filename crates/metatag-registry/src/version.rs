//! Version numbers and the tagging policy built on them.
//!
//! Versions follow semantic-version precedence, extended with placeholder
//! versions: a lone `-` or `+` suffix (`1.0.0-`, `1.0.0+`) denotes a single
//! empty identifier, used for "not yet released" tags that may be moved.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Bound;
use std::str::FromStr;

use crate::error::{RegistryError, Result};

/// A prerelease or build identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Numeric(u64),
    /// Alphanumeric identifier; the empty string marks a placeholder.
    Alpha(String),
}

impl Identifier {
    /// The empty placeholder identifier.
    pub fn empty() -> Self {
        Identifier::Alpha(String::new())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Identifier::Alpha(s) if s.is_empty())
    }

    fn parse(s: &str) -> Option<Self> {
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return None;
        }
        if s.chars().all(|c| c.is_ascii_digit()) {
            return s.parse().ok().map(Identifier::Numeric);
        }
        Some(Identifier::Alpha(s.to_string()))
    }
}

impl Ord for Identifier {
    // empty < numeric < non-empty alphanumeric
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Identifier::Numeric(a), Identifier::Numeric(b)) => a.cmp(b),
            (Identifier::Alpha(a), Identifier::Alpha(b)) => a.cmp(b),
            (Identifier::Numeric(_), Identifier::Alpha(b)) => {
                if b.is_empty() {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
            (Identifier::Alpha(a), Identifier::Numeric(_)) => {
                if a.is_empty() {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
        }
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(n) => write!(f, "{n}"),
            Identifier::Alpha(s) => f.write_str(s),
        }
    }
}

/// A package version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Vec<Identifier>,
    pub build: Vec<Identifier>,
}

impl Version {
    pub const ZERO: Version = Version::new(0, 0, 0);

    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
            pre: Vec::new(),
            build: Vec::new(),
        }
    }

    /// Parse a tag name of the form `v<version>`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        tag.strip_prefix('v')?.parse().ok()
    }

    /// The tag name for this version.
    pub fn tag_name(&self) -> String {
        format!("v{self}")
    }

    /// The release triple with prerelease and build dropped.
    pub fn this_patch(&self) -> Version {
        Version::new(self.major, self.minor, self.patch)
    }

    pub fn this_minor(&self) -> Version {
        Version::new(self.major, self.minor, 0)
    }

    pub fn this_major(&self) -> Version {
        Version::new(self.major, 0, 0)
    }

    /// The following patch release; a prerelease moves to its own release.
    pub fn next_patch(&self) -> Result<Version> {
        let this = self.this_patch();
        if *self < this {
            return Ok(this);
        }
        Ok(Version::new(self.major, self.minor, self.increment("patch", self.patch)?))
    }

    pub fn next_minor(&self) -> Result<Version> {
        let this = self.this_minor();
        if *self < this {
            return Ok(this);
        }
        Ok(Version::new(self.major, self.increment("minor", self.minor)?, 0))
    }

    pub fn next_major(&self) -> Result<Version> {
        let this = self.this_major();
        if *self < this {
            return Ok(this);
        }
        Ok(Version::new(self.increment("major", self.major)?, 0, 0))
    }

    fn increment(&self, part: &str, value: u64) -> Result<u64> {
        value.checked_add(1).ok_or_else(|| RegistryError::VersionConflict {
            version: self.to_string(),
            reason: format!("{part} number of {self} has no successor"),
        })
    }

    /// The smallest version sharing this release triple (`x.y.z-`).
    pub fn lower_bound(&self) -> Version {
        Version {
            pre: vec![Identifier::empty()],
            ..self.this_patch()
        }
    }

    /// Whether the tag for this version may be moved.
    ///
    /// Minor and major releases (patch zero) and placeholders carrying a
    /// single empty prerelease or build identifier are rewritable.
    pub fn is_rewritable(&self) -> bool {
        self.patch == 0 || is_placeholder(&self.pre) || is_placeholder(&self.build)
    }

    /// The next version for a `bump` request: unchanged when rewritable.
    pub fn next_bump(&self) -> Result<Version> {
        if self.is_rewritable() {
            Ok(self.clone())
        } else {
            self.next_patch()
        }
    }

    /// Convert for matching against `semver` requirements.
    ///
    /// A placeholder prerelease maps to the lowest semver prerelease (`-0`);
    /// build metadata is irrelevant to matching and dropped.
    pub fn to_semver(&self) -> semver::Version {
        let pre = if self.pre.is_empty() {
            semver::Prerelease::EMPTY
        } else if is_placeholder(&self.pre) {
            semver::Prerelease::new("0").unwrap_or(semver::Prerelease::EMPTY)
        } else {
            semver::Prerelease::new(&join(&self.pre)).unwrap_or(semver::Prerelease::EMPTY)
        };
        semver::Version {
            major: self.major,
            minor: self.minor,
            patch: self.patch,
            pre,
            build: semver::BuildMetadata::EMPTY,
        }
    }
}

fn is_placeholder(ids: &[Identifier]) -> bool {
    ids.len() == 1 && ids[0].is_empty()
}

fn join(ids: &[Identifier]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

fn parse_identifiers(s: &str) -> Option<Vec<Identifier>> {
    if s.is_empty() {
        return Some(vec![Identifier::empty()]);
    }
    s.split('.').map(Identifier::parse).collect()
}

impl FromStr for Version {
    type Err = RegistryError;

    /// Parse `MAJOR[.MINOR[.PATCH]][-PRE][+BUILD]`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || RegistryError::InvalidVersion {
            input: s.to_string(),
        };
        let (rest, build) = match s.split_once('+') {
            Some((rest, build)) => (rest, parse_identifiers(build).ok_or_else(invalid)?),
            None => (s, Vec::new()),
        };
        let (release, pre) = match rest.split_once('-') {
            Some((release, pre)) => (release, parse_identifiers(pre).ok_or_else(invalid)?),
            None => (rest, Vec::new()),
        };

        let mut parts = Vec::with_capacity(3);
        for part in release.split('.') {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            parts.push(part.parse::<u64>().map_err(|_| invalid())?);
        }
        if parts.len() > 3 {
            return Err(invalid());
        }
        parts.resize(3, 0);

        Ok(Version {
            major: parts[0],
            minor: parts[1],
            patch: parts[2],
            pre,
            build,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.pre.is_empty() {
            write!(f, "-{}", join(&self.pre))?;
        }
        if !self.build.is_empty() {
            write!(f, "+{}", join(&self.build))?;
        }
        Ok(())
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            // A release sorts above any of its prereleases.
            .then_with(|| match (self.pre.is_empty(), other.pre.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => self.pre.cmp(&other.pre),
            })
            // Build metadata only breaks ties, keeping the order total.
            .then_with(|| self.build.cmp(&other.build))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A symbolic request for the next version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// Keep a rewritable version, otherwise the next patch.
    Bump,
    Patch,
    Minor,
    Major,
}

impl Selector {
    /// Compute the successor of `base`.
    pub fn next(&self, base: &Version) -> Result<Version> {
        match self {
            Selector::Bump => base.next_bump(),
            Selector::Patch => base.next_patch(),
            Selector::Minor => base.next_minor(),
            Selector::Major => base.next_major(),
        }
    }
}

impl FromStr for Selector {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bump" => Ok(Selector::Bump),
            "patch" => Ok(Selector::Patch),
            "minor" => Ok(Selector::Minor),
            "major" => Ok(Selector::Major),
            other => Err(RegistryError::InvalidSelector {
                selector: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Selector::Bump => "bump",
            Selector::Patch => "patch",
            Selector::Minor => "minor",
            Selector::Major => "major",
        })
    }
}

/// What the user asked to tag: a concrete version or a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    Exact(Version),
    Select(Selector),
}

impl FromStr for VersionSpec {
    type Err = RegistryError;

    /// Anything starting with a digit (optionally after `v`) is a version;
    /// everything else must be a selector name.
    fn from_str(s: &str) -> Result<Self> {
        let digits = s.strip_prefix('v').unwrap_or(s);
        if digits.starts_with(|c: char| c.is_ascii_digit()) {
            return digits.parse().map(VersionSpec::Exact);
        }
        s.parse().map(VersionSpec::Select)
    }
}

/// Compute the successor of `base` for a selector given by name.
pub fn next_selector(selector: &str, base: &Version) -> Result<Version> {
    selector.parse::<Selector>()?.next(base)
}

/// Check that `candidate` may be added next to `existing` versions.
///
/// Initial versions must be (prereleases of) 0.0.0, 0.0.1, 0.1.0 or 1.0.0.
/// Later versions must be new, must not sort below every existing version,
/// must not skip past the next patch/minor/major of their predecessor, and a
/// prerelease must not precede an already existing release it belongs to.
pub fn check_new_version(existing: &BTreeSet<Version>, candidate: &Version) -> Result<()> {
    let conflict = |reason: String| RegistryError::VersionConflict {
        version: candidate.to_string(),
        reason,
    };

    if existing.is_empty() {
        let initial = [
            Version::new(0, 0, 0),
            Version::new(0, 0, 1),
            Version::new(0, 1, 0),
            Version::new(1, 0, 0),
        ];
        if initial
            .iter()
            .any(|v| v.lower_bound() <= *candidate && candidate <= v)
        {
            return Ok(());
        }
        return Err(conflict(format!(
            "{candidate} is not a valid initial version (try 0.0.0, 0.0.1, 0.1.0 or 1.0.0)"
        )));
    }

    let Some(previous) = existing.range(..=candidate).next_back() else {
        let lowest = existing.iter().next().map(ToString::to_string).unwrap_or_default();
        return Err(conflict(format!(
            "{candidate} is lower than every existing version (lowest is {lowest})"
        )));
    };
    if previous == candidate {
        return Err(conflict(format!("version {candidate} already exists")));
    }

    let next = if candidate.major != previous.major {
        previous.next_major()?
    } else if candidate.minor != previous.minor {
        previous.next_minor()?
    } else {
        previous.next_patch()?
    };
    if *candidate > next {
        return Err(conflict(format!("{candidate} skips over {next}")));
    }

    // Regular or build releases need no further checks.
    if candidate.this_patch() <= *candidate {
        return Ok(());
    }
    let following = existing
        .range((Bound::Excluded(candidate), Bound::Unbounded))
        .next();
    if let Some(following) = following {
        if following.this_patch() <= next {
            return Err(conflict(format!(
                "{candidate} is a pre-release of existing version {following}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    fn set(versions: &[&str]) -> BTreeSet<Version> {
        versions.iter().map(|s| v(s)).collect()
    }

    #[test]
    fn parse_and_display() {
        assert_eq!(v("1.2.3"), Version::new(1, 2, 3));
        assert_eq!(v("1.2"), Version::new(1, 2, 0));
        assert_eq!(v("2"), Version::new(2, 0, 0));
        assert_eq!(v("1.0.0-rc.1").to_string(), "1.0.0-rc.1");
        assert_eq!(v("1.0.0-").to_string(), "1.0.0-");
        assert_eq!(v("1.0.0+").to_string(), "1.0.0+");
        assert_eq!(v("1.0.0-beta+build.7").to_string(), "1.0.0-beta+build.7");
        assert_eq!(v("1.0.0-").pre, vec![Identifier::empty()]);
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", "v1.0.0", "1.0.0.0", "1..0", "a.b.c", "1.0.0-a..b", "1.0.0-é"] {
            assert!(
                matches!(bad.parse::<Version>(), Err(RegistryError::InvalidVersion { .. })),
                "{bad} should not parse"
            );
        }
    }

    #[test]
    fn tag_names() {
        assert_eq!(Version::from_tag("v1.2.3"), Some(Version::new(1, 2, 3)));
        assert_eq!(Version::from_tag("1.2.3"), None);
        assert_eq!(Version::from_tag("vnext"), None);
        assert_eq!(v("0.1.0-").tag_name(), "v0.1.0-");
    }

    #[test]
    fn precedence() {
        let ordered = [
            "1.0.0-",
            "1.0.0-0",
            "1.0.0-2",
            "1.0.0-10",
            "1.0.0-alpha",
            "1.0.0-alpha.1",
            "1.0.0-beta",
            "1.0.0",
            "1.0.0+",
            "1.0.0+build",
            "1.0.1",
            "1.1.0",
            "2.0.0",
        ];
        for pair in ordered.windows(2) {
            assert!(v(pair[0]) < v(pair[1]), "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn rewritable_classification() {
        assert!(v("1.0.0-").is_rewritable());
        assert!(v("2.0.0").is_rewritable());
        assert!(v("1.3.0").is_rewritable());
        assert!(v("1.2.3+").is_rewritable());
        assert!(v("1.2.3-").is_rewritable());
        assert!(!v("1.0.1").is_rewritable());
        assert!(!v("1.2.3-rc1").is_rewritable());
    }

    #[test]
    fn selectors() {
        let base = v("1.2.3");
        assert_eq!(next_selector("patch", &base).unwrap(), v("1.2.4"));
        assert_eq!(next_selector("minor", &base).unwrap(), v("1.3.0"));
        assert_eq!(next_selector("major", &base).unwrap(), v("2.0.0"));
        assert_eq!(next_selector("bump", &base).unwrap(), v("1.2.4"));
        assert_eq!(next_selector("bump", &v("1.2.3-")).unwrap(), v("1.2.3-"));
        assert!(matches!(
            next_selector("sideways", &base),
            Err(RegistryError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn next_of_prerelease_is_its_release() {
        assert_eq!(v("1.2.0-rc1").next_patch().unwrap(), v("1.2.0"));
        assert_eq!(v("1.2.0-rc1").next_minor().unwrap(), v("1.2.0"));
        assert_eq!(v("2.0.0-rc1").next_major().unwrap(), v("2.0.0"));
        assert_eq!(v("1.2.3+build").next_patch().unwrap(), v("1.2.4"));
    }

    #[test]
    fn successor_overflow_is_an_error() {
        let max = u64::MAX;
        let top = v(&format!("1.2.{max}"));
        assert!(matches!(top.next_patch(), Err(RegistryError::VersionConflict { .. })));
        assert!(matches!(
            next_selector("bump", &top),
            Err(RegistryError::VersionConflict { .. })
        ));
        // Higher components still have room.
        assert_eq!(top.next_minor().unwrap(), v("1.3.0"));
        assert!(matches!(
            v(&format!("1.{max}.0")).next_minor(),
            Err(RegistryError::VersionConflict { .. })
        ));
        assert!(matches!(
            v(&format!("{max}.0.0")).next_major(),
            Err(RegistryError::VersionConflict { .. })
        ));

        // Checking against a maximal predecessor reports instead of wrapping.
        let existing = set(&[format!("1.2.{max}").as_str()]);
        assert!(matches!(
            check_new_version(&existing, &v(&format!("1.2.{max}+b"))),
            Err(RegistryError::VersionConflict { .. })
        ));
    }

    #[test]
    fn version_spec_parsing() {
        assert_eq!(
            "1.2.0".parse::<VersionSpec>().unwrap(),
            VersionSpec::Exact(v("1.2.0"))
        );
        assert_eq!(
            "v1.2.0".parse::<VersionSpec>().unwrap(),
            VersionSpec::Exact(v("1.2.0"))
        );
        assert_eq!(
            "minor".parse::<VersionSpec>().unwrap(),
            VersionSpec::Select(Selector::Minor)
        );
        assert!(matches!(
            "1.x".parse::<VersionSpec>(),
            Err(RegistryError::InvalidVersion { .. })
        ));
        assert!(matches!(
            "latest".parse::<VersionSpec>(),
            Err(RegistryError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn initial_versions() {
        let none = BTreeSet::new();
        for ok in ["0.0.0", "0.0.1", "0.1.0", "1.0.0", "1.0.0-", "1.0.0-rc1", "0.1.0-beta"] {
            assert!(check_new_version(&none, &v(ok)).is_ok(), "{ok}");
        }
        for bad in ["0.2.0", "1.0.1", "2.0.0", "0.0.2"] {
            assert!(
                matches!(
                    check_new_version(&none, &v(bad)),
                    Err(RegistryError::VersionConflict { .. })
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn successor_versions() {
        let existing = set(&["1.0.0", "1.1.0"]);
        assert!(check_new_version(&existing, &v("1.1.1")).is_ok());
        assert!(check_new_version(&existing, &v("1.2.0")).is_ok());
        assert!(check_new_version(&existing, &v("2.0.0")).is_ok());
        assert!(check_new_version(&existing, &v("1.0.1")).is_ok());
        assert!(check_new_version(&existing, &v("1.2.0-rc1")).is_ok());

        let err = check_new_version(&existing, &v("1.1.0")).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        let err = check_new_version(&existing, &v("1.3.0")).unwrap_err();
        assert!(err.to_string().contains("skips over 1.2.0"));
        let err = check_new_version(&existing, &v("3.0.0")).unwrap_err();
        assert!(err.to_string().contains("skips over 2.0.0"));
        let err = check_new_version(&existing, &v("0.9.0")).unwrap_err();
        assert!(err.to_string().contains("lower than every existing version"));
    }

    #[test]
    fn prerelease_of_existing_release() {
        let existing = set(&["1.0.0", "1.1.0"]);
        let err = check_new_version(&existing, &v("1.1.0-rc1")).unwrap_err();
        assert!(err.to_string().contains("pre-release of existing version 1.1.0"));
    }

    #[test]
    fn semver_conversion() {
        assert_eq!(v("1.2.3").to_semver(), semver::Version::new(1, 2, 3));
        assert_eq!(v("1.0.0-").to_semver().to_string(), "1.0.0-0");
        assert_eq!(v("1.0.0-rc.1+b").to_semver().to_string(), "1.0.0-rc.1");
    }
}
