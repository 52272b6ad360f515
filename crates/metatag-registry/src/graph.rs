//! Dependency graph construction and installability checks over the registry.

use std::collections::BTreeSet;

use crate::metadata::Availability;
use crate::requirements::Requirement;
use crate::version::Version;

/// A requirement naming a package the registry does not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dangling {
    pub package: String,
    pub version: Version,
    pub dependency: String,
}

/// A package version that can never be installed, with the first
/// requirement no installable version satisfies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub package: String,
    pub version: Version,
    pub requirement: String,
}

/// Dependency-graph services consumed by the consistency checker.
pub trait DependencyGraph {
    /// Build the dependency graph from registry contents, reporting
    /// requirements on unregistered packages.
    fn build_graph(&self, avail: Availability) -> (Availability, Vec<Dangling>);

    /// Report uninstallable versions. An empty `scope` checks everything.
    fn sanity_check(&self, deps: &Availability, scope: &BTreeSet<String>) -> Vec<Problem>;
}

/// Graph services computed directly from registry entries.
///
/// A version is viable when every one of its requirements is matched by some
/// viable version of the required package; viability is computed as a
/// fixpoint so unsatisfiable requirements propagate to dependents.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryGraph;

type Key<'a> = (&'a str, &'a Version);

impl DependencyGraph for RegistryGraph {
    fn build_graph(&self, avail: Availability) -> (Availability, Vec<Dangling>) {
        let mut dangling = Vec::new();
        for (package, versions) in &avail {
            for (version, entry) in versions {
                for req in &entry.requires {
                    if !avail.contains_key(&req.package) {
                        dangling.push(Dangling {
                            package: package.clone(),
                            version: version.clone(),
                            dependency: req.package.clone(),
                        });
                    }
                }
            }
        }
        (avail, dangling)
    }

    fn sanity_check(&self, deps: &Availability, scope: &BTreeSet<String>) -> Vec<Problem> {
        let viable = viable_versions(deps);
        let scope = widen_scope(deps, scope);

        let mut problems = Vec::new();
        for (package, versions) in deps {
            if scope.as_ref().is_some_and(|s| !s.contains(package)) {
                continue;
            }
            for (version, entry) in versions {
                if viable.contains(&(package.as_str(), version)) {
                    continue;
                }
                let requirement = entry
                    .requires
                    .iter()
                    .find(|req| !satisfiable(deps, &viable, req))
                    .map(|req| req.package.clone())
                    .unwrap_or_default();
                problems.push(Problem {
                    package: package.clone(),
                    version: version.clone(),
                    requirement,
                });
            }
        }
        problems
    }
}

fn satisfiable<'a>(deps: &'a Availability, viable: &BTreeSet<Key<'a>>, req: &'a Requirement) -> bool {
    deps.get(&req.package).is_some_and(|versions| {
        versions
            .keys()
            .any(|v| req.matches(v) && viable.contains(&(req.package.as_str(), v)))
    })
}

fn viable_versions(deps: &Availability) -> BTreeSet<Key<'_>> {
    let mut viable: BTreeSet<Key<'_>> = deps
        .iter()
        .flat_map(|(package, versions)| versions.keys().map(move |v| (package.as_str(), v)))
        .collect();
    loop {
        let unviable: Vec<Key<'_>> = viable
            .iter()
            .copied()
            .filter(|(package, version)| {
                deps[*package][*version]
                    .requires
                    .iter()
                    .any(|req| !satisfiable(deps, &viable, req))
            })
            .collect();
        if unviable.is_empty() {
            return viable;
        }
        for key in unviable {
            viable.remove(&key);
        }
    }
}

/// Extend `scope` with every package that transitively requires a package in
/// it. `None` means unrestricted.
fn widen_scope(deps: &Availability, scope: &BTreeSet<String>) -> Option<BTreeSet<String>> {
    if scope.is_empty() {
        return None;
    }
    let mut widened = scope.clone();
    loop {
        let added: Vec<String> = deps
            .iter()
            .filter(|(package, _)| !widened.contains(*package))
            .filter(|(_, versions)| {
                versions
                    .values()
                    .any(|entry| entry.requires.iter().any(|req| widened.contains(&req.package)))
            })
            .map(|(package, _)| package.clone())
            .collect();
        if added.is_empty() {
            return Some(widened);
        }
        widened.extend(added);
    }
}
