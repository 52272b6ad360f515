//! Whole-registry consistency checks run before publishing.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{RegistryError, Result};
use crate::graph::DependencyGraph;
use crate::metadata;

/// Check that every requirement names a registered package and that no
/// version in scope is uninstallable.
///
/// `restrict_to` limits the installability check to the named packages and
/// the packages depending on them; empty means the whole registry.
pub fn check_metadata(
    registry: &Path,
    restrict_to: &BTreeSet<String>,
    graph: &dyn DependencyGraph,
) -> Result<()> {
    let avail = metadata::available(registry)?;
    let (deps, dangling) = graph.build_graph(avail);
    if let Some(first) = dangling.into_iter().next() {
        return Err(RegistryError::UnregisteredDependency {
            package: first.package,
            version: first.version.to_string(),
            dependency: first.dependency,
        });
    }

    let problems = graph.sanity_check(&deps, restrict_to);
    if !problems.is_empty() {
        return Err(RegistryError::UnsatisfiableRequirements { problems });
    }
    Ok(())
}
