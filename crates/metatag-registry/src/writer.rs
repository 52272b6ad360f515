//! Writing a single package-version entry into the registry.

use metatag_vcs::{ContentStore, Transaction};

use crate::error::{RegistryError, Result};
use crate::layout;
use crate::requirements::{self, Requirement};
use crate::version::Version;

/// Write the pointer and requirements of `package` at `version`.
///
/// Without `force`, an existing entry must already point at `commit`;
/// anything else is a [`RegistryError::PointerConflict`]. Changes are staged
/// through `tx` and not committed.
pub fn write_entry<S: ContentStore + ?Sized>(
    tx: &mut Transaction<'_, S>,
    package: &str,
    version: &Version,
    commit: &str,
    requires: &[Requirement],
    force: bool,
) -> Result<()> {
    let sha1_path = layout::sha1_path(package, version);
    let full = tx.store().work_dir().join(&sha1_path);
    if !force && full.is_file() {
        let existing = std::fs::read_to_string(&full)?.trim().to_string();
        if existing != commit {
            return Err(RegistryError::PointerConflict {
                package: package.to_string(),
                version: version.to_string(),
                existing,
                attempted: commit.to_string(),
            });
        }
    }
    tx.write(&sha1_path, &format!("{commit}\n"))?;

    let requires_path = layout::requires_path(package, version);
    if requires.is_empty() {
        tx.remove(&requires_path)?;
    } else {
        tx.write(&requires_path, &requirements::serialize(requires))?;
    }
    Ok(())
}
