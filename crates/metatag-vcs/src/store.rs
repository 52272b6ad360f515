//! The versioned content store capability.

use std::path::Path;

use crate::error::Result;

/// The repository operations the registry workflow relies on.
///
/// Paths are repository-relative and use `/` separators. References are
/// anything the backing store can resolve (branch names, tags, commit ids,
/// `HEAD`).
pub trait ContentStore {
    /// Root of the working tree.
    fn work_dir(&self) -> &Path;

    /// Commit id of the current head.
    fn head(&self) -> Result<String>;

    /// Short name of the checked-out branch, `None` when detached.
    fn current_branch(&self) -> Result<Option<String>>;

    /// Whether `id` names a commit in this repository.
    fn is_commit(&self, id: &str) -> Result<bool>;

    /// Resolve a reference to the commit it points at (peeling tags).
    ///
    /// Returns `None` when the reference does not exist.
    fn resolve_ref(&self, reference: &str) -> Result<Option<String>>;

    /// Names of all tags.
    fn tag_list(&self) -> Result<Vec<String>>;

    /// Create a tag. An empty `message` creates a lightweight tag.
    fn tag_create(&self, name: &str, target: &str, message: &str, force: bool) -> Result<()>;

    /// Delete a tag.
    fn tag_delete(&self, name: &str) -> Result<()>;

    /// Whether `ancestor` is reachable from `descendant` (a commit is its own ancestor).
    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool>;

    /// Paths added or modified between two references.
    fn diff(&self, from: &str, to: &str) -> Result<Vec<String>>;

    /// Contents of `path` as recorded at `reference`, `None` if absent there.
    fn read_blob_at(&self, reference: &str, path: &str) -> Result<Option<Vec<u8>>>;

    /// Whether tracked files (optionally only below `scope`) have uncommitted changes.
    fn is_dirty(&self, scope: Option<&str>) -> Result<bool>;

    /// Stage the working-tree state of `path` (additions, edits and deletions).
    fn stage(&self, path: &str) -> Result<()>;

    /// Put `path` back to its state at head, in both index and working tree.
    ///
    /// Paths unknown to head are unstaged and deleted.
    fn restore(&self, path: &str) -> Result<()>;

    /// Whether the index differs from head at any of `paths`; an empty
    /// slice checks the whole index.
    fn has_staged_changes(&self, paths: &[String]) -> Result<bool>;

    /// Commit the staged state of `paths` only, leaving anything else in the
    /// index uncommitted. Returns the new commit id.
    fn commit(&self, message: &str, paths: &[String]) -> Result<String>;

    /// Update remote-tracking references from `remote`.
    fn fetch(&self, remote: &str) -> Result<()>;

    /// Commits reachable only from `a` and only from `b`, in that order.
    fn rev_count(&self, a: &str, b: &str) -> Result<(usize, usize)>;

    /// Push refspecs to a remote name or URL.
    fn push(&self, remote: &str, refspecs: &[String], force: bool) -> Result<()>;

    /// Read a configuration value, `None` when unset.
    fn config(&self, key: &str) -> Result<Option<String>>;
}
