//! Scoped registry transactions.
//!
//! A [`Transaction`] owns every change it writes: files are written and
//! staged through it, and unless [`Transaction::commit`] succeeds each
//! touched path is put back to its state at head. Dropping a transaction
//! without committing discards it, so early returns and `?` propagation
//! leave the working tree and index as they were.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::store::ContentStore;

/// An open transaction over a content store.
pub struct Transaction<'a, S: ContentStore + ?Sized> {
    store: &'a S,
    touched: BTreeSet<String>,
    finished: bool,
}

impl<'a, S: ContentStore + ?Sized> Transaction<'a, S> {
    /// Open a transaction on `store`.
    pub fn begin(store: &'a S) -> Self {
        Transaction {
            store,
            touched: BTreeSet::new(),
            finished: false,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &'a S {
        self.store
    }

    /// Paths written or removed so far.
    pub fn touched(&self) -> impl Iterator<Item = &str> {
        self.touched.iter().map(String::as_str)
    }

    /// Write `contents` to `path` and stage it.
    pub fn write(&mut self, path: &str, contents: &str) -> Result<()> {
        self.touched.insert(path.to_string());
        let full = self.store.work_dir().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&full, contents)?;
        self.store.stage(path)
    }

    /// Delete `path` if present and stage the deletion.
    pub fn remove(&mut self, path: &str) -> Result<()> {
        let full = self.store.work_dir().join(path);
        if !full.exists() {
            return Ok(());
        }
        self.touched.insert(path.to_string());
        std::fs::remove_file(&full)?;
        self.store.stage(path)
    }

    /// Commit the changes made through this transaction with `message`.
    ///
    /// Changes staged in the store by anyone else are left staged and out of
    /// the commit. Returns the new commit id, or `None` when the transaction
    /// changed nothing, in which case no commit is created.
    pub fn commit(mut self, message: &str) -> Result<Option<String>> {
        let paths: Vec<String> = self.touched.iter().cloned().collect();
        if paths.is_empty() || !self.store.has_staged_changes(&paths)? {
            self.rollback()?;
            return Ok(None);
        }
        let id = self.store.commit(message, &paths)?;
        self.finished = true;
        Ok(Some(id))
    }

    /// Discard every change made through this transaction.
    pub fn discard(mut self) -> Result<()> {
        self.rollback()
    }

    fn rollback(&mut self) -> Result<()> {
        self.finished = true;
        for path in &self.touched {
            self.store.restore(path)?;
        }
        Ok(())
    }
}

impl<S: ContentStore + ?Sized> Drop for Transaction<'_, S> {
    fn drop(&mut self) {
        if !self.finished {
            // Errors cannot surface from drop; the store is left for repair tooling.
            let _ = self.rollback();
        }
    }
}
