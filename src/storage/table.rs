//! Table implementation
//!
//! A named key-value store with committed and staged state.

use std::fmt;
use std::sync::Arc;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex, RwLock};

use super::Entries;
use crate::error::{Result, TallyError};

/// A single named table
///
/// ## Concurrency:
/// - `staged`: the table lock. Whoever holds its guard (a [`TableLock`])
///   owns the pending writes and is the only writer of the table.
/// - `committed`: RwLock held only for the duration of one map access, so
///   readers never wait on another connection's open transaction.
#[derive(Debug)]
pub struct Table {
    /// Immutable name, unique within a directory
    name: String,

    /// Durable-for-the-process data
    committed: RwLock<Entries>,

    /// Pending writes, guarded by the table lock
    staged: Arc<Mutex<Entries>>,
}

impl Table {
    /// Create a new empty table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            committed: RwLock::new(Entries::new()),
            staged: Arc::new(Mutex::new(Entries::new())),
        }
    }

    /// Get the table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Acquire the table lock, blocking until it is free
    pub fn lock(self: &Arc<Self>) -> TableLock {
        let staged = self.staged.lock_arc();
        TableLock {
            table: Arc::clone(self),
            staged,
        }
    }

    /// Acquire the table lock without blocking
    ///
    /// Returns `None` if any holder (including the caller) already has it.
    pub fn try_lock(self: &Arc<Self>) -> Option<TableLock> {
        self.staged.try_lock_arc().map(|staged| TableLock {
            table: Arc::clone(self),
            staged,
        })
    }

    /// Whether some connection currently holds the table lock
    pub fn is_locked(&self) -> bool {
        self.staged.is_locked()
    }

    /// Read a committed value
    ///
    /// Staged writes are private to the lock holder, which reads through
    /// [`TableLock::get`] instead.
    pub fn get(&self, key: &str) -> Result<String> {
        self.committed
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| TallyError::KeyNotFound(key.to_string()))
    }

    /// Whether `key` has a committed value
    pub fn contains_key(&self, key: &str) -> bool {
        self.committed.read().contains_key(key)
    }

    /// Number of committed entries
    pub fn len(&self) -> usize {
        self.committed.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.read().is_empty()
    }
}

/// Exclusive hold on a table's lock
///
/// Dropping the handle (or calling [`TableLock::unlock`]) releases the lock.
/// Writes still staged at that point are discarded.
pub struct TableLock {
    table: Arc<Table>,
    staged: ArcMutexGuard<RawMutex, Entries>,
}

impl TableLock {
    /// The locked table
    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    /// Name of the locked table
    pub fn name(&self) -> &str {
        self.table.name()
    }

    /// Stage a write (insert or overwrite)
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.staged.insert(key.into(), value.into());
    }

    /// Read a value, preferring staged over committed data
    pub fn get(&self, key: &str) -> Result<String> {
        match self.staged.get(key) {
            Some(value) => Ok(value.clone()),
            None => self.table.get(key),
        }
    }

    /// Merge staged writes into committed data
    ///
    /// Returns the number of entries applied.
    pub fn commit_changes(&mut self) -> usize {
        let staged = std::mem::take(&mut *self.staged);
        let applied = staged.len();
        if applied > 0 {
            self.table.committed.write().extend(staged);
        }
        applied
    }

    /// Discard staged writes
    ///
    /// Returns the number of entries dropped.
    pub fn rollback_changes(&mut self) -> usize {
        let dropped = self.staged.len();
        self.staged.clear();
        dropped
    }

    /// Number of staged writes
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Release the lock
    pub fn unlock(self) {
        drop(self);
    }
}

impl Drop for TableLock {
    fn drop(&mut self) {
        let dropped = self.rollback_changes();
        if dropped > 0 {
            tracing::debug!(
                "Released lock on table {} with {} staged writes, discarded",
                self.table.name(),
                dropped
            );
        }
    }
}

impl fmt::Debug for TableLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableLock")
            .field("table", &self.table.name())
            .field("staged", &self.staged.len())
            .finish()
    }
}
