//! Table Directory
//!
//! Maps table names to the single [`Table`] instance for each name.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::Table;

/// Shared name -> table mapping, owned by the server
///
/// The directory lock protects only the mapping itself. It is held for one
/// lookup or insert and never while a table is being read or written.
/// Tables are never removed, so a handle returned by
/// [`TableDirectory::find_table`] stays valid for the life of the process.
#[derive(Debug, Default)]
pub struct TableDirectory {
    tables: Mutex<HashMap<String, Arc<Table>>>,
}

impl TableDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `name` if it does not exist yet
    ///
    /// Returns `true` if a new table was inserted. Re-creating an existing
    /// table leaves it and its data untouched.
    pub fn create_table(&self, name: &str) -> bool {
        let mut tables = self.tables.lock();
        if tables.contains_key(name) {
            return false;
        }
        tables.insert(name.to_string(), Arc::new(Table::new(name)));
        true
    }

    /// Look up a table by name
    pub fn find_table(&self, name: &str) -> Option<Arc<Table>> {
        self.tables.lock().get(name).cloned()
    }

    /// Number of tables
    pub fn len(&self) -> usize {
        self.tables.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.lock().is_empty()
    }

    /// Sorted table names
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.lock().keys().cloned().collect();
        names.sort();
        names
    }
}
