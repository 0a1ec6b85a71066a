//! In-memory tables

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::mapping::ColumnMap;

/// Rows per table, in insertion order
pub type Tables = HashMap<String, Vec<ColumnMap>>;

/// Process-local database of column maps
///
/// Reads share the lock and writes take it exclusively, so every repository
/// call sees a consistent table.
#[derive(Debug, Default)]
pub struct MemoryDb {
    tables: RwLock<Tables>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with shared access to every table
    pub fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        f(&self.tables.read())
    }

    /// Run `f` with exclusive access to every table
    pub fn write<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        f(&mut self.tables.write())
    }

    /// Copy of one table's rows
    pub fn rows(&self, table: &str) -> Vec<ColumnMap> {
        self.read(|tables| tables.get(table).cloned().unwrap_or_default())
    }

    /// Run `f` against a copy of the database and keep its writes only if it
    /// returns `Ok`
    ///
    /// The write lock is held for the whole call, so transactions are
    /// serialized with every other access. Calling back into `self` from `f`
    /// deadlocks; use the handle passed to `f`.
    pub fn transaction<R, E>(&self, f: impl FnOnce(&MemoryDb) -> Result<R, E>) -> Result<R, E> {
        let mut tables = self.tables.write();
        let tx = MemoryDb {
            tables: RwLock::new(tables.clone()),
        };
        match f(&tx) {
            Ok(result) => {
                *tables = tx.tables.into_inner();
                debug!("Memory transaction committed");
                Ok(result)
            }
            Err(e) => {
                debug!("Memory transaction rolled back");
                Err(e)
            }
        }
    }
}

impl Clone for MemoryDb {
    fn clone(&self) -> Self {
        Self {
            tables: RwLock::new(self.tables.read().clone()),
        }
    }
}
