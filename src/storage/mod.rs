//! Storage Module
//!
//! In-memory tables and the directory that owns them.
//!
//! ## Responsibilities
//! - Two-tier table state: committed data plus writes staged by the lock
//!   holder
//! - Per-table lock with blocking and non-blocking acquisition
//! - Idempotent table creation and lookup under concurrent access
//!
//! ## Data Structure Choice
//! BTreeMap for both tiers: ordered keys make dumps and tests deterministic,
//! and the tables are small enough that hashing buys nothing.

mod table;
mod directory;

pub use table::{Table, TableLock};
pub use directory::TableDirectory;

/// Key-value entries of one table tier
pub type Entries = std::collections::BTreeMap<String, String>;
