//! # TallyKV
//!
//! A networked, transactional key-value store with:
//! - Named tables of string keys and values
//! - A per-connection operand stack with integer arithmetic
//! - Autocommit writes and explicit BEGIN/COMMIT transactions
//! - Table-granularity locking that never blocks an open transaction
//! - A line-oriented TCP text protocol
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │              (one thread per connection)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Connection + Session                         │
//! │   (decode line → execute → encode one response line)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Operand    │          │    Table    │
//!   │   Stack     │          │  Directory  │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │    Table    │
//!                           │ staged/comm │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod storage;
pub mod session;
pub mod network;
pub mod protocol;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ErrorKind, Result, TallyError};
pub use config::Config;
pub use session::Session;
pub use storage::TableDirectory;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of TallyKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
