//! Error types for TallyKV
//!
//! Provides a unified error type for all operations.
//!
//! The `Display` text of every recoverable variant is exactly what the
//! server sends back in a `FAILED <message>` response, so the wording here
//! is part of the wire protocol.

use thiserror::Error;

/// Result type alias using TallyError
pub type Result<T> = std::result::Result<T, TallyError>;

/// Unified error type for TallyKV operations
#[derive(Debug, Error)]
pub enum TallyError {
    // -------------------------------------------------------------------------
    // I/O and Protocol Errors (fatal: the connection is closed)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Session Errors
    // -------------------------------------------------------------------------
    #[error("Must be logged in.")]
    NotLoggedIn,

    #[error("Operand Stack was empty.")]
    StackEmpty,

    #[error("Less than 2 values on Operand Stack.")]
    InsufficientOperands,

    #[error("Operand is not an integer.")]
    NotANumber,

    #[error("Division by zero.")]
    DivisionByZero,

    #[error("Arithmetic overflow.")]
    Overflow,

    // -------------------------------------------------------------------------
    // Table Errors
    // -------------------------------------------------------------------------
    #[error("Table does not exist: {0}")]
    TableNotFound(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    // -------------------------------------------------------------------------
    // Transaction Errors
    // -------------------------------------------------------------------------
    #[error("Cannot nest transactions.")]
    NestedTransaction,

    #[error("Cannot commit in autocommit mode.")]
    CommitInAutocommit,

    #[error("Couldn't acquire lock for table {0}")]
    TransactionConflict(String),

    // -------------------------------------------------------------------------
    // Client-side Errors
    // -------------------------------------------------------------------------
    #[error("Request failed: {0}")]
    Failed(String),

    #[error("Server error: {0}")]
    Server(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Error classes of the command protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input or broken transport. Ends the connection.
    Protocol,

    /// Login, operand stack and arithmetic failures.
    Session,

    /// Missing tables or keys.
    Table,

    /// Transaction state and lock acquisition failures.
    Transaction,
}

impl TallyError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            TallyError::NotLoggedIn
            | TallyError::StackEmpty
            | TallyError::InsufficientOperands
            | TallyError::NotANumber
            | TallyError::DivisionByZero
            | TallyError::Overflow => ErrorKind::Session,

            TallyError::TableNotFound(_) | TallyError::KeyNotFound(_) => ErrorKind::Table,

            TallyError::NestedTransaction
            | TallyError::CommitInAutocommit
            | TallyError::TransactionConflict(_) => ErrorKind::Transaction,

            TallyError::Io(_)
            | TallyError::Protocol(_)
            | TallyError::Failed(_)
            | TallyError::Server(_)
            | TallyError::Config(_) => ErrorKind::Protocol,
        }
    }

    /// Whether the connection must be closed after reporting this error
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Protocol
    }
}
