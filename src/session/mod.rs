//! Session Module
//!
//! Per-connection command interpreter.
//!
//! ## Responsibilities
//! - Operand stack and integer arithmetic
//! - Login gate in front of every other command
//! - Autocommit vs. transaction state and the table locks a transaction holds
//!
//! ## State Machine
//! ```text
//! AwaitingLogin --LOGIN--> Autocommit <--BEGIN / COMMIT--> InTransaction
//!                               |                               |
//!                               +------------BYE----------------+--> Terminated
//! ```
//! A BEGIN inside a transaction rolls it back, returns to `Autocommit` and
//! fails with `NestedTransaction`.

mod stack;
mod interpreter;

pub use stack::OperandStack;
pub use interpreter::Session;

/// What the connection should do after a successful command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Reply OK
    Ok,

    /// Reply DATA with the value
    Data(String),

    /// Reply OK, then close the connection
    Close,
}

/// States of the per-connection command state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingLogin,
    Autocommit,
    InTransaction,
    Terminated,
}
