//! Command interpreter
//!
//! Executes one decoded command at a time against a session's private state
//! and the shared table directory.

use std::sync::Arc;

use super::{OperandStack, Outcome, SessionState};
use crate::error::{Result, TallyError};
use crate::protocol::Command;
use crate::storage::{Table, TableDirectory, TableLock};

/// Per-connection interpreter state
///
/// ## Locking Protocol
/// - Autocommit SET: blocking `lock()`, stage, commit, release, all inside
///   the one command. The session holds no other lock while it waits.
/// - Transactional SET: non-blocking `try_lock()`. A session with an open
///   transaction never waits on another one; contention is reported as
///   `TransactionConflict` instead.
/// - Locks taken by a transaction are kept in acquisition order and released
///   by COMMIT, by the forced rollback of a nested BEGIN, or when the session
///   is dropped.
pub struct Session {
    /// Shared tables
    directory: Arc<TableDirectory>,

    /// Private operand stack
    stack: OperandStack,

    /// Set by LOGIN; gates every other command
    username: Option<String>,

    /// False while a transaction is open
    autocommit: bool,

    /// Tables locked by the open transaction, in acquisition order
    locked_tables: Vec<TableLock>,

    /// Set once BYE has been executed
    closed: bool,
}

impl Session {
    /// Create a session that is not logged in yet
    pub fn new(directory: Arc<TableDirectory>) -> Self {
        Self {
            directory,
            stack: OperandStack::new(),
            username: None,
            autocommit: true,
            locked_tables: Vec::new(),
            closed: false,
        }
    }

    /// Execute a command
    ///
    /// Recoverable failures come back as errors and leave the session usable;
    /// the caller decides how to report them.
    pub fn execute(&mut self, command: Command) -> Result<Outcome> {
        if self.closed {
            return Err(TallyError::Protocol("Session is closed".to_string()));
        }

        if self.username.is_none() && !matches!(command, Command::Login { .. }) {
            return Err(TallyError::NotLoggedIn);
        }

        match command {
            Command::Login { username } => {
                tracing::debug!("User {} logged in", username);
                self.username = Some(username);
                Ok(Outcome::Ok)
            }
            Command::Create { table } => {
                if self.directory.create_table(&table) {
                    tracing::debug!("Created table {}", table);
                }
                Ok(Outcome::Ok)
            }
            Command::Push { value } => {
                self.stack.push(value);
                Ok(Outcome::Ok)
            }
            Command::Pop => {
                self.stack.pop()?;
                Ok(Outcome::Ok)
            }
            Command::Top => Ok(Outcome::Data(self.stack.top()?.to_string())),
            Command::Set { table, key } => self.set(&table, key),
            Command::Get { table, key } => self.get(&table, &key),
            Command::Arith(op) => {
                self.stack.apply(op)?;
                Ok(Outcome::Ok)
            }
            Command::Begin => self.begin(),
            Command::Commit => self.commit(),
            Command::Bye => {
                self.abort_transaction();
                self.closed = true;
                Ok(Outcome::Close)
            }
        }
    }

    // =========================================================================
    // Table Commands
    // =========================================================================

    fn find_table(&self, name: &str) -> Result<Arc<Table>> {
        self.directory
            .find_table(name)
            .ok_or_else(|| TallyError::TableNotFound(name.to_string()))
    }

    /// Position of `table` in `locked_tables`, if this session holds it
    fn held_lock(&self, table: &Arc<Table>) -> Option<usize> {
        self.locked_tables
            .iter()
            .position(|lock| Arc::ptr_eq(lock.table(), table))
    }

    fn set(&mut self, name: &str, key: String) -> Result<Outcome> {
        let table = self.find_table(name)?;
        if self.stack.is_empty() {
            return Err(TallyError::StackEmpty);
        }

        if self.autocommit {
            let value = self.stack.pop()?;
            let mut lock = table.lock();
            lock.set(key, value);
            lock.commit_changes();
            lock.unlock();
            return Ok(Outcome::Ok);
        }

        let index = match self.held_lock(&table) {
            Some(index) => index,
            None => {
                let lock = table.try_lock().ok_or_else(|| {
                    tracing::debug!("Lock conflict on table {}", name);
                    TallyError::TransactionConflict(name.to_string())
                })?;
                self.locked_tables.push(lock);
                self.locked_tables.len() - 1
            }
        };

        let value = self.stack.pop()?;
        self.locked_tables[index].set(key, value);
        Ok(Outcome::Ok)
    }

    fn get(&mut self, name: &str, key: &str) -> Result<Outcome> {
        let table = self.find_table(name)?;
        let value = match self.held_lock(&table) {
            Some(index) => self.locked_tables[index].get(key)?,
            None => table.get(key)?,
        };
        self.stack.push(value);
        Ok(Outcome::Ok)
    }

    // =========================================================================
    // Transaction Commands
    // =========================================================================

    fn begin(&mut self) -> Result<Outcome> {
        if !self.autocommit {
            self.abort_transaction();
            return Err(TallyError::NestedTransaction);
        }
        self.autocommit = false;
        tracing::debug!("Transaction started");
        Ok(Outcome::Ok)
    }

    fn commit(&mut self) -> Result<Outcome> {
        if self.autocommit {
            return Err(TallyError::CommitInAutocommit);
        }

        let mut applied = 0;
        for lock in self.locked_tables.iter_mut() {
            applied += lock.commit_changes();
        }
        let tables = self.locked_tables.len();
        self.locked_tables.clear();
        self.autocommit = true;

        tracing::debug!(
            "Transaction committed: {} writes across {} tables",
            applied,
            tables
        );
        Ok(Outcome::Ok)
    }

    /// Roll back and release everything the open transaction holds
    ///
    /// Returns `true` if a transaction was open. The session is back in
    /// autocommit mode afterwards.
    pub fn abort_transaction(&mut self) -> bool {
        if self.autocommit {
            return false;
        }

        let mut dropped = 0;
        for lock in self.locked_tables.iter_mut() {
            dropped += lock.rollback_changes();
        }
        let tables = self.locked_tables.len();
        self.locked_tables.clear();
        self.autocommit = true;

        tracing::debug!(
            "Transaction rolled back: {} writes across {} tables",
            dropped,
            tables
        );
        true
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current state of the command state machine
    pub fn state(&self) -> SessionState {
        if self.closed {
            SessionState::Terminated
        } else if self.username.is_none() {
            SessionState::AwaitingLogin
        } else if self.autocommit {
            SessionState::Autocommit
        } else {
            SessionState::InTransaction
        }
    }

    /// Name given at LOGIN
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.username.is_some()
    }

    pub fn in_transaction(&self) -> bool {
        !self.autocommit
    }

    /// The operand stack
    pub fn stack(&self) -> &OperandStack {
        &self.stack
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Names of tables locked by the open transaction, in acquisition order
    pub fn locked_table_names(&self) -> Vec<&str> {
        self.locked_tables.iter().map(TableLock::name).collect()
    }

    /// The shared directory this session works against
    pub fn directory(&self) -> &Arc<TableDirectory> {
        &self.directory
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.abort_transaction() {
            tracing::debug!(
                "Session for {} ended with an open transaction",
                self.username.as_deref().unwrap_or("<anonymous>")
            );
        }
    }
}
