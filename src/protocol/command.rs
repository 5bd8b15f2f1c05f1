//! Command definitions
//!
//! Represents requests from clients.

/// Command types, one per request keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Login,
    Create,
    Push,
    Pop,
    Top,
    Set,
    Get,
    Add,
    Sub,
    Mul,
    Div,
    Begin,
    Commit,
    Bye,
}

impl CommandType {
    /// All request keywords
    pub const ALL: [CommandType; 14] = [
        CommandType::Login,
        CommandType::Create,
        CommandType::Push,
        CommandType::Pop,
        CommandType::Top,
        CommandType::Set,
        CommandType::Get,
        CommandType::Add,
        CommandType::Sub,
        CommandType::Mul,
        CommandType::Div,
        CommandType::Begin,
        CommandType::Commit,
        CommandType::Bye,
    ];

    /// The keyword used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::Login => "LOGIN",
            CommandType::Create => "CREATE",
            CommandType::Push => "PUSH",
            CommandType::Pop => "POP",
            CommandType::Top => "TOP",
            CommandType::Set => "SET",
            CommandType::Get => "GET",
            CommandType::Add => "ADD",
            CommandType::Sub => "SUB",
            CommandType::Mul => "MUL",
            CommandType::Div => "DIV",
            CommandType::Begin => "BEGIN",
            CommandType::Commit => "COMMIT",
            CommandType::Bye => "BYE",
        }
    }

    /// Look up a keyword
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == keyword)
    }

    /// Number of arguments following the keyword
    pub fn arity(&self) -> usize {
        match self {
            CommandType::Login | CommandType::Create | CommandType::Push => 1,
            CommandType::Set | CommandType::Get => 2,
            _ => 0,
        }
    }
}

/// Arithmetic operators applied to the top two stack entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Authenticate the session
    Login { username: String },

    /// Create a table (no-op if it exists)
    Create { table: String },

    /// Push a value onto the operand stack
    Push { value: String },

    /// Discard the top of the operand stack
    Pop,

    /// Send the top of the operand stack back as DATA
    Top,

    /// Pop the top operand and store it under `table.key`
    Set { table: String, key: String },

    /// Push the value stored under `table.key`
    Get { table: String, key: String },

    /// Pop two operands and push the result
    Arith(ArithOp),

    /// Open a transaction
    Begin,

    /// Commit the open transaction
    Commit,

    /// End the session
    Bye,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Login { .. } => CommandType::Login,
            Command::Create { .. } => CommandType::Create,
            Command::Push { .. } => CommandType::Push,
            Command::Pop => CommandType::Pop,
            Command::Top => CommandType::Top,
            Command::Set { .. } => CommandType::Set,
            Command::Get { .. } => CommandType::Get,
            Command::Arith(ArithOp::Add) => CommandType::Add,
            Command::Arith(ArithOp::Sub) => CommandType::Sub,
            Command::Arith(ArithOp::Mul) => CommandType::Mul,
            Command::Arith(ArithOp::Div) => CommandType::Div,
            Command::Begin => CommandType::Begin,
            Command::Commit => CommandType::Commit,
            Command::Bye => CommandType::Bye,
        }
    }

    /// Arguments in wire order
    pub fn args(&self) -> Vec<&str> {
        match self {
            Command::Login { username } => vec![username.as_str()],
            Command::Create { table } => vec![table.as_str()],
            Command::Push { value } => vec![value.as_str()],
            Command::Set { table, key } | Command::Get { table, key } => {
                vec![table.as_str(), key.as_str()]
            }
            _ => Vec::new(),
        }
    }
}
