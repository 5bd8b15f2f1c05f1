//! Protocol Client
//!
//! Blocking client for the line protocol, used by the CLI and tests.

use std::io::{BufReader, BufWriter, Write};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::{Result, TallyError};
use crate::protocol::{
    decode_response, read_line, read_response, write_command, ArithOp, Command, Response,
};

/// A connection to a TallyKV server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to a server
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    /// Send a command and wait for its response
    pub fn request(&mut self, command: &Command) -> Result<Response> {
        write_command(&mut self.writer, command)?;
        read_response(&mut self.reader)
    }

    /// Send a raw request line and wait for its response
    ///
    /// The line is sent as-is apart from the terminator, so malformed
    /// requests reach the server unchanged.
    pub fn send_line(&mut self, line: &str) -> Result<Response> {
        self.writer.write_all(line.trim_end_matches('\n').as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        match read_line(&mut self.reader)? {
            Some(reply) => decode_response(&reply),
            None => Err(TallyError::Protocol(
                "server closed the connection".to_string(),
            )),
        }
    }

    /// Send a command that must be answered with OK
    fn expect_ok(&mut self, command: &Command) -> Result<()> {
        match self.request(command)? {
            Response::Ok => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    // =========================================================================
    // Single Commands
    // =========================================================================

    pub fn login(&mut self, username: &str) -> Result<()> {
        self.expect_ok(&Command::Login {
            username: username.to_string(),
        })
    }

    pub fn create(&mut self, table: &str) -> Result<()> {
        self.expect_ok(&Command::Create {
            table: table.to_string(),
        })
    }

    pub fn push(&mut self, value: &str) -> Result<()> {
        self.expect_ok(&Command::Push {
            value: value.to_string(),
        })
    }

    pub fn pop(&mut self) -> Result<()> {
        self.expect_ok(&Command::Pop)
    }

    /// Read the top of the operand stack
    pub fn top(&mut self) -> Result<String> {
        match self.request(&Command::Top)? {
            Response::Data(value) => Ok(value),
            other => Err(unexpected(other)),
        }
    }

    /// Store the top operand under `table.key`
    pub fn set(&mut self, table: &str, key: &str) -> Result<()> {
        self.expect_ok(&Command::Set {
            table: table.to_string(),
            key: key.to_string(),
        })
    }

    /// Push the value of `table.key` onto the operand stack
    pub fn get(&mut self, table: &str, key: &str) -> Result<()> {
        self.expect_ok(&Command::Get {
            table: table.to_string(),
            key: key.to_string(),
        })
    }

    pub fn arith(&mut self, op: ArithOp) -> Result<()> {
        self.expect_ok(&Command::Arith(op))
    }

    pub fn begin(&mut self) -> Result<()> {
        self.expect_ok(&Command::Begin)
    }

    pub fn commit(&mut self) -> Result<()> {
        self.expect_ok(&Command::Commit)
    }

    /// Say goodbye; the server closes the connection afterwards
    pub fn bye(mut self) -> Result<()> {
        self.expect_ok(&Command::Bye)
    }

    // =========================================================================
    // Command Sequences
    // =========================================================================

    /// GET followed by TOP
    pub fn get_value(&mut self, table: &str, key: &str) -> Result<String> {
        self.get(table, key)?;
        self.top()
    }

    /// PUSH followed by SET
    pub fn set_value(&mut self, table: &str, key: &str, value: &str) -> Result<()> {
        self.push(value)?;
        self.set(table, key)
    }

    /// Add one to `table.key`, optionally inside BEGIN/COMMIT
    pub fn increment(&mut self, table: &str, key: &str, transactional: bool) -> Result<()> {
        if transactional {
            self.begin()?;
        }
        self.get(table, key)?;
        self.push("1")?;
        self.arith(ArithOp::Add)?;
        self.set(table, key)?;
        if transactional {
            self.commit()?;
        }
        Ok(())
    }
}

/// Turn a response that was not the expected one into an error
fn unexpected(response: Response) -> TallyError {
    match response {
        Response::Failed(message) => TallyError::Failed(message),
        Response::Error(message) => TallyError::Server(message),
        other => TallyError::Protocol(format!("Unexpected response: {}", other)),
    }
}
