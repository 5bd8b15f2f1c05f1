//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! Every message is one line of ASCII-whitespace separated tokens:
//! ```text
//! <KEYWORD> <arg1> <arg2> ...\n
//! ```
//! The encoded form, newline included, is at most [`MAX_ENCODED_LEN`] bytes.
//!
//! ### Arguments by Request Type
//! - LOGIN, CREATE:  one identifier
//! - PUSH:           one value token
//! - SET, GET:       table identifier + key identifier
//! - everything else: none
//!
//! ### Arguments by Response Type
//! - OK:             none
//! - DATA:           one value token
//! - FAILED, ERROR:  free text, rejoined with single spaces on decode

use std::io::{BufRead, Read, Write};

use super::{ArithOp, Command, CommandType, Response, Status};
use crate::error::{Result, TallyError};

/// Maximum encoded message length, including the terminating newline
pub const MAX_ENCODED_LEN: usize = 1024;

/// Line terminator
pub const TERMINATOR: char = '\n';

/// Longest piece of client input quoted back in an error message
const EXCERPT_LEN: usize = 32;

/// Check whether `s` is a valid user, table or key name
///
/// Identifiers start with an ASCII letter and continue with letters,
/// digits or underscores.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Printable, length-capped copy of client input for error messages
///
/// Non-printable characters become `?`, so the result is always a single
/// short token that fits in a response line.
fn excerpt(s: &str) -> String {
    let mut out: String = s
        .chars()
        .take(EXCERPT_LEN)
        .map(|c| if c.is_ascii_graphic() { c } else { '?' })
        .collect();
    if s.chars().count() > EXCERPT_LEN {
        out.push_str("...");
    }
    out
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(|c| c.is_ascii_whitespace())
}

fn check_identifier(kind: &str, value: &str) -> Result<()> {
    if is_identifier(value) {
        Ok(())
    } else {
        Err(TallyError::Protocol(format!(
            "Invalid {} name: {}",
            kind,
            excerpt(value)
        )))
    }
}

fn finish_line(mut line: String) -> Result<String> {
    line.push(TERMINATOR);
    if line.len() > MAX_ENCODED_LEN {
        return Err(TallyError::Protocol(format!(
            "Encoded message exceeds maximum length: {} bytes (max {})",
            line.len(),
            MAX_ENCODED_LEN
        )));
    }
    Ok(line)
}

/// Split a raw line into tokens after checking length and terminator
fn tokenize(line: &str) -> Result<Vec<&str>> {
    if line.len() > MAX_ENCODED_LEN {
        return Err(TallyError::Protocol(format!(
            "Message too long: {} bytes (max {})",
            line.len(),
            MAX_ENCODED_LEN
        )));
    }

    let body = line.strip_suffix(TERMINATOR).ok_or_else(|| {
        TallyError::Protocol("Message does not end with newline character".to_string())
    })?;

    let tokens: Vec<&str> = body.split_ascii_whitespace().collect();
    if tokens.is_empty() {
        return Err(TallyError::Protocol("Empty message".to_string()));
    }
    Ok(tokens)
}

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Check that a command can be represented on the wire
pub fn validate_command(command: &Command) -> Result<()> {
    match command {
        Command::Login { username } => check_identifier("user", username),
        Command::Create { table } => check_identifier("table", table),
        Command::Set { table, key } | Command::Get { table, key } => {
            check_identifier("table", table)?;
            check_identifier("key", key)
        }
        Command::Push { value } if !is_token(value) => Err(TallyError::Protocol(format!(
            "PUSH value must be a single token: {}",
            excerpt(value)
        ))),
        _ => Ok(()),
    }
}

/// Encode a command to a newline-terminated line
pub fn encode_command(command: &Command) -> Result<String> {
    validate_command(command)?;

    let mut line = command.command_type().as_str().to_string();
    for arg in command.args() {
        line.push(' ');
        line.push_str(arg);
    }
    finish_line(line)
}

/// Decode a command from a newline-terminated line
pub fn decode_command(line: &str) -> Result<Command> {
    let tokens = tokenize(line)?;
    let keyword = tokens[0];

    let command_type = match CommandType::from_keyword(keyword) {
        Some(t) => t,
        None if Status::from_keyword(keyword).is_some() => {
            return Err(TallyError::Protocol(format!(
                "Response keyword {} is not a valid request",
                keyword
            )))
        }
        None => {
            return Err(TallyError::Protocol(format!(
                "Unknown command: {}",
                excerpt(keyword)
            )))
        }
    };

    let args = &tokens[1..];
    if args.len() != command_type.arity() {
        return Err(TallyError::Protocol(format!(
            "{} expects {} argument(s), got {}",
            keyword,
            command_type.arity(),
            args.len()
        )));
    }

    let command = match command_type {
        CommandType::Login => Command::Login {
            username: args[0].to_string(),
        },
        CommandType::Create => Command::Create {
            table: args[0].to_string(),
        },
        CommandType::Push => Command::Push {
            value: args[0].to_string(),
        },
        CommandType::Pop => Command::Pop,
        CommandType::Top => Command::Top,
        CommandType::Set => Command::Set {
            table: args[0].to_string(),
            key: args[1].to_string(),
        },
        CommandType::Get => Command::Get {
            table: args[0].to_string(),
            key: args[1].to_string(),
        },
        CommandType::Add => Command::Arith(ArithOp::Add),
        CommandType::Sub => Command::Arith(ArithOp::Sub),
        CommandType::Mul => Command::Arith(ArithOp::Mul),
        CommandType::Div => Command::Arith(ArithOp::Div),
        CommandType::Begin => Command::Begin,
        CommandType::Commit => Command::Commit,
        CommandType::Bye => Command::Bye,
    };

    validate_command(&command)?;
    Ok(command)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to a newline-terminated line
///
/// Free-text messages are normalized to single spaces so they survive the
/// tokenizing decoder unchanged.
pub fn encode_response(response: &Response) -> Result<String> {
    let mut line = response.status().as_str().to_string();

    match response {
        Response::Ok => {}
        Response::Data(value) => {
            if !is_token(value) {
                return Err(TallyError::Protocol(format!(
                    "DATA value must be a single token: {}",
                    excerpt(value)
                )));
            }
            line.push(' ');
            line.push_str(value);
        }
        Response::Failed(message) | Response::Error(message) => {
            let words: Vec<&str> = message.split_ascii_whitespace().collect();
            if words.is_empty() {
                return Err(TallyError::Protocol(format!(
                    "{} response requires a message",
                    response.status().as_str()
                )));
            }
            line.push(' ');
            line.push_str(&words.join(" "));
        }
    }

    finish_line(line)
}

/// Decode a response from a newline-terminated line
pub fn decode_response(line: &str) -> Result<Response> {
    let tokens = tokenize(line)?;
    let keyword = tokens[0];
    let args = &tokens[1..];

    let status = Status::from_keyword(keyword).ok_or_else(|| {
        TallyError::Protocol(format!("Unknown response status: {}", excerpt(keyword)))
    })?;

    match status {
        Status::Ok if args.is_empty() => Ok(Response::Ok),
        Status::Data if args.len() == 1 => Ok(Response::Data(args[0].to_string())),
        Status::Failed if !args.is_empty() => Ok(Response::Failed(args.join(" "))),
        Status::Error if !args.is_empty() => Ok(Response::Error(args.join(" "))),
        _ => Err(TallyError::Protocol(format!(
            "{} response has wrong number of arguments: {}",
            keyword,
            args.len()
        ))),
    }
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one raw line from a stream
///
/// Returns `None` on a clean end-of-stream. Reads at most
/// [`MAX_ENCODED_LEN`] bytes; a longer line is a protocol error. A final
/// line without terminator is returned as-is so the decoder can reject it.
pub fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut buf = Vec::with_capacity(64);
    let n = reader
        .by_ref()
        .take(MAX_ENCODED_LEN as u64)
        .read_until(b'\n', &mut buf)?;

    if n == 0 {
        return Ok(None);
    }

    if n == MAX_ENCODED_LEN && buf.last() != Some(&b'\n') {
        return Err(TallyError::Protocol(format!(
            "Message exceeds maximum length of {} bytes",
            MAX_ENCODED_LEN
        )));
    }

    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| TallyError::Protocol("Message is not valid UTF-8".to_string()))
}

/// Read a complete command from a stream
///
/// Blocks until a full line is received. `None` means the peer closed the
/// stream between commands.
pub fn read_command<R: BufRead>(reader: &mut R) -> Result<Option<Command>> {
    match read_line(reader)? {
        Some(line) => decode_command(&line).map(Some),
        None => Ok(None),
    }
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let line = encode_command(command)?;
    writer.write_all(line.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: BufRead>(reader: &mut R) -> Result<Response> {
    match read_line(reader)? {
        Some(line) => decode_response(&line),
        None => Err(TallyError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "server closed the connection",
        ))),
    }
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let line = encode_response(response)?;
    writer.write_all(line.as_bytes())?;
    writer.flush()?;
    Ok(())
}
