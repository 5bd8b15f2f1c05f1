//! Protocol Module
//!
//! Defines the line-oriented text protocol for client-server communication.
//!
//! ## Requests
//! ```text
//! LOGIN <username>        CREATE <table>          PUSH <value>
//! POP                     TOP                     SET <table> <key>
//! GET <table> <key>       ADD | SUB | MUL | DIV   BEGIN
//! COMMIT                  BYE
//! ```
//!
//! ## Responses
//! - `OK`
//! - `FAILED <message>`: recoverable, the session continues
//! - `ERROR <message>`: fatal, the server closes the connection
//! - `DATA <value>`: reply to TOP
//!
//! Every request gets exactly one response line before the next request is
//! read.

mod command;
mod response;
mod codec;

pub use command::{ArithOp, Command, CommandType};
pub use response::{Response, Status};
pub use codec::{
    decode_command, decode_response, encode_command, encode_response, is_identifier,
    read_command, read_line, read_response, validate_command, write_command, write_response,
    MAX_ENCODED_LEN,
};
