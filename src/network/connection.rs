//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, TallyError};
use crate::protocol::{read_command, write_response, Command, Response};
use crate::session::{Outcome, Session};
use crate::storage::TableDirectory;

/// Sent in place of an ERROR whose text cannot be encoded
const INVALID_MESSAGE: &str = "Invalid message";

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Interpreter state private to this connection
    session: Session,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O and a fresh session
    pub fn new(stream: TcpStream, directory: Arc<TableDirectory>) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Request/response protocol: one small line each way
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            session: Session::new(directory),
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 leaves the timeout disabled)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let read_stream = self.reader.get_ref();
        let write_stream = self.writer.get_ref();

        if read_ms > 0 {
            read_stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            write_stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads commands in a loop and sends one response per command.
    /// Returns when the client says BYE, disconnects, or sends something
    /// that cannot be decoded (after answering it with ERROR).
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            // Read next command
            let command = match read_command(&mut self.reader) {
                Ok(Some(cmd)) => cmd,
                Ok(None) => {
                    // Client disconnected gracefully
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(TallyError::Io(ref e))
                    if matches!(
                        e.kind(),
                        ErrorKind::UnexpectedEof
                            | ErrorKind::ConnectionReset
                            | ErrorKind::ConnectionAborted
                    ) =>
                {
                    tracing::debug!("Connection to client {} lost: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(TallyError::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    // Read timeout (Windows uses TimedOut instead of WouldBlock)
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Bad request from {}: {}", self.peer_addr, e);
                    let _ = self.send_response(Response::error(e.to_string()));
                    return Err(e);
                }
            };

            tracing::trace!("Received command from {}: {:?}", self.peer_addr, command);

            // Execute command
            let (response, keep_open) = self.execute_command(command);

            // Send response
            if let Err(e) = self.send_response(response) {
                // The client went away before reading its answer
                if let TallyError::Io(ref io_err) = e {
                    match io_err.kind() {
                        ErrorKind::ConnectionAborted
                        | ErrorKind::ConnectionReset
                        | ErrorKind::BrokenPipe => {
                            tracing::debug!(
                                "Client {} disconnected before response could be sent: {}",
                                self.peer_addr,
                                e
                            );
                            return Ok(());
                        }
                        _ => {}
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }

            if !keep_open {
                tracing::debug!("Closing connection to {}", self.peer_addr);
                return Ok(());
            }
        }
    }

    /// Execute a command and return the response plus whether to keep going
    ///
    /// This is the single place where command errors become FAILED (the
    /// session continues) or ERROR (the connection is closed).
    fn execute_command(&mut self, command: Command) -> (Response, bool) {
        match self.session.execute(command) {
            Ok(Outcome::Ok) => (Response::Ok, true),
            Ok(Outcome::Data(value)) => (Response::Data(value), true),
            Ok(Outcome::Close) => (Response::Ok, false),
            Err(e) if e.is_fatal() => {
                tracing::warn!("Fatal error for {}: {}", self.peer_addr, e);
                (Response::error(e.to_string()), false)
            }
            Err(e) => {
                tracing::trace!("Command from {} failed: {}", self.peer_addr, e);
                (Response::failed(e.to_string()), true)
            }
        }
    }

    /// Send a response to the client
    ///
    /// A response that cannot be encoded is replaced by a fixed ERROR line,
    /// so the client always gets exactly one reply.
    fn send_response(&mut self, response: Response) -> Result<()> {
        match write_response(&mut self.writer, &response) {
            Err(TallyError::Protocol(reason)) => {
                tracing::warn!("Unencodable response for {}: {}", self.peer_addr, reason);
                write_response(&mut self.writer, &Response::error(INVALID_MESSAGE))
            }
            other => other,
        }
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Get the session driven by this connection
    pub fn session(&self) -> &Session {
        &self.session
    }
}
