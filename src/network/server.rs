//! TCP Server
//!
//! Accepts connections and runs each one on its own thread.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::sync::WaitGroup;
use parking_lot::Mutex;

use super::Connection;
use crate::config::Config;
use crate::error::{Result, TallyError};
use crate::protocol::{write_response, Response};
use crate::storage::TableDirectory;

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// State shared between the accept loop and shutdown handles
#[derive(Debug, Default)]
struct Shared {
    /// Set once shutdown has been requested
    shutdown: AtomicBool,

    /// Live client sockets, so shutdown can unblock their readers
    clients: Mutex<HashMap<u64, TcpStream>>,
}

/// TCP server for TallyKV
pub struct Server {
    config: Config,
    directory: Arc<TableDirectory>,
    listener: TcpListener,
    shared: Arc<Shared>,
}

/// Cloneable handle that stops a running [`Server`]
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    shared: Arc<Shared>,
}

impl ShutdownHandle {
    /// Stop accepting and close every live client connection
    ///
    /// Sessions on those connections end as if the peer had disconnected,
    /// which rolls back any open transaction.
    pub fn shutdown(&self) {
        self.shared.shutdown.store(true, Ordering::SeqCst);

        let clients = self.shared.clients.lock();
        for stream in clients.values() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }

    /// Whether shutdown has been requested
    pub fn is_shutdown(&self) -> bool {
        self.shared.shutdown.load(Ordering::SeqCst)
    }
}

impl Server {
    /// Bind the listening socket
    pub fn bind(config: Config, directory: Arc<TableDirectory>) -> Result<Self> {
        if config.max_connections == 0 {
            return Err(TallyError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }

        let listener = TcpListener::bind(&config.listen_addr)?;

        Ok(Self {
            config,
            directory,
            listener,
            shared: Arc::new(Shared::default()),
        })
    }

    /// Address the server is listening on
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Tables served by this server
    pub fn directory(&self) -> &Arc<TableDirectory> {
        &self.directory
    }

    /// Get a handle that can stop the server from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown_handle().shutdown();
    }

    /// Number of live client connections
    pub fn active_connections(&self) -> usize {
        self.shared.clients.lock().len()
    }

    /// Start the server (blocking)
    ///
    /// Returns after shutdown has been requested and every connection thread
    /// has finished.
    pub fn run(&self) -> Result<()> {
        self.listener.set_nonblocking(true)?;
        tracing::info!("Listening on {}", self.local_addr()?);

        let wait_group = WaitGroup::new();
        let mut next_id: u64 = 0;

        while !self.shared.shutdown.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    next_id += 1;
                    if let Err(e) = self.dispatch(next_id, stream, wait_group.clone()) {
                        tracing::warn!("Could not start connection for {}: {}", peer, e);
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::warn!("Could not accept connection: {}", e);
                }
            }
        }

        tracing::info!(
            "Shutting down, waiting for {} connections",
            self.active_connections()
        );
        wait_group.wait();
        Ok(())
    }

    /// Register a new client and spawn its worker thread
    fn dispatch(&self, id: u64, mut stream: TcpStream, wait_group: WaitGroup) -> Result<()> {
        // Accepted sockets inherit non-blocking mode on some platforms
        stream.set_nonblocking(false)?;

        {
            let mut clients = self.shared.clients.lock();

            // Checked under the registry lock so shutdown cannot miss us
            if self.shared.shutdown.load(Ordering::SeqCst) {
                let _ = stream.shutdown(Shutdown::Both);
                return Ok(());
            }

            if clients.len() >= self.config.max_connections {
                tracing::warn!(
                    "Rejecting connection: limit of {} reached",
                    self.config.max_connections
                );
                let _ = write_response(&mut stream, &Response::error("Too many connections"));
                return Ok(());
            }

            clients.insert(id, stream.try_clone()?);
        }

        let directory = Arc::clone(&self.directory);
        let shared = Arc::clone(&self.shared);
        let read_ms = self.config.read_timeout_ms;
        let write_ms = self.config.write_timeout_ms;

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", id))
            .spawn(move || {
                serve_client(stream, directory, read_ms, write_ms);
                shared.clients.lock().remove(&id);
                drop(wait_group);
            });

        if let Err(e) = spawned {
            self.shared.clients.lock().remove(&id);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Worker body: run one connection to completion
fn serve_client(stream: TcpStream, directory: Arc<TableDirectory>, read_ms: u64, write_ms: u64) {
    let mut connection = match Connection::new(stream, directory) {
        Ok(connection) => connection,
        Err(e) => {
            tracing::warn!("Could not set up connection: {}", e);
            return;
        }
    };

    if let Err(e) = connection.set_timeouts(read_ms, write_ms) {
        tracing::warn!(
            "Could not set timeouts for {}: {}",
            connection.peer_addr(),
            e
        );
        return;
    }

    if let Err(e) = connection.handle() {
        tracing::debug!("Connection {} ended with error: {}", connection.peer_addr(), e);
    }
}
