//! Network Module
//!
//! TCP server, per-client connection handling and a blocking client.
//!
//! ## Architecture
//! - Single acceptor thread
//! - One worker thread per connection, each owning its own session
//! - Workers share only the table directory

mod server;
mod connection;
mod client;

pub use server::{Server, ShutdownHandle};
pub use connection::Connection;
pub use client::Client;
