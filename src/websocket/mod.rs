//! WebSocket bridge module
//!
//! Handles WebSocket connections, command dispatch,
//! and client session management.

mod connection;
mod pool;
mod server;

pub use connection::{Connection, NOT_CONNECTED_REPLY, RECONNECTING_REPLY};
pub use pool::ConnectionPool;
pub use server::BridgeServer;
