//! Serial port manager for the Arduino bridge
//!
//! Discovers the device by description match and owns the single
//! serial handle shared by every WebSocket session.

mod backend;
mod manager;

pub use backend::{DeviceLink, PortBackend, PortInfo, SerialportBackend};
pub use manager::SerialManager;
