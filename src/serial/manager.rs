use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

use super::backend::{DeviceLink, PortBackend, PortInfo, SerialportBackend};
use crate::config::SerialConfig;
use crate::error::SerialError;

/// Owns the single serial handle shared by every WebSocket session.
///
/// The handle lives in one mutex-guarded slot, so device round-trips from
/// concurrent sessions queue instead of interleaving their writes and reads.
pub struct SerialManager {
    backend: Arc<dyn PortBackend>,
    device_marker: String,
    baud_rate: u32,
    read_timeout: Duration,
    handle: Arc<Mutex<Option<Box<dyn DeviceLink>>>>,
}

impl SerialManager {
    pub fn new(config: &SerialConfig) -> Self {
        Self::with_backend(config, Arc::new(SerialportBackend))
    }

    pub fn with_backend(config: &SerialConfig, backend: Arc<dyn PortBackend>) -> Self {
        Self {
            backend,
            device_marker: config.device_marker.clone(),
            baud_rate: config.baud_rate,
            read_timeout: config.read_timeout(),
            handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Enumerate all serial ports. Never touches the open handle.
    pub async fn list_ports(&self) -> Result<Vec<PortInfo>, SerialError> {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || backend.list_ports())
            .await
            .map_err(|e| SerialError::IoError(e.to_string()))?
    }

    /// First port whose description contains the configured marker.
    pub async fn discover(&self) -> Result<PortInfo, SerialError> {
        let ports = self.list_ports().await?;
        ports
            .into_iter()
            .find(|p| p.description.contains(&self.device_marker))
            .ok_or(SerialError::DeviceNotFound)
    }

    /// Discover and open the device, replacing any existing handle.
    ///
    /// Returns the port name on success. On failure the slot keeps its
    /// previous contents.
    pub async fn connect(&self) -> Result<String, SerialError> {
        let port = self.discover().await?;

        let backend = Arc::clone(&self.backend);
        let name = port.name.clone();
        let baud_rate = self.baud_rate;
        let timeout = self.read_timeout;
        let link = tokio::task::spawn_blocking(move || backend.open(&name, baud_rate, timeout))
            .await
            .map_err(|e| SerialError::IoError(e.to_string()))??;

        // Dropping the previous handle closes the port
        *self.handle.lock().await = Some(link);
        info!("Serial device connected on {}", port.name);
        Ok(port.name)
    }

    /// Close and clear the handle. Returns false if none was open.
    pub async fn disconnect(&self) -> bool {
        let removed = self.handle.lock().await.take().is_some();
        if removed {
            info!("Serial device disconnected");
        }
        removed
    }

    /// Drop the handle without logging a clean disconnect. Called after a
    /// device I/O failure, before a reconnect attempt.
    pub async fn invalidate(&self) {
        self.handle.lock().await.take();
    }

    pub async fn is_connected(&self) -> bool {
        self.handle.lock().await.is_some()
    }

    /// Write the payload plus a newline terminator and read one response
    /// line back, trimmed of trailing whitespace.
    ///
    /// The slot stays locked for the whole round-trip and the blocking port
    /// I/O runs off the async workers.
    pub async fn write_line(&self, payload: &str) -> Result<String, SerialError> {
        let mut guard = Arc::clone(&self.handle).lock_owned().await;
        if guard.is_none() {
            return Err(SerialError::NotConnected);
        }

        let payload = payload.as_bytes().to_vec();
        let (guard, result) = tokio::task::spawn_blocking(move || {
            let result = match guard.as_mut() {
                Some(link) => link
                    .write_line(&payload)
                    .and_then(|_| link.read_line()),
                None => Err(SerialError::NotConnected),
            };
            (guard, result)
        })
        .await
        .map_err(|e| SerialError::IoError(e.to_string()))?;
        drop(guard);

        result.map(|line| line.trim_end().to_string())
    }
}

impl std::fmt::Debug for SerialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialManager")
            .field("device_marker", &self.device_marker)
            .field("baud_rate", &self.baud_rate)
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}
