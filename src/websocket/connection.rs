use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{SerialError, WebSocketError};
use crate::serial::SerialManager;

/// Fixed reply when a forwarding command arrives with no device connected.
pub const NOT_CONNECTED_REPLY: &str = "Error: Arduino not connected.";
/// Reply sent once per device I/O failure, before the reconnect attempt.
pub const RECONNECTING_REPLY: &str = "Error: Arduino disconnected. Reconnecting...";

const UPLOAD_PREFIX: &str = "UPLOAD_CODE:";

pub struct Connection {
    id: Uuid,
    tx: mpsc::UnboundedSender<Message>,
    serial: Arc<SerialManager>,
}

impl Connection {
    pub fn new(tx: mpsc::UnboundedSender<Message>, serial: Arc<SerialManager>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tx,
            serial,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn handle_message(&mut self, msg: Message) -> Result<(), WebSocketError> {
        match msg {
            Message::Text(text) => {
                let reply = self.dispatch(&text).await;
                self.send_text(reply)?;
            }
            Message::Close(_) => {
                info!("Client initiated close for connection {}", self.id);
                return Err(WebSocketError::ConnectionClosed);
            }
            Message::Ping(data) => {
                self.tx
                    .send(Message::Pong(data))
                    .map_err(|e| WebSocketError::SendError(e.to_string()))?;
            }
            Message::Binary(_) => {
                warn!("Received binary frame on connection {}", self.id);
                self.send_text("Error: binary frames are not supported".to_string())?;
            }
            _ => {}
        }
        Ok(())
    }

    /// One reply per text frame, dispatched by exact or prefix match.
    /// Unrecognized text is forwarded to the device raw.
    async fn dispatch(&self, text: &str) -> String {
        match text {
            "LIST_PORTS" => self.list_ports().await,
            "CONNECT_ARDUINO" => self.connect_device().await,
            "DISCONNECT_ARDUINO" => self.disconnect_device().await,
            _ => {
                let payload = text
                    .strip_prefix(UPLOAD_PREFIX)
                    .map(str::trim)
                    .unwrap_or(text);
                self.forward(payload).await
            }
        }
    }

    async fn list_ports(&self) -> String {
        match self.serial.list_ports().await {
            Ok(ports) if ports.is_empty() => "No ports available".to_string(),
            Ok(ports) => {
                let names: Vec<String> = ports
                    .into_iter()
                    .map(|p| format!("{} ({})", p.name, p.description))
                    .collect();
                format!("Available ports: {}", names.join(", "))
            }
            Err(e) => format!("Error: {}", e),
        }
    }

    async fn connect_device(&self) -> String {
        match self.serial.connect().await {
            Ok(port) => format!("Connected to Arduino on {}", port),
            Err(e) => format!("Error: {}", e),
        }
    }

    async fn disconnect_device(&self) -> String {
        if self.serial.disconnect().await {
            "Disconnected from Arduino".to_string()
        } else {
            "No active connection".to_string()
        }
    }

    async fn forward(&self, payload: &str) -> String {
        if !self.serial.is_connected().await {
            return NOT_CONNECTED_REPLY.to_string();
        }

        match self.serial.write_line(payload).await {
            Ok(line) => format!("Arduino Response: {}", line),
            Err(SerialError::NotConnected) => NOT_CONNECTED_REPLY.to_string(),
            Err(e) => {
                error!("Device I/O failed on connection {}: {}", self.id, e);
                // One reconnect attempt per failure; the request itself is
                // not retried, the client must resend.
                let serial = Arc::clone(&self.serial);
                tokio::spawn(async move {
                    serial.invalidate().await;
                    match serial.connect().await {
                        Ok(port) => info!("Reconnected to Arduino on {}", port),
                        Err(e) => warn!("Reconnect attempt failed: {}", e),
                    }
                });
                RECONNECTING_REPLY.to_string()
            }
        }
    }

    fn send_text(&self, reply: String) -> Result<(), WebSocketError> {
        self.tx
            .send(Message::Text(reply))
            .map_err(|e| WebSocketError::SendError(e.to_string()))
    }
}
