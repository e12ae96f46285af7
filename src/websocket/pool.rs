use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio_tungstenite::tungstenite::Message;
use tracing::{error, info};
use uuid::Uuid;

/// Registry of currently open WebSocket connections.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    connections: Arc<RwLock<HashMap<Uuid, mpsc::UnboundedSender<Message>>>>,
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn add(&self, id: Uuid, sender: mpsc::UnboundedSender<Message>) {
        self.connections.write().await.insert(id, sender);
        info!("Added connection {} to registry", id);
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        let removed = self.connections.write().await.remove(id).is_some();
        if removed {
            info!("Removed connection {} from registry", id);
        }
        removed
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Push a close frame to every registered connection. Used at shutdown.
    pub async fn close_all(&self) {
        let connections = self.connections.read().await;
        for (id, sender) in connections.iter() {
            if let Err(e) = sender.send(Message::Close(None)) {
                error!("Failed to close connection {}: {}", id, e);
            }
        }
    }
}
