use std::sync::Arc;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{error, info};

use crate::serial::SerialManager;
use crate::websocket::{Connection, ConnectionPool};

pub struct BridgeServer {
    pool: Arc<ConnectionPool>,
    serial: Arc<SerialManager>,
}

impl BridgeServer {
    pub fn new(serial: Arc<SerialManager>) -> Self {
        Self {
            pool: Arc::new(ConnectionPool::new()),
            serial,
        }
    }

    pub async fn handle_connection(
        self: Arc<Self>,
        raw_stream: tokio::net::TcpStream,
        addr: std::net::SocketAddr,
    ) {
        info!("New WebSocket connection from: {}", addr);

        let ws_stream = match tokio_tungstenite::accept_async(raw_stream).await {
            Ok(ws) => ws,
            Err(e) => {
                error!("Error during WebSocket handshake: {}", e);
                return;
            }
        };

        let (ws_sink, ws_stream) = ws_stream.split();
        let (tx, rx) = mpsc::unbounded_channel();

        let mut connection = Connection::new(tx.clone(), Arc::clone(&self.serial));
        let connection_id = connection.id();

        // Add connection to the registry
        self.pool.add(connection_id, tx).await;
        let pool = Arc::clone(&self.pool);

        // Forward replies from rx to the socket
        let send_task = tokio::spawn(async move {
            let mut ws_sink = ws_sink;
            let mut rx = rx;

            while let Some(message) = rx.recv().await {
                let closing = matches!(message, Message::Close(_));
                if let Err(e) = ws_sink.send(message).await {
                    error!("Error sending WebSocket message: {}", e);
                    break;
                }
                if closing {
                    break;
                }
            }

            if let Err(e) = ws_sink.close().await {
                info!("WebSocket sink already closed: {}", e);
            }
        });

        // Handle incoming WebSocket messages
        let receive_task = tokio::spawn(async move {
            let mut ws_stream = ws_stream;

            while let Some(message) = ws_stream.next().await {
                match message {
                    Ok(msg) => {
                        if let Err(e) = connection.handle_message(msg).await {
                            info!("Session ending for connection {}: {}", connection_id, e);
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Error receiving WebSocket message: {}", e);
                        break;
                    }
                }
            }
        });

        // Wait for either task to complete
        tokio::select! {
            _ = send_task => {
                info!("Send task completed for connection {}", connection_id);
            }
            _ = receive_task => {
                info!("Receive task completed for connection {}", connection_id);
            }
        }

        // Cleanup connection
        pool.remove(&connection_id).await;
        info!("Connection {} closed", connection_id);
    }

    pub fn pool(&self) -> Arc<ConnectionPool> {
        Arc::clone(&self.pool)
    }

    /// Begin graceful shutdown: push a close frame to every open connection.
    pub async fn shutdown(&self) {
        self.pool.close_all().await;
    }
}
