use arduino_bridge::{AppState, BridgeServer, Settings};
use dotenv::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> arduino_bridge::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    // Load configuration
    let config = Settings::new()?;
    info!("Configuration loaded successfully");

    let state = AppState::new(config);

    // Try to open the device at startup; the bridge still serves clients
    // without one, they just get not-connected replies
    match state.serial.connect().await {
        Ok(port) => info!("Arduino connected on {}", port),
        Err(e) => warn!("No Arduino connected at startup: {}", e),
    }

    let addr = format!(
        "{}:{}",
        state.config.server.host, state.config.server.port
    );
    let listener = TcpListener::bind(&addr).await?;
    info!("WebSocket bridge listening on ws://{}", addr);

    let server = Arc::new(BridgeServer::new(Arc::clone(&state.serial)));
    let mut sessions = JoinSet::new();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, shutting down");
                break;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let server = Arc::clone(&server);
                        sessions.spawn(async move {
                            server.handle_connection(stream, peer).await;
                        });
                    }
                    Err(e) => error!("Failed to accept connection: {}", e),
                }
            }
        }
    }

    // Stop accepting, close every registered connection, then wait for
    // in-flight sends to finish
    drop(listener);
    server.shutdown().await;
    let drained = tokio::time::timeout(Duration::from_secs(5), async {
        while sessions.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        warn!("Timed out waiting for sessions to drain");
    }

    info!("Shutdown complete");
    Ok(())
}
