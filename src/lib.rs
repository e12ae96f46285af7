pub mod config;
pub mod error;
pub mod serial;
pub mod websocket;

use std::sync::Arc;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;
pub use serial::SerialManager;
pub use websocket::BridgeServer;

/// Application state shared across all components
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub serial: Arc<SerialManager>,
}

impl AppState {
    pub fn new(config: Settings) -> Self {
        let serial = Arc::new(SerialManager::new(&config.serial));
        Self {
            config: Arc::new(config),
            serial,
        }
    }
}
