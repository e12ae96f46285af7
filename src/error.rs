use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Serial error: {0}")]
    SerialError(#[from] SerialError),

    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] WebSocketError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

// Implement conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

// Add conversion from std::io::Error
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum SerialError {
    #[error("No matching serial device found")]
    DeviceNotFound,

    #[error("No active serial connection")]
    NotConnected,

    #[error("Failed to enumerate serial ports: {0}")]
    EnumerateError(String),

    #[error("Failed to open port {port}: {message}")]
    OpenError { port: String, message: String },

    #[error("Device I/O failed: {0}")]
    IoError(String),
}

impl From<std::io::Error> for SerialError {
    fn from(err: std::io::Error) -> Self {
        SerialError::IoError(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum WebSocketError {
    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Message sending failed: {0}")]
    SendError(String),

    #[error("Handshake failed: {0}")]
    HandshakeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_conversion() {
        // Test IO error conversion
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::InternalError(_)));

        // Test config error conversion
        let config_err = config::ConfigError::NotFound(String::from("key not found"));
        let app_err: AppError = config_err.into();
        assert!(matches!(app_err, AppError::ConfigError(_)));

        // Test serial error conversion
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged");
        let serial_err: SerialError = io_err.into();
        assert!(matches!(serial_err, SerialError::IoError(_)));
        let app_err: AppError = serial_err.into();
        assert!(matches!(app_err, AppError::SerialError(_)));
    }

    #[test]
    fn test_error_display() {
        let err = AppError::SerialError(SerialError::DeviceNotFound);
        assert_eq!(err.to_string(), "Serial error: No matching serial device found");

        let err = AppError::SerialError(SerialError::NotConnected);
        assert_eq!(err.to_string(), "Serial error: No active serial connection");

        let err = AppError::WebSocketError(WebSocketError::ConnectionClosed);
        assert_eq!(err.to_string(), "WebSocket error: Connection closed");

        let err = SerialError::OpenError {
            port: "/dev/ttyACM0".to_string(),
            message: "permission denied".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to open port /dev/ttyACM0: permission denied"
        );
    }
}
