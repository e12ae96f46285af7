use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    /// Substring matched against each port's human-readable description
    pub device_marker: String,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub serial: SerialConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default values
            .set_default("environment", "development")?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8765)?
            .set_default("serial.device_marker", "Arduino")?
            .set_default("serial.baud_rate", 9600)?
            .set_default("serial.read_timeout_ms", 1000)?
            // Add in settings from the config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in settings from environment variables (with prefix "APP_")
            // E.g., `APP_SERVER__PORT=5001` would set `Settings.server.port`
            .add_source(
                Environment::with_prefix("app")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }

    pub fn new_for_test() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("environment", "test")?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 0)?
            .set_default("serial.device_marker", "Arduino")?
            .set_default("serial.baud_rate", 9600)?
            .set_default("serial.read_timeout_ms", 50)?
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn cleanup_env() {
        env::remove_var("APP_SERVER__HOST");
        env::remove_var("APP_SERVER__PORT");
        env::remove_var("APP_SERIAL__DEVICE_MARKER");
        env::remove_var("APP_SERIAL__BAUD_RATE");
        env::remove_var("APP_SERIAL__READ_TIMEOUT_MS");
    }

    // Defaults and env override share one test; the env source is
    // process-wide and parallel tests would race on it.
    #[test]
    fn test_default_settings_and_env_override() {
        cleanup_env();
        let settings = Settings::new().expect("Failed to load default settings");

        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8765);
        assert_eq!(settings.serial.device_marker, "Arduino");
        assert_eq!(settings.serial.baud_rate, 9600);
        assert_eq!(settings.serial.read_timeout_ms, 1000);
        assert_eq!(settings.serial.read_timeout(), Duration::from_secs(1));

        env::set_var("APP_SERIAL__BAUD_RATE", "115200");
        let settings = Settings::new().expect("Failed to load settings");
        assert_eq!(settings.serial.baud_rate, 115200);

        cleanup_env();
    }

    #[test]
    fn test_settings_for_test() {
        let settings = Settings::new_for_test().expect("Failed to load test settings");
        assert_eq!(settings.environment, "test");
        assert_eq!(settings.server.port, 0);
    }
}
