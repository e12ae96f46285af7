use std::io::{Read, Write};
use std::time::Duration;

use crate::error::SerialError;

/// Information about a detected serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// OS port name (e.g. /dev/ttyACM0, COM3)
    pub name: String,
    /// Human-readable description, used for device discovery
    pub description: String,
}

/// One open device connection with newline-delimited request/response framing.
///
/// Calls block up to the configured read timeout; they must run on a
/// blocking-capable thread, never on the async workers.
pub trait DeviceLink: Send {
    fn write_line(&mut self, payload: &[u8]) -> Result<(), SerialError>;
    fn read_line(&mut self) -> Result<String, SerialError>;
}

/// Enumerates and opens serial ports.
pub trait PortBackend: Send + Sync {
    fn list_ports(&self) -> Result<Vec<PortInfo>, SerialError>;
    fn open(
        &self,
        port: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Box<dyn DeviceLink>, SerialError>;
}

/// Production backend on top of the `serialport` crate.
#[derive(Debug, Default)]
pub struct SerialportBackend;

impl PortBackend for SerialportBackend {
    fn list_ports(&self) -> Result<Vec<PortInfo>, SerialError> {
        let ports = serialport::available_ports()
            .map_err(|e| SerialError::EnumerateError(e.to_string()))?;

        Ok(ports
            .into_iter()
            .map(|p| {
                let description = match p.port_type {
                    serialport::SerialPortType::UsbPort(info) => {
                        info.product.unwrap_or_else(|| "USB Serial".to_string())
                    }
                    serialport::SerialPortType::PciPort => "PCI Serial".to_string(),
                    serialport::SerialPortType::BluetoothPort => "Bluetooth".to_string(),
                    serialport::SerialPortType::Unknown => "Unknown".to_string(),
                };
                PortInfo {
                    name: p.port_name,
                    description,
                }
            })
            .collect())
    }

    fn open(
        &self,
        port: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Box<dyn DeviceLink>, SerialError> {
        let handle = serialport::new(port, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|e| SerialError::OpenError {
                port: port.to_string(),
                message: e.to_string(),
            })?;

        Ok(Box::new(SerialportLink { port: handle }))
    }
}

struct SerialportLink {
    port: Box<dyn serialport::SerialPort>,
}

impl DeviceLink for SerialportLink {
    fn write_line(&mut self, payload: &[u8]) -> Result<(), SerialError> {
        self.port.write_all(payload)?;
        self.port.write_all(b"\n")?;
        self.port.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, SerialError> {
        let mut buffer = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            match self.port.read(&mut byte) {
                Ok(1) => {
                    if byte[0] == b'\n' {
                        break;
                    }
                    buffer.push(byte[0]);
                }
                // Zero-length read or timeout both end the line
                Ok(_) => break,
                Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => break,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
