//! Serial port driver.
//!
//! Owns the device handle and performs bounded-wait reads. Framing is fixed
//! at 8 data bits, no parity, one stop bit, no hardware flow control. Reads
//! use a 1ms timeout so the main loop polls with bounded latency instead of
//! spinning on a non-blocking descriptor.

use std::io::Read;
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits};

/// Capacity of the reusable read buffer owned by the main loop.
pub const READ_BUFFER_SIZE: usize = 960;

/// Read timeout bounding each poll of the device.
const READ_TIMEOUT: Duration = Duration::from_millis(1);

/// Supported UART speeds. Construction from a raw integer is fallible;
/// anything outside this set is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaudRate {
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
}

impl BaudRate {
    /// Maps a raw speed to a supported baud rate, or `None` if unsupported.
    pub fn from_raw(speed: u32) -> Option<Self> {
        match speed {
            9600 => Some(BaudRate::B9600),
            19200 => Some(BaudRate::B19200),
            38400 => Some(BaudRate::B38400),
            57600 => Some(BaudRate::B57600),
            115200 => Some(BaudRate::B115200),
            _ => None,
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            BaudRate::B9600 => 9600,
            BaudRate::B19200 => 19200,
            BaudRate::B38400 => 38400,
            BaudRate::B57600 => 57600,
            BaudRate::B115200 => 115200,
        }
    }
}

impl Default for BaudRate {
    fn default() -> Self {
        BaudRate::B115200
    }
}

impl std::fmt::Display for BaudRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

/// Device configuration, immutable after startup.
#[derive(Debug, Clone)]
pub struct PortConfig {
    /// Serial device path, e.g. `/dev/ttyUSB0`.
    pub device: String,
    pub baud: BaudRate,
}

/// Error type for port failures.
#[derive(Debug)]
pub enum PortError {
    /// Device could not be opened. Fatal at startup.
    Open {
        device: String,
        source: serialport::Error,
    },
    /// I/O error during a read. Non-fatal; the iteration is skipped.
    Read(std::io::Error),
    /// Device enumeration failed.
    Enumerate(serialport::Error),
}

impl std::fmt::Display for PortError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortError::Open { device, source } => {
                write!(f, "failed to open '{}': {}", device, source)
            }
            PortError::Read(e) => write!(f, "serial read error: {}", e),
            PortError::Enumerate(e) => write!(f, "failed to enumerate serial devices: {}", e),
        }
    }
}

impl std::error::Error for PortError {}

/// Result of one bounded-wait read.
#[derive(Debug, PartialEq, Eq)]
pub enum PortRead {
    /// `n` bytes arrived.
    Data(usize),
    /// No data this iteration. Not an error.
    Idle,
}

/// Open serial device handle. Closed on drop.
pub struct UartPort {
    inner: Box<dyn SerialPort>,
}

impl UartPort {
    /// Opens the device read/write without becoming the controlling terminal
    /// and applies the fixed 8N1 framing.
    pub fn open(config: &PortConfig) -> Result<Self, PortError> {
        let inner = serialport::new(config.device.as_str(), config.baud.as_u32())
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|source| PortError::Open {
                device: config.device.clone(),
                source,
            })?;
        Ok(Self { inner })
    }

    /// Reads whatever is pending into `buf`, waiting at most the read
    /// timeout. A timed-out or zero-byte read is `Idle`, not an error.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<PortRead, PortError> {
        match self.inner.read(buf) {
            Ok(0) => Ok(PortRead::Idle),
            Ok(n) => Ok(PortRead::Data(n)),
            Err(e)
                if e.kind() == std::io::ErrorKind::TimedOut
                    || e.kind() == std::io::ErrorKind::WouldBlock =>
            {
                Ok(PortRead::Idle)
            }
            Err(e) => Err(PortError::Read(e)),
        }
    }
}

/// Summary of a detected serial device.
#[derive(Debug, Clone)]
pub struct PortInfo {
    pub name: String,
    pub kind: &'static str,
}

/// Enumerates serial devices present on the system.
pub fn available_ports() -> Result<Vec<PortInfo>, PortError> {
    let ports = serialport::available_ports().map_err(PortError::Enumerate)?;
    Ok(ports
        .into_iter()
        .map(|p| PortInfo {
            name: p.port_name,
            kind: match p.port_type {
                SerialPortType::UsbPort(_) => "USB",
                SerialPortType::BluetoothPort => "Bluetooth",
                SerialPortType::PciPort => "PCI",
                SerialPortType::Unknown => "Unknown",
            },
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_accepts_supported_speeds() {
        assert_eq!(BaudRate::from_raw(9600), Some(BaudRate::B9600));
        assert_eq!(BaudRate::from_raw(19200), Some(BaudRate::B19200));
        assert_eq!(BaudRate::from_raw(38400), Some(BaudRate::B38400));
        assert_eq!(BaudRate::from_raw(57600), Some(BaudRate::B57600));
        assert_eq!(BaudRate::from_raw(115200), Some(BaudRate::B115200));
    }

    #[test]
    fn from_raw_rejects_unsupported_speeds() {
        assert_eq!(BaudRate::from_raw(300), None);
        assert_eq!(BaudRate::from_raw(0), None);
        assert_eq!(BaudRate::from_raw(921600), None);
    }

    #[test]
    fn default_baud_is_115200() {
        assert_eq!(BaudRate::default(), BaudRate::B115200);
        assert_eq!(BaudRate::default().as_u32(), 115200);
    }

    #[test]
    fn open_nonexistent_device_fails() {
        let config = PortConfig {
            device: "/dev/nonexistent-uartlog-test".to_string(),
            baud: BaudRate::default(),
        };
        let err = UartPort::open(&config).err().expect("open should fail");
        assert!(matches!(err, PortError::Open { .. }));
        assert!(err.to_string().contains("/dev/nonexistent-uartlog-test"));
    }
}
