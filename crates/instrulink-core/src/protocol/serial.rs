//! Serial port handling
//!
//! OS-backed collaborators of the exchange engine: port enumeration for
//! the validator and a `tokio-serial` opener producing [`Link`]s.

use serialport::{ClearBuffer, SerialPort, SerialPortInfo, SerialPortType};
use std::collections::HashMap;
#[cfg(target_os = "linux")]
use std::fs;
use std::io;
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use super::{ConfigField, ExchangeError, Handshake, Link, LinkConfig, LinkOpener, Parity, StopBits};

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub name: String,

    /// USB vendor ID (if USB device)
    pub vid: Option<u16>,

    /// USB product ID (if USB device)
    pub pid: Option<u16>,

    /// Manufacturer name (if available)
    pub manufacturer: Option<String>,

    /// Product name (if available)
    pub product: Option<String>,
}

impl PortInfo {
    fn bare(name: String) -> Self {
        Self {
            name,
            vid: None,
            pid: None,
            manufacturer: None,
            product: None,
        }
    }
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        match info.port_type {
            SerialPortType::UsbPort(usb) => Self {
                name: info.port_name,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                manufacturer: usb.manufacturer,
                product: usb.product,
            },
            _ => Self::bare(info.port_name),
        }
    }
}

/// Sort key placing ttyACM* first, then ttyUSB* (both numerically), then the rest by name
fn port_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    if let Some(rest) = basename.strip_prefix("ttyACM") {
        let num = rest.parse::<usize>().unwrap_or(usize::MAX);
        return (0, num, basename.to_string());
    }
    if let Some(rest) = basename.strip_prefix("ttyUSB") {
        let num = rest.parse::<usize>().unwrap_or(usize::MAX);
        return (1, num, basename.to_string());
    }
    (2, 0, basename.to_string())
}

/// List all available serial ports, with /dev fallbacks and deterministic ordering
pub fn list_ports() -> Vec<PortInfo> {
    let mut map: HashMap<String, PortInfo> = HashMap::new();
    match serialport::available_ports() {
        Ok(ports) => {
            for info in ports {
                let p = PortInfo::from(info);
                map.entry(p.name.clone()).or_insert(p);
            }
        }
        Err(e) => tracing::warn!("Port enumeration failed: {e}"),
    }

    // Some USB CDC adapters are missing from the enumeration API on Linux
    #[cfg(target_os = "linux")]
    if let Ok(entries) = fs::read_dir("/dev") {
        for entry in entries.flatten() {
            if let Some(fname) = entry.file_name().to_str() {
                if fname.starts_with("ttyACM") || fname.starts_with("ttyUSB") {
                    let full = format!("/dev/{}", fname);
                    map.entry(full.clone()).or_insert_with(|| PortInfo::bare(full));
                }
            }
        }
    }

    let mut v: Vec<PortInfo> = map.into_values().collect();
    v.sort_by_key(|p| port_sort_key(&p.name));
    v
}

/// Source of currently enumerable port identifiers
///
/// Consulted on every validation; implementations must not cache.
pub trait PortEnumerator: Send + Sync {
    /// Names of the ports present right now
    fn port_names(&self) -> Vec<String>;
}

/// Ports reported by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPorts;

impl PortEnumerator for SystemPorts {
    fn port_names(&self) -> Vec<String> {
        list_ports().into_iter().map(|p| p.name).collect()
    }
}

impl Link for SerialStream {
    fn discard_input(&mut self) -> io::Result<()> {
        SerialPort::clear(self, ClearBuffer::Input).map_err(io::Error::from)
    }

    fn bytes_to_read(&mut self) -> io::Result<usize> {
        SerialPort::bytes_to_read(self)
            .map(|n| n as usize)
            .map_err(io::Error::from)
    }
}

/// Opens OS serial ports through `tokio-serial`
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialOpener;

impl SerialOpener {
    /// Translate a [`LinkConfig`] into driver settings
    ///
    /// Mark/space parity, 1.5 stop bits and combined RTS + XON/XOFF flow
    /// control are not available through the driver and are rejected here.
    pub fn builder(config: &LinkConfig) -> Result<serialport::SerialPortBuilder, ExchangeError> {
        let data_bits = match config.data_bits {
            5 => serialport::DataBits::Five,
            6 => serialport::DataBits::Six,
            7 => serialport::DataBits::Seven,
            8 => serialport::DataBits::Eight,
            other => return Err(ExchangeError::invalid(ConfigField::DataBits, other)),
        };
        let parity = match config.parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
            unsupported => return Err(ExchangeError::invalid(ConfigField::Parity, unsupported)),
        };
        let stop_bits = match config.stop_bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
            unsupported => return Err(ExchangeError::invalid(ConfigField::StopBits, unsupported)),
        };
        let flow_control = match config.handshake {
            Handshake::None => serialport::FlowControl::None,
            Handshake::XOnXOff => serialport::FlowControl::Software,
            Handshake::RequestToSend => serialport::FlowControl::Hardware,
            unsupported => return Err(ExchangeError::invalid(ConfigField::Handshake, unsupported)),
        };

        Ok(serialport::new(config.port_name.as_str(), config.baud_rate)
            .data_bits(data_bits)
            .parity(parity)
            .stop_bits(stop_bits)
            .flow_control(flow_control))
    }
}

/// Map a driver open failure onto the exchange taxonomy
pub(crate) fn open_error(port: &str, e: serialport::Error) -> ExchangeError {
    match e.kind() {
        serialport::ErrorKind::NoDevice | serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => {
            ExchangeError::AccessDenied {
                port: port.to_string(),
                detail: e.description,
            }
        }
        _ => ExchangeError::Io(e.into()),
    }
}

impl LinkOpener for SerialOpener {
    fn open(&self, config: &LinkConfig) -> Result<Box<dyn Link>, ExchangeError> {
        let stream = Self::builder(config)?
            .open_native_async()
            .map_err(|e| open_error(&config.port_name, e))?;
        Ok(Box::new(stream))
    }
}
