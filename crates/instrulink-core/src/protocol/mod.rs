//! Serial Exchange Protocol
//!
//! Implements the single request/bounded-reply cycle used by ACK/NAK
//! instruments: an ASCII command line terminated by CR LF, answered by
//! whatever bytes the device has queued when the bounded wait completes.

mod error;
pub mod exchange;
pub mod link;
pub mod response;
pub mod serial;
pub mod settings;
pub mod validate;

pub use error::{ConfigField, ExchangeError, FailureKind};
pub use exchange::bounded_exchange;
pub use link::{Link, LinkLifecycle, LinkOpener};
pub use response::{classify, Reply};
pub use serial::{list_ports, PortEnumerator, PortInfo, SerialOpener, SystemPorts};
pub use settings::{Handshake, LinkConfig, Parity, StopBits};

/// Line terminator appended to every command
pub const LINE_TERMINATOR: &str = "\r\n";

/// Acknowledge control byte
pub const ACK: u8 = 0x06;

/// Negative-acknowledge control byte
pub const NAK: u8 = 0x15;

/// Highest baud rate accepted by the validator
pub const MAX_BAUD_RATE: u32 = 115200;

/// Default baud rate for new link configurations
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default bounded-read timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
