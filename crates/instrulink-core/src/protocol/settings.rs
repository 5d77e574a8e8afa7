//! Link configuration
//!
//! The enums keep the numeric codes instruments and older host software
//! use for these settings, so raw values from configuration files or
//! foreign callers can be checked with `TryFrom<u8>`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{ConfigField, ExchangeError, DEFAULT_BAUD_RATE};

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    /// No parity bit
    #[default]
    None = 0,
    /// Odd parity
    Odd = 1,
    /// Even parity
    Even = 2,
    /// Parity bit always set
    Mark = 3,
    /// Parity bit always clear
    Space = 4,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopBits {
    /// One stop bit
    #[default]
    One = 1,
    /// Two stop bits
    Two = 2,
    /// One and a half stop bits
    OnePointFive = 3,
}

/// Flow-control scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handshake {
    /// No flow control
    #[default]
    None = 0,
    /// Software (XON/XOFF) flow control
    XOnXOff = 1,
    /// Hardware (RTS/CTS) flow control
    RequestToSend = 2,
    /// Hardware and software flow control together
    RequestToSendXOnXOff = 3,
}

impl Parity {
    /// Numeric code of this parity mode
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl StopBits {
    /// Numeric code of this stop-bit setting
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl Handshake {
    /// Numeric code of this handshake
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Parity {
    type Error = ExchangeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Parity::None),
            1 => Ok(Parity::Odd),
            2 => Ok(Parity::Even),
            3 => Ok(Parity::Mark),
            4 => Ok(Parity::Space),
            other => Err(ExchangeError::invalid(ConfigField::Parity, other)),
        }
    }
}

impl TryFrom<u8> for StopBits {
    type Error = ExchangeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(StopBits::One),
            2 => Ok(StopBits::Two),
            3 => Ok(StopBits::OnePointFive),
            other => Err(ExchangeError::invalid(ConfigField::StopBits, other)),
        }
    }
}

impl TryFrom<u8> for Handshake {
    type Error = ExchangeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Handshake::None),
            1 => Ok(Handshake::XOnXOff),
            2 => Ok(Handshake::RequestToSend),
            3 => Ok(Handshake::RequestToSendXOnXOff),
            other => Err(ExchangeError::invalid(ConfigField::Handshake, other)),
        }
    }
}

/// Normalize a user-supplied name: lowercase, separators dropped
fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' ' | '.'))
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for Parity {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "none" | "n" => Ok(Parity::None),
            "odd" | "o" => Ok(Parity::Odd),
            "even" | "e" => Ok(Parity::Even),
            "mark" | "m" => Ok(Parity::Mark),
            "space" | "s" => Ok(Parity::Space),
            _ => Err(ExchangeError::invalid(ConfigField::Parity, s)),
        }
    }
}

impl FromStr for StopBits {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "one" | "1" => Ok(StopBits::One),
            "two" | "2" => Ok(StopBits::Two),
            "onepointfive" | "15" => Ok(StopBits::OnePointFive),
            _ => Err(ExchangeError::invalid(ConfigField::StopBits, s)),
        }
    }
}

impl FromStr for Handshake {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "none" => Ok(Handshake::None),
            "xonxoff" | "software" => Ok(Handshake::XOnXOff),
            "requesttosend" | "rts" | "hardware" => Ok(Handshake::RequestToSend),
            "requesttosendxonxoff" | "rtsxonxoff" => Ok(Handshake::RequestToSendXOnXOff),
            _ => Err(ExchangeError::invalid(ConfigField::Handshake, s)),
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Parity::None => "none",
            Parity::Odd => "odd",
            Parity::Even => "even",
            Parity::Mark => "mark",
            Parity::Space => "space",
        };
        f.write_str(s)
    }
}

impl fmt::Display for StopBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopBits::One => "one",
            StopBits::Two => "two",
            StopBits::OnePointFive => "one_point_five",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Handshake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Handshake::None => "none",
            Handshake::XOnXOff => "x_on_x_off",
            Handshake::RequestToSend => "request_to_send",
            Handshake::RequestToSendXOnXOff => "request_to_send_x_on_x_off",
        };
        f.write_str(s)
    }
}

/// Serial link configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Parity mode
    pub parity: Parity,
    /// Data bits per character (5-8)
    pub data_bits: u8,
    /// Stop bits
    pub stop_bits: StopBits,
    /// Flow control
    pub handshake: Handshake,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            parity: Parity::None,
            data_bits: 8,
            stop_bits: StopBits::One,
            handshake: Handshake::None,
        }
    }
}

impl LinkConfig {
    /// 8N1 configuration without flow control
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            ..Self::default()
        }
    }
}

impl fmt::Display for LinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} baud, {} data bits, parity {}, stop bits {}, handshake {}",
            self.port_name, self.baud_rate, self.data_bits, self.parity, self.stop_bits, self.handshake
        )
    }
}
