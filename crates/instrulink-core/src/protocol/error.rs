//! Exchange errors

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Link configuration field that failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigField {
    /// Port identifier
    PortName,
    /// Baud rate
    BaudRate,
    /// Data bits per character
    DataBits,
    /// Parity code
    Parity,
    /// Stop-bits code
    StopBits,
    /// Handshake code
    Handshake,
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfigField::PortName => "port name",
            ConfigField::BaudRate => "baud rate",
            ConfigField::DataBits => "data bits",
            ConfigField::Parity => "parity value",
            ConfigField::StopBits => "stop bits value",
            ConfigField::Handshake => "handshake value",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during a serial exchange
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// A configuration field failed validation or cannot be applied
    #[error("Invalid {field}: {value}")]
    InvalidConfig {
        /// Offending field
        field: ConfigField,
        /// Rejected value as given
        value: String,
    },

    /// The port exists but could not be opened
    #[error("Access to port {port} is denied: {detail}")]
    AccessDenied {
        /// Port identifier
        port: String,
        /// Driver message
        detail: String,
    },

    /// No reply byte arrived before the deadline
    #[error("Timeout while reading from port {port} after {}ms", .timeout.as_millis())]
    Timeout {
        /// Port identifier
        port: String,
        /// Deadline that elapsed
        timeout: Duration,
    },

    /// The caller or the session cancelled the exchange
    #[error("Read from port {port} was cancelled")]
    Cancelled {
        /// Port identifier
        port: String,
    },

    /// Transport failure while writing or reading
    #[error("Failed to read from the serial port: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse failure classification, stable for hosts and serialized output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// See [`ExchangeError::InvalidConfig`]
    InvalidConfig,
    /// See [`ExchangeError::AccessDenied`]
    AccessDenied,
    /// See [`ExchangeError::Timeout`]
    Timeout,
    /// See [`ExchangeError::Cancelled`]
    Cancelled,
    /// See [`ExchangeError::Io`]
    Io,
}

impl ExchangeError {
    pub(crate) fn invalid(field: ConfigField, value: impl fmt::Display) -> Self {
        ExchangeError::InvalidConfig {
            field,
            value: value.to_string(),
        }
    }

    /// Failure kind of this error
    pub fn kind(&self) -> FailureKind {
        match self {
            ExchangeError::InvalidConfig { .. } => FailureKind::InvalidConfig,
            ExchangeError::AccessDenied { .. } => FailureKind::AccessDenied,
            ExchangeError::Timeout { .. } => FailureKind::Timeout,
            ExchangeError::Cancelled { .. } => FailureKind::Cancelled,
            ExchangeError::Io(_) => FailureKind::Io,
        }
    }

    /// Field that failed validation, if this is a configuration error
    pub fn field(&self) -> Option<ConfigField> {
        match self {
            ExchangeError::InvalidConfig { field, .. } => Some(*field),
            _ => None,
        }
    }
}
