//! Response classification

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ACK, NAK};

/// Classified instrument reply
///
/// Each variant carries the decoded response with surrounding whitespace
/// and line terminators trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Reply {
    /// The instrument acknowledged the command (ACK present)
    Acknowledged(String),
    /// The instrument rejected the command (NAK present, no ACK)
    Rejected(String),
    /// Neither control byte was present
    Unclassified(String),
}

impl Reply {
    /// Trimmed response text
    pub fn text(&self) -> &str {
        match self {
            Reply::Acknowledged(text) | Reply::Rejected(text) | Reply::Unclassified(text) => text,
        }
    }

    /// Whether the instrument acknowledged the command
    pub fn is_acknowledged(&self) -> bool {
        matches!(self, Reply::Acknowledged(_))
    }

    /// Whether the instrument rejected the command
    pub fn is_rejected(&self) -> bool {
        matches!(self, Reply::Rejected(_))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Acknowledged(text) => {
                write!(f, "Command successfully completed\nReceived response: {text}")
            }
            Reply::Rejected(text) => {
                write!(f, "Error: Invalid command string\nReceived response: {text}")
            }
            Reply::Unclassified(text) => write!(f, "Received response: {text}"),
        }
    }
}

/// Decode bytes as ASCII, replacing anything above 0x7F with `?`
pub fn decode_ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .collect()
}

/// Classify a raw response; ACK takes precedence over NAK
pub fn classify(bytes: &[u8]) -> Reply {
    let text = decode_ascii(bytes);
    let trimmed = text.trim().to_string();

    if bytes.contains(&ACK) {
        Reply::Acknowledged(trimmed)
    } else if bytes.contains(&NAK) {
        Reply::Rejected(trimmed)
    } else {
        Reply::Unclassified(trimmed)
    }
}
