//! Exchange profiles
//!
//! A profile stores the link settings, timeout and command of an exchange
//! as pretty-printed JSON so it can be replayed later.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

use crate::protocol::{LinkConfig, DEFAULT_TIMEOUT_SECS};

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Saved exchange configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeProfile {
    /// Link settings
    #[serde(default)]
    pub link: LinkConfig,
    /// Read timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Command to send; `None` sends an empty line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl Default for ExchangeProfile {
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            command: None,
        }
    }
}

impl ExchangeProfile {
    /// Load a profile from a JSON file
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a profile from JSON text
    pub fn from_json(content: &str) -> io::Result<Self> {
        serde_json::from_str(content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Save the profile as pretty JSON, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, json)
    }
}
