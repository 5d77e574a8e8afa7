//! # Instrulink Core Library
//!
//! Single command/response exchanges with instruments attached over a
//! serial link.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Validation of serial link parameters before any port is touched
//! - Scoped link lifecycle (open, discard stale input, guaranteed release)
//! - A bounded read that races incoming data against a timeout and an
//!   external cancellation signal
//! - ACK/NAK classification of instrument replies
//! - A locking session wrapper, persisted exchange profiles and a
//!   simulated instrument for hardware-free runs
//!
//! ## Example
//!
//! ```rust,ignore
//! use instrulink_core::prelude::*;
//!
//! let session = ExchangeSession::new(ExchangeEngine::serial());
//! let config = LinkConfig::new("/dev/ttyUSB0", 9600);
//!
//! match session.perform_exchange(config, 2, Some("ID?")).await? {
//!     Reply::Acknowledged(text) => println!("instrument says {text}"),
//!     other => println!("{other}"),
//! }
//! ```

pub mod demo;
pub mod diagnostics;
pub mod engine;
pub mod profile;
pub mod protocol;
pub mod session;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::diagnostics::{DiagnosticsSink, NullSink, RecordingSink, TracingSink};
    pub use crate::engine::{ExchangeEngine, ExchangeRequest};
    pub use crate::profile::ExchangeProfile;
    pub use crate::protocol::{
        ConfigField, ExchangeError, FailureKind, Handshake, LinkConfig, Parity, Reply, StopBits,
    };
    pub use crate::session::ExchangeSession;
    pub use tokio_util::sync::CancellationToken;
}
