//! Link lifecycle
//!
//! A [`Link`] is an open byte channel to the instrument. [`LinkLifecycle`]
//! owns at most one of them for the duration of an exchange and releases it
//! exactly once, either through [`LinkLifecycle::close`] or when the
//! lifecycle is dropped on an error, cancellation or panic path.

use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

use super::{ExchangeError, LinkConfig};

/// An open connection to an instrument
pub trait Link: AsyncRead + AsyncWrite + Unpin + Send {
    /// Drop every byte received but not yet read
    fn discard_input(&mut self) -> io::Result<()>;

    /// Number of bytes queued on the device and readable without waiting
    fn bytes_to_read(&mut self) -> io::Result<usize>;
}

/// Factory for [`Link`]s
pub trait LinkOpener: Send + Sync {
    /// Open a link with the given (already validated) configuration
    ///
    /// Permission and device-busy failures must be reported as
    /// [`ExchangeError::AccessDenied`].
    fn open(&self, config: &LinkConfig) -> Result<Box<dyn Link>, ExchangeError>;
}

/// Scoped owner of a single link
pub struct LinkLifecycle {
    opener: Arc<dyn LinkOpener>,
    config: LinkConfig,
    link: Option<Box<dyn Link>>,
}

impl LinkLifecycle {
    /// Create a closed lifecycle for `config`
    pub fn new(opener: Arc<dyn LinkOpener>, config: LinkConfig) -> Self {
        Self {
            opener,
            config,
            link: None,
        }
    }

    /// Whether the link is currently open
    pub fn is_open(&self) -> bool {
        self.link.is_some()
    }

    /// Open the link; a no-op if it is already open
    pub fn open(&mut self) -> Result<&mut dyn Link, ExchangeError> {
        if self.link.is_none() {
            tracing::debug!(port = %self.config.port_name, "opening link");
            self.link = Some(self.opener.open(&self.config)?);
        }
        self.link_mut()
    }

    /// The open link
    pub fn link_mut(&mut self) -> Result<&mut dyn Link, ExchangeError> {
        match self.link.as_deref_mut() {
            Some(link) => Ok(link),
            None => Err(ExchangeError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                format!("link to {} is not open", self.config.port_name),
            ))),
        }
    }

    /// Close and release the link; later calls do nothing
    pub fn close(&mut self) {
        if let Some(link) = self.link.take() {
            drop(link);
            tracing::debug!(port = %self.config.port_name, "link released");
        }
    }
}

impl Drop for LinkLifecycle {
    fn drop(&mut self) {
        self.close();
    }
}
