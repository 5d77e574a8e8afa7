//! Serialized exchange session
//!
//! Wraps an [`ExchangeEngine`] for hosts where several tasks may talk to the
//! same physical port. The lock is held around the whole
//! open -> exchange -> close sequence.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::engine::{ExchangeEngine, ExchangeRequest};
use crate::profile::ExchangeProfile;
use crate::protocol::{ExchangeError, LinkConfig, Reply};

/// Engine plus a port lock and a session-wide cancellation token
pub struct ExchangeSession {
    engine: ExchangeEngine,
    lock: Mutex<()>,
    shutdown: CancellationToken,
}

impl ExchangeSession {
    /// Create a session around `engine`
    pub fn new(engine: ExchangeEngine) -> Self {
        Self {
            engine,
            lock: Mutex::new(()),
            shutdown: CancellationToken::new(),
        }
    }

    /// The wrapped engine
    pub fn engine(&self) -> &ExchangeEngine {
        &self.engine
    }

    /// Perform one exchange, waiting for any exchange already in progress
    ///
    /// `command: None` sends an empty line.
    pub async fn perform_exchange(
        &self,
        config: LinkConfig,
        timeout_secs: u64,
        command: Option<&str>,
    ) -> Result<Reply, ExchangeError> {
        let request = ExchangeRequest::new(
            config,
            command.unwrap_or_default(),
            Duration::from_secs(timeout_secs),
        );
        self.perform(request).await
    }

    /// Perform the exchange a profile describes
    pub async fn perform_profile(&self, profile: &ExchangeProfile) -> Result<Reply, ExchangeError> {
        self.perform_exchange(
            profile.link.clone(),
            profile.timeout_secs,
            profile.command.as_deref(),
        )
        .await
    }

    /// Perform a prepared request
    ///
    /// The request's own token stays effective; session shutdown also
    /// cancels it.
    ///
    /// Nothing is opened or written once either token has fired, including
    /// while waiting for the port lock.
    pub async fn perform(&self, request: ExchangeRequest) -> Result<Reply, ExchangeError> {
        let caller = request.cancel.clone();
        let linked = self.shutdown.child_token();
        let port = request.config.port_name.clone();

        let guard = tokio::select! {
            biased;
            _ = linked.cancelled() => None,
            _ = caller.cancelled() => None,
            guard = self.lock.lock() => Some(guard),
        };
        let _guard = match guard {
            Some(guard) if !linked.is_cancelled() && !caller.is_cancelled() => guard,
            _ => {
                let err = ExchangeError::Cancelled { port };
                self.engine.diagnostics().log_error(&err.to_string());
                return Err(err);
            }
        };

        let exchange = self
            .engine
            .perform_exchange(request.with_cancel(linked.clone()));
        tokio::pin!(exchange);

        tokio::select! {
            result = &mut exchange => return result,
            _ = caller.cancelled() => linked.cancel(),
        }
        exchange.await
    }

    /// Cancel every in-flight and future exchange of this session
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Whether [`shutdown`](Self::shutdown) was called
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
