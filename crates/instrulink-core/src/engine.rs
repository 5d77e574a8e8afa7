//! Exchange engine
//!
//! Ties the pieces of one exchange together: validate the configuration,
//! open the link, run the bounded exchange, release the link, classify the
//! reply. Every outcome is reported to the diagnostics sink exactly once.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::demo::{DemoOpener, DemoPorts};
use crate::diagnostics::{DiagnosticsSink, TracingSink};
use crate::protocol::{
    bounded_exchange, classify, validate::validate_config, ExchangeError, LinkConfig,
    LinkLifecycle, LinkOpener, PortEnumerator, Reply, SerialOpener, SystemPorts,
    DEFAULT_TIMEOUT_SECS,
};

/// Everything needed for one exchange
#[derive(Debug, Clone)]
pub struct ExchangeRequest {
    /// Link configuration
    pub config: LinkConfig,
    /// Command text, sent followed by CR LF (may be empty)
    pub command: String,
    /// Upper bound on the wait for the first reply byte
    pub timeout: Duration,
    /// Caller cancellation; ends the wait early when fired
    pub cancel: CancellationToken,
}

impl ExchangeRequest {
    /// Request with a fresh, never-fired cancellation token
    pub fn new(config: LinkConfig, command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            config,
            command: command.into(),
            timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// Use `cancel` as the caller's cancellation signal
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl Default for ExchangeRequest {
    fn default() -> Self {
        Self::new(
            LinkConfig::default(),
            String::new(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }
}

/// Single-exchange engine
///
/// Holds no per-call state. Callers sharing one physical port must
/// serialize their calls (see [`crate::session::ExchangeSession`]).
#[derive(Clone)]
pub struct ExchangeEngine {
    opener: Arc<dyn LinkOpener>,
    ports: Arc<dyn PortEnumerator>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl ExchangeEngine {
    /// Engine over custom collaborators, reporting through [`TracingSink`]
    pub fn new(opener: Arc<dyn LinkOpener>, ports: Arc<dyn PortEnumerator>) -> Self {
        Self {
            opener,
            ports,
            diagnostics: Arc::new(TracingSink),
        }
    }

    /// Engine over the operating system's serial ports
    pub fn serial() -> Self {
        Self::new(Arc::new(SerialOpener), Arc::new(SystemPorts))
    }

    /// Engine over the simulated instrument
    pub fn demo() -> Self {
        Self::new(Arc::new(DemoOpener), Arc::new(DemoPorts))
    }

    /// Replace the diagnostics sink
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Sink receiving this engine's diagnostics
    pub fn diagnostics(&self) -> &dyn DiagnosticsSink {
        self.diagnostics.as_ref()
    }

    /// Port enumerator used for validation
    pub fn ports(&self) -> &dyn PortEnumerator {
        self.ports.as_ref()
    }

    /// Perform one exchange
    pub async fn perform_exchange(&self, request: ExchangeRequest) -> Result<Reply, ExchangeError> {
        let span = tracing::info_span!(
            "exchange",
            id = %Uuid::new_v4(),
            port = %request.config.port_name
        );

        async {
            match self.run(&request).await {
                Ok(reply) => {
                    if reply.is_rejected() {
                        self.diagnostics.log_error(&reply.to_string());
                    } else {
                        self.diagnostics.log_information(&reply.to_string());
                    }
                    Ok(reply)
                }
                Err(e) => {
                    self.diagnostics.log_error(&e.to_string());
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(&self, request: &ExchangeRequest) -> Result<Reply, ExchangeError> {
        validate_config(&request.config, self.ports.as_ref())?;

        let mut lifecycle = LinkLifecycle::new(self.opener.clone(), request.config.clone());
        let link = lifecycle.open()?;
        let received = bounded_exchange(
            link,
            &request.config.port_name,
            &request.command,
            request.timeout,
            &request.cancel,
        )
        .await;
        lifecycle.close();

        Ok(classify(&received?))
    }
}
