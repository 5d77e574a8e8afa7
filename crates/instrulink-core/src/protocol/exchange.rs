//! Bounded command/response exchange
//!
//! One exchange is: discard stale input, write the command line, then wait
//! for the first reply byte while racing a timeout and the caller's
//! cancellation token. Once a byte arrives everything the device has
//! already queued is drained into the same buffer.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use super::{ExchangeError, Link, LINE_TERMINATOR};

/// Frame `command` as a line on the wire
pub fn command_line(command: &str) -> Vec<u8> {
    let mut line = Vec::with_capacity(command.len() + LINE_TERMINATOR.len());
    line.extend_from_slice(command.as_bytes());
    line.extend_from_slice(LINE_TERMINATOR.as_bytes());
    line
}

/// Run one bounded exchange on an open link
///
/// Only the read is bounded by `timeout`; the write is awaited to
/// completion first. When the read wins the race, an empty result (end of
/// stream) is returned as-is. The pending read is dropped before this
/// function returns on every path.
pub async fn bounded_exchange(
    link: &mut dyn Link,
    port: &str,
    command: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, ExchangeError> {
    link.discard_input()?;

    let line = command_line(command);
    link.write_all(&line).await?;
    link.flush().await?;
    tracing::debug!(bytes = line.len(), "command written");

    let mut first = [0u8; 1];
    let deadline = tokio::time::sleep(timeout);

    // A deadline that expired together with the token still counts as a timeout
    let n = tokio::select! {
        biased;
        read = link.read(&mut first) => read?,
        _ = deadline => {
            return Err(ExchangeError::Timeout {
                port: port.to_string(),
                timeout,
            });
        }
        _ = cancel.cancelled() => {
            return Err(ExchangeError::Cancelled {
                port: port.to_string(),
            });
        }
    };

    let mut response = first[..n].to_vec();
    if n > 0 {
        let queued = link.bytes_to_read()?;
        if queued > 0 {
            let mut rest = vec![0u8; queued];
            let got = link.read(&mut rest).await?;
            response.extend_from_slice(&rest[..got]);
        }
    }

    tracing::debug!(bytes = response.len(), "response received");
    Ok(response)
}
