//! Demo Mode - Simulated ACK/NAK instrument
//!
//! Lets the engine and hosts run end to end without hardware. The simulated
//! instrument answers after a random 20-80 ms latency:
//!
//! - `ID?` / `*IDN?` -> ACK + identity string
//! - `PING` -> ACK + `PONG`
//! - empty command -> no reply at all
//! - anything else -> NAK + `ERR`

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll, Waker};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::Sleep;

use crate::protocol::{
    ExchangeError, Link, LinkConfig, LinkOpener, PortEnumerator, ACK, LINE_TERMINATOR, NAK,
};

/// Port name under which the demo instrument is enumerated
pub const DEMO_PORT: &str = "DEMO";

/// Identity reported for `ID?`
pub const DEMO_IDENTITY: &str = "INSTRULINK,DEMO-1,0001,1.0";

/// Simulated instrument speaking the line/ACK/NAK protocol
pub struct DemoInstrument {
    /// Bytes of a command line not yet terminated
    inbound: Vec<u8>,
    /// Reply bytes, readable once `latency` has elapsed
    outbound: VecDeque<u8>,
    /// Remaining reply latency
    latency: Option<Pin<Box<Sleep>>>,
    /// Reader parked on an empty queue
    read_waker: Option<Waker>,
    rng: StdRng,
}

impl Default for DemoInstrument {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoInstrument {
    /// Create a demo instrument with random latency
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create a demo instrument with reproducible latency
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            inbound: Vec::new(),
            outbound: VecDeque::new(),
            latency: None,
            read_waker: None,
            rng,
        }
    }

    /// Reply the instrument gives to `command`, if any
    pub fn respond(command: &str) -> Option<Vec<u8>> {
        let reply = |control: u8, text: &str| {
            let mut bytes = vec![control];
            bytes.extend_from_slice(text.as_bytes());
            bytes.extend_from_slice(LINE_TERMINATOR.as_bytes());
            bytes
        };

        match command.trim().to_ascii_uppercase().as_str() {
            "" => None,
            "ID?" | "*IDN?" => Some(reply(ACK, DEMO_IDENTITY)),
            "PING" => Some(reply(ACK, "PONG")),
            _ => Some(reply(NAK, "ERR")),
        }
    }

    fn accept(&mut self, data: &[u8]) {
        for &byte in data {
            if byte != b'\n' {
                self.inbound.push(byte);
                continue;
            }

            let line = String::from_utf8_lossy(&self.inbound).into_owned();
            self.inbound.clear();
            tracing::debug!(command = %line.trim_end(), "demo instrument received command");

            if let Some(reply) = Self::respond(&line) {
                let delay = Duration::from_millis(self.rng.gen_range(20..=80));
                self.outbound.extend(reply);
                self.latency = Some(Box::pin(tokio::time::sleep(delay)));
                if let Some(waker) = self.read_waker.take() {
                    waker.wake();
                }
            }
        }
    }

    fn reply_visible(&self) -> bool {
        self.latency.as_ref().map_or(true, |sleep| sleep.is_elapsed())
    }
}

impl AsyncRead for DemoInstrument {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if let Some(sleep) = this.latency.as_mut() {
            ready!(sleep.as_mut().poll(cx));
            this.latency = None;
        }

        if this.outbound.is_empty() {
            this.read_waker = Some(cx.waker().clone());
            return Poll::Pending;
        }

        let n = buf.remaining().min(this.outbound.len());
        let chunk: Vec<u8> = this.outbound.drain(..n).collect();
        buf.put_slice(&chunk);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for DemoInstrument {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.get_mut().accept(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl Link for DemoInstrument {
    fn discard_input(&mut self) -> io::Result<()> {
        self.outbound.clear();
        self.latency = None;
        Ok(())
    }

    fn bytes_to_read(&mut self) -> io::Result<usize> {
        Ok(if self.reply_visible() {
            self.outbound.len()
        } else {
            0
        })
    }
}

/// Opens a fresh [`DemoInstrument`] for any configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoOpener;

impl LinkOpener for DemoOpener {
    fn open(&self, _config: &LinkConfig) -> Result<Box<dyn Link>, ExchangeError> {
        Ok(Box::new(DemoInstrument::new()))
    }
}

/// Enumerates only [`DEMO_PORT`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoPorts;

impl PortEnumerator for DemoPorts {
    fn port_names(&self) -> Vec<String> {
        vec![DEMO_PORT.to_string()]
    }
}
