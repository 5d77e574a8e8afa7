//! Scripted serial link for integration tests

#![allow(dead_code)]

use instrulink_core::protocol::{ExchangeError, Link, LinkConfig, LinkOpener, PortEnumerator};
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

pub const PORT: &str = "/dev/ttyMOCK0";

/// Observable step of an exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Open,
    Discard,
    Write(Vec<u8>),
    ReadWait,
    Release,
}

/// How the mock device answers a written command line
#[derive(Debug, Clone)]
pub enum Script {
    /// Never answer
    Silent,
    /// Queue these bytes as soon as the line is written
    Reply(Vec<u8>),
    /// Queue these bytes after a delay
    DelayedReply(Duration, Vec<u8>),
    /// Report end of stream on read
    Eof,
    /// Fail the write
    WriteError,
}

#[derive(Default)]
struct State {
    incoming: VecDeque<u8>,
    eof: bool,
    waker: Option<Waker>,
    waiting: bool,
    events: Vec<Event>,
}

/// Device side shared by the opener and every link it opens
#[derive(Clone)]
pub struct MockDevice {
    state: Arc<Mutex<State>>,
    script: Arc<Mutex<Script>>,
}

impl MockDevice {
    pub fn new(script: Script) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            script: Arc::new(Mutex::new(script)),
        }
    }

    /// Put bytes on the wire as if the device had sent them
    pub fn push(&self, bytes: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state.incoming.extend(bytes.iter().copied());
        if let Some(waker) = state.waker.take() {
            waker.wake();
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }

    pub fn written(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Write(bytes) => Some(bytes),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn record(&self, event: Event) {
        self.state.lock().unwrap().events.push(event);
    }
}

pub struct MockLink {
    device: MockDevice,
}

impl Drop for MockLink {
    fn drop(&mut self) {
        self.device.record(Event::Release);
    }
}

impl AsyncRead for MockLink {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let mut state = self.device.state.lock().unwrap();
        if !state.waiting {
            state.waiting = true;
            state.events.push(Event::ReadWait);
        }
        if state.incoming.is_empty() {
            if state.eof {
                return Poll::Ready(Ok(()));
            }
            state.waker = Some(cx.waker().clone());
            return Poll::Pending;
        }
        let n = buf.remaining().min(state.incoming.len());
        let chunk: Vec<u8> = state.incoming.drain(..n).collect();
        buf.put_slice(&chunk);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockLink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let script = self.device.script.lock().unwrap().clone();
        if let Script::WriteError = script {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "cable unplugged")));
        }
        self.device.record(Event::Write(buf.to_vec()));
        match script {
            Script::Reply(bytes) => self.device.push(&bytes),
            Script::DelayedReply(delay, bytes) => {
                let device = self.device.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    device.push(&bytes);
                });
            }
            Script::Eof => self.device.state.lock().unwrap().eof = true,
            Script::Silent | Script::WriteError => {}
        }
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl Link for MockLink {
    fn discard_input(&mut self) -> io::Result<()> {
        let mut state = self.device.state.lock().unwrap();
        state.incoming.clear();
        state.events.push(Event::Discard);
        Ok(())
    }

    fn bytes_to_read(&mut self) -> io::Result<usize> {
        Ok(self.device.state.lock().unwrap().incoming.len())
    }
}

/// Opener handing out [`MockLink`]s on one [`MockDevice`]
pub struct MockOpener {
    pub device: MockDevice,
    pub fail_with: Mutex<Option<ExchangeError>>,
}

impl MockOpener {
    pub fn new(device: MockDevice) -> Self {
        Self {
            device,
            fail_with: Mutex::new(None),
        }
    }

    pub fn failing(device: MockDevice, error: ExchangeError) -> Self {
        Self {
            device,
            fail_with: Mutex::new(Some(error)),
        }
    }
}

impl LinkOpener for MockOpener {
    fn open(&self, _config: &LinkConfig) -> Result<Box<dyn Link>, ExchangeError> {
        if let Some(err) = self.fail_with.lock().unwrap().take() {
            return Err(err);
        }
        self.device.record(Event::Open);
        Ok(Box::new(MockLink {
            device: self.device.clone(),
        }))
    }
}

pub struct MockPorts(pub Vec<String>);

impl MockPorts {
    pub fn single() -> Self {
        Self(vec![PORT.to_string()])
    }
}

impl PortEnumerator for MockPorts {
    fn port_names(&self) -> Vec<String> {
        self.0.clone()
    }
}

pub fn config() -> LinkConfig {
    LinkConfig::new(PORT, 9600)
}
