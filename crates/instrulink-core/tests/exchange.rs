//! End-to-end exchange behaviour against a scripted device

mod common;

use common::{config, Event, MockDevice, MockOpener, MockPorts, Script, PORT};
use instrulink_core::diagnostics::{DiagnosticLevel, RecordingSink};
use instrulink_core::engine::{ExchangeEngine, ExchangeRequest};
use instrulink_core::protocol::{
    ConfigField, ExchangeError, FailureKind, LinkLifecycle, LinkOpener, Reply,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

fn engine(opener: MockOpener) -> (ExchangeEngine, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let engine = ExchangeEngine::new(Arc::new(opener), Arc::new(MockPorts::single()))
        .with_diagnostics(sink.clone());
    (engine, sink)
}

fn request(command: &str, timeout: Duration) -> ExchangeRequest {
    ExchangeRequest::new(config(), command, timeout)
}

#[tokio::test(start_paused = true)]
async fn test_ack_reply_is_acknowledged() {
    let device = MockDevice::new(Script::Reply(b"\x06OK\r\n".to_vec()));
    let (engine, sink) = engine(MockOpener::new(device.clone()));

    let reply = engine
        .perform_exchange(request("ID?", Duration::from_secs(2)))
        .await
        .unwrap();

    assert!(reply.is_acknowledged());
    assert!(reply.text().contains("OK"));
    assert_eq!(device.written(), b"ID?\r\n".to_vec());
    assert_eq!(device.count(&Event::Release), 1);

    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].level, DiagnosticLevel::Information);
    assert!(entries[0].message.starts_with("Command successfully completed"));
}

#[tokio::test(start_paused = true)]
async fn test_nak_reply_is_rejected() {
    let device = MockDevice::new(Script::Reply(b"\x15ERR".to_vec()));
    let (engine, sink) = engine(MockOpener::new(device.clone()));

    let reply = engine
        .perform_exchange(request("ID?", Duration::from_secs(2)))
        .await
        .unwrap();

    assert!(reply.is_rejected());
    assert!(reply.text().contains("ERR"));
    assert_eq!(sink.count(DiagnosticLevel::Error), 1);
    assert_eq!(device.count(&Event::Release), 1);
}

#[tokio::test(start_paused = true)]
async fn test_whole_reply_drained_after_first_byte() {
    let device = MockDevice::new(Script::DelayedReply(
        Duration::from_millis(150),
        b"\x06+23.50E+00\r\n".to_vec(),
    ));
    let (engine, _sink) = engine(MockOpener::new(device.clone()));

    let reply = engine
        .perform_exchange(request("MEAS?", Duration::from_secs(2)))
        .await
        .unwrap();

    assert_eq!(reply, Reply::Acknowledged("\u{6}+23.50E+00".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_silent_device_times_out_and_releases() {
    let device = MockDevice::new(Script::Silent);
    let (engine, sink) = engine(MockOpener::new(device.clone()));
    let start = Instant::now();

    let err = engine
        .perform_exchange(request("ID?", Duration::from_secs(2)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Timeout);
    assert_eq!(start.elapsed(), Duration::from_secs(2));
    assert_eq!(device.count(&Event::Release), 1);
    assert_eq!(sink.count(DiagnosticLevel::Error), 1);
    assert!(sink.entries()[0].message.contains(PORT));
}

#[tokio::test(start_paused = true)]
async fn test_reply_after_timeout_is_ignored() {
    let device = MockDevice::new(Script::DelayedReply(
        Duration::from_secs(3),
        b"\x06late".to_vec(),
    ));
    let (engine, _sink) = engine(MockOpener::new(device.clone()));

    let err = engine
        .perform_exchange(request("ID?", Duration::from_secs(2)))
        .await
        .unwrap_err();

    assert!(matches!(err, ExchangeError::Timeout { .. }));
}

#[tokio::test]
async fn test_zero_baud_fails_before_open() {
    let device = MockDevice::new(Script::Reply(b"\x06OK".to_vec()));
    let (engine, sink) = engine(MockOpener::new(device.clone()));

    let mut bad = config();
    bad.baud_rate = 0;
    let err = engine
        .perform_exchange(ExchangeRequest::new(bad, "ID?", Duration::from_secs(2)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::InvalidConfig);
    assert_eq!(err.field(), Some(ConfigField::BaudRate));
    assert!(device.events().is_empty(), "no link may be opened or written");
    assert_eq!(sink.entries().len(), 1);
}

#[tokio::test]
async fn test_unknown_port_fails_before_open() {
    let device = MockDevice::new(Script::Silent);
    let (engine, _sink) = engine(MockOpener::new(device.clone()));

    let mut bad = config();
    bad.port_name = "/dev/ttyMOCK9".to_string();
    bad.data_bits = 4;
    let err = engine
        .perform_exchange(ExchangeRequest::new(bad, "ID?", Duration::from_secs(2)))
        .await
        .unwrap_err();

    assert_eq!(err.field(), Some(ConfigField::PortName));
    assert!(device.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_external_cancel_unblocks_read() {
    let device = MockDevice::new(Script::Silent);
    let (engine, sink) = engine(MockOpener::new(device.clone()));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let err = engine
        .perform_exchange(request("ID?", Duration::from_secs(5)).with_cancel(cancel))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Cancelled);
    assert_eq!(start.elapsed(), Duration::from_millis(500));
    assert_eq!(device.count(&Event::Release), 1);
    assert_eq!(sink.count(DiagnosticLevel::Error), 1);
}

#[tokio::test(start_paused = true)]
async fn test_steps_happen_in_order() {
    let device = MockDevice::new(Script::DelayedReply(
        Duration::from_millis(10),
        b"\x06".to_vec(),
    ));
    let (engine, _sink) = engine(MockOpener::new(device.clone()));

    engine
        .perform_exchange(request("RUN", Duration::from_secs(1)))
        .await
        .unwrap();

    assert_eq!(
        device.events(),
        vec![
            Event::Open,
            Event::Discard,
            Event::Write(b"RUN\r\n".to_vec()),
            Event::ReadWait,
            Event::Release,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_stale_bytes_discarded_before_write() {
    let device = MockDevice::new(Script::DelayedReply(
        Duration::from_millis(20),
        b"fresh\r\n".to_vec(),
    ));
    device.push(b"\x06stale");
    let (engine, _sink) = engine(MockOpener::new(device.clone()));

    let reply = engine
        .perform_exchange(request("READ?", Duration::from_secs(1)))
        .await
        .unwrap();

    assert_eq!(reply, Reply::Unclassified("fresh".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_end_of_stream_is_empty_unclassified() {
    let device = MockDevice::new(Script::Eof);
    let (engine, _sink) = engine(MockOpener::new(device.clone()));

    let reply = engine
        .perform_exchange(request("ID?", Duration::from_secs(1)))
        .await
        .unwrap();

    assert_eq!(reply, Reply::Unclassified(String::new()));
    assert_eq!(device.count(&Event::Release), 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_command_sends_bare_terminator() {
    let device = MockDevice::new(Script::Reply(b"READY".to_vec()));
    let (engine, _sink) = engine(MockOpener::new(device.clone()));

    let reply = engine
        .perform_exchange(request("", Duration::from_secs(1)))
        .await
        .unwrap();

    assert_eq!(device.written(), b"\r\n".to_vec());
    assert_eq!(reply.to_string(), "Received response: READY");
}

#[tokio::test]
async fn test_write_failure_is_io_and_releases() {
    let device = MockDevice::new(Script::WriteError);
    let (engine, sink) = engine(MockOpener::new(device.clone()));

    let err = engine
        .perform_exchange(request("ID?", Duration::from_secs(1)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Io);
    assert_eq!(device.count(&Event::Release), 1);
    assert_eq!(sink.entries().len(), 1);
}

#[tokio::test]
async fn test_access_denied_surfaces_distinctly() {
    let device = MockDevice::new(Script::Silent);
    let opener = MockOpener::failing(
        device.clone(),
        ExchangeError::AccessDenied {
            port: PORT.to_string(),
            detail: "Device or resource busy".to_string(),
        },
    );
    let (engine, sink) = engine(opener);

    let err = engine
        .perform_exchange(request("ID?", Duration::from_secs(1)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::AccessDenied);
    assert_eq!(
        sink.entries()[0].message,
        format!("Access to port {PORT} is denied: Device or resource busy")
    );
    assert!(device.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_dropped_exchange_still_releases() {
    let device = MockDevice::new(Script::Silent);
    let (engine, _sink) = engine(MockOpener::new(device.clone()));

    let outcome = tokio::time::timeout(
        Duration::from_millis(100),
        engine.perform_exchange(request("ID?", Duration::from_secs(10))),
    )
    .await;

    assert!(outcome.is_err());
    assert_eq!(device.count(&Event::Release), 1);
}

#[test]
fn test_open_is_idempotent() {
    let device = MockDevice::new(Script::Silent);
    let opener: Arc<dyn LinkOpener> = Arc::new(MockOpener::new(device.clone()));
    let mut lifecycle = LinkLifecycle::new(opener, config());

    assert!(!lifecycle.is_open());
    lifecycle.open().unwrap();
    lifecycle.open().unwrap();
    assert!(lifecycle.is_open());
    assert_eq!(device.count(&Event::Open), 1);

    lifecycle.close();
    lifecycle.close();
    drop(lifecycle);
    assert_eq!(device.count(&Event::Release), 1);
}
