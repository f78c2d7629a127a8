#![cfg(all(feature = "client", feature = "logging"))]

use std::io::{self, Read};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::util::SubscriberInitExt;
use wsconn::mock::MockHost;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn connection_lifecycle_is_traced() {
    let capture = Capture::default();
    let writer = capture.clone();
    let _guard = tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish()
        .set_default();

    let host = MockHost::new();
    let mut conn = wsconn::client::dial(&host, "ws://logs.example.test/").unwrap();
    let remote = host.accept_timeout(Duration::from_secs(5)).unwrap();
    remote.send_binary(&[1, 2, 3]);
    remote.abort();

    let mut buf = [0u8; 2];
    assert_eq!(conn.read(&mut buf).unwrap(), 2);
    assert!(conn.read_to_end(&mut Vec::new()).is_err());

    let logs = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("dial_with_config"));
    assert!(logs.contains("connection open"));
    assert!(logs.contains("partial frame read"));
    assert!(logs.contains("end of stream"));
}
