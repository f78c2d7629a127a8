#![cfg(feature = "client")]

use proptest::prelude::*;
use std::io::{self, Read, Write};
use std::thread;
use std::time::{Duration, Instant};
use wsconn::client::{dial, dial_with_config, DialConfig};
use wsconn::mock::{MockHost, MockRemote};
use wsconn::{CloseEvent, Error, FaultKind, Frame, ReadyState};

const TIMEOUT: Duration = Duration::from_secs(5);
const URL: &str = "ws://stream.example.test/";

fn connect(host: &MockHost) -> (wsconn::client::Conn<wsconn::mock::MockSocket>, MockRemote) {
    let conn = dial(host, URL).expect("dial");
    let remote = host.accept_timeout(TIMEOUT).expect("accept");
    (conn, remote)
}

fn typed(err: io::Error) -> Error {
    *err.into_inner()
        .expect("typed source")
        .downcast::<Error>()
        .expect("wsconn error")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn bytes_arrive_in_order_for_any_read_size(
        frames in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..48), 0..8),
        sizes in prop::collection::vec(1usize..16, 1..8),
    ) {
        let host = MockHost::new();
        let (mut conn, remote) = connect(&host);
        for frame in &frames {
            remote.send_binary(frame);
        }
        remote.close(1000, "done");

        let mut received = Vec::new();
        for size in sizes.iter().cycle() {
            let mut buf = vec![0u8; *size];
            let n = conn.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            received.extend_from_slice(&buf[..n]);
        }

        prop_assert_eq!(received, frames.concat());
    }
}

#[test]
fn partial_frame_is_carried_over() {
    let host = MockHost::new();
    let (mut conn, remote) = connect(&host);
    remote.send_binary(&[0, 1, 2, 3, 4]);
    remote.close(1000, "");

    let mut buf = [0u8; 2];
    let mut reads = Vec::new();
    loop {
        let n = conn.read(&mut buf).unwrap();
        reads.push(buf[..n].to_vec());
        if n == 0 {
            break;
        }
    }
    assert_eq!(reads, vec![vec![0, 1], vec![2, 3], vec![4], vec![]]);
}

#[test]
fn end_of_stream_is_sticky() {
    let host = MockHost::new();
    let (mut conn, remote) = connect(&host);
    remote.send_text("bye");
    remote.close(4000, "going away");

    let mut text = String::new();
    conn.read_to_string(&mut text).unwrap();
    assert_eq!(text, "bye");

    let started = Instant::now();
    for _ in 0..3 {
        assert_eq!(conn.read(&mut [0u8; 8]).unwrap(), 0);
    }
    assert!(started.elapsed() < TIMEOUT);
}

#[test]
fn read_deadline_is_honored_and_temporary() {
    let host = MockHost::new();
    let (mut conn, remote) = connect(&host);

    let deadline = Instant::now() + Duration::from_millis(40);
    conn.set_deadline(Some(deadline)).unwrap();
    let err = conn.read(&mut [0u8; 8]).unwrap_err();
    assert!(Instant::now() >= deadline);
    assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    let err = typed(err);
    assert!(err.is_timeout() && err.is_temporary());
    assert_eq!(err.to_string(), "i/o timeout: deadline reached");

    // The connection survives the timeout.
    conn.set_deadline(None).unwrap();
    remote.send_binary(b"after");
    let mut buf = [0u8; 8];
    let n = conn.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"after");
}

#[test]
fn zero_length_read_returns_immediately() {
    let host = MockHost::new();
    let (mut conn, _remote) = connect(&host);
    let started = Instant::now();
    assert_eq!(conn.read(&mut []).unwrap(), 0);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn abnormal_close_surfaces_as_error() {
    let host = MockHost::new();
    let (mut conn, remote) = connect(&host);
    remote.abort();

    let err = conn.read(&mut [0u8; 8]).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::ConnectionAborted);
    let event = typed(err).close_event().cloned();
    assert_eq!(event, Some(CloseEvent::new(1006, "", false)));

    // Same outcome again, without blocking.
    assert!(conn.read(&mut [0u8; 8]).is_err());
}

#[test]
fn writes_do_not_wait_for_the_echo() {
    let host = MockHost::new().echo();
    let (mut conn, _remote) = connect(&host);

    for chunk in [&b"one"[..], b"two", b"three"] {
        assert_eq!(conn.write(chunk).unwrap(), chunk.len());
    }

    let mut echoed = vec![0u8; 11];
    conn.read_exact(&mut echoed).unwrap();
    assert_eq!(echoed, b"onetwothree");
}

#[test]
fn connection_moves_to_another_thread() {
    let host = MockHost::new().echo();
    let (conn, _remote) = connect(&host);

    let (tx, rx) = std::sync::mpsc::channel::<Vec<u8>>();
    let worker = thread::spawn(move || {
        let mut conn = conn;
        for chunk in rx {
            conn.write_all(&chunk).unwrap();
        }
        let mut echoed = [0u8; 6];
        conn.read_exact(&mut echoed).map(|_| echoed)
    });

    tx.send(b"abc".to_vec()).unwrap();
    tx.send(b"def".to_vec()).unwrap();
    drop(tx);
    assert_eq!(&worker.join().unwrap().unwrap(), b"abcdef");
}

#[test]
fn dial_reports_invalid_url() {
    let host = MockHost::new();
    match dial(&host, "blah://blah.example/invalid").unwrap_err() {
        Error::Host(fault) => assert_eq!(fault.kind, FaultKind::Syntax),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn dial_reports_refusal_as_close_event() {
    let host = MockHost::new().refuse(CloseEvent::new(1006, "", false));
    let err = dial(&host, URL).unwrap_err();
    assert_eq!(err.close_event().map(|event| event.was_clean), Some(false));
    assert!(!err.is_timeout());
}

#[test]
fn dial_gives_up_after_connect_timeout() {
    let host = MockHost::new().hold_open();
    let config = DialConfig::default().connect_timeout(Duration::from_millis(40));
    let started = Instant::now();
    let err = dial_with_config(&host, URL, &config).unwrap_err();
    assert!(started.elapsed() >= Duration::from_millis(40));
    assert!(err.is_timeout());

    let remote = host.accept_timeout(TIMEOUT).unwrap();
    assert!(remote.wait_closed(TIMEOUT));

    // Opening late does not resurrect the connection.
    remote.open();
    remote.flush();
    assert_eq!(remote.ready_state(), ReadyState::Closed);
}

#[test]
fn dial_waits_for_delayed_open() {
    let host = MockHost::new().hold_open();
    thread::scope(|scope| {
        scope.spawn(|| {
            let remote = host.accept_timeout(TIMEOUT).expect("accept");
            thread::sleep(Duration::from_millis(30));
            remote.open();
        });

        let started = Instant::now();
        let conn = dial(&host, URL).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
        assert_eq!(conn.ready_state(), ReadyState::Open);
    });
}

#[test]
fn frames_sent_before_a_local_close_are_still_read() {
    let host = MockHost::new();
    let (mut conn, remote) = connect(&host);

    let mut expected = Vec::new();
    for i in 0..200u32 {
        let chunk = i.to_be_bytes();
        if i % 2 == 0 {
            remote.send_binary(&chunk);
        } else {
            remote.send_frame(Frame::binary(chunk.to_vec()));
        }
        expected.extend_from_slice(&chunk);
    }
    remote.send_text("tail");
    expected.extend_from_slice(b"tail");

    conn.close().unwrap();
    assert!(remote.wait_closed(TIMEOUT));

    let mut received = Vec::new();
    conn.read_to_end(&mut received).unwrap();
    assert_eq!(received, expected);
    assert_eq!(conn.read(&mut [0u8; 8]).unwrap(), 0);
}

#[test]
fn close_handle_unblocks_a_blocked_reader() {
    let host = MockHost::new();
    let (mut conn, remote) = connect(&host);
    remote.send_binary(b"queued");
    remote.flush();

    let closer = conn.closer();
    let reader = thread::spawn(move || {
        let mut data = Vec::new();
        let result = conn.read_to_end(&mut data);
        (result, data)
    });

    thread::sleep(Duration::from_millis(30));
    closer.close().unwrap();
    let (result, data) = reader.join().unwrap();
    assert_eq!(result.unwrap(), 6);
    assert_eq!(data, b"queued");
    assert!(remote.wait_closed(TIMEOUT));
}

#[test]
fn frames_keep_their_kind_on_the_wire() {
    let host = MockHost::new();
    let (mut conn, remote) = connect(&host);
    conn.write_all(&[1, 2, 3]).unwrap();
    conn.send_text("hello").unwrap();
    assert_eq!(remote.recv_timeout(TIMEOUT), Some(Frame::binary(vec![1u8, 2, 3])));
    assert_eq!(remote.recv_timeout(TIMEOUT), Some(Frame::text("hello")));
}
