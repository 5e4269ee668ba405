// src/stream/tests.rs

use super::*;
use std::io::Cursor;
use std::net::TcpListener;
use std::sync::mpsc::channel;
use test_log::test;

const LIMIT: usize = 1024;
const WAIT: Duration = Duration::from_secs(5);

fn encoded(frames: &[&[u8]]) -> Vec<u8> {
    let mut wire = Vec::new();
    for frame in frames {
        write_frame(&mut wire, frame).unwrap();
    }
    wire
}

#[test]
fn it_should_prefix_frames_with_a_big_endian_length() {
    let wire = encoded(&[&[0xAA, 0xBB, 0xCC]]);
    assert_eq!(wire, vec![0, 0, 0, 3, 0xAA, 0xBB, 0xCC]);
}

#[test]
fn it_should_read_frames_in_order_and_report_clean_eof() -> io::Result<()> {
    let mut cursor = Cursor::new(encoded(&[&[1, 2], &[], &[3, 4, 5]]));
    assert_eq!(read_frame(&mut cursor, LIMIT)?, Some(vec![1, 2]));
    assert_eq!(read_frame(&mut cursor, LIMIT)?, Some(vec![]));
    assert_eq!(read_frame(&mut cursor, LIMIT)?, Some(vec![3, 4, 5]));
    assert_eq!(read_frame(&mut cursor, LIMIT)?, None);
    Ok(())
}

#[test]
fn it_should_fail_on_a_truncated_payload() {
    let mut wire = encoded(&[&[1, 2, 3, 4]]);
    wire.truncate(6);
    let err = read_frame(&mut Cursor::new(wire), LIMIT).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
}

#[test]
fn it_should_fail_on_a_truncated_header() {
    let err = read_frame(&mut Cursor::new(vec![0, 0]), LIMIT).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
}

#[test]
fn it_should_reject_frames_over_the_limit() {
    let wire = encoded(&[&[0u8; 16]]);
    let err = read_frame(&mut Cursor::new(wire), 8).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
}

#[test]
fn it_should_forward_frames_from_a_tcp_producer() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let producer = thread::spawn(move || -> io::Result<()> {
        let (mut socket, _) = listener.accept()?;
        write_frame(&mut socket, &[1, 2, 3, 4])?;
        write_frame(&mut socket, &[5, 6, 7, 8])?;
        Ok(())
    });

    let (event_tx, event_rx) = channel();
    let actor = StreamActor::spawn(
        StreamSettings {
            addr: addr.to_string(),
            max_frame_bytes: LIMIT,
            reconnect_delay: None,
        },
        event_tx,
    )?;

    assert!(matches!(event_rx.recv_timeout(WAIT)?, StreamEvent::Connected(_)));
    assert_eq!(event_rx.recv_timeout(WAIT)?, StreamEvent::Frame(vec![1, 2, 3, 4]));
    assert_eq!(event_rx.recv_timeout(WAIT)?, StreamEvent::Frame(vec![5, 6, 7, 8]));
    producer.join().unwrap()?;
    assert!(matches!(
        event_rx.recv_timeout(WAIT)?,
        StreamEvent::Disconnected(_)
    ));
    drop(actor);
    Ok(())
}

#[test]
fn it_should_report_an_unreachable_producer() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);

    let (event_tx, event_rx) = channel();
    let _actor = StreamActor::spawn(
        StreamSettings {
            addr: addr.to_string(),
            max_frame_bytes: LIMIT,
            reconnect_delay: None,
        },
        event_tx,
    )?;

    assert!(matches!(
        event_rx.recv_timeout(WAIT)?,
        StreamEvent::Disconnected(_)
    ));
    Ok(())
}

#[test]
fn it_should_stop_promptly_while_waiting_to_reconnect() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);

    let (event_tx, event_rx) = channel();
    let actor = StreamActor::spawn(
        StreamSettings {
            addr: addr.to_string(),
            max_frame_bytes: LIMIT,
            reconnect_delay: Some(Duration::from_secs(60)),
        },
        event_tx,
    )?;
    assert!(matches!(
        event_rx.recv_timeout(WAIT)?,
        StreamEvent::Disconnected(_)
    ));

    let started = std::time::Instant::now();
    drop(actor);
    assert!(started.elapsed() < Duration::from_secs(10));
    Ok(())
}
