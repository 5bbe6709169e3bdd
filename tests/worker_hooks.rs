//! End-to-end tests of the plugin hooks against real TLS clients.

use std::fs::{self, File};
use std::io::{IoSlice, Read, Write};
use std::os::unix::io::{AsRawFd, IntoRawFd};
use std::os::unix::net::UnixStream;

use tokio::io::unix::AsyncFd;

use tls_shim::config::WorkerConfig;
use tls_shim::session::negotiate_async;
use tls_shim::{EventAction, NetworkIo, TlsError};

mod common;

fn limited(write_buffer_limit: usize, send_file_chunk: usize) -> WorkerConfig {
    WorkerConfig {
        write_buffer_limit,
        send_file_chunk,
        ..WorkerConfig::default()
    }
}

#[test]
fn test_echo_through_hooks() {
    let shim = common::shim(WorkerConfig::default());
    let mut worker = shim.worker();
    let (server, client) = UnixStream::pair().unwrap();
    let peer = common::spawn_client(client, |stream| {
        stream.write_all(b"ping")?;
        let mut reply = [0u8; 4];
        stream.read_exact(&mut reply)?;
        Ok(reply.to_vec())
    });
    let fd = server.into_raw_fd();

    assert_eq!(worker.on_read_event(fd), EventAction::Next);
    let mut buf = [0u8; 64];
    let n = worker.read(fd, &mut buf).unwrap();
    assert_eq!(worker.write(fd, &buf[..n]).unwrap(), n);

    worker.close(fd).unwrap();
    assert!(worker.registry().is_empty());
    assert_eq!(peer.join().unwrap().unwrap(), b"ping");
}

#[test]
fn test_round_trip_across_chunk_boundaries() {
    let shim = common::shim(WorkerConfig::default());
    let mut worker = shim.worker();
    let (server, client) = UnixStream::pair().unwrap();
    let payload: Vec<u8> = (0..50_000u32).map(|i| (i * 7 % 256) as u8).collect();
    let expected = payload.clone();
    let peer = common::spawn_client(client, move |stream| {
        // Many small records, then one large one.
        for piece in payload[..1000].chunks(10) {
            stream.write_all(piece)?;
        }
        stream.write_all(&payload[1000..])?;
        stream.flush()?;
        Ok(Vec::new())
    });
    let fd = server.into_raw_fd();
    assert_eq!(worker.on_read_event(fd), EventAction::Next);

    let mut received = Vec::new();
    let mut buf = [0u8; 4096];
    while received.len() < expected.len() {
        let n = worker.read(fd, &mut buf).unwrap();
        assert!(n > 0);
        received.extend_from_slice(&buf[..n]);
    }
    assert_eq!(received, expected);

    worker.close(fd).unwrap();
    peer.join().unwrap().unwrap();
}

#[test]
fn test_accepted_bytes_add_up() {
    let shim = common::shim(limited(1024, 16 * 1024));
    let mut worker = shim.worker();
    let (server, client) = UnixStream::pair().unwrap();
    let data: Vec<u8> = (0..10_000u32).map(|i| (i % 253) as u8).collect();
    let total = data.len();
    let peer = common::spawn_client(client, move |stream| {
        let mut got = vec![0u8; total];
        stream.read_exact(&mut got)?;
        Ok(got)
    });
    let fd = server.into_raw_fd();
    assert_eq!(worker.on_read_event(fd), EventAction::Next);

    let mut accepted_sum = 0;
    let mut writes = 0;
    while accepted_sum < data.len() {
        let accepted = worker.write(fd, &data[accepted_sum..]).unwrap();
        assert!(accepted > 0 && accepted <= 1024);
        accepted_sum += accepted;
        writes += 1;
    }
    assert_eq!(accepted_sum, data.len());
    assert!(writes >= 10);

    worker.close(fd).unwrap();
    assert_eq!(peer.join().unwrap().unwrap(), data);
}

#[test]
fn test_writev_matches_single_write() {
    let shim = common::shim(WorkerConfig::default());
    let mut worker = shim.worker();
    let (server, client) = UnixStream::pair().unwrap();
    let peer = common::spawn_client(client, |stream| {
        let mut got = vec![0u8; 11];
        stream.read_exact(&mut got)?;
        Ok(got)
    });
    let fd = server.into_raw_fd();
    assert_eq!(worker.on_read_event(fd), EventAction::Next);

    let parts = [IoSlice::new(b"hel"), IoSlice::new(b""), IoSlice::new(b"lo "), IoSlice::new(b"world")];
    assert_eq!(worker.writev(fd, &parts).unwrap(), 11);

    worker.close(fd).unwrap();
    assert_eq!(peer.join().unwrap().unwrap(), b"hello world");
}

#[test]
fn test_send_file_advances_offset_by_accepted_bytes() {
    let path = std::env::temp_dir().join(format!("tls-shim-send-file-{}", std::process::id()));
    let contents: Vec<u8> = (0..40_000u32).map(|i| (i % 241) as u8).collect();
    fs::write(&path, &contents).unwrap();
    let file = File::open(&path).unwrap();

    let shim = common::shim(limited(4096, 3000));
    let mut worker = shim.worker();
    let (server, client) = UnixStream::pair().unwrap();
    let size = contents.len() - 100;
    let peer = common::spawn_client(client, move |stream| {
        let mut got = vec![0u8; size];
        stream.read_exact(&mut got)?;
        Ok(got)
    });
    let fd = server.into_raw_fd();
    assert_eq!(worker.on_read_event(fd), EventAction::Next);

    let mut offset = 100u64;
    let sent = worker.send_file(fd, file.as_raw_fd(), &mut offset, size).unwrap();
    assert_eq!(sent, size);
    assert_eq!(offset, contents.len() as u64);

    worker.close(fd).unwrap();
    fs::remove_file(&path).ok();
    assert_eq!(peer.join().unwrap().unwrap(), contents[100..]);
}

#[test]
fn test_send_file_stops_at_end_of_file() {
    let path = std::env::temp_dir().join(format!("tls-shim-short-file-{}", std::process::id()));
    fs::write(&path, vec![b'z'; 500]).unwrap();
    let file = File::open(&path).unwrap();

    let shim = common::shim(WorkerConfig::default());
    let mut worker = shim.worker();
    let (server, client) = UnixStream::pair().unwrap();
    let peer = common::spawn_client(client, |stream| {
        let mut got = vec![0u8; 500];
        stream.read_exact(&mut got)?;
        Ok(got)
    });
    let fd = server.into_raw_fd();
    assert_eq!(worker.on_read_event(fd), EventAction::Next);

    let mut offset = 0u64;
    assert_eq!(worker.send_file(fd, file.as_raw_fd(), &mut offset, 10_000).unwrap(), 500);
    assert_eq!(offset, 500);

    worker.close(fd).unwrap();
    fs::remove_file(&path).ok();
    assert_eq!(peer.join().unwrap().unwrap(), vec![b'z'; 500]);
}

#[test]
fn test_truncated_handshake_is_not_registered() {
    let shim = common::shim(WorkerConfig::default());
    let mut worker = shim.worker();
    let (server, mut client) = UnixStream::pair().unwrap();
    // Handshake record header promising 200 bytes, followed by only four.
    client.write_all(&[0x16, 0x03, 0x01, 0x00, 0xc8, 0x01, 0x00, 0x00, 0xc4]).unwrap();
    drop(client);
    let fd = server.into_raw_fd();

    assert_eq!(worker.on_read_event(fd), EventAction::Close);
    assert!(worker.registry().find(fd).is_none());

    let mut buf = [0u8; 8];
    assert!(matches!(worker.read(fd, &mut buf), Err(TlsError::UnknownDescriptor(_))));
    worker.close(fd).unwrap();
}

#[test]
fn test_alert_during_handshake_closes_connection() {
    let shim = common::shim(WorkerConfig::default());
    let mut worker = shim.worker();
    let (server, mut client) = UnixStream::pair().unwrap();
    client.write_all(&[0x15, 0x03, 0x03, 0x00, 0x02, 0x02, 0x28]).unwrap();
    let fd = server.into_raw_fd();

    assert_eq!(worker.on_read_event(fd), EventAction::Close);
    assert!(worker.registry().is_empty());
    worker.close(fd).unwrap();
}

#[test]
fn test_empty_read_leaves_session_open() {
    let shim = common::shim(WorkerConfig::default());
    let mut worker = shim.worker();
    let (server, client) = UnixStream::pair().unwrap();
    let peer = common::spawn_client(client, |stream| {
        stream.write_all(b"still here")?;
        Ok(Vec::new())
    });
    let fd = server.into_raw_fd();
    assert_eq!(worker.on_read_event(fd), EventAction::Next);

    assert_eq!(worker.read(fd, &mut []).unwrap(), 0);
    assert!(worker.registry().find(fd).is_some());

    let mut buf = [0u8; 32];
    let n = worker.read(fd, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"still here");

    worker.close(fd).unwrap();
    peer.join().unwrap().unwrap();
}

#[test]
fn test_closed_descriptor_gets_fresh_session() {
    let shim = common::shim(WorkerConfig::default());
    let mut worker = shim.worker();

    for round in 0..2u8 {
        let (server, client) = UnixStream::pair().unwrap();
        let peer = common::spawn_client(client, move |stream| {
            stream.write_all(&[round])?;
            Ok(Vec::new())
        });
        let fd = server.into_raw_fd();

        assert_eq!(worker.on_read_event(fd), EventAction::Next);
        assert!(worker.registry().find(fd).unwrap().is_established());
        let mut buf = [0u8; 1];
        assert_eq!(worker.read(fd, &mut buf).unwrap(), 1);
        assert_eq!(buf[0], round);

        worker.close(fd).unwrap();
        assert!(worker.registry().find(fd).is_none());
        peer.join().unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_async_handshake_then_adopt() {
    let shim = common::shim(WorkerConfig::default());
    let mut worker = shim.worker();
    let (server, client) = UnixStream::pair().unwrap();
    server.set_nonblocking(true).unwrap();
    let peer = common::spawn_client(client, |stream| {
        stream.write_all(b"async")?;
        Ok(Vec::new())
    });

    let io = AsyncFd::new(server).unwrap();
    let mut session = worker.new_session(io.as_raw_fd()).unwrap();
    negotiate_async(&mut session, &io).await.unwrap();

    let server = io.into_inner();
    server.set_nonblocking(false).unwrap();
    let fd = server.into_raw_fd();
    worker.adopt(session).unwrap();
    assert_eq!(worker.on_read_event(fd), EventAction::Next);
    assert_eq!(worker.registry().len(), 1);

    let mut buf = [0u8; 16];
    let n = worker.read(fd, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"async");

    worker.close(fd).unwrap();
    peer.join().unwrap().unwrap();
}
