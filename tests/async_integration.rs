//! Integration tests for the async event-loop backend
//!
//! The blocking-socket capability is removed from the client configuration
//! so the event loop is selected.

#![cfg(feature = "async")]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use http10::http::{Backend, Capabilities, Capability, Client, ClientConfig, Error, Headers};

fn event_loop_config() -> ClientConfig {
    ClientConfig::default().with_capabilities(Capabilities::detect().without(Capability::Socket))
}

#[test]
fn test_async_get() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut data = Vec::new();
        let mut buf = [0u8; 128];
        while !data.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            assert!(n > 0);
            data.extend_from_slice(&buf[..n]);
        }
        stream
            .write_all(b"HTTP/1.0 200 OK\r\nContent-Type: text/html\r\n\r\n<p>async</p>")
            .unwrap();
        String::from_utf8(data).unwrap()
    });

    let config = event_loop_config().with_read_buf_size(5);
    let client = Client::with_config("http", "127.0.0.1", Some(port), config).unwrap();
    assert_eq!(client.backend(), Backend::AsyncEventLoop);

    let response = client.get("/index.html", &Headers::new()).unwrap();
    assert_eq!(response.code(), Some(200));
    assert_eq!(response.content_type(), Some("text/html"));
    assert_eq!(response.body(), Some("<p>async</p>"));

    let request = server.join().unwrap();
    assert!(request.starts_with("GET /index.html HTTP/1.0\r\n"));
}

#[test]
fn test_async_streaming() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 1024];
        let mut seen = Vec::new();
        while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            assert!(n > 0);
            seen.extend_from_slice(&buf[..n]);
        }
        stream.write_all(b"HTTP/1.0 200 OK\r\n\r\nchunked-ish").unwrap();
    });

    let client = Client::with_config("http", "127.0.0.1", Some(port), event_loop_config()).unwrap();

    let mut streamed = Vec::new();
    let response = client
        .get_streaming("/", &Headers::new(), |chunk| streamed.extend_from_slice(chunk))
        .unwrap();

    assert_eq!(streamed, b"HTTP/1.0 200 OK\r\n\r\nchunked-ish");
    assert_eq!(response.body(), None);

    server.join().unwrap();
}

#[test]
fn test_async_unresolved_address() {
    let client = Client::with_config("http", "no-such-host.invalid", Some(80), event_loop_config())
        .unwrap();
    assert_eq!(client.backend(), Backend::AsyncEventLoop);

    let result = client.get("/", &Headers::new());
    assert!(matches!(result, Err(Error::Transport(_))));
}

#[test]
fn test_async_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = Client::with_config("http", "127.0.0.1", Some(port), event_loop_config()).unwrap();
    let result = client.post("/", &Headers::new());
    assert!(matches!(result, Err(Error::Transport(_))));
}
