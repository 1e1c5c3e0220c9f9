//! Async event-loop backend
//!
//! Runs on a single-threaded tokio runtime owned by the client. Every call
//! drives the runtime until the operation's future completes, so the
//! caller sees a blocking API while connect, write and the read loop are
//! non-blocking underneath.

use super::session::{slice_by_buffer_size, ResponseSink};
use super::{Error, Result};
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// Current-thread event loop used by the async backend
pub struct EventLoop {
    runtime: Runtime,
}

impl EventLoop {
    pub fn new() -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_io().build()?;
        Ok(EventLoop { runtime })
    }

    /// Resolve `host` to its first IPv4 address
    ///
    /// Resolution failures are not errors: the result is simply `None`.
    pub fn resolve(&self, host: &str) -> Option<Ipv4Addr> {
        let resolved = self.runtime.block_on(async {
            match tokio::net::lookup_host((host, 0)).await {
                Ok(addrs) => addrs
                    .filter_map(|addr| match addr.ip() {
                        IpAddr::V4(ip) => Some(ip),
                        IpAddr::V6(_) => None,
                    })
                    .next(),
                Err(e) => {
                    debug!(host, error = %e, "resolution failed");
                    None
                }
            }
        });
        debug!(host, ?resolved, "resolved");
        resolved
    }

    /// Connect, send `request`, and hand every chunk read to `out` until the
    /// peer closes the connection
    ///
    /// A missing address fails like a refused connection; nothing is sent.
    pub fn exchange(
        &self,
        ip: Option<Ipv4Addr>,
        port: u16,
        request: &[u8],
        read_buf_size: usize,
        write_buf_size: usize,
        out: &mut ResponseSink<'_>,
    ) -> Result<()> {
        let ip = ip.ok_or_else(|| {
            Error::Transport(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                "target address was not resolved",
            ))
        })?;
        let addr = SocketAddr::from((ip, port));

        self.runtime
            .block_on(run_exchange(addr, request, read_buf_size, write_buf_size, out))
            .map_err(Error::from)
    }
}

async fn run_exchange(
    addr: SocketAddr,
    request: &[u8],
    read_buf_size: usize,
    write_buf_size: usize,
    out: &mut ResponseSink<'_>,
) -> io::Result<()> {
    let mut stream = TcpStream::connect(addr).await?;
    debug!(%addr, "connected");

    let result = transfer(&mut stream, request, read_buf_size, write_buf_size, out).await;

    if let Err(e) = stream.shutdown().await {
        debug!(error = %e, "close failed");
    }
    result
}

async fn transfer(
    stream: &mut TcpStream,
    request: &[u8],
    read_buf_size: usize,
    write_buf_size: usize,
    out: &mut ResponseSink<'_>,
) -> io::Result<()> {
    for slice in slice_by_buffer_size(request, write_buf_size) {
        stream.write_all(slice).await?;
    }

    let mut chunk = vec![0u8; read_buf_size.max(1)];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        out.push(&chunk[..n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_resolve_localhost() {
        let event_loop = EventLoop::new().unwrap();
        assert_eq!(event_loop.resolve("127.0.0.1"), Some(Ipv4Addr::LOCALHOST));
    }

    #[test]
    fn test_resolve_failure_is_none() {
        let event_loop = EventLoop::new().unwrap();
        assert_eq!(event_loop.resolve("no-such-host.invalid"), None);
    }

    #[test]
    fn test_exchange_without_address() {
        let event_loop = EventLoop::new().unwrap();
        let mut out = ResponseSink::buffered();
        let result = event_loop.exchange(None, 80, b"GET / HTTP/1.0\r\n\r\n", 16, 16, &mut out);
        assert!(matches!(result, Err(Error::Transport(e)) if e.kind() == io::ErrorKind::AddrNotAvailable));
        assert_eq!(out.received(), 0);
    }

    #[test]
    fn test_exchange_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 5];
            stream.read_exact(&mut buf).unwrap();
            assert_eq!(&buf, b"hello");
            stream.write_all(b"HTTP/1.0 200 OK\r\n\r\nworld").unwrap();
        });

        let event_loop = EventLoop::new().unwrap();
        let mut out = ResponseSink::buffered();
        event_loop
            .exchange(Some(Ipv4Addr::LOCALHOST), port, b"hello", 3, 2, &mut out)
            .unwrap();
        assert_eq!(&out.into_bytes()[..], b"HTTP/1.0 200 OK\r\n\r\nworld");

        handle.join().unwrap();
    }
}
