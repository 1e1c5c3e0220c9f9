//! Session operations abstraction
//!
//! This module provides the session operations pattern that allows
//! transparent switching between Unix sockets, plain TCP and TLS
//! connections. The request/response exchange is written once against
//! `SessionOps` and reused by every blocking backend.

use super::{Error, Result};
use bytes::{Bytes, BytesMut};
use socket2::{Domain, Protocol, Socket, Type};
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use tracing::{debug, trace};

/// Session operations trait
///
/// This trait defines the operations that can be performed on a session,
/// abstracting over the concrete transport.
pub trait SessionOps {
    /// Read data from the session; 0 means the peer closed the stream
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write data to the session
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Close the session
    fn close(&mut self) -> Result<()>;
}

/// Plain TCP session operations
pub struct TcpSessionOps {
    stream: TcpStream,
}

impl TcpSessionOps {
    pub fn new(stream: TcpStream) -> Self {
        TcpSessionOps { stream }
    }
}

impl SessionOps for TcpSessionOps {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.stream.read(buf).map_err(Error::from)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.stream.write(buf).map_err(Error::from)
    }

    fn close(&mut self) -> Result<()> {
        self.stream.shutdown(Shutdown::Both).map_err(Error::from)
    }
}

/// Unix domain socket session operations
#[cfg(unix)]
pub struct UnixSessionOps {
    stream: UnixStream,
}

#[cfg(unix)]
impl UnixSessionOps {
    pub fn new(stream: UnixStream) -> Self {
        UnixSessionOps { stream }
    }
}

#[cfg(unix)]
impl SessionOps for UnixSessionOps {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.stream.read(buf).map_err(Error::from)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.stream.write(buf).map_err(Error::from)
    }

    fn close(&mut self) -> Result<()> {
        self.stream.shutdown(Shutdown::Both).map_err(Error::from)
    }
}

/// Open a TCP connection, trying each resolved address in turn
pub fn connect_tcp(host: &str, port: u16) -> Result<TcpStream> {
    let mut last_err = None;

    for addr in (host, port).to_socket_addrs()? {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        match socket.connect(&addr.into()) {
            Ok(()) => {
                socket.set_nodelay(true)?;
                debug!(%addr, "connected");
                return Ok(socket.into());
            }
            Err(e) => {
                debug!(%addr, error = %e, "connect failed");
                last_err = Some(e);
            }
        }
    }

    Err(Error::Transport(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no addresses found for {}", host),
        )
    })))
}

/// Split a buffer into consecutive slices of at most `buffer_size` bytes
///
/// An empty buffer yields no slices. A zero size is treated as 1.
pub fn slice_by_buffer_size(buf: &[u8], buffer_size: usize) -> std::slice::Chunks<'_, u8> {
    buf.chunks(buffer_size.max(1))
}

/// Destination of response bytes: an in-memory buffer, or a caller sink
/// that receives each chunk as it arrives
pub struct ResponseSink<'a> {
    buffer: BytesMut,
    stream: Option<&'a mut dyn FnMut(&[u8])>,
    received: usize,
}

impl<'a> ResponseSink<'a> {
    /// Accumulate the whole response
    pub fn buffered() -> Self {
        ResponseSink {
            buffer: BytesMut::new(),
            stream: None,
            received: 0,
        }
    }

    /// Forward every chunk to `sink` instead of buffering it
    pub fn streaming(sink: &'a mut dyn FnMut(&[u8])) -> Self {
        ResponseSink {
            buffer: BytesMut::new(),
            stream: Some(sink),
            received: 0,
        }
    }

    /// Accept one chunk read from the transport
    pub fn push(&mut self, chunk: &[u8]) {
        self.received += chunk.len();
        trace!(len = chunk.len(), "response chunk");
        match self.stream.as_mut() {
            Some(sink) => sink(chunk),
            None => self.buffer.extend_from_slice(chunk),
        }
    }

    /// Total bytes received, buffered or streamed
    pub fn received(&self) -> usize {
        self.received
    }

    /// Buffered bytes; empty when streaming
    pub fn into_bytes(self) -> Bytes {
        self.buffer.freeze()
    }
}

/// Write `buf` in slices of at most `write_buf_size` bytes
pub fn write_chunked<S: SessionOps>(session: &mut S, buf: &[u8], write_buf_size: usize) -> Result<()> {
    for slice in slice_by_buffer_size(buf, write_buf_size) {
        let mut written = 0;
        while written < slice.len() {
            match session.write(&slice[written..]) {
                Ok(0) => {
                    return Err(Error::Transport(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "connection closed while writing request",
                    )))
                }
                Ok(n) => written += n,
                Err(Error::Transport(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
    Ok(())
}

/// Read chunks of `read_buf_size` bytes until the peer closes the stream
pub fn read_to_end<S: SessionOps>(
    session: &mut S,
    read_buf_size: usize,
    out: &mut ResponseSink<'_>,
) -> Result<()> {
    let mut chunk = vec![0u8; read_buf_size.max(1)];
    loop {
        match session.read(&mut chunk) {
            Ok(0) => return Ok(()),
            Ok(n) => out.push(&chunk[..n]),
            Err(Error::Transport(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Run one request/response exchange and close the session
///
/// The session is closed whether or not the exchange succeeded. A failure
/// to close is logged and does not mask the exchange result.
pub fn exchange<S: SessionOps>(
    mut session: S,
    request: &[u8],
    read_buf_size: usize,
    write_buf_size: usize,
    out: &mut ResponseSink<'_>,
) -> Result<()> {
    let result = write_chunked(&mut session, request, write_buf_size)
        .and_then(|()| read_to_end(&mut session, read_buf_size, out));

    if let Err(e) = session.close() {
        debug!(error = %e, "close failed");
    }

    debug!(
        written = request.len(),
        received = out.received(),
        ok = result.is_ok(),
        "exchange finished"
    );
    result
}
