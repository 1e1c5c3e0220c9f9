//! TLS session operations
//!
//! This module implements the SessionOps trait for TLS connections,
//! enabling transparent switching between plain TCP and TLS I/O.

use super::config::{TlsConfig, TlsError};
use crate::http::session::SessionOps;
use crate::http::{Error, Result as HttpResult};
use openssl::ssl::{ErrorCode, HandshakeError, Ssl, SslStream};
use std::io;
use std::net::{IpAddr, Shutdown, TcpStream};
use tracing::debug;

/// TLS session operations
///
/// Implements SessionOps trait for TLS-encrypted connections.
/// Wraps an OpenSSL SslStream and provides read/write/close operations.
pub struct TlsSessionOps {
    stream: SslStream<TcpStream>,
    failed: bool,
}

impl TlsSessionOps {
    /// Create a client TLS connection (perform handshake)
    pub fn connect(
        tcp_stream: TcpStream,
        config: &TlsConfig,
        host: &str,
    ) -> std::result::Result<Self, TlsError> {
        let mut ssl = Ssl::new(&config.ctx)?;
        let name = config.servername.as_deref().unwrap_or(host);

        // SNI only carries host names, IP targets are checked by address
        match name.parse::<IpAddr>() {
            Ok(ip) => {
                if config.verify_peer {
                    ssl.param_mut().set_ip(ip)?;
                }
            }
            Err(_) => {
                ssl.set_hostname(name)?;
                if config.verify_peer {
                    ssl.param_mut().set_host(name)?;
                }
            }
        }

        let ssl_stream = ssl.connect(tcp_stream).map_err(|e| match e {
            HandshakeError::SetupFailure(stack) => TlsError::OpenSsl(stack),
            HandshakeError::Failure(mid) | HandshakeError::WouldBlock(mid) => {
                debug!(
                    servername = name,
                    verify = %mid.ssl().verify_result(),
                    "TLS handshake failed"
                );
                TlsError::HandshakeFailed(mid.into_error())
            }
        })?;

        debug!(
            servername = name,
            version = ssl_stream.ssl().version_str(),
            "TLS handshake complete"
        );

        Ok(TlsSessionOps {
            stream: ssl_stream,
            failed: false,
        })
    }

    fn fail(&mut self, e: openssl::ssl::Error) -> Error {
        self.failed = true;
        match e.into_io_error() {
            Ok(io_err) => Error::Transport(io_err),
            Err(e) => Error::Transport(io::Error::new(io::ErrorKind::Other, e)),
        }
    }
}

impl SessionOps for TlsSessionOps {
    fn read(&mut self, buf: &mut [u8]) -> HttpResult<usize> {
        match self.stream.ssl_read(buf) {
            Ok(n) => Ok(n),
            // close_notify from the peer
            Err(e) if e.code() == ErrorCode::ZERO_RETURN => Ok(0),
            // peer closed the socket without close_notify
            Err(e) if e.code() == ErrorCode::SYSCALL && e.io_error().is_none() => Ok(0),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn write(&mut self, buf: &[u8]) -> HttpResult<usize> {
        match self.stream.ssl_write(buf) {
            Ok(n) => Ok(n),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn close(&mut self) -> HttpResult<()> {
        // close_notify first, then the TCP connection
        if !self.failed {
            if let Err(e) = self.stream.shutdown() {
                debug!(error = %e, "TLS shutdown failed");
            }
        }

        self.stream
            .get_mut()
            .shutdown(Shutdown::Both)
            .map_err(Error::from)
    }
}
