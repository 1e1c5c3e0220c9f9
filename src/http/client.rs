//! HTTP client implementation
//!
//! `Client` picks its transport backend once, at construction, then runs
//! every request as a fresh one-shot exchange on that backend.

#[cfg(feature = "async")]
use super::event_loop::EventLoop;
use super::message::{Method, Request, Scheme, Target};
use super::session::{self, ResponseSink, TcpSessionOps};
#[cfg(unix)]
use super::session::UnixSessionOps;
#[cfg(feature = "tls")]
use super::tls::TlsConfig;
use super::{Capability, ClientConfig, Error, Headers, Response, Result};
use bytes::Bytes;
use std::net::TcpStream;
#[cfg(feature = "async")]
use std::net::Ipv4Addr;
use tracing::{debug, warn};

/// Transport backend used by a `Client`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    UnixSocket,
    BlockingSocket,
    AsyncEventLoop,
}

impl Backend {
    /// Choose the backend for a scheme from the available capabilities
    ///
    /// `unix` needs the Unix-socket capability. Network schemes prefer
    /// blocking sockets and fall back to the event loop.
    pub fn select(scheme: Scheme, config: &ClientConfig) -> Result<Self> {
        let caps = &config.capabilities;
        match scheme {
            Scheme::Unix if caps.has(Capability::UnixSocket) => Ok(Backend::UnixSocket),
            Scheme::Unix => Err(Error::CapabilityMissing(Capability::UnixSocket)),
            _ if caps.has(Capability::Socket) => Ok(Backend::BlockingSocket),
            _ if caps.has(Capability::EventLoop) => Ok(Backend::AsyncEventLoop),
            _ => Err(Error::CapabilityMissing(Capability::Socket)),
        }
    }
}

/// HTTP/1.0 client
///
/// Every request opens its own connection and reads the response until the
/// server closes it. A `Client` holds no per-request state, so it can be
/// shared by reference; requests through one client are serialized by the
/// caller.
pub struct Client {
    target: Target,
    backend: Backend,
    config: ClientConfig,
    #[cfg(feature = "async")]
    event_loop: Option<EventLoop>,
    #[cfg(feature = "async")]
    resolved: Option<Ipv4Addr>,
    /// Set when requests go over TLS; built once per client
    #[cfg(feature = "tls")]
    tls: Option<TlsConfig>,
}

impl Client {
    /// Create a client with the default configuration
    pub fn new(scheme: &str, address: &str, port: Option<u16>) -> Result<Self> {
        Self::with_config(scheme, address, port, ClientConfig::default())
    }

    /// Create a client
    ///
    /// Fails with `CapabilityMissing` when no backend can serve the scheme.
    /// For `https` over TLS the TLS context is built here, so a broken
    /// default context surfaces as `Error::Tls`.
    /// When the event-loop backend is chosen the address is resolved here;
    /// if that yields nothing, later requests fail with a transport error.
    pub fn with_config(
        scheme: &str,
        address: &str,
        port: Option<u16>,
        config: ClientConfig,
    ) -> Result<Self> {
        let scheme: Scheme = scheme.parse()?;
        let backend = Backend::select(scheme, &config)?;
        let target = Target::new(
            scheme,
            address,
            port,
            config.capabilities.has(Capability::Tls),
        );

        if scheme == Scheme::Https && !config.capabilities.has(Capability::Tls) {
            warn!(address, "https without TLS support, requests are sent in plain text");
        }

        debug!(
            scheme = %scheme,
            address,
            port = ?target.port(),
            ?backend,
            "client created"
        );

        #[cfg(feature = "tls")]
        let tls = if scheme == Scheme::Https
            && backend == Backend::BlockingSocket
            && config.capabilities.has(Capability::Tls)
        {
            match &config.tls {
                Some(tls) => Some(tls.clone()),
                None => Some(TlsConfig::client().build()?),
            }
        } else {
            None
        };

        match backend {
            #[cfg(feature = "async")]
            Backend::AsyncEventLoop => {
                let event_loop = EventLoop::new()?;
                let resolved = event_loop.resolve(address);
                Ok(Client {
                    target,
                    backend,
                    config,
                    event_loop: Some(event_loop),
                    resolved,
                    #[cfg(feature = "tls")]
                    tls,
                })
            }
            _ => Ok(Client {
                target,
                backend,
                config,
                #[cfg(feature = "async")]
                event_loop: None,
                #[cfg(feature = "async")]
                resolved: None,
                #[cfg(feature = "tls")]
                tls,
            }),
        }
    }

    /// Host name, IP address, or socket path for `unix` targets
    pub fn address(&self) -> &str {
        self.target.address()
    }

    /// Port, absent for `unix` targets
    pub fn port(&self) -> Option<u16> {
        self.target.port()
    }

    pub fn scheme(&self) -> Scheme {
        self.target.scheme()
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a GET request
    pub fn get(&self, path: &str, headers: &Headers) -> Result<Response> {
        self.request(Method::Get, path, headers, None)
    }

    /// Send a GET request, handing each response chunk to `sink` as it
    /// arrives
    ///
    /// Streamed bytes are not buffered, so the returned response is the
    /// parse of an empty buffer: no header, body or code.
    pub fn get_streaming<F>(&self, path: &str, headers: &Headers, mut sink: F) -> Result<Response>
    where
        F: FnMut(&[u8]),
    {
        self.request(Method::Get, path, headers, Some(&mut sink))
    }

    /// Send a POST request; the body comes from the `Body` header entry
    pub fn post(&self, path: &str, headers: &Headers) -> Result<Response> {
        self.request(Method::Post, path, headers, None)
    }

    /// Send a PUT request; the body comes from the `Body` header entry
    pub fn put(&self, path: &str, headers: &Headers) -> Result<Response> {
        self.request(Method::Put, path, headers, None)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        headers: &Headers,
        sink: Option<&mut dyn FnMut(&[u8])>,
    ) -> Result<Response> {
        let request = Request::new(method, path, headers, &self.target);
        debug!(method = %method, path = request.path(), "sending request");

        let raw = self.send_request(&request.to_wire(), sink)?;
        Ok(Response::parse(&raw))
    }

    /// Run one exchange on the selected backend and return the buffered
    /// response bytes (empty when a sink consumed them)
    pub fn send_request(
        &self,
        request: &[u8],
        sink: Option<&mut dyn FnMut(&[u8])>,
    ) -> Result<Bytes> {
        let mut out = match sink {
            Some(sink) => ResponseSink::streaming(sink),
            None => ResponseSink::buffered(),
        };
        let read_buf_size = self.config.read_buf_size;
        let write_buf_size = self.config.write_buf_size;

        match self.backend {
            Backend::UnixSocket => {
                let session = self.connect_unix()?;
                session::exchange(session, request, read_buf_size, write_buf_size, &mut out)?;
            }
            Backend::BlockingSocket => {
                let stream = session::connect_tcp(self.target.address(), self.network_port())?;
                self.exchange_blocking(stream, request, &mut out)?;
            }
            Backend::AsyncEventLoop => self.exchange_async(request, &mut out)?,
        }

        Ok(out.into_bytes())
    }

    #[cfg(feature = "tls")]
    fn exchange_blocking(
        &self,
        stream: TcpStream,
        request: &[u8],
        out: &mut ResponseSink<'_>,
    ) -> Result<()> {
        let (read_buf_size, write_buf_size) = (self.config.read_buf_size, self.config.write_buf_size);
        match &self.tls {
            Some(tls) => {
                let session = tls.connect(stream, self.target.address())?;
                session::exchange(session, request, read_buf_size, write_buf_size, out)
            }
            None => {
                let session = TcpSessionOps::new(stream);
                session::exchange(session, request, read_buf_size, write_buf_size, out)
            }
        }
    }

    #[cfg(not(feature = "tls"))]
    fn exchange_blocking(
        &self,
        stream: TcpStream,
        request: &[u8],
        out: &mut ResponseSink<'_>,
    ) -> Result<()> {
        session::exchange(
            TcpSessionOps::new(stream),
            request,
            self.config.read_buf_size,
            self.config.write_buf_size,
            out,
        )
    }

    fn network_port(&self) -> u16 {
        self.target.port().unwrap_or(super::DEFAULT_HTTP_PORT)
    }

    #[cfg(unix)]
    fn connect_unix(&self) -> Result<UnixSessionOps> {
        let stream = std::os::unix::net::UnixStream::connect(self.target.address())?;
        Ok(UnixSessionOps::new(stream))
    }

    #[cfg(not(unix))]
    fn connect_unix(&self) -> Result<TcpSessionOps> {
        Err(Error::CapabilityMissing(Capability::UnixSocket))
    }

    #[cfg(feature = "async")]
    fn exchange_async(&self, request: &[u8], out: &mut ResponseSink<'_>) -> Result<()> {
        match &self.event_loop {
            Some(event_loop) => event_loop.exchange(
                self.resolved,
                self.network_port(),
                request,
                self.config.read_buf_size,
                self.config.write_buf_size,
                out,
            ),
            None => Err(Error::CapabilityMissing(Capability::EventLoop)),
        }
    }

    #[cfg(not(feature = "async"))]
    fn exchange_async(&self, _request: &[u8], _out: &mut ResponseSink<'_>) -> Result<()> {
        Err(Error::CapabilityMissing(Capability::EventLoop))
    }
}
