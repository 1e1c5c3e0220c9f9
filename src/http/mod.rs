//! HTTP/1.0 client implementation
//!
//! This module provides a one-shot HTTP/1.0 client: every request opens a
//! fresh connection, sends `Connection: close`, and reads until the peer
//! closes the stream.
//!
//! # Architecture
//!
//! The client uses the session operations abstraction so the same exchange
//! code drives every transport:
//!
//! - `SessionOps` trait defines operations (read, write, close)
//! - Unix sockets, plain TCP and TLS streams implement `SessionOps`
//! - The async event-loop backend runs the same exchange as a future,
//!   driven to completion before the call returns
//!
//! Which backend a `Client` uses is decided once, at construction, from the
//! `Capabilities` compiled into the crate (or restricted through
//! `ClientConfig`).
//!
//! # Examples
//!
//! ```no_run
//! use http10::http::{Client, Headers};
//!
//! let client = Client::new("http", "example.com", None).unwrap();
//!
//! let mut headers = Headers::new();
//! headers.insert("User-Agent", "http10");
//!
//! let response = client.get("/", &headers).unwrap();
//! assert_eq!(response.code(), Some(200));
//! println!("{}", response.body().unwrap_or_default());
//! ```

pub mod client;
pub mod config;
#[cfg(feature = "async")]
pub mod event_loop;
pub mod headers;
pub mod message;
pub mod parser;
pub mod session;
#[cfg(feature = "tls")]
pub mod tls;

pub use client::{Backend, Client};
pub use config::{Capabilities, Capability, ClientConfig};
pub use headers::{capitalize, HeaderValue, Headers};
pub use message::{create_request_header, normalize_path, Method, Request, Scheme, Target};
pub use parser::{Field, Response};
pub use session::{slice_by_buffer_size, SessionOps};

/// Result type for HTTP operations
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP client errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport or TLS provider required by the target is not available
    #[error("capability missing: {0}")]
    CapabilityMissing(Capability),

    #[error("invalid scheme: {0}")]
    InvalidScheme(String),

    /// Connection, read, write or resolution failure, as reported by the
    /// underlying transport
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[cfg(feature = "tls")]
    #[error("TLS error: {0}")]
    Tls(#[from] tls::TlsError),
}

/// HTTP version token written on every request line
pub const HTTP_VERSION: &str = "HTTP/1.0";

/// Default HTTP port
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// Default HTTPS port
pub const DEFAULT_HTTPS_PORT: u16 = 443;

/// Default value of the `Accept` header
pub const DEFAULT_ACCEPT: &str = "*/*";

/// Default read and write buffer size
pub const DEFAULT_BUF_SIZE: usize = 4096;

/// CRLF line ending
pub const CRLF: &str = "\r\n";
