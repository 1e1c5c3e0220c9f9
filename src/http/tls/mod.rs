//! TLS support for HTTPS targets
//!
//! TLS wraps the blocking-socket backend using the session operations
//! abstraction:
//!
//! 1. `TlsConfig` defines client TLS settings (versions, verification, CA)
//! 2. `TlsSessionOps` implements the `SessionOps` trait for encrypted I/O
//! 3. The exchange code remains unchanged - it transparently uses TLS operations
//!
//! # Examples
//!
//! ```no_run
//! use http10::http::tls::{TlsConfig, TlsVersion};
//! use http10::http::{Client, ClientConfig, Headers};
//!
//! let tls = TlsConfig::client()
//!     .min_version(TlsVersion::Tls12)
//!     .build()
//!     .unwrap();
//!
//! let config = ClientConfig::default().with_tls(tls);
//! let client = Client::with_config("https", "example.com", None, config).unwrap();
//! let response = client.get("/", &Headers::new()).unwrap();
//! ```

pub mod config;
pub mod session;

pub use config::{ClientConfigBuilder, TlsConfig, TlsError, TlsVersion};
pub use session::TlsSessionOps;
