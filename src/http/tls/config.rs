//! TLS configuration
//!
//! This module provides the client-side TLS configuration builder.

use super::session::TlsSessionOps;
use openssl::ssl::{SslContext, SslContextBuilder, SslMethod, SslVerifyMode};
use std::fmt;
use std::net::TcpStream;
use std::path::{Path, PathBuf};

/// TLS version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TlsVersion {
    /// TLS 1.0
    Tls10,
    /// TLS 1.1
    Tls11,
    /// TLS 1.2
    Tls12,
    /// TLS 1.3
    Tls13,
}

impl TlsVersion {
    /// Get OpenSSL protocol version constant
    pub fn to_openssl_version(&self) -> openssl::ssl::SslVersion {
        use openssl::ssl::SslVersion;
        match self {
            TlsVersion::Tls10 => SslVersion::TLS1,
            TlsVersion::Tls11 => SslVersion::TLS1_1,
            TlsVersion::Tls12 => SslVersion::TLS1_2,
            TlsVersion::Tls13 => SslVersion::TLS1_3,
        }
    }
}

/// TLS errors
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The handshake was rejected or the connection broke during it
    #[error("Handshake failed: {0}")]
    HandshakeFailed(#[source] openssl::ssl::Error),
}

impl TlsError {
    /// Underlying I/O error of a failed handshake, if the transport caused it
    pub fn io_error(&self) -> Option<&std::io::Error> {
        match self {
            TlsError::HandshakeFailed(e) => e.io_error(),
            _ => None,
        }
    }
}

/// Client TLS configuration (immutable after building)
#[derive(Clone)]
pub struct TlsConfig {
    pub(crate) ctx: SslContext,
    pub(crate) servername: Option<String>,
    pub(crate) verify_peer: bool,
}

impl TlsConfig {
    /// Create a new client configuration builder
    pub fn client() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Perform the client handshake over an established TCP connection
    ///
    /// `host` is used for SNI and certificate name checks unless a
    /// servername was configured.
    pub fn connect(&self, stream: TcpStream, host: &str) -> Result<TlsSessionOps, TlsError> {
        TlsSessionOps::connect(stream, self, host)
    }

    pub fn verify_peer(&self) -> bool {
        self.verify_peer
    }
}

impl fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsConfig")
            .field("servername", &self.servername)
            .field("verify_peer", &self.verify_peer)
            .finish()
    }
}

/// Client configuration builder
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    servername: Option<String>,
    verify_peer: bool,
    ca_file: Option<PathBuf>,
    min_version: Option<TlsVersion>,
    max_version: Option<TlsVersion>,
}

impl ClientConfigBuilder {
    fn new() -> Self {
        ClientConfigBuilder {
            servername: None,
            verify_peer: true,
            ca_file: None,
            min_version: None,
            max_version: None,
        }
    }

    /// Set TLS version (both min and max)
    pub fn version(self, version: TlsVersion) -> Self {
        self.version_range(version, version)
    }

    /// Set TLS version range
    pub fn version_range(mut self, min: TlsVersion, max: TlsVersion) -> Self {
        self.min_version = Some(min);
        self.max_version = Some(max);
        self
    }

    pub fn min_version(mut self, version: TlsVersion) -> Self {
        self.min_version = Some(version);
        self
    }

    /// Set SNI servername, overriding the target address
    pub fn servername(mut self, name: impl Into<String>) -> Self {
        self.servername = Some(name.into());
        self
    }

    /// Enable/disable peer certificate verification (enabled by default)
    pub fn verify_peer(mut self, verify: bool) -> Self {
        self.verify_peer = verify;
        self
    }

    /// Trust the CA certificates in a PEM file in addition to the system store
    pub fn ca_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.ca_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Build the TLS configuration
    pub fn build(self) -> Result<TlsConfig, TlsError> {
        if let (Some(min), Some(max)) = (self.min_version, self.max_version) {
            if min > max {
                return Err(TlsError::InvalidConfig(format!(
                    "minimum version {:?} is above maximum {:?}",
                    min, max
                )));
            }
        }

        let mut ctx_builder = SslContextBuilder::new(SslMethod::tls_client())?;

        if self.verify_peer {
            ctx_builder.set_default_verify_paths()?;
            ctx_builder.set_verify(SslVerifyMode::PEER);
        } else {
            ctx_builder.set_verify(SslVerifyMode::NONE);
        }

        if let Some(ref path) = self.ca_file {
            ctx_builder.set_ca_file(path)?;
        }

        if let Some(min) = self.min_version {
            ctx_builder.set_min_proto_version(Some(min.to_openssl_version()))?;
        }
        if let Some(max) = self.max_version {
            ctx_builder.set_max_proto_version(Some(max.to_openssl_version()))?;
        }

        Ok(TlsConfig {
            ctx: ctx_builder.build(),
            servername: self.servername,
            verify_peer: self.verify_peer,
        })
    }
}
