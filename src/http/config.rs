//! Client configuration
//!
//! Buffer sizes and the set of transport capabilities a `Client` may choose
//! from. Capabilities are fixed at build time by cargo features and the
//! target platform; a configuration can only narrow them down.

#[cfg(feature = "tls")]
use super::tls::TlsConfig;
use super::DEFAULT_BUF_SIZE;
use std::fmt;

/// Environment variable for the read buffer size
pub const READ_BUF_SIZE_ENV: &str = "READ_BUF_SIZE";
/// Environment variable for the write buffer size
pub const WRITE_BUF_SIZE_ENV: &str = "WRITE_BUF_SIZE";
/// Environment variable used for both sizes when the specific one is unset
pub const BUF_SIZE_ENV: &str = "BUF_SIZE";

/// An optional transport facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Unix domain stream sockets
    UnixSocket,
    /// Blocking TCP sockets
    Socket,
    /// Async event loop with TCP handles and address resolution
    EventLoop,
    /// TLS over TCP
    Tls,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::UnixSocket => "unix socket",
            Capability::Socket => "socket",
            Capability::EventLoop => "event loop",
            Capability::Tls => "tls",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of available capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    unix_socket: bool,
    socket: bool,
    event_loop: bool,
    tls: bool,
}

impl Capabilities {
    /// Capabilities compiled into this build
    pub fn detect() -> Self {
        Capabilities {
            unix_socket: cfg!(unix),
            socket: true,
            event_loop: cfg!(feature = "async"),
            tls: cfg!(feature = "tls"),
        }
    }

    /// Remove a capability
    pub fn without(mut self, capability: Capability) -> Self {
        match capability {
            Capability::UnixSocket => self.unix_socket = false,
            Capability::Socket => self.socket = false,
            Capability::EventLoop => self.event_loop = false,
            Capability::Tls => self.tls = false,
        }
        self
    }

    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::UnixSocket => self.unix_socket,
            Capability::Socket => self.socket,
            Capability::EventLoop => self.event_loop,
            Capability::Tls => self.tls,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::detect()
    }
}

/// Client configuration
#[derive(Clone)]
pub struct ClientConfig {
    /// Size of each read from the transport
    pub read_buf_size: usize,
    /// Largest slice written to the transport in one call
    pub write_buf_size: usize,
    pub capabilities: Capabilities,
    /// TLS settings for `https`; a verifying default is used when unset
    #[cfg(feature = "tls")]
    pub tls: Option<TlsConfig>,
}

impl ClientConfig {
    /// Defaults with buffer sizes taken from the environment
    ///
    /// `READ_BUF_SIZE` and `WRITE_BUF_SIZE` each fall back to `BUF_SIZE`,
    /// then to 4096. Values that are not positive integers are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let size = |name: &str| {
            lookup(name)
                .and_then(|v| v.trim().parse::<usize>().ok())
                .filter(|&n| n > 0)
        };
        let shared = size(BUF_SIZE_ENV);

        ClientConfig {
            read_buf_size: size(READ_BUF_SIZE_ENV).or(shared).unwrap_or(DEFAULT_BUF_SIZE),
            write_buf_size: size(WRITE_BUF_SIZE_ENV).or(shared).unwrap_or(DEFAULT_BUF_SIZE),
            ..Self::default()
        }
    }

    /// Set the read buffer size (zero is ignored)
    pub fn with_read_buf_size(mut self, size: usize) -> Self {
        if size > 0 {
            self.read_buf_size = size;
        }
        self
    }

    /// Set the write buffer size (zero is ignored)
    pub fn with_write_buf_size(mut self, size: usize) -> Self {
        if size > 0 {
            self.write_buf_size = size;
        }
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    #[cfg(feature = "tls")]
    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            read_buf_size: DEFAULT_BUF_SIZE,
            write_buf_size: DEFAULT_BUF_SIZE,
            capabilities: Capabilities::detect(),
            #[cfg(feature = "tls")]
            tls: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ClientConfig");
        s.field("read_buf_size", &self.read_buf_size)
            .field("write_buf_size", &self.write_buf_size)
            .field("capabilities", &self.capabilities);
        #[cfg(feature = "tls")]
        s.field("tls", &self.tls.is_some());
        s.finish()
    }
}
