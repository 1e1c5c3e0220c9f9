//! HTTP message types
//!
//! This module defines the request side of the client: the connection
//! target, the supported methods, and the assembly of request bytes.

use super::headers::{capitalize, HeaderValue, Headers};
use super::{Error, Result, CRLF, DEFAULT_ACCEPT, DEFAULT_HTTPS_PORT, DEFAULT_HTTP_PORT, HTTP_VERSION};
use bytes::{BufMut, Bytes, BytesMut};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Name of the pseudo-header that carries the request body
pub const BODY_PSEUDO_HEADER: &str = "Body";

/// HTTP methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl Method {
    /// Convert method to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }

    /// Whether the request always carries a `Content-Length`
    pub fn sends_content_length(&self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Connection scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
    /// HTTP over a Unix domain socket; the address is a filesystem path
    Unix,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::Unix => "unix",
        }
    }
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            "unix" => Ok(Scheme::Unix),
            _ => Err(Error::InvalidScheme(s.to_string())),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where requests are sent
///
/// For `unix` targets the address is a socket path and there is no port.
/// Otherwise the port is always set: either given explicitly, or the default
/// for the scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    scheme: Scheme,
    address: String,
    port: Option<u16>,
}

impl Target {
    /// Build a target
    ///
    /// `tls_available` decides the `https` default port: 443 when TLS can be
    /// used, 80 otherwise.
    pub fn new(
        scheme: Scheme,
        address: impl Into<String>,
        port: Option<u16>,
        tls_available: bool,
    ) -> Self {
        let port = match scheme {
            Scheme::Unix => None,
            Scheme::Https if tls_available => Some(port.unwrap_or(DEFAULT_HTTPS_PORT)),
            _ => Some(port.unwrap_or(DEFAULT_HTTP_PORT)),
        };

        Target {
            scheme,
            address: address.into(),
            port,
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Host name, IP address, or socket path for `unix` targets
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

/// Normalize a request path: empty becomes `/`, anything else gets a
/// leading `/` if it lacks one
pub fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// An assembled HTTP/1.0 request
///
/// Header names are capitalized and kept sorted, which is also the order
/// they are written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    path: String,
    headers: BTreeMap<String, HeaderValue>,
    body: Bytes,
}

impl Request {
    /// Assemble a request from caller headers
    ///
    /// - caller header names are capitalized, repeats fold into one entry
    /// - `Host` (the target address) and `Accept: */*` are added if absent
    /// - `Connection: close` always replaces any caller value
    /// - a `Body` entry becomes the body and is removed from the headers
    /// - POST and PUT get a `Content-Length` unless the caller set one
    pub fn new(method: Method, path: &str, req: &Headers, target: &Target) -> Self {
        let mut headers: BTreeMap<String, HeaderValue> = BTreeMap::new();

        for (name, value) in req.iter() {
            let name = capitalize(name);
            for v in value.values() {
                match headers.get_mut(&name) {
                    Some(existing) => existing.push(v),
                    None => {
                        headers.insert(name.clone(), HeaderValue::from(v));
                    }
                }
            }
        }

        // Unix targets send the socket path as Host
        headers
            .entry("Host".to_string())
            .or_insert_with(|| HeaderValue::from(target.address()));
        headers
            .entry("Accept".to_string())
            .or_insert_with(|| HeaderValue::from(DEFAULT_ACCEPT));
        headers.insert("Connection".to_string(), HeaderValue::from("close"));

        let body = headers
            .remove(BODY_PSEUDO_HEADER)
            .map(|value| Bytes::from(value.values().collect::<String>()))
            .unwrap_or_default();

        if method.sends_content_length() && !headers.contains_key(&capitalize("Content-Length")) {
            headers.insert(
                "Content-Length".to_string(),
                HeaderValue::from(body.len().to_string()),
            );
        }

        Request {
            method,
            path: normalize_path(path),
            headers,
            body,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &BTreeMap<String, HeaderValue> {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Serialize to wire format
    ///
    /// A multi-value header is written as one line per value.
    pub fn to_wire(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(256 + self.body.len());

        buf.put_slice(
            format!("{} {} {}{}", self.method, self.path, HTTP_VERSION, CRLF).as_bytes(),
        );

        for (name, value) in &self.headers {
            for v in value.values() {
                buf.put_slice(format!("{}: {}{}", name, v, CRLF).as_bytes());
            }
        }

        buf.put_slice(CRLF.as_bytes());
        buf.put_slice(&self.body);

        buf.freeze()
    }
}

/// Build the wire bytes for a request in one step
pub fn create_request_header(method: Method, path: &str, req: &Headers, target: &Target) -> Bytes {
    Request::new(method, path, req, target).to_wire()
}
