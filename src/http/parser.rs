//! HTTP response parsing
//!
//! The client reads until the server closes the connection, so parsing runs
//! once over the complete response bytes. Parsing is lenient on purpose:
//! an unparseable status code becomes 0 and header lines without a `": "`
//! separator are skipped. Nothing in here returns an error.
//!
//! The header block is decoded as text (invalid UTF-8 is replaced). The body
//! is kept as raw bytes.

use super::headers::Headers;
use super::CRLF;
use bytes::Bytes;
use std::fmt;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const HEADER_SEPARATOR: &str = ": ";

/// Key of the raw header block in the response map
pub const HEADER_KEY: &str = "header";
/// Key of the body in the response map
pub const BODY_KEY: &str = "body";
/// Key of the status text in the response map
pub const STATUS_KEY: &str = "status";
/// Key of the numeric status code in the response map
pub const CODE_KEY: &str = "code";

/// A value in the response map
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Text(String),
    /// Values of a repeated header, in arrival order
    Multi(Vec<String>),
    Code(u32),
    /// Raw bytes, used for the body
    Binary(Bytes),
}

impl Field {
    /// Text of the field, or its first value when repeated
    ///
    /// Binary fields only have a text view when they are valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Field::Text(s) => Some(s),
            Field::Multi(values) => values.first().map(String::as_str),
            Field::Code(_) => None,
            Field::Binary(bytes) => std::str::from_utf8(bytes).ok(),
        }
    }

    /// Byte view of a text or binary field
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Field::Text(s) => Some(s.as_bytes()),
            Field::Binary(bytes) => Some(bytes),
            Field::Multi(_) | Field::Code(_) => None,
        }
    }

    fn push(&mut self, value: String) {
        match self {
            Field::Multi(values) => values.push(value),
            Field::Text(first) => {
                let first = std::mem::take(first);
                *self = Field::Multi(vec![first, value]);
            }
            Field::Code(code) => {
                *self = Field::Multi(vec![code.to_string(), value]);
            }
            Field::Binary(bytes) => {
                let first = String::from_utf8_lossy(bytes).into_owned();
                *self = Field::Multi(vec![first, value]);
            }
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Text(s) => f.write_str(s),
            Field::Multi(values) => f.write_str(&values.join(", ")),
            Field::Code(code) => write!(f, "{}", code),
            Field::Binary(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
        }
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Field::Text(value.to_string())
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Field::Text(value)
    }
}

impl From<u32> for Field {
    fn from(value: u32) -> Self {
        Field::Code(value)
    }
}

impl From<Bytes> for Field {
    fn from(value: Bytes) -> Self {
        Field::Binary(value)
    }
}

impl From<Vec<String>> for Field {
    fn from(values: Vec<String>) -> Self {
        Field::Multi(values)
    }
}

/// Find the first header terminator in a buffer
fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
}

/// Parse the status code token the way a lenient integer conversion does:
/// leading digits are used, anything else yields 0. Digits beyond the `u32`
/// range also yield 0.
fn parse_code(token: Option<&str>) -> u32 {
    let digits: String = token
        .unwrap_or("")
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

/// Parsed HTTP response
///
/// Everything lives in one ordered map: the raw header block under
/// `header`, the body under `body`, `status` and `code` when the first line
/// is a status line, then one entry per lower-cased header name. Header
/// values are also kept in a dedicated `Headers` collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    fields: Vec<(String, Field)>,
    headers: Headers,
}

impl Response {
    /// Parse complete response bytes
    ///
    /// Only the first blank line splits header block and body. Without one,
    /// the whole input is the header block and there is no body. Empty
    /// input yields a response with neither.
    pub fn parse(raw: &[u8]) -> Self {
        let mut response = Response::default();

        if raw.is_empty() {
            return response;
        }

        let header = match find_header_end(raw) {
            Some(pos) => {
                let header = String::from_utf8_lossy(&raw[..pos]).into_owned();
                let body = Bytes::copy_from_slice(&raw[pos + HEADER_TERMINATOR.len()..]);
                response.fields.push((HEADER_KEY.to_string(), Field::Text(header.clone())));
                response.fields.push((BODY_KEY.to_string(), Field::Binary(body)));
                header
            }
            None => {
                let header = String::from_utf8_lossy(raw).into_owned();
                response.fields.push((HEADER_KEY.to_string(), Field::Text(header.clone())));
                header
            }
        };

        response.parse_header(&header);
        response
    }

    fn parse_header(&mut self, header: &str) {
        let lines: Vec<&str> = header.split(CRLF).collect();

        if let Some(first) = lines.first().filter(|line| line.contains("HTTP/1")) {
            let trimmed = first.trim_start();
            let status = match trimmed.split_once(char::is_whitespace) {
                Some((_, rest)) => rest.trim_start(),
                None => trimmed,
            };
            let code = parse_code(trimmed.split_whitespace().nth(1));

            self.set(STATUS_KEY, status);
            self.set(CODE_KEY, code);
        }

        for line in lines {
            let Some((name, value)) = line.split_once(HEADER_SEPARATOR) else {
                continue;
            };
            let name = name.to_lowercase();

            match self.position(&name) {
                Some(idx) => self.fields[idx].1.push(value.to_string()),
                None => self.fields.push((name.clone(), Field::from(value))),
            }
            self.headers.insert(name, value);
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|(k, _)| k == key)
    }

    /// Look up any entry of the response map
    pub fn get(&self, key: &str) -> Option<&Field> {
        self.position(key).map(|idx| &self.fields[idx].1)
    }

    /// Set an entry of the response map, replacing any existing value
    ///
    /// The dedicated headers collection is not touched.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Field>) {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(idx) => self.fields[idx].1 = value,
            None => self.fields.push((key, value)),
        }
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Field::as_str)
    }

    /// Raw header block, absent for an empty response
    pub fn header(&self) -> Option<&str> {
        self.text(HEADER_KEY)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Body text, absent when the response had no blank line or the body
    /// is not valid UTF-8
    pub fn body(&self) -> Option<&str> {
        self.text(BODY_KEY)
    }

    /// Raw body bytes, absent when the response had no blank line
    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.get(BODY_KEY).and_then(Field::as_bytes)
    }

    /// Status line text after the version token, e.g. `200 OK`
    pub fn status(&self) -> Option<&str> {
        self.text(STATUS_KEY)
    }

    pub fn code(&self) -> Option<u32> {
        match self.get(CODE_KEY) {
            Some(Field::Code(code)) => Some(*code),
            _ => None,
        }
    }

    pub fn date(&self) -> Option<&str> {
        self.text("date")
    }

    pub fn content_type(&self) -> Option<&str> {
        self.text("content-type")
    }

    pub fn content_length(&self) -> Option<&str> {
        self.text("content-length")
    }

    /// Iterate over (key, value) pairs of the response map
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over the keys of the response map
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }
}

impl<'a> IntoIterator for &'a Response {
    type Item = (&'a str, &'a Field);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Field)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
