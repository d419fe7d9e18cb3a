use std::fmt;

/// Protocol versions understood by the parser. HTTP/2 and HTTP/3 are out of reach
/// of a text start line and are not represented.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum HttpVersion {
    Http10,
    Http11,
}

impl HttpVersion {
    /// Case-insensitive match of the version token, e.g. `HTTP/1.1` or `http/1.0`.
    pub fn from_bytes(token: &[u8]) -> Option<HttpVersion> {
        if token.eq_ignore_ascii_case(b"http/1.1") {
            Some(HttpVersion::Http11)
        } else if token.eq_ignore_ascii_case(b"http/1.0") {
            Some(HttpVersion::Http10)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVersion::Http10 => "HTTP/1.0",
            HttpVersion::Http11 => "HTTP/1.1",
        }
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpVersion> for http::Version {
    fn from(version: HttpVersion) -> Self {
        match version {
            HttpVersion::Http10 => http::Version::HTTP_10,
            HttpVersion::Http11 => http::Version::HTTP_11,
        }
    }
}
