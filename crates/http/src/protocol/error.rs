use std::io;
use thiserror::Error;

/// Failure while reading the start line and header block of a request.
///
/// The set is closed: every way the parser can stop short of a complete
/// [`RequestHead`](crate::protocol::RequestHead) maps onto one of these.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("no data received before the stream completed")]
    NoData,

    #[error("incomplete line, more bytes are needed")]
    Incomplete,

    #[error("line too long, current: {current_size} exceed the limit {max_size}")]
    LineTooLong { current_size: usize, max_size: usize },

    #[error("malformed start line: {reason}")]
    MalformedStartLine { reason: String },

    #[error("invalid http method: {method}")]
    InvalidMethod { method: String },

    #[error("invalid request target: {target}")]
    InvalidRoute { target: String },

    #[error("unsupported http version: {version}")]
    UnsupportedVersion { version: String },

    #[error("invalid header name: {name}")]
    InvalidHeaderName { name: String },

    #[error("invalid value for header {name}")]
    InvalidHeaderValue { name: String },

    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    HeaderSizeExceeded { current_size: usize, max_size: usize },

    #[error("request parsing was cancelled")]
    Cancelled,
}

/// Field-less discriminant of [`ParseError`], handy for comparing outcomes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    NoData,
    Incomplete,
    LineTooLong,
    MalformedStartLine,
    InvalidMethod,
    InvalidRoute,
    UnsupportedVersion,
    InvalidHeaderName,
    InvalidHeaderValue,
    HeaderSizeExceeded,
    Cancelled,
}

impl ParseError {
    pub fn line_too_long(current_size: usize, max_size: usize) -> Self {
        Self::LineTooLong { current_size, max_size }
    }

    pub fn header_size_exceeded(current_size: usize, max_size: usize) -> Self {
        Self::HeaderSizeExceeded { current_size, max_size }
    }

    pub fn malformed_start_line<S: ToString>(str: S) -> Self {
        Self::MalformedStartLine { reason: str.to_string() }
    }

    pub fn invalid_method(bytes: &[u8]) -> Self {
        Self::InvalidMethod { method: String::from_utf8_lossy(bytes).into_owned() }
    }

    pub fn invalid_route(bytes: &[u8]) -> Self {
        Self::InvalidRoute { target: String::from_utf8_lossy(bytes).into_owned() }
    }

    pub fn unsupported_version(bytes: &[u8]) -> Self {
        Self::UnsupportedVersion { version: String::from_utf8_lossy(bytes).into_owned() }
    }

    pub fn invalid_header_name(bytes: &[u8]) -> Self {
        Self::InvalidHeaderName { name: String::from_utf8_lossy(bytes).into_owned() }
    }

    pub fn invalid_header_value(name: &[u8]) -> Self {
        Self::InvalidHeaderValue { name: String::from_utf8_lossy(name).into_owned() }
    }

    pub fn kind(&self) -> ParseErrorKind {
        match self {
            Self::NoData => ParseErrorKind::NoData,
            Self::Incomplete => ParseErrorKind::Incomplete,
            Self::LineTooLong { .. } => ParseErrorKind::LineTooLong,
            Self::MalformedStartLine { .. } => ParseErrorKind::MalformedStartLine,
            Self::InvalidMethod { .. } => ParseErrorKind::InvalidMethod,
            Self::InvalidRoute { .. } => ParseErrorKind::InvalidRoute,
            Self::UnsupportedVersion { .. } => ParseErrorKind::UnsupportedVersion,
            Self::InvalidHeaderName { .. } => ParseErrorKind::InvalidHeaderName,
            Self::InvalidHeaderValue { .. } => ParseErrorKind::InvalidHeaderValue,
            Self::HeaderSizeExceeded { .. } => ParseErrorKind::HeaderSizeExceeded,
            Self::Cancelled => ParseErrorKind::Cancelled,
        }
    }

    /// Whether the failure came from the peer going away rather than from
    /// malformed input.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::NoData | Self::Cancelled)
    }
}

/// A failing transport means the peer is gone; used by the `tokio_util` decoder.
impl From<io::Error> for ParseError {
    fn from(_e: io::Error) -> Self {
        Self::Cancelled
    }
}

/// Failure while reading a request body through [`RequestBody`](crate::protocol::RequestBody).
#[derive(Error, Debug)]
pub enum BodyError {
    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("body of {length} bytes exceed the limit {max_size}")]
    TooLarge { length: u64, max_size: usize },

    #[error("stream completed after {received} of {expected} body bytes")]
    UnexpectedEof { received: usize, expected: usize },

    #[error("body read was cancelled")]
    Cancelled,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl BodyError {
    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }
}
