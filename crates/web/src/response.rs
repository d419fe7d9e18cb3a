use bytes::Bytes;
use http::StatusCode;
use mime::Mime;

/// The answer a responder gives: a status code with an optional body.
///
/// Rendering it onto the wire is left to the host; see [`Server`](crate::Server).
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseStatus {
    status: StatusCode,
    body: Option<Bytes>,
    content_type: Option<Mime>,
}

impl ResponseStatus {
    pub fn new(status: StatusCode) -> Self {
        Self { status, body: None, content_type: None }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    /// A `text/plain; charset=utf-8` response.
    pub fn text(status: StatusCode, text: impl Into<String>) -> Self {
        Self::new(status).with_body(text.into(), mime::TEXT_PLAIN_UTF_8)
    }

    pub fn with_body(mut self, body: impl Into<Bytes>, content_type: Mime) -> Self {
        self.body = Some(body.into());
        self.content_type = Some(content_type);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn content_type(&self) -> Option<&Mime> {
        self.content_type.as_ref()
    }

    pub fn content_length(&self) -> usize {
        self.body.as_ref().map_or(0, Bytes::len)
    }
}

impl From<StatusCode> for ResponseStatus {
    fn from(status: StatusCode) -> Self {
        Self::new(status)
    }
}
