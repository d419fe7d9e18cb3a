//! Parsed request types.
//!
//! [`RequestHead`] is what the parser produces from the start line and header
//! block. [`Request`] pairs it with the [`RequestBody`] handle positioned at the
//! first body byte.

use http::Uri;

use crate::protocol::{BodyError, HeaderCollection, HttpVersion, Method, RequestBody};

/// Start line and headers of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    method: Method,
    route: Uri,
    version: HttpVersion,
    headers: HeaderCollection,
}

impl RequestHead {
    pub fn new(method: Method, route: Uri, version: HttpVersion, headers: HeaderCollection) -> Self {
        Self { method, route, version, headers }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// The request target, always in origin form (no scheme or authority).
    pub fn route(&self) -> &Uri {
        &self.route
    }

    pub fn path(&self) -> &str {
        self.route.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.route.query()
    }

    pub fn version(&self) -> HttpVersion {
        self.version
    }

    pub fn headers(&self) -> &HeaderCollection {
        &self.headers
    }

    /// Declared body length, `None` when the request carries no body.
    ///
    /// Bodyless methods always yield `None`. A request that declares both a
    /// `Transfer-Encoding` and a `Content-Length` is rejected, as is a length
    /// that isn't a plain decimal number.
    pub fn content_length(&self) -> Result<Option<u64>, BodyError> {
        if self.method.is_bodyless() {
            return Ok(None);
        }

        // refer: https://www.rfc-editor.org/rfc/rfc9112.html#name-transfer-encoding
        let te_header = self.headers.get("Transfer-Encoding");
        let cl_header = self.headers.get("Content-Length");

        match (te_header, cl_header) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(BodyError::invalid_content_length("transfer-encoding is not supported")),
            (None, Some(cl_str)) => {
                let length = cl_str
                    .trim()
                    .parse::<u64>()
                    .map_err(|_e| BodyError::invalid_content_length(format!("value {cl_str} is not u64")))?;
                Ok(Some(length))
            }
            (Some(_), Some(_)) => {
                Err(BodyError::invalid_content_length("transfer_encoding and content_length both present in headers"))
            }
        }
    }

    /// Converts into the `http` crate's request head.
    pub fn to_http(&self) -> Result<http::Request<()>, http::Error> {
        let mut builder = http::Request::builder()
            .method(http::Method::from(self.method))
            .uri(self.route.clone())
            .version(self.version.into());

        if let Some(headers) = builder.headers_mut() {
            *headers = self.headers.to_header_map()?;
        }

        builder.body(())
    }
}

/// A parsed head plus the still-open body stream.
#[derive(Debug)]
pub struct Request {
    head: RequestHead,
    body: RequestBody,
}

impl Request {
    pub fn new(head: RequestHead, body: RequestBody) -> Self {
        Self { head, body }
    }

    pub fn head(&self) -> &RequestHead {
        &self.head
    }

    pub fn body_mut(&mut self) -> &mut RequestBody {
        &mut self.body
    }

    pub fn into_parts(self) -> (RequestHead, RequestBody) {
        (self.head, self.body)
    }
}
