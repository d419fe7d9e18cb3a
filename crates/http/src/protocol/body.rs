use std::fmt;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use crate::protocol::{BodyError, RequestHead};
use crate::stream::{ByteStream, ChunkedStream};

/// Handle to the part of the connection that follows the header block.
///
/// The parser never reads from it; handlers decide whether and how much of the
/// body to pull.
pub struct RequestBody {
    stream: Box<dyn ByteStream>,
}

impl RequestBody {
    pub fn new<S: ByteStream + 'static>(stream: S) -> Self {
        Self { stream: Box::new(stream) }
    }

    /// A body with no bytes behind it.
    pub fn empty() -> Self {
        Self::new(ChunkedStream::empty())
    }

    /// Bytes that arrived together with the header block and are not consumed yet.
    pub fn buffered(&self) -> &[u8] {
        self.stream.peek()
    }

    /// Reads exactly `len` bytes.
    pub async fn read_exact(&mut self, len: usize, cancel: &CancellationToken) -> Result<Bytes, BodyError> {
        loop {
            let available = self.stream.peek();
            if available.len() >= len {
                let bytes = Bytes::copy_from_slice(&available[..len]);
                self.stream.advance(len);
                trace!(len, "read request body");
                return Ok(bytes);
            }

            let (received, completed, canceled) = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(BodyError::Cancelled),
                result = self.stream.read() => {
                    let result = result.inspect_err(|e| warn!(cause = %e, "failed to read request body"))?;
                    (result.buffer().len(), result.is_completed(), result.is_canceled())
                }
            };

            if canceled {
                return Err(BodyError::Cancelled);
            }
            if completed && received < len {
                return Err(BodyError::UnexpectedEof { received, expected: len });
            }
        }
    }

    /// Reads the body declared by `head`'s `Content-Length`, refusing anything above `max_size`.
    pub async fn collect(
        &mut self,
        head: &RequestHead,
        max_size: usize,
        cancel: &CancellationToken,
    ) -> Result<Bytes, BodyError> {
        let Some(length) = head.content_length()? else {
            return Ok(Bytes::new());
        };

        let len = usize::try_from(length)
            .ok()
            .filter(|len| *len <= max_size)
            .ok_or(BodyError::TooLarge { length, max_size })?;

        self.read_exact(len, cancel).await
    }

    pub fn into_stream(self) -> Box<dyn ByteStream> {
        self.stream
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBody").field("buffered", &self.stream.peek().len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{HeaderCollection, HttpVersion, Method};
    use http::Uri;

    fn post_with_length(length: &str) -> RequestHead {
        let mut headers = HeaderCollection::new();
        headers.append("Content-Length", length).unwrap();
        RequestHead::new(Method::Post, Uri::from_static("/"), HttpVersion::Http11, headers)
    }

    #[tokio::test]
    async fn reads_body_across_chunks() {
        let mut body = RequestBody::new(ChunkedStream::new([&b"hel"[..], &b"lo wor"[..], &b"ld"[..]]));
        let cancel = CancellationToken::new();

        let bytes = body.collect(&post_with_length("11"), 1024, &cancel).await.unwrap();
        assert_eq!(&bytes[..], b"hello world");
    }

    #[tokio::test]
    async fn reports_truncated_body() {
        let mut body = RequestBody::new(ChunkedStream::single(&b"short"[..]));
        let cancel = CancellationToken::new();

        let error = body.read_exact(10, &cancel).await.unwrap_err();
        assert!(matches!(error, BodyError::UnexpectedEof { received: 5, expected: 10 }));
    }

    #[tokio::test]
    async fn refuses_oversized_body() {
        let mut body = RequestBody::empty();
        let cancel = CancellationToken::new();

        let error = body.collect(&post_with_length("4096"), 1024, &cancel).await.unwrap_err();
        assert!(matches!(error, BodyError::TooLarge { length: 4096, max_size: 1024 }));
    }

    #[tokio::test]
    async fn observes_cancellation() {
        let mut body = RequestBody::new(ChunkedStream::single(&b"abc"[..]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(matches!(body.read_exact(10, &cancel).await, Err(BodyError::Cancelled)));
    }
}
