use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use crate::codec::request_decoder::{DecodeStep, RequestDecoder};
use crate::config::ParserConfig;
use crate::protocol::{ParseError, Request, RequestBody, RequestHead};
use crate::stream::ByteStream;

/// Reads one request head off a [`ByteStream`].
///
/// The parser only awaits at the stream boundary: every window handed out by
/// [`ByteStream::read`] is run through a [`RequestDecoder`] line by line, the
/// consumed byte count is reported back through [`ByteStream::advance`], and
/// the next read resumes wherever the last line left off.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestParser {
    config: ParserConfig,
}

impl RequestParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses the head and hands the rest of `stream` out as the request body.
    pub async fn parse<S>(&self, mut stream: S, cancel: &CancellationToken) -> Result<Request, ParseError>
    where
        S: ByteStream + 'static,
    {
        let head = self.parse_head(&mut stream, cancel).await?;
        Ok(Request::new(head, RequestBody::new(stream)))
    }

    /// Parses the head only, leaving `stream` positioned at the first body byte.
    ///
    /// # Errors
    ///
    /// - [`ParseError::NoData`] when the first read yields no bytes
    /// - [`ParseError::Cancelled`] when `cancel` fires, the stream reports
    ///   completion or cancellation before the terminating empty line, or the
    ///   stream fails with an I/O error
    /// - any of the syntax or size errors raised by the line parsers
    pub async fn parse_head<S>(&self, stream: &mut S, cancel: &CancellationToken) -> Result<RequestHead, ParseError>
    where
        S: ByteStream + ?Sized,
    {
        let mut decoder = RequestDecoder::new(self.config);
        let mut first_read = true;

        loop {
            if cancel.is_cancelled() {
                return Err(ParseError::Cancelled);
            }

            let read = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ParseError::Cancelled),
                read = stream.read() => read,
            };

            let result = match read {
                Ok(result) => result,
                Err(e) => {
                    warn!(cause = %e, "failed to read request head");
                    return Err(ParseError::Cancelled);
                }
            };

            if result.is_canceled() {
                return Err(ParseError::Cancelled);
            }

            let window = result.buffer();
            if first_read && window.is_empty() {
                return Err(ParseError::NoData);
            }
            first_read = false;
            let completed = result.is_completed();

            let mut offset = 0;
            let head = loop {
                if cancel.is_cancelled() {
                    return Err(ParseError::Cancelled);
                }

                match decoder.decode_line(&window[offset..])? {
                    DecodeStep::NeedMore => break None,
                    DecodeStep::Line { consumed } => offset += consumed,
                    DecodeStep::Complete { head, consumed } => {
                        offset += consumed;
                        break Some(head);
                    }
                }
            };

            trace!(consumed = offset, buffered = window.len(), "consumed request head bytes");
            stream.advance(offset);

            if let Some(head) = head {
                return Ok(head);
            }

            if completed {
                // the peer hung up in the middle of the head
                return Err(ParseError::Cancelled);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{HttpVersion, Method, ParseErrorKind};
    use crate::stream::ChunkedStream;
    use indoc::indoc;

    const SIMPLE_GET: &str = "GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";

    async fn parse(stream: ChunkedStream) -> Result<Request, ParseError> {
        RequestParser::default().parse(stream, &CancellationToken::new()).await
    }

    async fn parse_err(input: &'static str) -> ParseErrorKind {
        parse(ChunkedStream::single(input)).await.unwrap_err().kind()
    }

    /// Parses `input` whole, split at every offset, and in small fixed chunks,
    /// asserting that each feeding gives `expected` (header count or error kind).
    async fn assert_every_split(max_header_size: usize, input: &str, expected: Result<usize, ParseErrorKind>) {
        let parser = RequestParser::new(ParserConfig::new().with_max_header_size(max_header_size));
        let cancel = CancellationToken::new();
        let outcome = |result: Result<Request, ParseError>| result.map(|r| r.head().headers().len()).map_err(|e| e.kind());

        let whole = parser.parse(ChunkedStream::single(input.to_owned()), &cancel).await;
        assert_eq!(outcome(whole), expected, "whole input");

        for split in 1..input.len() {
            let result = parser.parse(ChunkedStream::split_at(input.to_owned(), &[split]), &cancel).await;
            assert_eq!(outcome(result), expected, "split at {split}");
        }

        for size in [1, 2, 3, 7] {
            let result = parser.parse(ChunkedStream::every(input.to_owned(), size), &cancel).await;
            assert_eq!(outcome(result), expected, "chunks of {size}");
        }
    }

    #[tokio::test]
    async fn parses_simple_get() {
        let request = parse(ChunkedStream::single(SIMPLE_GET)).await.unwrap();
        let head = request.head();

        assert_eq!(head.method(), Method::Get);
        assert_eq!(head.path(), "/");
        assert_eq!(head.version(), HttpVersion::Http11);
        assert_eq!(head.headers().len(), 1);
        assert_eq!(head.headers().get("Host"), Some("localhost"));
    }

    #[tokio::test]
    async fn reports_unsupported_version() {
        assert_eq!(parse_err("GET / HTTP/9.9\r\n\r\n").await, ParseErrorKind::UnsupportedVersion);
    }

    #[tokio::test]
    async fn reports_invalid_method() {
        assert_eq!(parse_err("BADMETHOD / HTTP/1.1\r\n\r\n").await, ParseErrorKind::InvalidMethod);
    }

    #[tokio::test]
    async fn reports_header_errors() {
        assert_eq!(parse_err("GET / HTTP/1.1\r\nBad Header: x\r\n\r\n").await, ParseErrorKind::InvalidHeaderName);
        assert_eq!(parse_err("GET / HTTP/1.1\r\nX-Bin: \x01\r\n\r\n").await, ParseErrorKind::InvalidHeaderValue);
    }

    #[tokio::test]
    async fn same_result_at_every_split_point() {
        let input = indoc! {"
        POST /submit?id=7 HTTP/1.0\r
        Host: example.com\r
        content-type: text/plain\r
        X-Forwarded-For: 10.0.0.1\r
        x-forwarded-for: 10.0.0.2\r
        \r
        "};

        let expected = parse(ChunkedStream::single(input)).await.unwrap();

        for split in 1..input.len() {
            let request = parse(ChunkedStream::split_at(input, &[split])).await.unwrap();
            assert_eq!(request.head(), expected.head(), "split at {split}");
        }

        for size in [1, 2, 3, 7] {
            let request = parse(ChunkedStream::every(input, size)).await.unwrap();
            assert_eq!(request.head(), expected.head(), "chunks of {size}");
        }

        let head = expected.head();
        assert_eq!(head.method(), Method::Post);
        assert_eq!(head.query(), Some("id=7"));
        assert_eq!(head.headers().get_all("X-FORWARDED-FOR").collect::<Vec<_>>(), ["10.0.0.1", "10.0.0.2"]);
        assert_eq!(head.headers().get("Content-Type"), Some("text/plain"));
    }

    #[tokio::test]
    async fn same_error_at_every_split_point() {
        let oversized = "GET / HTTP/1.1\r\nX-A: 0123456789\r\nX-B: 0123456789012345678901\r\n\r\n";
        assert_every_split(20, oversized, Err(ParseErrorKind::HeaderSizeExceeded)).await;

        // the block budget is spent before the line could be validated
        let oversized_invalid = "GET / HTTP/1.1\r\nX-A: 0123456789\r\nBad Header 0123456789\r\n\r\n";
        assert_every_split(20, oversized_invalid, Err(ParseErrorKind::HeaderSizeExceeded)).await;

        let invalid = "GET / HTTP/1.1\r\nX-A: 0123\r\nBad Header\r\n\r\n";
        assert_every_split(64, invalid, Err(ParseErrorKind::InvalidHeaderName)).await;

        let long_start = "GET /0123456789012345678901 HTTP/1.1\r\n\r\n";
        assert_every_split(20, long_start, Err(ParseErrorKind::LineTooLong)).await;
    }

    #[tokio::test]
    async fn header_limit_boundaries() {
        // one header line of exactly 24 bytes
        let line = format!("GET / HTTP/1.1\r\nX-Pad: {}\r\n\r\n", "p".repeat(17));
        assert_every_split(24, &line, Ok(1)).await;

        let line = format!("GET / HTTP/1.1\r\nX-Pad: {}\r\n\r\n", "p".repeat(18));
        assert_every_split(24, &line, Err(ParseErrorKind::HeaderSizeExceeded)).await;

        // two lines of 12 bytes reach the limit exactly
        let total = "GET / HTTP/1.1\r\nX-A: 0123456\r\nX-B: 0123456\r\n\r\n";
        assert_every_split(24, total, Ok(2)).await;

        let total = "GET / HTTP/1.1\r\nX-A: 0123456\r\nX-B: 01234567\r\n\r\n";
        assert_every_split(24, total, Err(ParseErrorKind::HeaderSizeExceeded)).await;
    }

    #[tokio::test]
    async fn enforces_size_limits() {
        let parser = RequestParser::new(ParserConfig::new().with_max_header_size(24));
        let cancel = CancellationToken::new();

        // start line of exactly 24 bytes
        let exact = "GET /aaaaaaaaaa HTTP/1.1\r\n\r\n";
        assert!(parser.parse(ChunkedStream::single(exact), &cancel).await.is_ok());

        let longer = "GET /aaaaaaaaaaa HTTP/1.1\r\n\r\n";
        let error = parser.parse(ChunkedStream::single(longer), &cancel).await.unwrap_err();
        assert_eq!(error.kind(), ParseErrorKind::LineTooLong);

        let flood = "GET / HTTP/1.1\r\nA: 1\r\nB: 2\r\nC: 3\r\nD: 4\r\nE: 5\r\nF: 6\r\nG: 7\r\n\r\n";
        let error = parser.parse(ChunkedStream::every(flood, 4), &cancel).await.unwrap_err();
        assert_eq!(error.kind(), ParseErrorKind::HeaderSizeExceeded);
    }

    #[tokio::test]
    async fn empty_stream_is_no_data() {
        let error = parse(ChunkedStream::empty()).await.unwrap_err();
        assert_eq!(error.kind(), ParseErrorKind::NoData);
        assert!(error.is_disconnect());
    }

    #[tokio::test]
    async fn truncated_head_is_cancelled() {
        let error = parse(ChunkedStream::single("GET / HTTP/1.1\r\nHost: loc")).await.unwrap_err();
        assert_eq!(error.kind(), ParseErrorKind::Cancelled);

        let error = parse(ChunkedStream::single("GET / HTTP/1.1\r\n").cancel_at_end()).await.unwrap_err();
        assert_eq!(error.kind(), ParseErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn observes_cancellation_token() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let error = RequestParser::default().parse(ChunkedStream::single(SIMPLE_GET), &cancel).await.unwrap_err();
        assert_eq!(error.kind(), ParseErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn leaves_body_unread() {
        let input = "POST /echo HTTP/1.1\r\nContent-Length: 11\r\n\r\nhello world";
        let mut request = parse(ChunkedStream::split_at(input, &[20, 45])).await.unwrap();

        assert_eq!(request.head().content_length().unwrap(), Some(11));
        assert_eq!(request.body_mut().buffered(), b"he");

        let cancel = CancellationToken::new();
        let head = request.head().clone();
        let body = request.body_mut().collect(&head, 1024, &cancel).await.unwrap();
        assert_eq!(&body[..], b"hello world");
    }
}
