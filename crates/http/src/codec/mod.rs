//! Request head decoding
//!
//! This module turns the bytes of a start line and header block into a
//! [`RequestHead`](crate::protocol::RequestHead). Parsing is line oriented and
//! resumable: nothing is buffered beyond what the [`ByteStream`](crate::stream::ByteStream)
//! already holds, and a window that ends mid-line simply waits for the next read.
//!
//! # Architecture
//!
//! - Line parsers:
//!   - `request_line`: [`parse_request_line`] for `METHOD SP target SP VERSION`
//!   - `header_line`: [`parse_header_line`] for one `Name: value` line
//! - State machine:
//!   - [`RequestDecoder`]: start line then headers, with the running size
//!     limit; also usable as a `tokio_util::codec::Decoder`
//! - Orchestration:
//!   - [`RequestParser`]: drives the decoder over a byte stream, observes
//!     cancellation and hands the remaining stream out as the body
//!
//! # Example
//!
//! ```no_run
//! use strata_http::codec::RequestParser;
//! use strata_http::stream::ChunkedStream;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), strata_http::protocol::ParseError> {
//! let stream = ChunkedStream::single(&b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n"[..]);
//! let request = RequestParser::default().parse(stream, &CancellationToken::new()).await?;
//! assert_eq!(request.head().headers().get("host"), Some("localhost"));
//! # Ok(())
//! # }
//! ```

mod header_line;
mod line;
mod request_decoder;
mod request_line;
mod request_parser;

pub use header_line::{parse_header_line, HeaderLine};
pub use request_decoder::{DecodeStep, RequestDecoder};
pub use request_line::{parse_request_line, RequestLine};
pub use request_parser::RequestParser;
