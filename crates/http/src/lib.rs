//! Incremental HTTP/1.1 request parsing
//!
//! This crate reads the start line and header block of an HTTP/1.1 request off
//! a byte stream that may deliver its data in arbitrarily short pieces. It never
//! waits for a full buffered request: each window is parsed as far as it goes,
//! the consumed bytes are released, and parsing resumes on the next read.
//!
//! # Example
//!
//! ```no_run
//! use strata_http::codec::RequestParser;
//! use strata_http::config::ParserConfig;
//! use strata_http::stream::ReaderStream;
//! use tokio::net::TcpListener;
//! use tokio_util::sync::CancellationToken;
//! use tracing::{info, warn};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let parser = RequestParser::new(ParserConfig::new().with_max_header_size(4 * 1024));
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = listener.accept().await?;
//!         let (reader, _writer) = tcp_stream.into_split();
//!
//!         match parser.parse(ReaderStream::new(reader), &CancellationToken::new()).await {
//!             Ok(request) => info!(method = %request.head().method(), path = request.head().path(), "received request"),
//!             Err(e) => warn!(cause = %e, "invalid request"),
//!         }
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`stream`]: the [`ByteStream`](stream::ByteStream) read/advance contract and
//!   its socket and in-memory implementations
//! - [`codec`]: line parsers, the resumable decoder and the async
//!   [`RequestParser`](codec::RequestParser)
//! - [`protocol`]: methods, versions, the normalized header collection, the
//!   parsed request and the error types
//! - [`config`]: size limits
//!
//! # Limits
//!
//! A single line and the sum of all header lines are both bounded by
//! [`ParserConfig::max_header_size`](config::ParserConfig::max_header_size),
//! 8 KiB by default. Line lengths exclude the `CRLF` terminator.
//!
//! # Errors
//!
//! Every failure is reported as data through [`ParseError`](protocol::ParseError)
//! or [`BodyError`](protocol::BodyError); the parser never panics on input.

pub mod codec;
pub mod config;
pub mod protocol;
pub mod stream;

mod utils;
pub(crate) use utils::ensure;
