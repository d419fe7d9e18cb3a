//! Resumable request head state machine
//!
//! [`RequestDecoder`] consumes one line per [`decode_line`](RequestDecoder::decode_line)
//! call and keeps its progress between calls, so it can be fed whatever window
//! the transport delivers next. It is shared by the async
//! [`RequestParser`](crate::codec::RequestParser) and by its
//! [`Decoder`] implementation, which plugs it into `tokio_util::codec::FramedRead`.
//!
//! # State Machine
//!
//! - `StartLine`: waiting for the request line
//! - `Headers`: appending header lines until the empty terminator line
//!
//! Reaching the terminator yields [`DecodeStep::Complete`] and resets the
//! decoder to `StartLine` for the next request on the same buffer.

use std::mem;

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::header_line::{parse_header_line, HeaderLine};
use crate::codec::request_line::{parse_request_line, RequestLine};
use crate::config::ParserConfig;
use crate::protocol::{HeaderCollection, ParseError, RequestHead};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum DecodeState {
    StartLine,
    Headers,
}

/// Result of feeding one window to [`RequestDecoder::decode_line`].
#[derive(Debug)]
pub enum DecodeStep {
    /// No complete line in the window; wait for more bytes.
    NeedMore,
    /// One line was consumed; call again with the remaining window.
    Line { consumed: usize },
    /// The header block is complete.
    Complete { head: RequestHead, consumed: usize },
}

#[derive(Debug)]
pub struct RequestDecoder {
    config: ParserConfig,
    state: DecodeState,
    request_line: Option<RequestLine>,
    headers: HeaderCollection,
    /// running total of header line bytes, terminators excluded
    header_bytes: usize,
}

impl RequestDecoder {
    pub fn new(config: ParserConfig) -> Self {
        Self { config, state: DecodeState::StartLine, request_line: None, headers: HeaderCollection::new(), header_bytes: 0 }
    }

    /// Whether part of a request head has been consumed already.
    pub fn in_progress(&self) -> bool {
        self.state != DecodeState::StartLine
    }

    /// Consumes at most one line from the front of `window`.
    pub fn decode_line(&mut self, window: &[u8]) -> Result<DecodeStep, ParseError> {
        let max_size = self.config.max_header_size();

        match self.state {
            DecodeState::StartLine => match parse_request_line(window, max_size) {
                Ok((request_line, consumed)) => {
                    trace!(method = %request_line.method, route = %request_line.route, consumed, "parsed start line");
                    self.request_line = Some(request_line);
                    self.state = DecodeState::Headers;
                    Ok(DecodeStep::Line { consumed })
                }
                Err(ParseError::Incomplete) => Ok(DecodeStep::NeedMore),
                Err(e) => Err(e),
            },

            // every header line is bounded by what is left of the block budget, complete or not,
            // so the reported error does not depend on where the window was cut
            DecodeState::Headers => match parse_header_line(window, max_size - self.header_bytes, &mut self.headers) {
                Ok((HeaderLine::HeaderParsed, consumed)) => {
                    self.header_bytes += consumed - 2;
                    Ok(DecodeStep::Line { consumed })
                }
                Ok((HeaderLine::EndOfHeaders, consumed)) => {
                    let head = self.finish()?;
                    trace!(header_bytes = self.header_bytes, headers = head.headers().len(), "parsed header block");
                    self.reset();
                    Ok(DecodeStep::Complete { head, consumed })
                }
                Err(ParseError::Incomplete) => Ok(DecodeStep::NeedMore),
                Err(ParseError::LineTooLong { current_size, .. }) => {
                    Err(ParseError::header_size_exceeded(self.header_bytes + current_size, max_size))
                }
                Err(e) => Err(e),
            },
        }
    }

    fn finish(&mut self) -> Result<RequestHead, ParseError> {
        let RequestLine { method, route, version } =
            self.request_line.take().ok_or_else(|| ParseError::malformed_start_line("header block without start line"))?;
        Ok(RequestHead::new(method, route, version, mem::take(&mut self.headers)))
    }

    /// Drops any partial progress and waits for a new start line.
    pub fn reset(&mut self) {
        self.state = DecodeState::StartLine;
        self.request_line = None;
        self.headers = HeaderCollection::new();
        self.header_bytes = 0;
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl Decoder for RequestDecoder {
    type Item = RequestHead;
    type Error = ParseError;

    /// Decodes as many lines as `src` holds.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(head))`: a complete request head; `src` starts at the body
    /// - `Ok(None)`: need more data to proceed
    /// - `Err(_)`: the head is invalid
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.decode_line(&src[..])? {
                DecodeStep::NeedMore => return Ok(None),
                DecodeStep::Line { consumed } => src.advance(consumed),
                DecodeStep::Complete { head, consumed } => {
                    src.advance(consumed);
                    return Ok(Some(head));
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(head) => Ok(Some(head)),
            None if src.is_empty() && !self.in_progress() => Ok(None),
            None => Err(ParseError::Cancelled),
        }
    }
}
