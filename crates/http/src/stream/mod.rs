//! Buffered byte sources the parser reads from.
//!
//! A [`ByteStream`] hands out everything it has buffered so far and lets the
//! caller say how much of it was consumed. Bytes that were handed out but not
//! consumed are returned again by the next [`read`](ByteStream::read), together
//! with whatever arrived in between, so a parser can stop in the middle of a
//! line and pick up where it left off.
//!
//! # Implementations
//!
//! - [`ReaderStream`]: wraps any `tokio::io::AsyncRead`, typically the read half
//!   of a TCP stream
//! - [`ChunkedStream`]: replays a fixed sequence of in-memory chunks, which makes
//!   short reads reproducible in tests and benchmarks

mod chunked_stream;
mod reader_stream;

pub use chunked_stream::ChunkedStream;
pub use reader_stream::ReaderStream;

use async_trait::async_trait;
use std::io;

/// The window returned by one [`ByteStream::read`] call.
#[derive(Debug, Clone, Copy)]
pub struct ReadResult<'a> {
    buffer: &'a [u8],
    is_completed: bool,
    is_canceled: bool,
}

impl<'a> ReadResult<'a> {
    pub fn new(buffer: &'a [u8], is_completed: bool, is_canceled: bool) -> Self {
        Self { buffer, is_completed, is_canceled }
    }

    /// All buffered, not yet consumed bytes.
    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    /// The producer has finished; no byte beyond `buffer` will ever arrive.
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    /// The producer gave up, e.g. the connection was torn down.
    pub fn is_canceled(&self) -> bool {
        self.is_canceled
    }
}

#[async_trait]
pub trait ByteStream: Send {
    /// Waits for bytes beyond the ones already handed out, then returns the whole
    /// unconsumed buffer. Returns immediately once the stream is completed.
    async fn read<'a>(&'a mut self) -> io::Result<ReadResult<'a>>;

    /// Bytes buffered right now, without waiting.
    fn peek(&self) -> &[u8];

    /// Drops the first `consumed` bytes of the buffer.
    fn advance(&mut self, consumed: usize);
}

#[async_trait]
impl<S: ByteStream + ?Sized> ByteStream for Box<S> {
    async fn read<'a>(&'a mut self) -> io::Result<ReadResult<'a>> {
        (**self).read().await
    }

    fn peek(&self) -> &[u8] {
        (**self).peek()
    }

    fn advance(&mut self, consumed: usize) {
        (**self).advance(consumed);
    }
}
