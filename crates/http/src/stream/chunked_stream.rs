use std::collections::VecDeque;
use std::io;

use async_trait::async_trait;
use bytes::{Buf, Bytes, BytesMut};

use crate::stream::{ByteStream, ReadResult};

/// An in-memory [`ByteStream`] that delivers one queued chunk per read.
///
/// Once the queue is drained the stream reports completion, or cancellation
/// when built with [`cancel_at_end`](ChunkedStream::cancel_at_end).
#[derive(Debug, Default)]
pub struct ChunkedStream {
    chunks: VecDeque<Bytes>,
    buffer: BytesMut,
    cancel_at_end: bool,
}

impl ChunkedStream {
    pub fn new<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self { chunks: chunks.into_iter().map(Into::into).collect(), buffer: BytesMut::new(), cancel_at_end: false }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// The whole input as a single chunk.
    pub fn single(data: impl Into<Bytes>) -> Self {
        Self::new([data.into()])
    }

    /// Splits `data` at the given offsets, which must be ascending.
    pub fn split_at(data: impl Into<Bytes>, offsets: &[usize]) -> Self {
        let data = data.into();
        let mut chunks = Vec::with_capacity(offsets.len() + 1);
        let mut start = 0;
        for &offset in offsets {
            let offset = offset.clamp(start, data.len());
            chunks.push(data.slice(start..offset));
            start = offset;
        }
        chunks.push(data.slice(start..));
        Self::new(chunks)
    }

    /// Delivers `data` in chunks of at most `size` bytes.
    pub fn every(data: impl Into<Bytes>, size: usize) -> Self {
        let data = data.into();
        let size = size.max(1);
        let chunks = (0..data.len()).step_by(size).map(|start| data.slice(start..(start + size).min(data.len())));
        Self::new(chunks.collect::<Vec<_>>())
    }

    /// Report cancellation instead of completion after the last chunk.
    pub fn cancel_at_end(mut self) -> Self {
        self.cancel_at_end = true;
        self
    }
}

#[async_trait]
impl ByteStream for ChunkedStream {
    async fn read<'a>(&'a mut self) -> io::Result<ReadResult<'a>> {
        match self.chunks.pop_front() {
            Some(chunk) => {
                self.buffer.extend_from_slice(&chunk);
                Ok(ReadResult::new(&self.buffer, false, false))
            }
            None if self.cancel_at_end => Ok(ReadResult::new(&self.buffer, false, true)),
            None => Ok(ReadResult::new(&self.buffer, true, false)),
        }
    }

    fn peek(&self) -> &[u8] {
        &self.buffer
    }

    fn advance(&mut self, consumed: usize) {
        self.buffer.advance(consumed);
    }
}
