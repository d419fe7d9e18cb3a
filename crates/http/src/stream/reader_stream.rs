use std::io;

use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

use crate::stream::{ByteStream, ReadResult};

/// Initial buffer size, also the minimum spare room before every socket read
const READ_BUFFER_SIZE: usize = 8 * 1024;

/// A [`ByteStream`] on top of an `AsyncRead`.
///
/// Every [`read`](ByteStream::read) performs one read on the inner reader; a
/// zero-length read marks the stream as completed.
#[derive(Debug)]
pub struct ReaderStream<R> {
    reader: R,
    buffer: BytesMut,
    eof: bool,
}

impl<R> ReaderStream<R>
where
    R: AsyncRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, READ_BUFFER_SIZE)
    }

    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self { reader, buffer: BytesMut::with_capacity(capacity), eof: false }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[async_trait]
impl<R> ByteStream for ReaderStream<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn read<'a>(&'a mut self) -> io::Result<ReadResult<'a>> {
        if !self.eof {
            if self.buffer.capacity() - self.buffer.len() < READ_BUFFER_SIZE / 4 {
                self.buffer.reserve(READ_BUFFER_SIZE);
            }

            let read = self.reader.read_buf(&mut self.buffer).await?;
            trace!(read, buffered = self.buffer.len(), "read from socket");
            if read == 0 {
                self.eof = true;
            }
        }

        Ok(ReadResult::new(&self.buffer, self.eof, false))
    }

    fn peek(&self) -> &[u8] {
        &self.buffer
    }

    fn advance(&mut self, consumed: usize) {
        self.buffer.advance(consumed);
    }
}
