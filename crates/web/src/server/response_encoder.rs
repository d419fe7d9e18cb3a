use std::io;
use std::io::Write;

use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;

use crate::ResponseStatus;

/// Initial buffer size reserved for the status line and headers
const INIT_HEAD_SIZE: usize = 256;

/// Serializes a [`ResponseStatus`] into a complete `HTTP/1.1` response.
///
/// Every response closes the connection and carries an explicit
/// `Content-Length`, zero when there is no body.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ResponseEncoder;

impl Encoder<ResponseStatus> for ResponseEncoder {
    type Error = io::Error;

    fn encode(&mut self, item: ResponseStatus, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let status = item.status();
        dst.reserve(INIT_HEAD_SIZE + item.content_length());

        write!(FastWrite(dst), "HTTP/1.1 {} {}\r\n", status.as_str(), status.canonical_reason().unwrap_or(""))?;
        if let Some(content_type) = item.content_type() {
            write!(FastWrite(dst), "Content-Type: {content_type}\r\n")?;
        }
        write!(FastWrite(dst), "Content-Length: {}\r\n", item.content_length())?;
        dst.put_slice(b"Connection: close\r\n\r\n");

        if let Some(body) = item.body() {
            dst.put_slice(body);
        }
        Ok(())
    }
}

struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
