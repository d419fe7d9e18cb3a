use crate::ensure;
use crate::protocol::ParseError;

const CRLF: &[u8] = b"\r\n";

/// Finds the first `CRLF`-terminated line in `window`.
///
/// Returns the line without its terminator and the number of bytes it occupies
/// including the terminator. Fails with [`ParseError::Incomplete`] when no
/// terminator has arrived yet, or [`ParseError::LineTooLong`] as soon as the
/// line is known to exceed `max_size`.
pub(crate) fn next_line(window: &[u8], max_size: usize) -> Result<(&[u8], usize), ParseError> {
    if let Some(end) = window.windows(CRLF.len()).position(|w| w == CRLF) {
        ensure!(end <= max_size, ParseError::line_too_long(end, max_size));
        return Ok((&window[..end], end + CRLF.len()));
    }

    ensure!(pending_len(window) <= max_size, ParseError::line_too_long(pending_len(window), max_size));
    Err(ParseError::Incomplete)
}

/// Length of an unterminated line, not counting a trailing `\r` that may be
/// the first half of its terminator.
pub(crate) fn pending_len(window: &[u8]) -> usize {
    match window.last() {
        Some(b'\r') => window.len() - 1,
        _ => window.len(),
    }
}
