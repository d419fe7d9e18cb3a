//! One `Name: value CRLF` line at a time, until the bare `CRLF` terminator.

use crate::codec::line::next_line;
use crate::protocol::{HeaderCollection, ParseError};

/// What a single call to [`parse_header_line`] found.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HeaderLine {
    /// One header was appended; more lines follow.
    HeaderParsed,
    /// The empty line closing the header block.
    EndOfHeaders,
}

/// Parses the header line at the beginning of `window` into `headers`.
///
/// Returns the outcome and the bytes consumed, terminator included. A line
/// without `:`, a name outside the token set or a value outside printable
/// ASCII fails the whole request; nothing is silently skipped.
pub fn parse_header_line(
    window: &[u8],
    max_size: usize,
    headers: &mut HeaderCollection,
) -> Result<(HeaderLine, usize), ParseError> {
    let (line, consumed) = next_line(window, max_size)?;

    if line.is_empty() {
        return Ok((HeaderLine::EndOfHeaders, consumed));
    }

    let colon = line.iter().position(|&b| b == b':').ok_or_else(|| ParseError::invalid_header_name(line))?;
    let name = trim_whitespace(&line[..colon]);
    let value = trim_whitespace(&line[colon + 1..]);

    headers.append_bytes(name, value)?;
    Ok((HeaderLine::HeaderParsed, consumed))
}

/// Strips spaces and tabs only; any other control byte stays and fails validation.
fn trim_whitespace(bytes: &[u8]) -> &[u8] {
    let is_ows = |b: &u8| matches!(b, b' ' | b'\t');
    let start = bytes.iter().position(|b| !is_ows(b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !is_ows(b)).map_or(start, |i| i + 1);
    &bytes[start..end]
}
