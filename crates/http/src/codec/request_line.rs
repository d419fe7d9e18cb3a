//! Start line parsing: `METHOD SP target SP HTTP-VERSION CRLF`.
//!
//! The line is split on its first and last space, so a target containing
//! spaces ends up as one token and is then rejected by the URI parser. Checks
//! run in the order method, target, version.

use http::Uri;

use crate::codec::line::next_line;
use crate::ensure;
use crate::protocol::{HttpVersion, Method, ParseError};

/// The three tokens of a start line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    pub route: Uri,
    pub version: HttpVersion,
}

/// Parses the start line at the beginning of `window`.
///
/// On success returns the line and the number of bytes consumed, terminator
/// included, so the caller can move straight to the first header byte.
pub fn parse_request_line(window: &[u8], max_size: usize) -> Result<(RequestLine, usize), ParseError> {
    let (line, consumed) = next_line(window, max_size)?;

    let first_space = line.iter().position(|&b| b == b' ');
    let last_space = line.iter().rposition(|&b| b == b' ');
    let (first_space, last_space) = match (first_space, last_space) {
        (Some(first), Some(last)) if first != last => (first, last),
        _ => return Err(ParseError::malformed_start_line(String::from_utf8_lossy(line))),
    };

    let method_token = &line[..first_space];
    let method = Method::from_bytes(method_token).ok_or_else(|| ParseError::invalid_method(method_token))?;

    let route = parse_route(&line[first_space + 1..last_space])?;

    let version_token = &line[last_space + 1..];
    let version = HttpVersion::from_bytes(version_token).ok_or_else(|| ParseError::unsupported_version(version_token))?;

    Ok((RequestLine { method, route, version }, consumed))
}

/// Accepts relative targets only: origin form (`/path?query`) or `*`.
fn parse_route(target: &[u8]) -> Result<Uri, ParseError> {
    ensure!(!target.is_empty(), ParseError::invalid_route(target));

    let route = Uri::try_from(target).map_err(|_e| ParseError::invalid_route(target))?;
    ensure!(route.scheme().is_none() && route.authority().is_none(), ParseError::invalid_route(target));

    Ok(route)
}
