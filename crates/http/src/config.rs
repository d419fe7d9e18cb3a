use serde::Deserialize;

/// Default limit for a single line and for the whole header block
pub const DEFAULT_MAX_HEADER_SIZE: usize = 8 * 1024;

/// Limits applied while parsing a request head.
///
/// `max_header_size` bounds the start line, every header line, and the running
/// total of all header lines. Line lengths are counted without the trailing
/// `CRLF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    max_header_size: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self { max_header_size: DEFAULT_MAX_HEADER_SIZE }
    }
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_header_size(mut self, max_header_size: usize) -> Self {
        self.max_header_size = max_header_size;
        self
    }

    pub fn max_header_size(&self) -> usize {
        self.max_header_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_defaults() {
        let config: ParserConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_header_size(), DEFAULT_MAX_HEADER_SIZE);

        let config: ParserConfig = serde_json::from_str(r#"{"max_header_size": 512}"#).unwrap();
        assert_eq!(config, ParserConfig::new().with_max_header_size(512));
    }
}
