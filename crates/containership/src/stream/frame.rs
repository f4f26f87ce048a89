// crates/containership/src/stream/frame.rs
// Newline framing for the combined analysis stream

use super::utf8::Utf8Decoder;
use tracing::debug;

/// Record separator between frames
pub const DEFAULT_SEPARATOR: char = '\n';

/// Prefix marking a payload-carrying SSE line
pub const DATA_PREFIX: &str = "data: ";

/// Splits a chunked text stream into complete separator-delimited frames.
///
/// Whatever follows the last separator of a chunk stays in the carry buffer
/// until a later chunk completes it, so the frames produced do not depend on
/// where the transport happened to cut the bytes.
#[derive(Debug)]
pub struct FrameDecoder {
    separator: char,
    prefix: String,
    carry: String,
    utf8: Utf8Decoder,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::with_format(DEFAULT_SEPARATOR, DATA_PREFIX)
    }

    pub fn with_format(separator: char, prefix: impl Into<String>) -> Self {
        Self {
            separator,
            prefix: prefix.into(),
            carry: String::new(),
            utf8: Utf8Decoder::new(),
        }
    }

    /// Feed raw bytes; returns the frames they complete
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<String> {
        let text = self.utf8.decode(bytes);
        self.push_str(&text)
    }

    /// Feed decoded text; returns the frames it completes
    pub fn push_str(&mut self, text: &str) -> Vec<String> {
        self.carry.push_str(text);

        let Some(last) = self.carry.rfind(self.separator) else {
            return Vec::new();
        };

        let rest = self.carry.split_off(last + self.separator.len_utf8());
        let complete = std::mem::replace(&mut self.carry, rest);
        complete[..last].split(self.separator).map(str::to_string).collect()
    }

    /// End of stream. A dangling partial frame is dropped, never emitted.
    ///
    /// Returns the number of bytes discarded.
    pub fn finish(&mut self) -> usize {
        self.carry.push_str(&self.utf8.finish());
        let dropped = self.carry.len();
        if dropped > 0 {
            debug!(bytes = dropped, "Discarding partial frame at end of stream");
        }
        self.carry.clear();
        dropped
    }

    /// Payload of a frame, or None for blank and non-data lines
    pub fn payload<'a>(&self, frame: &'a str) -> Option<&'a str> {
        let frame = frame.strip_suffix('\r').unwrap_or(frame);
        frame.strip_prefix(self.prefix.as_str())
    }

    /// Bytes currently waiting for a separator
    pub fn buffered(&self) -> usize {
        self.carry.len()
    }
}
