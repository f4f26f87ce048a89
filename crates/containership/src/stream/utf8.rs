// crates/containership/src/stream/utf8.rs
// Incremental UTF-8 decoding across chunk boundaries

/// Decodes a byte stream chunk by chunk.
///
/// A multi-byte sequence split across two chunks is held back until the rest
/// arrives instead of being replaced, which `String::from_utf8_lossy` on each
/// chunk would do. Genuinely invalid bytes become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `chunk` (plus any held-back bytes) as is complete
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::with_capacity(self.pending.len());

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        None => {
                            // Incomplete trailing sequence, wait for more bytes
                            self.pending.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// Flush held-back bytes at end of stream
    pub fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
