// crates/containership/src/stream/mod.rs
// Combined-stream decoding: bytes -> frames -> typed messages

pub mod dispatch;
pub mod frame;
pub mod utf8;

pub use dispatch::{decode_event, DispatchReport, Dispatcher, SkippedFrame, StreamOutcome, MAX_SKIPPED_RECORDED};
pub use frame::{FrameDecoder, DATA_PREFIX, DEFAULT_SEPARATOR};
pub use utf8::Utf8Decoder;
