use bytes::Bytes;

use crate::error::Result;

/// Source of complete inbound frames.
///
/// Implementations block until one whole frame body is available and
/// return it with the length prefix already stripped. `Ok(None)` signals
/// clean end-of-stream at a frame boundary.
pub trait FrameRead: Send {
    fn read_frame(&mut self) -> Result<Option<Bytes>>;
}

/// Sink for complete outbound frames.
///
/// Implementations prepend the length prefix and write prefix plus body
/// as one unit from the caller's perspective.
pub trait FrameWrite: Send {
    fn write_frame(&mut self, body: &[u8]) -> Result<()>;
}
