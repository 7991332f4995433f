use bytes::Bytes;

/// Append-only log of raw frame bytes, for tests and debugging.
///
/// A capture is owned by one channel direction and appended to under that
/// direction's lock, so snapshots reproduce wire order exactly. Enabling
/// one has no effect on protocol behavior.
#[derive(Debug, Default)]
pub struct FrameCapture {
    frames: Vec<Bytes>,
}

impl FrameCapture {
    /// Record one frame's raw bytes.
    pub fn append(&mut self, frame: &[u8]) {
        self.frames.push(Bytes::copy_from_slice(frame));
    }

    /// All captured frames, in wire order.
    pub fn snapshot(&self) -> Vec<Bytes> {
        self.frames.clone()
    }

    /// Number of captured frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True if nothing has been captured.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
