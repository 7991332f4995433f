use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use flower_transport::{FrameRead, FrameWrite};
use flower_wire::Message;
use tracing::{debug, error};

use crate::capture::FrameCapture;
use crate::error::{ChannelError, Result};

/// Configuration for a message channel.
#[derive(Debug, Clone, Default)]
pub struct ChannelConfig {
    /// Record the raw bytes of every inbound frame that decodes.
    pub capture_reads: bool,
    /// Record the raw bytes of every outbound frame that is sent.
    pub capture_writes: bool,
}

struct ReadHalf<R> {
    frames: R,
    closed: bool,
    capture: Option<FrameCapture>,
}

struct WriteHalf<W> {
    frames: W,
    closed: bool,
    capture: Option<FrameCapture>,
}

/// Thread-safe message exchange over one framed transport.
///
/// The two directions are serialized independently: concurrent readers
/// queue on the read lock, concurrent writers on the write lock, and a
/// blocked read never delays a write. The transport halves must support
/// simultaneous one-reader/one-writer use.
///
/// Both operations block for the duration of the underlying I/O; deadline
/// and cancellation policy belongs to the transport. Once a direction
/// reports closure or failure it stays closed.
pub struct MessageChannel<R, W> {
    reader: Mutex<ReadHalf<R>>,
    writer: Mutex<WriteHalf<W>>,
}

impl<R: FrameRead, W: FrameWrite> MessageChannel<R, W> {
    /// Create a channel with default configuration.
    pub fn new(frames_in: R, frames_out: W) -> Self {
        Self::with_config(frames_in, frames_out, ChannelConfig::default())
    }

    /// Create a channel with explicit configuration.
    pub fn with_config(frames_in: R, frames_out: W, config: ChannelConfig) -> Self {
        Self {
            reader: Mutex::new(ReadHalf {
                frames: frames_in,
                closed: false,
                capture: config.capture_reads.then(FrameCapture::default),
            }),
            writer: Mutex::new(WriteHalf {
                frames: frames_out,
                closed: false,
                capture: config.capture_writes.then(FrameCapture::default),
            }),
        }
    }

    /// Receive the next message, blocking until one frame arrives.
    ///
    /// Returns [`ChannelError::Closed`] once the transport reports
    /// end-of-stream or a read failure; every later call fails the same
    /// way without touching the transport. A frame that fails to decode
    /// is discarded and surfaced as [`ChannelError::Wire`]; the channel
    /// remains usable.
    pub fn read_message(&self) -> Result<Message> {
        let mut half = lock(&self.reader);
        if half.closed {
            return Err(ChannelError::Closed);
        }

        let frame = match half.frames.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                half.closed = true;
                error!("transport closed while reading");
                return Err(ChannelError::Closed);
            }
            Err(err) => {
                half.closed = true;
                error!(%err, "transport failed while reading");
                return Err(ChannelError::Closed);
            }
        };

        let message = Message::decode(&frame)?;
        if let Some(capture) = half.capture.as_mut() {
            capture.append(&frame);
        }
        debug!(kind = message.kind_name(), "received message");
        Ok(message)
    }

    /// Encode and send one message as a single frame.
    ///
    /// A transport failure is terminal: the cause is returned as
    /// [`ChannelError::Transport`] and every later call fails with
    /// [`ChannelError::WriteClosed`] without touching the transport.
    pub fn write_message(&self, message: &Message) -> Result<()> {
        let mut half = lock(&self.writer);
        if half.closed {
            return Err(ChannelError::WriteClosed);
        }

        let frame = message.encode();
        if let Err(err) = half.frames.write_frame(&frame) {
            half.closed = true;
            error!(%err, "transport failed while writing");
            return Err(ChannelError::Transport(err));
        }

        if let Some(capture) = half.capture.as_mut() {
            capture.append(&frame);
        }
        debug!(kind = message.kind_name(), "sent message");
        Ok(())
    }

    /// True once the read side has observed closure or failure.
    pub fn read_closed(&self) -> bool {
        lock(&self.reader).closed
    }

    /// True once a write has failed.
    pub fn write_closed(&self) -> bool {
        lock(&self.writer).closed
    }

    /// Raw bytes of every captured inbound frame, in arrival order.
    /// Empty unless `capture_reads` was set.
    pub fn captured_reads(&self) -> Vec<Bytes> {
        lock(&self.reader)
            .capture
            .as_ref()
            .map(FrameCapture::snapshot)
            .unwrap_or_default()
    }

    /// Raw bytes of every captured outbound frame, in departure order.
    /// Empty unless `capture_writes` was set.
    pub fn captured_writes(&self) -> Vec<Bytes> {
        lock(&self.writer)
            .capture
            .as_ref()
            .map(FrameCapture::snapshot)
            .unwrap_or_default()
    }
}

/// Lock one direction, recovering the guard if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
