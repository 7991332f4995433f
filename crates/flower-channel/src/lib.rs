//! Thread-safe message exchange for the Flower tunneling protocol.
//!
//! A [`MessageChannel`] carries whole typed messages over one framed
//! transport. Reads and writes are serialized under independent locks, so
//! concurrent writers never interleave partial frames, concurrent readers
//! never split one frame, and the two directions stay fully duplex.
//!
//! Channels are single-use: once the read side reports closure or a write
//! fails, the channel stays terminal and callers must establish a fresh
//! transport.

pub mod capture;
pub mod channel;
pub mod connector;
pub mod error;

pub use capture::FrameCapture;
pub use channel::{ChannelConfig, MessageChannel};
pub use connector::{connect, connect_with_config, ChannelListener, TcpChannel};
pub use error::{ChannelError, Result};
