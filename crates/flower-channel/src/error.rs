/// Errors surfaced by message-channel operations.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The frame body could not be decoded; the frame is discarded and
    /// the channel remains usable.
    #[error("wire error: {0}")]
    Wire(#[from] flower_wire::WireError),

    /// The transport failed while writing; the channel's write side is
    /// closed afterwards.
    #[error("transport error: {0}")]
    Transport(#[from] flower_transport::TransportError),

    /// The transport reported end-of-stream or a read failure. Terminal
    /// for the read side.
    #[error("channel closed")]
    Closed,

    /// A previous write failed; the channel refuses further writes.
    #[error("channel write side is closed")]
    WriteClosed,
}

pub type Result<T> = std::result::Result<T, ChannelError>;
