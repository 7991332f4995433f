/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// An I/O error occurred on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended inside a frame.
    #[error("stream closed mid-frame ({got} of {expected} bytes)")]
    Truncated { expected: usize, got: usize },

    /// The peer stopped accepting bytes.
    #[error("connection closed")]
    Closed,

    /// The frame body exceeds what the 16-bit length prefix can carry,
    /// or the configured maximum.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// Failed to connect to the remote address.
    #[error("failed to connect to {addr}: {source}")]
    Connect { addr: String, source: std::io::Error },

    /// Failed to bind the listening address.
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: std::io::Error },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
