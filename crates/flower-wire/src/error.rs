/// Errors that can occur while decoding a message body.
///
/// All of these are unrecoverable for the frame at hand; the channel layer
/// discards the frame and surfaces the error to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// The frame body was zero-length.
    #[error("empty message body")]
    EmptyMessage,

    /// The leading byte does not name a known message kind.
    #[error("unknown message discriminant {0}")]
    UnknownDiscriminant(u8),

    /// A field could not be sliced to its required width.
    #[error("truncated field: {0}")]
    TruncatedField(&'static str),
}

pub type Result<T> = std::result::Result<T, WireError>;
