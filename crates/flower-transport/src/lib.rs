//! Length-prefixed framing over connected byte streams.
//!
//! Every frame on the wire is a 2-byte big-endian body length followed by
//! the body; one frame carries exactly one encoded message. This is the
//! lowest layer of the tunnel: [`FrameReader`] and [`FrameWriter`] provide
//! blocking whole-frame I/O over anything implementing `Read`/`Write`, and
//! the [`FrameRead`]/[`FrameWrite`] traits are the seam the message
//! channel is generic over.
//!
//! No partial reads, no buffer management in user code.

pub mod config;
pub mod error;
pub mod reader;
pub mod tcp;
pub mod traits;
pub mod writer;

pub use config::{FrameConfig, MAX_FRAME_LEN, PREFIX_LEN};
pub use error::{Result, TransportError};
pub use reader::FrameReader;
pub use tcp::TcpTransport;
pub use traits::{FrameRead, FrameWrite};
pub use writer::FrameWriter;
