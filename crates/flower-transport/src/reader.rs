use std::io::{ErrorKind, Read};
use std::net::TcpStream;

use bytes::Bytes;
use tracing::trace;

use crate::config::{FrameConfig, PREFIX_LEN};
use crate::error::{Result, TransportError};
use crate::traits::FrameRead;

/// Reads length-prefixed frames from any `Read` stream.
///
/// Handles partial reads internally — callers always get complete frame
/// bodies, or `None` when the peer closes the stream between frames.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next frame body (blocking).
    ///
    /// Returns `Ok(None)` when the stream ends cleanly on a frame
    /// boundary; end-of-stream inside a frame is
    /// [`TransportError::Truncated`].
    pub fn read_frame(&mut self) -> Result<Option<Bytes>> {
        let mut prefix = [0u8; PREFIX_LEN];
        if !self.fill(&mut prefix, true)? {
            return Ok(None);
        }

        let len = u16::from_be_bytes(prefix) as usize;
        if len > self.config.frame_ceiling() {
            return Err(TransportError::FrameTooLarge {
                size: len,
                max: self.config.frame_ceiling(),
            });
        }

        let mut body = vec![0u8; len];
        self.fill(&mut body, false)?;
        trace!(len, "read frame");
        Ok(Some(body.into()))
    }

    /// Fill `buf` completely from the stream.
    ///
    /// Returns `Ok(false)` if end-of-stream arrives before the first byte
    /// and `eof_ok` is set; any later end-of-stream is `Truncated`.
    fn fill(&mut self, buf: &mut [u8], eof_ok: bool) -> Result<bool> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    if filled == 0 && eof_ok {
                        return Ok(false);
                    }
                    return Err(TransportError::Truncated {
                        expected: buf.len(),
                        got: filled,
                    });
                }
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        Ok(true)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<TcpStream> {
    /// Wrap a TCP stream and apply the configured read timeout.
    pub fn with_config_tcp(inner: TcpStream, config: FrameConfig) -> Result<Self> {
        inner.set_read_timeout(config.read_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}

impl<T: Read + Send> FrameRead for FrameReader<T> {
    fn read_frame(&mut self) -> Result<Option<Bytes>> {
        FrameReader::read_frame(self)
    }
}
