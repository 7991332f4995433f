use std::io::{ErrorKind, Write};
use std::net::TcpStream;

use bytes::{BufMut, BytesMut};
use tracing::trace;

use crate::config::{FrameConfig, PREFIX_LEN};
use crate::error::{Result, TransportError};
use crate::traits::FrameWrite;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes length-prefixed frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Write one frame: the 2-byte big-endian body length, then the body
    /// (blocking). The frame is flushed before returning.
    pub fn write_frame(&mut self, body: &[u8]) -> Result<()> {
        let max = self.config.frame_ceiling();
        if body.len() > max {
            return Err(TransportError::FrameTooLarge {
                size: body.len(),
                max,
            });
        }

        self.buf.clear();
        self.buf.reserve(PREFIX_LEN + body.len());
        self.buf.put_u16(body.len() as u16);
        self.buf.put_slice(body);

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        self.flush()?;
        trace!(len = body.len(), "wrote frame");
        Ok(())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameWriter<TcpStream> {
    /// Wrap a TCP stream and apply the configured write timeout.
    pub fn with_config_tcp(inner: TcpStream, config: FrameConfig) -> Result<Self> {
        inner.set_write_timeout(config.write_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}

impl<T: Write + Send> FrameWrite for FrameWriter<T> {
    fn write_frame(&mut self, body: &[u8]) -> Result<()> {
        FrameWriter::write_frame(self, body)
    }
}
