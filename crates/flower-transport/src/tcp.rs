use std::fmt::Display;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// TCP transport.
///
/// Provides bind/accept/connect over TCP. One accepted or connected
/// stream carries a whole tunnel; the frame reader/writer wrap its two
/// halves.
pub struct TcpTransport {
    listener: TcpListener,
    addr: SocketAddr,
}

impl TcpTransport {
    /// Bind and listen on a TCP address.
    pub fn bind(addr: impl ToSocketAddrs + Display) -> Result<Self> {
        let listener = TcpListener::bind(&addr).map_err(|source| TransportError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        let addr = listener.local_addr()?;
        info!(%addr, "listening");
        Ok(Self { listener, addr })
    }

    /// Accept one incoming connection (blocking).
    pub fn accept(&self) -> Result<TcpStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        Ok(stream)
    }

    /// Connect to a listening endpoint (blocking).
    pub fn connect(addr: impl ToSocketAddrs + Display) -> Result<TcpStream> {
        let stream = TcpStream::connect(&addr).map_err(|source| TransportError::Connect {
            addr: addr.to_string(),
            source,
        })?;
        debug!(%addr, "connected");
        Ok(stream)
    }

    /// The bound listening address.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}
