use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};

/// Wire width of a bare IPv4 address.
pub const IPV4_LEN: usize = 4;

/// Wire width of a bare IPv6 address.
pub const IPV6_LEN: usize = 16;

/// Wire width of an IPv4 endpoint: 2-byte port plus address.
pub const ENDPOINT_V4_LEN: usize = 2 + IPV4_LEN;

/// Wire width of an IPv6 endpoint: 2-byte port plus address.
pub const ENDPOINT_V6_LEN: usize = 2 + IPV6_LEN;

/// Wire width of a stream identifier.
pub const STREAM_ID_LEN: usize = 8;

/// An IPv4 (address, port) pair in its fixed-width wire form.
///
/// Encoding is always `port (2B BE) ++ address (4B)`. The full 16-bit port
/// is written, including the high byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointV4 {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl EndpointV4 {
    pub fn new(host: Ipv4Addr, port: u16) -> Self {
        Self { host, port }
    }

    /// Decode from exactly [`ENDPOINT_V4_LEN`] bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ENDPOINT_V4_LEN {
            return Err(WireError::TruncatedField("ipv4 endpoint"));
        }
        let port = u16::from_be_bytes([bytes[0], bytes[1]]);
        let host = decode_ipv4(&bytes[2..], "ipv4 endpoint")?;
        Ok(Self { host, port })
    }

    pub fn encode_into(&self, dst: &mut BytesMut) {
        dst.put_u16(self.port);
        dst.put_slice(&self.host.octets());
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(ENDPOINT_V4_LEN);
        self.encode_into(&mut buf);
        buf.freeze()
    }
}

impl fmt::Display for EndpointV4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// An IPv6 (address, port) pair in its fixed-width wire form.
///
/// Encoding is always `port (2B BE) ++ address (16B)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointV6 {
    pub host: Ipv6Addr,
    pub port: u16,
}

impl EndpointV6 {
    pub fn new(host: Ipv6Addr, port: u16) -> Self {
        Self { host, port }
    }

    /// Decode from exactly [`ENDPOINT_V6_LEN`] bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ENDPOINT_V6_LEN {
            return Err(WireError::TruncatedField("ipv6 endpoint"));
        }
        let port = u16::from_be_bytes([bytes[0], bytes[1]]);
        let host = decode_ipv6(&bytes[2..], "ipv6 endpoint")?;
        Ok(Self { host, port })
    }

    pub fn encode_into(&self, dst: &mut BytesMut) {
        dst.put_u16(self.port);
        dst.put_slice(&self.host.octets());
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(ENDPOINT_V6_LEN);
        self.encode_into(&mut buf);
        buf.freeze()
    }
}

impl fmt::Display for EndpointV6 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]:{}", self.host, self.port)
    }
}

/// Decode a bare IPv4 address from exactly [`IPV4_LEN`] bytes.
///
/// `field` names the enclosing field in the error on length mismatch.
pub fn decode_ipv4(bytes: &[u8], field: &'static str) -> Result<Ipv4Addr> {
    let octets: [u8; IPV4_LEN] = bytes
        .try_into()
        .map_err(|_| WireError::TruncatedField(field))?;
    Ok(Ipv4Addr::from(octets))
}

/// Decode a bare IPv6 address from exactly [`IPV6_LEN`] bytes.
pub fn decode_ipv6(bytes: &[u8], field: &'static str) -> Result<Ipv6Addr> {
    let octets: [u8; IPV6_LEN] = bytes
        .try_into()
        .map_err(|_| WireError::TruncatedField(field))?;
    Ok(Ipv6Addr::from(octets))
}
