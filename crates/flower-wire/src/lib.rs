//! Wire-format codec for the Flower tunneling protocol.
//!
//! Flower multiplexes TCP stream lifecycle events, UDP datagrams, raw
//! IP/ICMP packets, and IP-address-lease negotiation over one reliable
//! byte stream. Every message is encoded as:
//! - A 1-byte discriminant selecting the variant
//! - The variant's fixed-width fields (addresses, endpoints, stream ids)
//! - Any remainder as the variant's payload
//!
//! All multi-byte integers are big-endian. Addresses are 4 bytes (IPv4) or
//! 16 bytes (IPv6); endpoints prepend a 2-byte port; stream identifiers
//! are 8-byte opaque integers.
//!
//! Frame boundaries are supplied by the transport layer, not by this
//! codec: [`Message::decode`] expects exactly one message's bytes.

pub mod address;
pub mod error;
pub mod kind;
pub mod message;

pub use address::{
    decode_ipv4, decode_ipv6, EndpointV4, EndpointV6, ENDPOINT_V4_LEN, ENDPOINT_V6_LEN, IPV4_LEN,
    IPV6_LEN, STREAM_ID_LEN,
};
pub use error::{Result, WireError};
pub use message::{Message, StreamId};
