use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use bytes::{BufMut, Bytes, BytesMut};

use crate::address::{
    decode_ipv4, decode_ipv6, EndpointV4, EndpointV6, ENDPOINT_V4_LEN, ENDPOINT_V6_LEN, IPV4_LEN,
    IPV6_LEN, STREAM_ID_LEN,
};
use crate::error::{Result, WireError};
use crate::kind;

/// Opaque identifier naming one logical TCP stream multiplexed over the
/// tunnel. Encoded as 8 bytes big-endian; the codec attaches no further
/// semantics.
pub type StreamId = u64;

/// One Flower protocol message.
///
/// The wire form is a single discriminant byte followed by the variant's
/// fields in declaration order; see [`kind`] for the discriminant values.
/// Values are transient: constructed per decode or per send, then
/// discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Open a tunneled TCP stream to an IPv4 destination.
    TcpOpenV4 {
        destination: EndpointV4,
        stream_id: StreamId,
    },
    /// Open a tunneled TCP stream to an IPv6 destination.
    TcpOpenV6 {
        destination: EndpointV6,
        stream_id: StreamId,
    },
    /// Close one tunneled TCP stream.
    TcpClose { stream_id: StreamId },
    /// Data for an open TCP stream. The payload is never empty.
    TcpData {
        stream_id: StreamId,
        payload: Bytes,
    },
    /// A UDP datagram for an IPv4 destination. The payload is never empty.
    UdpDataV4 {
        destination: EndpointV4,
        payload: Bytes,
    },
    /// A UDP datagram for an IPv6 destination. The payload is never empty.
    UdpDataV6 {
        destination: EndpointV6,
        payload: Bytes,
    },
    /// Server grants the client an IPv4 address lease.
    IpAssignV4(Ipv4Addr),
    /// Server grants the client an IPv6 address lease.
    IpAssignV6(Ipv6Addr),
    /// Server grants both an IPv4 and an IPv6 lease.
    IpAssignDualStack(Ipv4Addr, Ipv6Addr),
    /// One raw IPv4 packet. May be empty.
    IpDataV4(Bytes),
    /// One raw IPv6 packet. May be empty.
    IpDataV6(Bytes),
    /// Client requests an IPv4 address lease.
    IpRequestV4,
    /// Client requests an IPv6 address lease.
    IpRequestV6,
    /// Client requests both an IPv4 and an IPv6 lease.
    IpRequestDualStack,
    /// Client asks to resume a previously assigned IPv4 lease.
    IpReuseV4(Ipv4Addr),
    /// Client asks to resume a previously assigned IPv6 lease.
    IpReuseV6(Ipv6Addr),
    /// Client asks to resume a previous dual-stack lease.
    IpReuseDualStack(Ipv4Addr, Ipv6Addr),
    /// An ICMP payload for an IPv4 host. The payload is never empty.
    IcmpDataV4 { host: Ipv4Addr, payload: Bytes },
    /// An ICMP payload for an IPv6 host. The payload is never empty.
    IcmpDataV6 { host: Ipv6Addr, payload: Bytes },
}

impl Message {
    /// Decode one message from a complete frame body.
    pub fn decode(body: &[u8]) -> Result<Message> {
        let (&discriminant, tail) = body.split_first().ok_or(WireError::EmptyMessage)?;
        match discriminant {
            kind::TCP_OPEN_V4 => {
                let (endpoint, rest) = split_field(tail, ENDPOINT_V4_LEN, "ipv4 endpoint")?;
                Ok(Message::TcpOpenV4 {
                    destination: EndpointV4::decode(endpoint)?,
                    stream_id: decode_stream_id(rest)?,
                })
            }
            kind::TCP_OPEN_V6 => {
                let (endpoint, rest) = split_field(tail, ENDPOINT_V6_LEN, "ipv6 endpoint")?;
                Ok(Message::TcpOpenV6 {
                    destination: EndpointV6::decode(endpoint)?,
                    stream_id: decode_stream_id(rest)?,
                })
            }
            kind::TCP_CLOSE => Ok(Message::TcpClose {
                stream_id: decode_stream_id(tail)?,
            }),
            kind::TCP_DATA => {
                let (id, payload) = split_field(tail, STREAM_ID_LEN, "stream id")?;
                Ok(Message::TcpData {
                    stream_id: decode_stream_id(id)?,
                    payload: non_empty_payload(payload)?,
                })
            }
            kind::UDP_DATA_V4 => {
                let (endpoint, payload) = split_field(tail, ENDPOINT_V4_LEN, "ipv4 endpoint")?;
                Ok(Message::UdpDataV4 {
                    destination: EndpointV4::decode(endpoint)?,
                    payload: non_empty_payload(payload)?,
                })
            }
            kind::UDP_DATA_V6 => {
                let (endpoint, payload) = split_field(tail, ENDPOINT_V6_LEN, "ipv6 endpoint")?;
                Ok(Message::UdpDataV6 {
                    destination: EndpointV6::decode(endpoint)?,
                    payload: non_empty_payload(payload)?,
                })
            }
            kind::IP_ASSIGN_V4 => Ok(Message::IpAssignV4(decode_ipv4(tail, "ipv4 address")?)),
            kind::IP_ASSIGN_V6 => Ok(Message::IpAssignV6(decode_ipv6(tail, "ipv6 address")?)),
            kind::IP_ASSIGN_DUAL_STACK => {
                let (v4, v6) = split_field(tail, IPV4_LEN, "ipv4 address")?;
                Ok(Message::IpAssignDualStack(
                    decode_ipv4(v4, "ipv4 address")?,
                    decode_ipv6(v6, "ipv6 address")?,
                ))
            }
            kind::IP_DATA_V4 => Ok(Message::IpDataV4(Bytes::copy_from_slice(tail))),
            kind::IP_DATA_V6 => Ok(Message::IpDataV6(Bytes::copy_from_slice(tail))),
            kind::IP_REQUEST_V4 => Ok(Message::IpRequestV4),
            kind::IP_REQUEST_V6 => Ok(Message::IpRequestV6),
            kind::IP_REQUEST_DUAL_STACK => Ok(Message::IpRequestDualStack),
            kind::IP_REUSE_V4 => Ok(Message::IpReuseV4(decode_ipv4(tail, "ipv4 address")?)),
            kind::IP_REUSE_V6 => Ok(Message::IpReuseV6(decode_ipv6(tail, "ipv6 address")?)),
            kind::IP_REUSE_DUAL_STACK => {
                let (v4, v6) = split_field(tail, IPV4_LEN, "ipv4 address")?;
                Ok(Message::IpReuseDualStack(
                    decode_ipv4(v4, "ipv4 address")?,
                    decode_ipv6(v6, "ipv6 address")?,
                ))
            }
            kind::ICMP_DATA_V4 => {
                let (addr, payload) = split_field(tail, IPV4_LEN, "ipv4 address")?;
                Ok(Message::IcmpDataV4 {
                    host: decode_ipv4(addr, "ipv4 address")?,
                    payload: non_empty_payload(payload)?,
                })
            }
            kind::ICMP_DATA_V6 => {
                let (addr, payload) = split_field(tail, IPV6_LEN, "ipv6 address")?;
                Ok(Message::IcmpDataV6 {
                    host: decode_ipv6(addr, "ipv6 address")?,
                    payload: non_empty_payload(payload)?,
                })
            }
            unknown => Err(WireError::UnknownDiscriminant(unknown)),
        }
    }

    /// Encode this message into one frame body: discriminant byte, then
    /// the variant's fields. Encoding is total.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(1 + ENDPOINT_V6_LEN + STREAM_ID_LEN);
        buf.put_u8(self.kind());
        match self {
            Message::TcpOpenV4 {
                destination,
                stream_id,
            } => {
                destination.encode_into(&mut buf);
                buf.put_u64(*stream_id);
            }
            Message::TcpOpenV6 {
                destination,
                stream_id,
            } => {
                destination.encode_into(&mut buf);
                buf.put_u64(*stream_id);
            }
            Message::TcpClose { stream_id } => buf.put_u64(*stream_id),
            Message::TcpData { stream_id, payload } => {
                buf.put_u64(*stream_id);
                buf.put_slice(payload);
            }
            Message::UdpDataV4 {
                destination,
                payload,
            } => {
                destination.encode_into(&mut buf);
                buf.put_slice(payload);
            }
            Message::UdpDataV6 {
                destination,
                payload,
            } => {
                destination.encode_into(&mut buf);
                buf.put_slice(payload);
            }
            Message::IpAssignV4(addr) => buf.put_slice(&addr.octets()),
            Message::IpAssignV6(addr) => buf.put_slice(&addr.octets()),
            Message::IpAssignDualStack(v4, v6) => {
                buf.put_slice(&v4.octets());
                buf.put_slice(&v6.octets());
            }
            Message::IpDataV4(packet) => buf.put_slice(packet),
            Message::IpDataV6(packet) => buf.put_slice(packet),
            Message::IpRequestV4 | Message::IpRequestV6 | Message::IpRequestDualStack => {}
            Message::IpReuseV4(addr) => buf.put_slice(&addr.octets()),
            Message::IpReuseV6(addr) => buf.put_slice(&addr.octets()),
            Message::IpReuseDualStack(v4, v6) => {
                buf.put_slice(&v4.octets());
                buf.put_slice(&v6.octets());
            }
            Message::IcmpDataV4 { host, payload } => {
                buf.put_slice(&host.octets());
                buf.put_slice(payload);
            }
            Message::IcmpDataV6 { host, payload } => {
                buf.put_slice(&host.octets());
                buf.put_slice(payload);
            }
        }
        buf.freeze()
    }

    /// The discriminant byte for this variant.
    pub fn kind(&self) -> u8 {
        match self {
            Message::TcpOpenV4 { .. } => kind::TCP_OPEN_V4,
            Message::TcpOpenV6 { .. } => kind::TCP_OPEN_V6,
            Message::TcpClose { .. } => kind::TCP_CLOSE,
            Message::TcpData { .. } => kind::TCP_DATA,
            Message::UdpDataV4 { .. } => kind::UDP_DATA_V4,
            Message::UdpDataV6 { .. } => kind::UDP_DATA_V6,
            Message::IpAssignV4(_) => kind::IP_ASSIGN_V4,
            Message::IpAssignV6(_) => kind::IP_ASSIGN_V6,
            Message::IpAssignDualStack(..) => kind::IP_ASSIGN_DUAL_STACK,
            Message::IpDataV4(_) => kind::IP_DATA_V4,
            Message::IpDataV6(_) => kind::IP_DATA_V6,
            Message::IpRequestV4 => kind::IP_REQUEST_V4,
            Message::IpRequestV6 => kind::IP_REQUEST_V6,
            Message::IpRequestDualStack => kind::IP_REQUEST_DUAL_STACK,
            Message::IpReuseV4(_) => kind::IP_REUSE_V4,
            Message::IpReuseV6(_) => kind::IP_REUSE_V6,
            Message::IpReuseDualStack(..) => kind::IP_REUSE_DUAL_STACK,
            Message::IcmpDataV4 { .. } => kind::ICMP_DATA_V4,
            Message::IcmpDataV6 { .. } => kind::ICMP_DATA_V6,
        }
    }

    /// Human-readable variant name, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        kind::kind_name(self.kind())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::TcpOpenV4 {
                destination,
                stream_id,
            } => write!(f, "TCPOpenV4 {destination} stream {stream_id}"),
            Message::TcpOpenV6 {
                destination,
                stream_id,
            } => write!(f, "TCPOpenV6 {destination} stream {stream_id}"),
            Message::TcpClose { stream_id } => write!(f, "TCPClose stream {stream_id}"),
            Message::TcpData { stream_id, payload } => {
                write!(f, "TCPData stream {stream_id} ({} bytes)", payload.len())
            }
            Message::UdpDataV4 {
                destination,
                payload,
            } => write!(f, "UDPDataV4 {destination} ({} bytes)", payload.len()),
            Message::UdpDataV6 {
                destination,
                payload,
            } => write!(f, "UDPDataV6 {destination} ({} bytes)", payload.len()),
            Message::IpAssignV4(addr) => write!(f, "IPAssignV4 {addr}"),
            Message::IpAssignV6(addr) => write!(f, "IPAssignV6 {addr}"),
            Message::IpAssignDualStack(v4, v6) => write!(f, "IPAssignDualStack {v4} {v6}"),
            Message::IpDataV4(packet) => write!(f, "IPDataV4 ({} bytes)", packet.len()),
            Message::IpDataV6(packet) => write!(f, "IPDataV6 ({} bytes)", packet.len()),
            Message::IpRequestV4 => write!(f, "IPRequestV4"),
            Message::IpRequestV6 => write!(f, "IPRequestV6"),
            Message::IpRequestDualStack => write!(f, "IPRequestDualStack"),
            Message::IpReuseV4(addr) => write!(f, "IPReuseV4 {addr}"),
            Message::IpReuseV6(addr) => write!(f, "IPReuseV6 {addr}"),
            Message::IpReuseDualStack(v4, v6) => write!(f, "IPReuseDualStack {v4} {v6}"),
            Message::IcmpDataV4 { host, payload } => {
                write!(f, "ICMPDataV4 {host} ({} bytes)", payload.len())
            }
            Message::IcmpDataV6 { host, payload } => {
                write!(f, "ICMPDataV6 {host} ({} bytes)", payload.len())
            }
        }
    }
}

/// Split `width` bytes off the front, or fail naming the short field.
fn split_field<'a>(
    bytes: &'a [u8],
    width: usize,
    field: &'static str,
) -> Result<(&'a [u8], &'a [u8])> {
    if bytes.len() < width {
        return Err(WireError::TruncatedField(field));
    }
    Ok(bytes.split_at(width))
}

/// Decode a stream identifier from exactly [`STREAM_ID_LEN`] bytes.
fn decode_stream_id(bytes: &[u8]) -> Result<StreamId> {
    let raw: [u8; STREAM_ID_LEN] = bytes
        .try_into()
        .map_err(|_| WireError::TruncatedField("stream id"))?;
    Ok(u64::from_be_bytes(raw))
}

fn non_empty_payload(bytes: &[u8]) -> Result<Bytes> {
    if bytes.is_empty() {
        return Err(WireError::TruncatedField("payload"));
    }
    Ok(Bytes::copy_from_slice(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v4() -> Ipv4Addr {
        Ipv4Addr::new(10, 8, 0, 3)
    }

    fn v6() -> Ipv6Addr {
        "2001:db8::42".parse().unwrap()
    }

    /// One message per variant, with minimal payloads so every strict
    /// prefix of the encoding is invalid.
    fn representatives() -> Vec<Message> {
        vec![
            Message::TcpOpenV4 {
                destination: EndpointV4::new(v4(), 8080),
                stream_id: 7,
            },
            Message::TcpOpenV6 {
                destination: EndpointV6::new(v6(), 8080),
                stream_id: u64::MAX,
            },
            Message::TcpClose { stream_id: 0 },
            Message::TcpData {
                stream_id: 99,
                payload: Bytes::from_static(b"x"),
            },
            Message::UdpDataV4 {
                destination: EndpointV4::new(v4(), u16::MAX),
                payload: Bytes::from_static(b"d"),
            },
            Message::UdpDataV6 {
                destination: EndpointV6::new(v6(), 0),
                payload: Bytes::from_static(b"d"),
            },
            Message::IpAssignV4(v4()),
            Message::IpAssignV6(v6()),
            Message::IpAssignDualStack(v4(), v6()),
            Message::IpDataV4(Bytes::new()),
            Message::IpDataV6(Bytes::new()),
            Message::IpRequestV4,
            Message::IpRequestV6,
            Message::IpRequestDualStack,
            Message::IpReuseV4(v4()),
            Message::IpReuseV6(v6()),
            Message::IpReuseDualStack(v4(), v6()),
            Message::IcmpDataV4 {
                host: v4(),
                payload: Bytes::from_static(b"p"),
            },
            Message::IcmpDataV6 {
                host: v6(),
                payload: Bytes::from_static(b"p"),
            },
        ]
    }

    #[test]
    fn roundtrip_every_variant() {
        for message in representatives() {
            let encoded = message.encode();
            let decoded = Message::decode(&encoded).unwrap();
            assert_eq!(decoded, message, "roundtrip failed for {message}");
        }
    }

    #[test]
    fn discriminants_cover_zero_through_eighteen() {
        let kinds: Vec<u8> = representatives().iter().map(Message::kind).collect();
        assert_eq!(kinds, (0..=18).collect::<Vec<u8>>());
    }

    #[test]
    fn stream_id_boundaries_roundtrip() {
        for stream_id in [0, 1, u64::MAX] {
            let message = Message::TcpClose { stream_id };
            assert_eq!(Message::decode(&message.encode()).unwrap(), message);
        }
    }

    #[test]
    fn large_payload_roundtrips() {
        let message = Message::TcpData {
            stream_id: 3,
            payload: Bytes::from(vec![0xAB; 60_000]),
        };
        assert_eq!(Message::decode(&message.encode()).unwrap(), message);
    }

    #[test]
    fn port_65535_is_exact() {
        let message = Message::TcpOpenV4 {
            destination: EndpointV4::new(v4(), u16::MAX),
            stream_id: 1,
        };
        match Message::decode(&message.encode()).unwrap() {
            Message::TcpOpenV4 { destination, .. } => assert_eq!(destination.port, u16::MAX),
            other => panic!("wrong variant: {other}"),
        }
    }

    #[test]
    fn ip_request_v4_is_single_byte() {
        assert_eq!(Message::IpRequestV4.encode().as_ref(), &[0x0B]);
        assert_eq!(Message::decode(&[0x0B]).unwrap(), Message::IpRequestV4);
    }

    #[test]
    fn tcp_close_concrete_bytes() {
        let encoded = Message::TcpClose { stream_id: 1 }.encode();
        assert_eq!(encoded.as_ref(), &[0x02, 0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn tcp_open_v4_concrete_layout() {
        let encoded = Message::TcpOpenV4 {
            destination: EndpointV4::new(Ipv4Addr::new(1, 2, 3, 4), 0x0506),
            stream_id: 0x0708,
        }
        .encode();
        assert_eq!(
            encoded.as_ref(),
            &[0x00, 0x05, 0x06, 1, 2, 3, 4, 0, 0, 0, 0, 0, 0, 0x07, 0x08]
        );
    }

    #[test]
    fn empty_body_rejected() {
        assert_eq!(Message::decode(&[]), Err(WireError::EmptyMessage));
    }

    #[test]
    fn unknown_discriminants_rejected() {
        for discriminant in [19u8, 20, 0x7F, 0xFF] {
            assert_eq!(
                Message::decode(&[discriminant]),
                Err(WireError::UnknownDiscriminant(discriminant))
            );
        }
    }

    #[test]
    fn every_strict_prefix_is_rejected() {
        // Representatives use minimal payloads, so no truncation can land
        // on another valid encoding of the same variant.
        for message in representatives() {
            let encoded = message.encode();
            for cut in 0..encoded.len() {
                let result = Message::decode(&encoded[..cut]);
                assert!(
                    matches!(
                        result,
                        Err(WireError::EmptyMessage) | Err(WireError::TruncatedField(_))
                    ),
                    "prefix {cut}/{} of {message} decoded to {result:?}",
                    encoded.len()
                );
            }
        }
    }

    #[test]
    fn empty_payload_rejected_where_required() {
        // Each body is a valid header with nothing after the fixed fields.
        let mut tcp_data = vec![kind::TCP_DATA];
        tcp_data.extend_from_slice(&[0; STREAM_ID_LEN]);
        let mut udp_v4 = vec![kind::UDP_DATA_V4];
        udp_v4.extend_from_slice(&[0; ENDPOINT_V4_LEN]);
        let mut udp_v6 = vec![kind::UDP_DATA_V6];
        udp_v6.extend_from_slice(&[0; ENDPOINT_V6_LEN]);
        let mut icmp_v4 = vec![kind::ICMP_DATA_V4];
        icmp_v4.extend_from_slice(&[0; IPV4_LEN]);
        let mut icmp_v6 = vec![kind::ICMP_DATA_V6];
        icmp_v6.extend_from_slice(&[0; IPV6_LEN]);

        for body in [tcp_data, udp_v4, udp_v6, icmp_v4, icmp_v6] {
            assert_eq!(
                Message::decode(&body),
                Err(WireError::TruncatedField("payload"))
            );
        }
    }

    #[test]
    fn ip_data_may_be_empty() {
        assert_eq!(
            Message::decode(&[kind::IP_DATA_V4]).unwrap(),
            Message::IpDataV4(Bytes::new())
        );
        assert_eq!(
            Message::decode(&[kind::IP_DATA_V6]).unwrap(),
            Message::IpDataV6(Bytes::new())
        );
    }

    #[test]
    fn tcp_data_stream_id_field_is_eight_bytes() {
        // Seven bytes after the discriminant is a short stream id, not a
        // short payload.
        let mut body = vec![kind::TCP_DATA];
        body.extend_from_slice(&[0; 7]);
        assert_eq!(
            Message::decode(&body),
            Err(WireError::TruncatedField("stream id"))
        );

        // Exactly eight id bytes plus one payload byte decodes.
        let mut body = vec![kind::TCP_DATA];
        body.extend_from_slice(&1u64.to_be_bytes());
        body.push(0xAA);
        assert_eq!(
            Message::decode(&body).unwrap(),
            Message::TcpData {
                stream_id: 1,
                payload: Bytes::from_static(&[0xAA]),
            }
        );
    }

    #[test]
    fn dual_stack_remainder_must_be_sixteen_bytes() {
        for extra in [15usize, 17] {
            let mut body = vec![kind::IP_ASSIGN_DUAL_STACK];
            body.extend_from_slice(&[0; IPV4_LEN]);
            body.extend_from_slice(&vec![0; extra]);
            assert_eq!(
                Message::decode(&body),
                Err(WireError::TruncatedField("ipv6 address"))
            );
        }
    }

    #[test]
    fn bare_address_variants_reject_overlong_tails() {
        let mut body = vec![kind::IP_ASSIGN_V4];
        body.extend_from_slice(&[10, 0, 0, 1, 99]);
        assert_eq!(
            Message::decode(&body),
            Err(WireError::TruncatedField("ipv4 address"))
        );

        let mut body = vec![kind::IP_REUSE_V6];
        body.extend_from_slice(&[0; 17]);
        assert_eq!(
            Message::decode(&body),
            Err(WireError::TruncatedField("ipv6 address"))
        );
    }

    #[test]
    fn request_variants_ignore_trailing_bytes() {
        // Request messages have no fields; trailing bytes are discarded.
        assert_eq!(
            Message::decode(&[kind::IP_REQUEST_V6, 0xFF]).unwrap(),
            Message::IpRequestV6
        );
    }

    #[test]
    fn display_names_match_kind_names() {
        for message in representatives() {
            assert!(
                message.to_string().starts_with(message.kind_name()),
                "display for {} does not lead with its kind name",
                message.kind_name()
            );
        }
    }
}
