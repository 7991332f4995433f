use std::fmt::Display;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

use flower_transport::{FrameConfig, FrameReader, FrameWriter, TcpTransport, TransportError};

use crate::channel::{ChannelConfig, MessageChannel};
use crate::error::Result;

/// A message channel over one TCP connection.
pub type TcpChannel = MessageChannel<FrameReader<TcpStream>, FrameWriter<TcpStream>>;

/// Connect to a listening tunnel endpoint.
pub fn connect(addr: impl ToSocketAddrs + Display) -> Result<TcpChannel> {
    connect_with_config(addr, FrameConfig::default(), ChannelConfig::default())
}

/// Connect with explicit frame and channel configuration.
pub fn connect_with_config(
    addr: impl ToSocketAddrs + Display,
    frame_config: FrameConfig,
    channel_config: ChannelConfig,
) -> Result<TcpChannel> {
    let stream = TcpTransport::connect(addr)?;
    channel_from_stream(stream, frame_config, channel_config)
}

/// Listens for and accepts tunnel connections, one channel per peer.
pub struct ChannelListener {
    transport: TcpTransport,
    frame_config: FrameConfig,
    channel_config: ChannelConfig,
}

impl ChannelListener {
    /// Bind to a TCP address.
    pub fn bind(addr: impl ToSocketAddrs + Display) -> Result<Self> {
        Ok(Self {
            transport: TcpTransport::bind(addr)?,
            frame_config: FrameConfig::default(),
            channel_config: ChannelConfig::default(),
        })
    }

    /// Override frame configuration for accepted connections.
    pub fn with_frame_config(mut self, config: FrameConfig) -> Self {
        self.frame_config = config;
        self
    }

    /// Override channel configuration for accepted connections.
    pub fn with_channel_config(mut self, config: ChannelConfig) -> Self {
        self.channel_config = config;
        self
    }

    /// Accept the next connection (blocking) and wrap it in a channel.
    pub fn accept(&self) -> Result<TcpChannel> {
        let stream = self.transport.accept()?;
        channel_from_stream(
            stream,
            self.frame_config.clone(),
            self.channel_config.clone(),
        )
    }

    /// Bound listening address.
    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }
}

/// Split one stream into reader/writer halves and assemble a channel.
fn channel_from_stream(
    stream: TcpStream,
    frame_config: FrameConfig,
    channel_config: ChannelConfig,
) -> Result<TcpChannel> {
    let read_stream = stream.try_clone().map_err(TransportError::Io)?;
    let reader = FrameReader::with_config_tcp(read_stream, frame_config.clone())?;
    let writer = FrameWriter::with_config_tcp(stream, frame_config)?;
    Ok(MessageChannel::with_config(reader, writer, channel_config))
}

#[cfg(test)]
mod tests {
    use std::thread;

    use flower_wire::Message;

    use super::*;

    #[test]
    fn connect_and_exchange() {
        let listener = ChannelListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr();

        let server = thread::spawn(move || {
            let channel = listener.accept().unwrap();
            let request = channel.read_message().unwrap();
            assert_eq!(request, Message::IpRequestV4);
            channel
                .write_message(&Message::IpAssignV4("10.8.0.2".parse().unwrap()))
                .unwrap();
        });

        let client = connect(addr).unwrap();
        client.write_message(&Message::IpRequestV4).unwrap();
        assert_eq!(
            client.read_message().unwrap(),
            Message::IpAssignV4("10.8.0.2".parse().unwrap())
        );

        server.join().unwrap();
    }

    #[test]
    fn accepted_channels_inherit_capture_config() {
        let listener = ChannelListener::bind("127.0.0.1:0")
            .unwrap()
            .with_channel_config(ChannelConfig {
                capture_reads: true,
                capture_writes: false,
            });
        let addr = listener.local_addr();

        let server = thread::spawn(move || {
            let channel = listener.accept().unwrap();
            channel.read_message().unwrap();
            assert_eq!(
                channel.captured_reads(),
                vec![bytes::Bytes::from_static(&[0x0B])]
            );
        });

        let client = connect(addr).unwrap();
        client.write_message(&Message::IpRequestV4).unwrap();

        server.join().unwrap();
    }
}
