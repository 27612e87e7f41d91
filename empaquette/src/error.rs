//! Custom error types used throughout the crate.

use std::io;

use thiserror::Error;

use crate::packet::PacketType;
use crate::types::ConnectReturnCode;

/// Custom error types.
///
/// Nothing in this crate retries or recovers from any of these. Once a packet failed to encode or decode, the
/// connection it belongs to should be considered broken.
#[derive(Debug, Error)]
pub enum MqttError {

    /// The underlying stream failed to read or write, or ended in the middle of a packet.
    #[error("Transport Error: {0}")]
    Transport(#[from] io::Error),

    /// A Remaining Length with a continuation bit in its fourth byte, or a value above 268,435,455.
    #[error("Malformed Remaining Length")]
    MalformedLength,

    /// The upper four bits of the fixed header are outside of `1..=14`.
    #[error("Invalid packet type: {0}")]
    InvalidPacketType(u8),

    /// QoS bits set to `3`.
    #[error("Invalid QoS: {0}")]
    InvalidQoS(u8),

    /// Strings and binary fields have a two byte length, so anything beyond 65,535 bytes cannot be encoded.
    #[error("String too long: {0} bytes, the maximum is 65535")]
    StringTooLong(usize),

    /// Syntactical error indicating that a control packet could not be fully parsed.
    /// See MQTT standard `4.8`.
    #[error("Malformed Packet: {0}")]
    MalformedPacket(String),

    /// A valid packet type this crate has no decoder for. The packet body has been skipped.
    #[error("Unsupported packet type: {0}")]
    UnsupportedPacketType(PacketType),

    /// A CONNACK with a return code the standard reserves for future use.
    #[error("Unknown CONNACK return code: {0}")]
    UnknownReturnCode(u8),

    /// The server refused the connection.
    #[error("Connection refused: {0}")]
    ConnectionRefused(ConnectReturnCode),

    /// Used for packets that are well-formed but make no sense in the current exchange, or carry inconsistent data.
    #[error("Protocol Error: {0}")]
    ProtocolError(String),
}

impl MqttError {
    pub fn invalid_flags(packet_type: PacketType, first_byte: u8) -> Self {
        MqttError::MalformedPacket(format!("Invalid fixed header flags for {}: {:08b}", packet_type, first_byte))
    }

    pub fn unexpected_packet(expected: &str, actual: PacketType) -> Self {
        MqttError::ProtocolError(format!("Expected {} but received {}", expected, actual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!("Malformed Remaining Length", MqttError::MalformedLength.to_string());
        assert_eq!("Unsupported packet type: SUBSCRIBE", MqttError::UnsupportedPacketType(PacketType::SUBSCRIBE).to_string());
        assert_eq!("Invalid fixed header flags for PUBREL: 01100000",
            MqttError::invalid_flags(PacketType::PUBREL, 0b0110_0000).to_string().trim_start_matches("Malformed Packet: "));
        assert_eq!("Connection refused: not authorized",
            MqttError::ConnectionRefused(ConnectReturnCode::RefusedNotAuthorized).to_string());
    }

    #[test]
    fn from_io_error() {
        let err: MqttError = io::Error::from(io::ErrorKind::UnexpectedEof).into();
        assert!(matches!(err, MqttError::Transport(e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }
}
