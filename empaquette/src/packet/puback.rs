//! Packets whose body is nothing but a packet identifier.

use std::io::Read;

use crate::error::MqttError;
use crate::types::{read_u16, write_u16};

use super::{Decodeable, FixedHeader, MqttControlPacket, PacketType};

macro_rules! packet_identifier_only {
    ($(#[$doc:meta])* $name:ident, $packet_type:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name {
            pub packet_identifier: u16,
        }

        impl $name {
            pub fn new(packet_identifier: u16) -> Self {
                Self { packet_identifier }
            }
        }

        impl MqttControlPacket for $name {
            fn packet_type() -> PacketType {
                $packet_type
            }

            fn encode_body(&self, body: &mut Vec<u8>) -> Result<(), MqttError> {
                write_u16(body, self.packet_identifier)
            }
        }

        impl Decodeable for $name {
            fn decode_body<R: Read>(_: &FixedHeader, src: &mut R) -> Result<Self, MqttError> {
                Ok(Self { packet_identifier: read_u16(src)? })
            }
        }
    };
}

packet_identifier_only!(
    /// `PUBACK` is the response to a `PUBLISH` that was sent with [crate::types::QoS::AtLeastOnce].
    Puback, PacketType::PUBACK);

packet_identifier_only!(
    /// `PUBREC` is the first response to a `PUBLISH` sent with [crate::types::QoS::ExactlyOnce].
    ///
    /// The sequence of messages for QoS 2 is as follows:
    /// - `PUBLISH` -->
    /// - `PUBREC` <--
    /// - `PUBREL` -->
    /// - `PUBCOMP` <--
    Pubrec, PacketType::PUBREC);

packet_identifier_only!(
    /// `PUBREL` is the response to a [`PUBREC`](Pubrec). Its fixed header carries the reserved flags `0b0010`.
    Pubrel, PacketType::PUBREL);

packet_identifier_only!(
    /// `PUBCOMP` ends a QoS 2 exchange.
    Pubcomp, PacketType::PUBCOMP);

packet_identifier_only!(
    /// `UNSUBACK` confirms an `UNSUBSCRIBE` with the same packet identifier.
    Unsuback, PacketType::UNSUBACK);
