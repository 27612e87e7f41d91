use std::io::Read;

use crate::error::MqttError;

use super::{Decodeable, FixedHeader, MqttControlPacket, PacketType};

/// Sent by the client to keep the connection alive when there is nothing else to send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pingreq;

/// The server's answer to [Pingreq].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pingresp;

/// The last packet a client sends before closing the connection. In 3.1.1 only clients send it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Disconnect;

macro_rules! empty_body {
    ($name:ident, $packet_type:expr) => {
        impl MqttControlPacket for $name {
            fn packet_type() -> PacketType {
                $packet_type
            }

            fn encode_body(&self, _: &mut Vec<u8>) -> Result<(), MqttError> {
                Ok(())
            }
        }

        impl Decodeable for $name {
            fn decode_body<R: Read>(_: &FixedHeader, _: &mut R) -> Result<Self, MqttError> {
                Ok($name)
            }
        }
    };
}

empty_body!(Pingreq, PacketType::PINGREQ);
empty_body!(Pingresp, PacketType::PINGRESP);
empty_body!(Disconnect, PacketType::DISCONNECT);

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn encode() -> Result<(), MqttError> {
        assert_eq!(vec![0b11000000, 0], Pingreq.to_bytes()?);
        assert_eq!(vec![0b11010000, 0], Pingresp.to_bytes()?);
        assert_eq!(vec![0b11100000, 0], Disconnect.to_bytes()?);
        Ok(())
    }

    #[test]
    fn decode() -> Result<(), MqttError> {
        assert_eq!(Pingresp, Pingresp::read_from(&mut Cursor::new(vec![0xD0, 0x00]))?);
        Ok(())
    }

    #[test]
    fn decode_with_body() {
        let result = Pingresp::read_from(&mut Cursor::new(vec![0xD0, 0x01, 0x00]));
        assert!(matches!(result, Err(MqttError::MalformedPacket(_))));
    }
}
