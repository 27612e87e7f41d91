use std::io::Read;

use crate::error::MqttError;
use crate::types::{read_u16, read_u8, write_u16, SubscribeReturnCode};

use super::{Decodeable, FixedHeader, MqttControlPacket, PacketType};

/// The server's answer to a [`SUBSCRIBE`](super::Subscribe), one return code per requested topic filter, in the same
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suback {
    pub packet_identifier: u16,
    pub return_codes: Vec<SubscribeReturnCode>,
}

impl MqttControlPacket for Suback {

    fn packet_type() -> PacketType {
        PacketType::SUBACK
    }

    fn encode_body(&self, body: &mut Vec<u8>) -> Result<(), MqttError> {
        write_u16(body, self.packet_identifier)?;
        body.extend(self.return_codes.iter().map(|code| u8::from(*code)));
        Ok(())
    }
}

impl Decodeable for Suback {

    /// Everything after the packet identifier is a return code, one byte each.
    fn decode_body<R: Read>(header: &FixedHeader, src: &mut R) -> Result<Self, MqttError> {
        let packet_identifier = read_u16(src)?;

        let count = (header.remaining_length as usize).saturating_sub(2);
        let mut return_codes = Vec::with_capacity(count);
        for _ in 0..count {
            return_codes.push(SubscribeReturnCode::try_from(read_u8(src)?)?);
        }

        Ok(Suback { packet_identifier, return_codes })
    }
}
