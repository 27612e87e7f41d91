use std::io::{Read, Write};

use crate::error::MqttError;
use crate::types::{read_u8, QoS, VariableByteInteger};

use super::PacketType;

/// The first two to five bytes of every MQTT control packet: packet type, flags and the remaining length.
///
/// The flag bits are kept as they appear on the wire for every packet type. Only `PUBLISH` gives them a meaning,
/// all other types have fixed values (see [FixedHeader::new]) which the dispatcher checks after decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedHeader {
    pub packet_type: PacketType,
    pub dup: bool,
    pub qos: QoS,
    pub retain: bool,
    /// Number of bytes following the fixed header, i.e. variable header plus payload.
    pub remaining_length: u32,
}

impl FixedHeader {

    const TYPE_SHIFT: u8 = 4;
    const DUP_FLAG_MASK: u8 = 0b0000_1000;
    const QOS_MASK: u8 = 0b0000_0110;
    const RETAIN_FLAG_MASK: u8 = 0b0000_0001;

    /// Creates a header with the reserved flags the standard demands for `packet_type`: `0b0010` for `PUBREL`,
    /// `SUBSCRIBE` and `UNSUBSCRIBE`, all zero otherwise.
    pub fn new(packet_type: PacketType, remaining_length: u32) -> Self {
        let qos = match packet_type {
            PacketType::PUBREL | PacketType::SUBSCRIBE | PacketType::UNSUBSCRIBE => QoS::AtLeastOnce,
            _=> QoS::AtMostOnce,
        };

        FixedHeader { packet_type, dup: false, qos, retain: false, remaining_length }
    }

    /// A `PUBLISH` header, the only one where all flags are up to the sender.
    pub fn publish(dup: bool, qos: QoS, retain: bool, remaining_length: u32) -> Self {
        FixedHeader { packet_type: PacketType::PUBLISH, dup, qos, retain, remaining_length }
    }

    /// The lower four bits of the first byte.
    pub fn flags(&self) -> u8 {
        let mut flags = u8::from(self.qos) << 1;
        if self.dup {
            flags |= Self::DUP_FLAG_MASK;
        }
        if self.retain {
            flags |= Self::RETAIN_FLAG_MASK;
        }
        flags
    }

    /// Packet type in the upper four bits, flags in the lower four.
    pub fn first_byte(&self) -> u8 {
        (u8::from(self.packet_type) << Self::TYPE_SHIFT) | self.flags()
    }

    /// Fails with [MqttError::MalformedPacket] if a packet type other than `PUBLISH` carries flags different from
    /// the reserved ones.
    pub fn validate_flags(&self) -> Result<(), MqttError> {
        if self.packet_type == PacketType::PUBLISH {
            return Ok(())
        }

        let reserved = FixedHeader::new(self.packet_type, self.remaining_length);
        match reserved.flags() == self.flags() {
            true => Ok(()),
            false => Err(MqttError::invalid_flags(self.packet_type, self.first_byte())),
        }
    }

    pub fn write_to<W: Write>(&self, dst: &mut W) -> Result<(), MqttError> {
        let remaining_length = VariableByteInteger::new(self.remaining_length)?;
        dst.write_all(&[self.first_byte()])?;
        remaining_length.encode(dst)
    }

    pub fn read_from<R: Read>(src: &mut R) -> Result<Self, MqttError> {
        let first_byte = read_u8(src)?;
        let packet_type = PacketType::try_from(first_byte)?;
        let qos = QoS::try_from((first_byte & Self::QOS_MASK) >> 1)?;
        let remaining_length = VariableByteInteger::decode(src)?.value;

        Ok(FixedHeader {
            packet_type,
            dup: first_byte & Self::DUP_FLAG_MASK != 0,
            qos,
            retain: first_byte & Self::RETAIN_FLAG_MASK != 0,
            remaining_length,
        })
    }
}
