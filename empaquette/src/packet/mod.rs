//! Representations of MQTT 3.1.1 control packets.
//! Includes serialization and deserialization of packets into and from byte streams.
//!
//! Every packet struct holds its variable header and payload fields, plus whatever of the fixed header flags are
//! meaningful for it (only [Publish] has any). The fixed header itself is never part of the structs; it is derived
//! on encoding and consumed by the [dispatcher](read_packet) on decoding.
//!
//! Encoding always serializes the body into a scratch buffer first, since the remaining length in the fixed header
//! has to be known before any byte of the body can be written.

mod connack;
mod connect;
mod header;
mod ping;
mod puback;
mod publish;
mod suback;
mod subscribe;
mod unsubscribe;

use std::fmt::Display;
use std::io::{self, Read, Write};

use log::{debug, trace, warn};

use crate::error::MqttError;

pub use self::connack::Connack;
pub use self::connect::Connect;
pub use self::header::FixedHeader;
pub use self::ping::{Disconnect, Pingreq, Pingresp};
pub use self::puback::{Puback, Pubcomp, Pubrec, Pubrel, Unsuback};
pub use self::publish::Publish;
pub use self::suback::Suback;
pub use self::subscribe::Subscribe;
pub use self::unsubscribe::Unsubscribe;

/// MQTT control packet types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    CONNECT = 1,
    CONNACK = 2,
    PUBLISH = 3,
    PUBACK = 4,
    PUBREC = 5,
    PUBREL = 6,
    PUBCOMP = 7,
    SUBSCRIBE = 8,
    SUBACK = 9,
    UNSUBSCRIBE = 10,
    UNSUBACK = 11,
    PINGREQ = 12,
    PINGRESP = 13,
    DISCONNECT = 14,
}

impl TryFrom<u8> for PacketType {
    type Error = MqttError;

    /// Takes the first byte of a fixed header, the lower four bits are ignored.
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let shifted = value >> 4;

        match shifted {
            1 => Ok(PacketType::CONNECT),
            2 => Ok(PacketType::CONNACK),
            3 => Ok(PacketType::PUBLISH),
            4 => Ok(PacketType::PUBACK),
            5 => Ok(PacketType::PUBREC),
            6 => Ok(PacketType::PUBREL),
            7 => Ok(PacketType::PUBCOMP),
            8 => Ok(PacketType::SUBSCRIBE),
            9 => Ok(PacketType::SUBACK),
            10 => Ok(PacketType::UNSUBSCRIBE),
            11 => Ok(PacketType::UNSUBACK),
            12 => Ok(PacketType::PINGREQ),
            13 => Ok(PacketType::PINGRESP),
            14 => Ok(PacketType::DISCONNECT),
            _=> Err(MqttError::InvalidPacketType(shifted)),
        }
    }
}

impl From<PacketType> for u8 {
    fn from(packet_type: PacketType) -> Self {
        packet_type as u8
    }
}

impl Display for PacketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            PacketType::CONNECT => write!(f, "CONNECT"),
            PacketType::CONNACK => write!(f, "CONNACK"),
            PacketType::PUBLISH => write!(f, "PUBLISH"),
            PacketType::PUBACK => write!(f, "PUBACK"),
            PacketType::PUBREC => write!(f, "PUBREC"),
            PacketType::PUBREL => write!(f, "PUBREL"),
            PacketType::PUBCOMP => write!(f, "PUBCOMP"),
            PacketType::SUBSCRIBE => write!(f, "SUBSCRIBE"),
            PacketType::SUBACK => write!(f, "SUBACK"),
            PacketType::UNSUBSCRIBE => write!(f, "UNSUBSCRIBE"),
            PacketType::UNSUBACK => write!(f, "UNSUBACK"),
            PacketType::PINGREQ => write!(f, "PINGREQ"),
            PacketType::PINGRESP => write!(f, "PINGRESP"),
            PacketType::DISCONNECT => write!(f, "DISCONNECT"),
        }
    }
}

/// Common behavior for MQTT control packets: everything that can be sent can be encoded.
pub trait MqttControlPacket {

    fn packet_type() -> PacketType;

    /// Appends variable header and payload to `body`.
    fn encode_body(&self, body: &mut Vec<u8>) -> Result<(), MqttError>;

    /// The fixed header to send in front of a body of `remaining_length` bytes.
    fn fixed_header(&self, remaining_length: u32) -> FixedHeader {
        FixedHeader::new(Self::packet_type(), remaining_length)
    }

    /// Writes the complete packet to `dst`. Nothing is written if encoding the body fails.
    fn write_to<W: Write>(&self, dst: &mut W) -> Result<(), MqttError> {
        let mut body = Vec::new();
        self.encode_body(&mut body)?;

        let remaining_length = u32::try_from(body.len()).map_err(|_| MqttError::MalformedLength)?;
        self.fixed_header(remaining_length).write_to(dst)?;
        dst.write_all(&body)?;
        Ok(())
    }

    /// The complete packet including its fixed header.
    fn to_bytes(&self) -> Result<Vec<u8>, MqttError> {
        let mut result = Vec::new();
        self.write_to(&mut result)?;
        Ok(result)
    }
}

/// Packets that can also be parsed.
pub trait Decodeable: MqttControlPacket + Sized {

    /// Parses variable header and payload.
    ///
    /// `src` yields at most `header.remaining_length` bytes, and it is a [MqttError::MalformedPacket] if the
    /// implementation does not consume all of them.
    fn decode_body<R: Read>(header: &FixedHeader, src: &mut R) -> Result<Self, MqttError>;

    /// Reads a fixed header from `src` and then the body, failing if the packet is of a different type.
    fn read_from<R: Read>(src: &mut R) -> Result<Self, MqttError> {
        let header = FixedHeader::read_from(src)?;
        if header.packet_type != Self::packet_type() {
            return Err(MqttError::unexpected_packet(&Self::packet_type().to_string(), header.packet_type))
        }
        decode_exact(&header, src)
    }
}

/// Limits `src` to the remaining length of `header` and makes sure the decoder uses up every byte of it.
fn decode_exact<P: Decodeable, R: Read>(header: &FixedHeader, src: &mut R) -> Result<P, MqttError> {
    header.validate_flags()?;

    let mut body = src.by_ref().take(header.remaining_length as u64);
    let packet = match P::decode_body(header, &mut body) {
        // the stream itself may still have data, the declared length was too short for the fields
        Err(MqttError::Transport(e)) if e.kind() == io::ErrorKind::UnexpectedEof && body.limit() == 0 => {
            return Err(MqttError::MalformedPacket(format!(
                "{} body shorter than its fields, remaining length {}", header.packet_type, header.remaining_length)))
        },
        els => els?,
    };

    match body.limit() {
        0 => Ok(packet),
        left => Err(MqttError::MalformedPacket(format!(
            "{} has {} unexpected trailing bytes", header.packet_type, left))),
    }
}

/// Reads and discards the body following `header`, so the next read starts at a fixed header again.
fn drain_body<R: Read>(header: &FixedHeader, src: &mut R) -> Result<(), MqttError> {
    let expected = header.remaining_length as u64;
    let drained = io::copy(&mut src.by_ref().take(expected), &mut io::sink())?;
    if drained < expected {
        return Err(MqttError::Transport(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("stream ended after {} of {} bytes", drained, expected))))
    }
    Ok(())
}

/// Any MQTT 3.1.1 control packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Connect(Connect),
    Connack(Connack),
    Publish(Publish),
    Puback(Puback),
    Pubrec(Pubrec),
    Pubrel(Pubrel),
    Pubcomp(Pubcomp),
    Subscribe(Subscribe),
    Suback(Suback),
    Unsubscribe(Unsubscribe),
    Unsuback(Unsuback),
    Pingreq(Pingreq),
    Pingresp(Pingresp),
    Disconnect(Disconnect),
}

impl Packet {

    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::Connect(_) => PacketType::CONNECT,
            Packet::Connack(_) => PacketType::CONNACK,
            Packet::Publish(_) => PacketType::PUBLISH,
            Packet::Puback(_) => PacketType::PUBACK,
            Packet::Pubrec(_) => PacketType::PUBREC,
            Packet::Pubrel(_) => PacketType::PUBREL,
            Packet::Pubcomp(_) => PacketType::PUBCOMP,
            Packet::Subscribe(_) => PacketType::SUBSCRIBE,
            Packet::Suback(_) => PacketType::SUBACK,
            Packet::Unsubscribe(_) => PacketType::UNSUBSCRIBE,
            Packet::Unsuback(_) => PacketType::UNSUBACK,
            Packet::Pingreq(_) => PacketType::PINGREQ,
            Packet::Pingresp(_) => PacketType::PINGRESP,
            Packet::Disconnect(_) => PacketType::DISCONNECT,
        }
    }
}

/// Reads exactly one packet from `src`.
///
/// `SUBSCRIBE` and `UNSUBSCRIBE` only ever travel from client to server, so there is no decoder for them. Their body
/// is skipped before returning [MqttError::UnsupportedPacketType], which leaves `src` at the start of the next packet.
///
/// Any other error leaves `src` at an undefined position.
pub fn read_packet<R: Read>(src: &mut R) -> Result<Packet, MqttError> {
    let header = FixedHeader::read_from(src)?;
    debug!("Received {} with remaining length {}", header.packet_type, header.remaining_length);

    let packet = match header.packet_type {
        PacketType::CONNECT => Packet::Connect(decode_exact(&header, src)?),
        PacketType::CONNACK => Packet::Connack(decode_exact(&header, src)?),
        PacketType::PUBLISH => Packet::Publish(decode_exact(&header, src)?),
        PacketType::PUBACK => Packet::Puback(decode_exact(&header, src)?),
        PacketType::PUBREC => Packet::Pubrec(decode_exact(&header, src)?),
        PacketType::PUBREL => Packet::Pubrel(decode_exact(&header, src)?),
        PacketType::PUBCOMP => Packet::Pubcomp(decode_exact(&header, src)?),
        PacketType::SUBACK => Packet::Suback(decode_exact(&header, src)?),
        PacketType::UNSUBACK => Packet::Unsuback(decode_exact(&header, src)?),
        PacketType::PINGREQ => Packet::Pingreq(decode_exact(&header, src)?),
        PacketType::PINGRESP => Packet::Pingresp(decode_exact(&header, src)?),
        PacketType::DISCONNECT => Packet::Disconnect(decode_exact(&header, src)?),
        unsupported @ (PacketType::SUBSCRIBE | PacketType::UNSUBSCRIBE) => {
            warn!("Skipping {} bytes of unsupported {}", header.remaining_length, unsupported);
            drain_body(&header, src)?;
            return Err(MqttError::UnsupportedPacketType(unsupported))
        },
    };

    trace!("{:?}", packet);
    Ok(packet)
}

/// Writes `packet` including its fixed header to `dst`.
pub fn write_packet<W: Write>(dst: &mut W, packet: &Packet) -> Result<(), MqttError> {
    match packet {
        Packet::Connect(p) => p.write_to(dst),
        Packet::Connack(p) => p.write_to(dst),
        Packet::Publish(p) => p.write_to(dst),
        Packet::Puback(p) => p.write_to(dst),
        Packet::Pubrec(p) => p.write_to(dst),
        Packet::Pubrel(p) => p.write_to(dst),
        Packet::Pubcomp(p) => p.write_to(dst),
        Packet::Subscribe(p) => p.write_to(dst),
        Packet::Suback(p) => p.write_to(dst),
        Packet::Unsubscribe(p) => p.write_to(dst),
        Packet::Unsuback(p) => p.write_to(dst),
        Packet::Pingreq(p) => p.write_to(dst),
        Packet::Pingresp(p) => p.write_to(dst),
        Packet::Disconnect(p) => p.write_to(dst),
    }
}
