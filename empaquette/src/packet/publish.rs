use std::io::{self, Read};

use crate::error::MqttError;
use crate::types::{read_u16, write_u16, MqttDataType, QoS, VarLengthString};

use super::{Decodeable, FixedHeader, MqttControlPacket, PacketType};

/// An MQTT `PUBLISH` packet is used to send a specific message to a topic.
///
/// # Examples
///
/// ```
/// use empaquette::packet::Publish;
/// use empaquette::types::QoS;
///
/// let mut publish = Publish::new("/some/topic/name", vec![0, 1, 2, 3, 4]).unwrap();
/// publish.qos_level = QoS::AtLeastOnce;
/// publish.packet_identifier = Some(21);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publish {
    // FIXED HEADER
    /// If `true` this message is considered an attempted re-delivery.
    /// Defaults to `false`, and **must** be so if QoS is `0`.
    pub dup: bool,

    /// QoS for this message.
    pub qos_level: QoS,

    /// Whether the server should keep this message for future subscribers or not.
    /// Defaults to `false`.
    pub retain: bool,

    // VARIABLE HEADER

    /// Name of the topic to publish to.
    pub topic_name: VarLengthString,

    /// Only part of the packet if QoS is > 0, where it is mandatory [MQTT-2.3.1-1].
    pub packet_identifier: Option<u16>,

    // PAYLOAD

    /// The application message. Its length is not encoded anywhere, it is whatever is left of the remaining length
    /// after the variable header. A zero length payload is valid.
    pub payload: Vec<u8>,
}

impl Publish {

    /// Creates a new QoS 0 packet. Fails if `topic_name` exceeds 65,535 bytes.
    pub fn new(topic_name: &str, payload: Vec<u8>) -> Result<Self, MqttError> {
        Ok(Self {
            dup: false,
            qos_level: QoS::AtMostOnce,
            retain: false,
            topic_name: VarLengthString::try_from(topic_name)?,
            packet_identifier: None,
            payload,
        })
    }
}

impl MqttControlPacket for Publish {

    fn packet_type() -> PacketType {
        PacketType::PUBLISH
    }

    fn encode_body(&self, body: &mut Vec<u8>) -> Result<(), MqttError> {
        self.topic_name.write_to(body)?;

        match (self.qos_level, self.packet_identifier) {
            (QoS::AtMostOnce, None) => (),
            (QoS::AtMostOnce, Some(_)) => {
                return Err(MqttError::ProtocolError("QoS 0 PUBLISH must not have a packet identifier".to_string()))
            },
            (_, Some(pid)) => write_u16(body, pid)?,
            (qos, None) => {
                return Err(MqttError::ProtocolError(format!("QoS {} PUBLISH requires a packet identifier", qos)))
            },
        }

        body.extend_from_slice(&self.payload);
        Ok(())
    }

    fn fixed_header(&self, remaining_length: u32) -> FixedHeader {
        FixedHeader::publish(self.dup, self.qos_level, self.retain, remaining_length)
    }
}

impl Decodeable for Publish {

    fn decode_body<R: Read>(header: &FixedHeader, src: &mut R) -> Result<Self, MqttError> {
        let topic_name = VarLengthString::read_from(src)?;

        let variable_header_len = match header.qos {
            QoS::AtMostOnce => topic_name.encoded_len(),
            _=> topic_name.encoded_len() + 2_u16.encoded_len(),
        };
        let payload_len = (header.remaining_length as usize).checked_sub(variable_header_len)
            .ok_or_else(|| MqttError::MalformedPacket(format!(
                "PUBLISH variable header needs {} bytes, remaining length is {}",
                variable_header_len, header.remaining_length)))?;

        let packet_identifier = match header.qos {
            QoS::AtMostOnce => None,
            _=> Some(read_u16(src)?),
        };

        // grows with the data actually received, not with the declared length
        let mut payload = Vec::new();
        src.by_ref().take(payload_len as u64).read_to_end(&mut payload)?;
        if payload.len() < payload_len {
            return Err(MqttError::Transport(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("PUBLISH payload ended after {} of {} bytes", payload.len(), payload_len))))
        }

        Ok(Publish {
            dup: header.dup,
            qos_level: header.qos,
            retain: header.retain,
            topic_name,
            packet_identifier,
            payload,
        })
    }
}
