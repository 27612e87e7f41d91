use crate::error::MqttError;
use crate::types::{write_u16, QoS, VarLengthString};

use super::{MqttControlPacket, PacketType};

/// Asks the server for messages published to one or more topic filters.
///
/// Only the client side is implemented, there is no decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscribe {
    pub packet_identifier: u16,
    /// Topic filters, each with the maximum QoS the server may use for messages it forwards. At least one is
    /// required.
    pub topic_filters: Vec<(VarLengthString, QoS)>,
}

impl Subscribe {

    /// A subscription to a single filter. Fails if `filter` exceeds 65,535 bytes.
    pub fn new(packet_identifier: u16, filter: &str, maximum_qos: QoS) -> Result<Self, MqttError> {
        Ok(Subscribe {
            packet_identifier,
            topic_filters: vec![(VarLengthString::try_from(filter)?, maximum_qos)],
        })
    }
}

impl MqttControlPacket for Subscribe {

    fn packet_type() -> PacketType {
        PacketType::SUBSCRIBE
    }

    fn encode_body(&self, body: &mut Vec<u8>) -> Result<(), MqttError> {
        if self.topic_filters.is_empty() {
            return Err(MqttError::ProtocolError("SUBSCRIBE requires at least one topic filter".to_string()))
        }

        write_u16(body, self.packet_identifier)?;
        for (filter, qos) in &self.topic_filters {
            filter.write_to(body)?;
            body.push((*qos).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn encode() -> Result<(), MqttError> {
        let subscribe = Subscribe::new(1, "a/b", QoS::AtLeastOnce)?;
        assert_eq!(vec![0x82, 0x08, 0x00, 0x01, 0x00, 0x03, 0x61, 0x2F, 0x62, 0x01], subscribe.to_bytes()?);
        Ok(())
    }

    #[test]
    fn encode_multiple() -> Result<(), MqttError> {
        let mut subscribe = Subscribe::new(10, "a/#", QoS::ExactlyOnce)?;
        subscribe.topic_filters.push(("+".try_into()?, QoS::AtMostOnce));

        let expect: Vec<u8> = vec![0x82, 0x0C, 0x00, 0x0A, 0x00, 0x03, 0x61, 0x2F, 0x23, 0x02, 0x00, 0x01, 0x2B, 0x00];
        assert_eq!(expect, subscribe.to_bytes()?);
        Ok(())
    }

    #[test]
    fn encode_without_filters() {
        let subscribe = Subscribe { packet_identifier: 1, topic_filters: vec![] };
        assert!(matches!(subscribe.to_bytes(), Err(MqttError::ProtocolError(_))));
    }
}
