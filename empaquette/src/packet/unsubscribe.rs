use crate::error::MqttError;
use crate::types::{write_u16, VarLengthString};

use super::{MqttControlPacket, PacketType};

/// Removes subscriptions. Client side only, like [`SUBSCRIBE`](super::Subscribe).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsubscribe {
    pub packet_identifier: u16,
    /// Must match filters of earlier subscriptions exactly. At least one is required.
    pub topic_filters: Vec<VarLengthString>,
}

impl Unsubscribe {

    pub fn new(packet_identifier: u16, filter: &str) -> Result<Self, MqttError> {
        Ok(Unsubscribe { packet_identifier, topic_filters: vec![VarLengthString::try_from(filter)?] })
    }
}

impl MqttControlPacket for Unsubscribe {

    fn packet_type() -> PacketType {
        PacketType::UNSUBSCRIBE
    }

    fn encode_body(&self, body: &mut Vec<u8>) -> Result<(), MqttError> {
        if self.topic_filters.is_empty() {
            return Err(MqttError::ProtocolError("UNSUBSCRIBE requires at least one topic filter".to_string()))
        }

        write_u16(body, self.packet_identifier)?;
        for filter in &self.topic_filters {
            filter.write_to(body)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn encode() -> Result<(), MqttError> {
        let unsubscribe = Unsubscribe::new(2, "a/b")?;
        assert_eq!(vec![0xA2, 0x07, 0x00, 0x02, 0x00, 0x03, 0x61, 0x2F, 0x62], unsubscribe.to_bytes()?);
        Ok(())
    }

    #[test]
    fn encode_without_filters() {
        let unsubscribe = Unsubscribe { packet_identifier: 2, topic_filters: vec![] };
        assert!(matches!(unsubscribe.to_bytes(), Err(MqttError::ProtocolError(_))));
    }
}
