use std::io::Read;

use crate::error::MqttError;
use crate::types::{read_u8, ConnectReturnCode};

use super::{Decodeable, FixedHeader, MqttControlPacket, PacketType};

const SESSION_PRESENT_MASK: u8 = 0b0000_0001;

/// A `CONNACK` MQTT control packet, the server's answer to a [`CONNECT`](super::Connect).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connack {

    /// Whether this connect/connack exchange resumes an existing session or starts a new one.
    pub session_present: bool,

    /// Indicates whether the connection attempt was successful, and if not why.
    pub return_code: ConnectReturnCode,
}

impl Connack {

    pub fn new(session_present: bool, return_code: ConnectReturnCode) -> Self {
        Connack { session_present, return_code }
    }

    /// `Ok` only if the server accepted the connection.
    ///
    /// Return codes the standard does not define are reported as [MqttError::UnknownReturnCode], all defined refusals
    /// as [MqttError::ConnectionRefused].
    pub fn ensure_accepted(&self) -> Result<(), MqttError> {
        match self.return_code {
            ConnectReturnCode::Accepted => Ok(()),
            ConnectReturnCode::Unknown(code) => Err(MqttError::UnknownReturnCode(code)),
            refused => Err(MqttError::ConnectionRefused(refused)),
        }
    }
}

impl MqttControlPacket for Connack {

    fn packet_type() -> PacketType {
        PacketType::CONNACK
    }

    fn encode_body(&self, body: &mut Vec<u8>) -> Result<(), MqttError> {
        body.push(self.session_present.into());
        body.push(self.return_code.into());
        Ok(())
    }
}

impl Decodeable for Connack {

    /// Only bit 0 of the acknowledge flags is looked at, the other seven are reserved.
    fn decode_body<R: Read>(_: &FixedHeader, src: &mut R) -> Result<Self, MqttError> {
        let session_present = read_u8(src)? & SESSION_PRESENT_MASK != 0;
        let return_code = ConnectReturnCode::from(read_u8(src)?);

        Ok(Connack { session_present, return_code })
    }
}
