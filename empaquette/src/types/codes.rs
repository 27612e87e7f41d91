use std::fmt::Display;

use crate::error::MqttError;

use super::{MqttDataType, QoS};

/// CONNACK return codes, MQTT-3.2.2.3. A single byte.
///
/// Codes above 5 are reserved by the standard. They are kept as [ConnectReturnCode::Unknown] instead of failing the
/// decode, so it is up to the caller to decide what to make of them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ConnectReturnCode {
    /// 0x00
    Accepted,
    /// 0x01
    RefusedProtocolVersion,
    /// 0x02
    RefusedIdentifierRejected,
    /// 0x03
    RefusedServerUnavailable,
    /// 0x04
    RefusedBadCredentials,
    /// 0x05
    RefusedNotAuthorized,
    /// Anything else
    Unknown(u8),
}

impl ConnectReturnCode {

    /// `true` for [ConnectReturnCode::Accepted] only.
    pub fn is_accepted(&self) -> bool {
        *self == ConnectReturnCode::Accepted
    }

    /// `false` for codes outside of the range defined by the standard.
    pub fn is_known(&self) -> bool {
        !matches!(self, ConnectReturnCode::Unknown(_))
    }
}

impl MqttDataType for ConnectReturnCode {
    fn encoded_len(&self) -> usize {
        1
    }
}

impl From<u8> for ConnectReturnCode {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Accepted,
            1 => Self::RefusedProtocolVersion,
            2 => Self::RefusedIdentifierRejected,
            3 => Self::RefusedServerUnavailable,
            4 => Self::RefusedBadCredentials,
            5 => Self::RefusedNotAuthorized,
            els => Self::Unknown(els),
        }
    }
}

impl From<ConnectReturnCode> for u8 {
    fn from(code: ConnectReturnCode) -> Self {
        match code {
            ConnectReturnCode::Accepted => 0,
            ConnectReturnCode::RefusedProtocolVersion => 1,
            ConnectReturnCode::RefusedIdentifierRejected => 2,
            ConnectReturnCode::RefusedServerUnavailable => 3,
            ConnectReturnCode::RefusedBadCredentials => 4,
            ConnectReturnCode::RefusedNotAuthorized => 5,
            ConnectReturnCode::Unknown(value) => value,
        }
    }
}

impl Display for ConnectReturnCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectReturnCode::Accepted => write!(f, "connection accepted"),
            ConnectReturnCode::RefusedProtocolVersion => write!(f, "unacceptable protocol version"),
            ConnectReturnCode::RefusedIdentifierRejected => write!(f, "identifier rejected"),
            ConnectReturnCode::RefusedServerUnavailable => write!(f, "server unavailable"),
            ConnectReturnCode::RefusedBadCredentials => write!(f, "bad user name or password"),
            ConnectReturnCode::RefusedNotAuthorized => write!(f, "not authorized"),
            ConnectReturnCode::Unknown(value) => write!(f, "unknown return code {}", value),
        }
    }
}

/// One entry of a SUBACK payload, MQTT-3.9.3: either the QoS the server granted, or a failure.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SubscribeReturnCode {
    Success(QoS),
    /// 0x80
    Failure,
}

impl SubscribeReturnCode {
    const FAILURE: u8 = 0x80;
}

impl TryFrom<u8> for SubscribeReturnCode {
    type Error = MqttError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            Self::FAILURE => Ok(Self::Failure),
            0..=2 => Ok(Self::Success(QoS::try_from(value)?)),
            _=> Err(MqttError::MalformedPacket(format!("Undefined SUBACK return code: {:#04x}", value))),
        }
    }
}

impl From<SubscribeReturnCode> for u8 {
    fn from(code: SubscribeReturnCode) -> Self {
        match code {
            SubscribeReturnCode::Success(qos) => qos.into(),
            SubscribeReturnCode::Failure => SubscribeReturnCode::FAILURE,
        }
    }
}
