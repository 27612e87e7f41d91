use std::io::Read;

use crate::error::MqttError;
use crate::types::{read_u16, read_u8, write_string, write_u16, VarLengthString};

use super::{Decodeable, FixedHeader, MqttControlPacket, PacketType};

/// CONNECT
///
/// Fixed Header (packet type (1) | reserved (0)):
/// 0001 0000
/// [remaining length] (len(variable_header) + len(payload))
///
/// Variable Header:
///     Protocol Name ('MQTT')
///     Protocol Level (4)
///     Connect Flags (username, password, will retain, will qos (2 bits), will flag, clean session, reserved)
///     Keep Alive (2 byte, KA interval in seconds)
///
/// Payload:
/// ClientID, [username], [password]
///
/// Will messages are not supported, the will flags are always `0`.
///
/// # Examples
///
/// ```
/// use empaquette::packet::{Connect, MqttControlPacket};
///
/// let connect = Connect::with_client_id("clienttesttoto").unwrap();
/// let bytes = connect.to_bytes().unwrap();
/// assert_eq!(&[0x10, 0x1A, 0x00, 0x04, b'M', b'Q', b'T', b'T', 0x04, 0x00, 0x0E, 0x10], &bytes[..12]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connect {
    /// `4` for MQTT 3.1.1.
    pub protocol_level: u8,

    /// Whether the server should throw away any previous session state for this client ID.
    /// Defaults to `false`.
    pub clean_session: bool,

    /// Maximum interval in seconds between two packets sent by the client. `0` turns keep alive off.
    pub keep_alive: u16,

    pub client_id: VarLengthString,

    pub username: Option<VarLengthString>,

    /// Binary data, may only be set together with a [Connect::username].
    pub password: Option<VarLengthString>,
}

impl Connect {

    pub const PROTOCOL_NAME: &'static [u8] = b"MQTT";
    pub const PROTOCOL_LEVEL: u8 = 4;
    pub const DEFAULT_KEEP_ALIVE: u16 = 3600;

    const USERNAME_FLAG: u8 = 0b1000_0000;
    const PASSWORD_FLAG: u8 = 0b0100_0000;
    /// will retain, will qos and will flag
    const WILL_FLAGS: u8 = 0b0011_1100;
    const CLEAN_SESSION_FLAG: u8 = 0b0000_0010;
    const RESERVED_FLAG: u8 = 0b0000_0001;

    /// Fails if `client_id` exceeds 65,535 bytes.
    pub fn with_client_id(client_id: &str) -> Result<Self, MqttError> {
        Ok(Connect {
            protocol_level: Self::PROTOCOL_LEVEL,
            clean_session: false,
            keep_alive: Self::DEFAULT_KEEP_ALIVE,
            client_id: VarLengthString::try_from(client_id)?,
            username: None,
            password: None,
        })
    }

    pub fn connect_flags(&self) -> u8 {
        let mut flags = 0;
        if self.username.is_some() {
            flags |= Self::USERNAME_FLAG;
        }
        if self.password.is_some() {
            flags |= Self::PASSWORD_FLAG;
        }
        if self.clean_session {
            flags |= Self::CLEAN_SESSION_FLAG;
        }
        flags
    }
}

impl MqttControlPacket for Connect {

    fn packet_type() -> PacketType {
        PacketType::CONNECT
    }

    fn encode_body(&self, body: &mut Vec<u8>) -> Result<(), MqttError> {
        if self.password.is_some() && self.username.is_none() {
            return Err(MqttError::ProtocolError("CONNECT with a password requires a username".to_string()))
        }

        // variable header
        write_string(body, Self::PROTOCOL_NAME)?;
        body.push(self.protocol_level);
        body.push(self.connect_flags());
        write_u16(body, self.keep_alive)?;

        // payload
        self.client_id.write_to(body)?;
        if let Some(username) = &self.username {
            username.write_to(body)?;
        }
        if let Some(password) = &self.password {
            password.write_to(body)?;
        }

        Ok(())
    }
}

impl Decodeable for Connect {

    fn decode_body<R: Read>(_: &FixedHeader, src: &mut R) -> Result<Self, MqttError> {
        let protocol_name = VarLengthString::read_from(src)?;
        if protocol_name.as_bytes() != Self::PROTOCOL_NAME {
            return Err(MqttError::MalformedPacket(format!("Invalid protocol name: {}", protocol_name)))
        }

        let protocol_level = read_u8(src)?;

        let flags = read_u8(src)?;
        if flags & Self::RESERVED_FLAG != 0 {
            return Err(MqttError::MalformedPacket(format!("Reserved CONNECT flag is set: {:08b}", flags)))
        }
        if flags & Self::WILL_FLAGS != 0 {
            return Err(MqttError::MalformedPacket(format!("Will messages are not supported: {:08b}", flags)))
        }
        if flags & Self::PASSWORD_FLAG != 0 && flags & Self::USERNAME_FLAG == 0 {
            return Err(MqttError::MalformedPacket(format!("Password flag without username flag: {:08b}", flags)))
        }

        let keep_alive = read_u16(src)?;
        let client_id = VarLengthString::read_from(src)?;

        let username = match flags & Self::USERNAME_FLAG {
            0 => None,
            _=> Some(VarLengthString::read_from(src)?),
        };
        let password = match flags & Self::PASSWORD_FLAG {
            0 => None,
            _=> Some(VarLengthString::read_from(src)?),
        };

        Ok(Connect {
            protocol_level,
            clean_session: flags & Self::CLEAN_SESSION_FLAG != 0,
            keep_alive,
            client_id,
            username,
            password,
        })
    }
}
