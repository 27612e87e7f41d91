//! MQTT data types and representations.
//!
//! These types all map more or less to rust data types directly,
//! and exist as a bridge to the binary-level protocol.
//!
//! | MQTT type | rust type | Crate type | Description |
//! | --------- | --------- | ---------- | ----------- |
//! | Byte | [u8] | - | Single byte |
//! | Two Byte Integer | [u16] | - | Unsigned 16-bit integer (Big-Endian) |
//! | Remaining Length | [u32] | [VariableByteInteger](self::integer::VariableByteInteger) | 7 bits per byte, 1 to 4 bytes |
//! | UTF-8 String | `Vec<u8>` | [VarLengthString](self::string::VarLengthString) | Max length 65,535 bytes, prefixed with its length |
//!
//! All of them are read from any [std::io::Read] and written to any [std::io::Write], one field at a time.
//! Reading never goes past the bytes a field needs, so the same stream can be handed to the next decoder.

mod codes;
mod integer;
mod qos;
mod string;

pub use self::codes::{ConnectReturnCode, SubscribeReturnCode};
pub use self::integer::{read_u16, read_u8, write_u16, VariableByteInteger};
pub use self::qos::QoS;
pub use self::string::{read_string, write_string, VarLengthString};

/// A data type as defined in the MQTT standard.
pub trait MqttDataType {

    /// Returns the size in number of bytes that this type will use in a binary MQTT packet.
    fn encoded_len(&self) -> usize;
}
