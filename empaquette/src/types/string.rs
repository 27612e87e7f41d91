use std::fmt::Display;
use std::io::{Read, Write};

use crate::error::MqttError;

use super::{read_u16, write_u16, MqttDataType};

const MAX_LENGTH: usize = u16::MAX as usize;

/// A sequence of at most 65,535 bytes, prefixed with its length in two bytes when encoded.
/// See [MQTT-1.5.3](https://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718016).
///
/// Topic names and client identifiers are meant to be UTF-8, but they are kept as raw bytes here. Nothing is
/// validated beyond the length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VarLengthString {
    inner: Vec<u8>,
}

impl VarLengthString {

    const LENGTH_FIELD_SIZE: usize = 2;

    /// Returns [MqttError::StringTooLong] if the vector exceeds the maximum allowed number of bytes (65535).
    pub fn new(bytes: Vec<u8>) -> Result<Self, MqttError> {
        if bytes.len() > MAX_LENGTH {
            return Err(MqttError::StringTooLong(bytes.len()));
        }

        Ok(VarLengthString { inner: bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    /// `None` if the bytes are not valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.inner).ok()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.inner
    }

    pub fn write_to<W: Write>(&self, dst: &mut W) -> Result<(), MqttError> {
        write_string(dst, &self.inner)
    }

    pub fn read_from<R: Read>(src: &mut R) -> Result<Self, MqttError> {
        Ok(VarLengthString { inner: read_string(src)? })
    }
}

impl MqttDataType for VarLengthString {
    /// The length of the string plus 2 bytes for the length prefix.
    fn encoded_len(&self) -> usize {
        self.inner.len() + Self::LENGTH_FIELD_SIZE
    }
}

impl TryFrom<&str> for VarLengthString {
    type Error = MqttError;

    fn try_from(val: &str) -> Result<Self, Self::Error> {
        VarLengthString::new(val.as_bytes().to_vec())
    }
}

impl TryFrom<String> for VarLengthString {
    type Error = MqttError;

    fn try_from(val: String) -> Result<Self, Self::Error> {
        VarLengthString::new(val.into_bytes())
    }
}

impl TryFrom<Vec<u8>> for VarLengthString {
    type Error = MqttError;

    fn try_from(val: Vec<u8>) -> Result<Self, Self::Error> {
        VarLengthString::new(val)
    }
}

impl PartialEq<&str> for VarLengthString {
    fn eq(&self, other: &&str) -> bool {
        self.inner == other.as_bytes()
    }
}

impl Display for VarLengthString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        String::from_utf8_lossy(&self.inner).fmt(f)
    }
}

/// Writes the length of `bytes` in two Big-Endian bytes, followed by `bytes` themselves.
pub fn write_string<W: Write>(dst: &mut W, bytes: &[u8]) -> Result<(), MqttError> {
    let length = u16::try_from(bytes.len()).map_err(|_| MqttError::StringTooLong(bytes.len()))?;
    write_u16(dst, length)?;
    dst.write_all(bytes)?;
    Ok(())
}

/// Reads a two byte length, then exactly that many bytes.
pub fn read_string<R: Read>(src: &mut R) -> Result<Vec<u8>, MqttError> {
    let length = read_u16(src)? as usize;
    let mut bytes = vec![0_u8; length];
    src.read_exact(&mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn exceeding_max_capacity() {
        assert!(VarLengthString::new(vec![1; 65535]).is_ok());
        assert!(matches!(VarLengthString::new(vec![1; 65536]), Err(MqttError::StringTooLong(65536))));
    }

    #[test]
    fn write_string_too_long() {
        let mut dst = Vec::new();
        assert!(matches!(write_string(&mut dst, &[b'x'; 65536]), Err(MqttError::StringTooLong(65536))));
        assert!(dst.is_empty());
    }

    #[test]
    fn encode() -> Result<(), MqttError> {
        let mqtt = VarLengthString::try_from("MQTT")?;
        assert_eq!(6, mqtt.encoded_len());

        let mut actual = Vec::new();
        mqtt.write_to(&mut actual)?;
        assert_eq!(vec![0, 4, 77, 81, 84, 84], actual);
        Ok(())
    }

    #[test]
    fn encode_empty() -> Result<(), MqttError> {
        let mut actual = Vec::new();
        VarLengthString::default().write_to(&mut actual)?;
        assert_eq!(vec![0, 0], actual);
        Ok(())
    }

    #[test]
    fn decode() -> Result<(), MqttError> {
        let mut src = Cursor::new(vec![0, 3, 0x61, 0x2F, 0x62, 0xFF]);
        let actual = VarLengthString::read_from(&mut src)?;
        assert_eq!(actual, "a/b");
        assert_eq!(Some("a/b"), actual.as_str());
        // trailing bytes belong to whoever reads next
        assert_eq!(5, src.position());
        Ok(())
    }

    #[test]
    fn decode_length_too_short() {
        let mut src = Cursor::new(vec![0, 6, 129, 90, 3, 240, 7]);
        assert!(matches!(read_string(&mut src), Err(MqttError::Transport(_))));
    }

    #[test]
    fn decode_missing_length() {
        assert!(matches!(read_string(&mut Cursor::new(vec![2])), Err(MqttError::Transport(_))));
    }

    #[test]
    fn round_trip() -> Result<(), MqttError> {
        let longest = "x".repeat(65535);
        for s in ["", "a", "some/topic/name", "DOLLAR€", longest.as_str()] {
            let mut buf = Vec::new();
            write_string(&mut buf, s.as_bytes())?;
            assert_eq!(s.len() + 2, buf.len());
            assert_eq!(s.as_bytes(), &read_string(&mut Cursor::new(buf))?[..]);
        }
        Ok(())
    }

    #[test]
    fn display_is_lossy() {
        let bytes = VarLengthString::new(vec![0x61, 0xFF, 0x62]).unwrap();
        assert_eq!(None, bytes.as_str());
        assert_eq!("a\u{FFFD}b", bytes.to_string());
    }
}
