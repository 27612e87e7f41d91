use std::io::{Read, Write};

use crate::error::MqttError;

use super::MqttDataType;

/// The "Remaining Length" of the fixed header, MQTT-2.2.3.
///
/// Seven bits per byte, least significant group first, with the high bit of each byte set when another byte follows.
/// Four bytes at most, which caps the value at 268,435,455.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableByteInteger {
    pub value: u32,
}

impl VariableByteInteger {

    /// Largest value that fits into four bytes.
    pub const MAX: u32 = 268_435_455;

    const MAX_BYTES: usize = 4;
    const VALUE_MASK: u8 = 0b0111_1111;
    const CONTINUATION_BIT: u8 = 0b1000_0000;

    /// Fails with [MqttError::MalformedLength] if `value` does not fit into four bytes.
    pub fn new(value: u32) -> Result<Self, MqttError> {
        if value > Self::MAX {
            return Err(MqttError::MalformedLength)
        }
        Ok(VariableByteInteger { value })
    }

    /// Writes one to four bytes to `dst`.
    pub fn encode<W: Write>(&self, dst: &mut W) -> Result<(), MqttError> {
        let encoded: Vec<u8> = Vec::try_from(*self)?;
        dst.write_all(&encoded)?;
        Ok(())
    }

    /// Reads byte by byte until one without the continuation bit shows up.
    ///
    /// A fifth byte is never read: if the fourth one still has the continuation bit set the length is malformed.
    pub fn decode<R: Read>(src: &mut R) -> Result<Self, MqttError> {
        let mut value: u32 = 0;
        let mut multiplier: u32 = 1;

        for _ in 0..Self::MAX_BYTES {
            let byte = read_u8(src)?;
            value += (byte & Self::VALUE_MASK) as u32 * multiplier;

            if byte & Self::CONTINUATION_BIT == 0 {
                return Ok(VariableByteInteger { value })
            }
            multiplier *= 128;
        }

        Err(MqttError::MalformedLength)
    }
}

impl MqttDataType for VariableByteInteger {
    fn encoded_len(&self) -> usize {
        match self.value {
            x if x <= 127 => 1,
            x if x <= 16_383 => 2,
            x if x <= 2_097_151 => 3,
            _=> 4,
        }
    }
}

impl TryFrom<VariableByteInteger> for Vec<u8> {
    type Error = MqttError;

    /// Converts an unsigned integer (max 28 bits) into its binary representation. Zero is a single `0x00` byte.
    fn try_from(vbi: VariableByteInteger) -> Result<Self, Self::Error> {
        if vbi.value > VariableByteInteger::MAX {
            return Err(MqttError::MalformedLength)
        }

        let mut res: Vec<u8> = Vec::with_capacity(vbi.encoded_len());
        let mut val = vbi.value;

        loop {
            let mut byte: u8 = (val % 128) as u8;
            val /= 128;
            if val > 0 {
                byte |= VariableByteInteger::CONTINUATION_BIT;
            }
            res.push(byte);

            if val == 0 {
                return Ok(res)
            }
        }
    }
}

impl MqttDataType for u8 {
    fn encoded_len(&self) -> usize {
        1
    }
}

impl MqttDataType for u16 {
    fn encoded_len(&self) -> usize {
        2
    }
}

/// Reads a single byte.
pub fn read_u8<R: Read>(src: &mut R) -> Result<u8, MqttError> {
    let mut buf = [0_u8; 1];
    src.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Reads a Big-Endian Two Byte Integer.
pub fn read_u16<R: Read>(src: &mut R) -> Result<u16, MqttError> {
    let mut buf = [0_u8; 2];
    src.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

/// Writes `val` as two Big-Endian bytes.
pub fn write_u16<W: Write>(dst: &mut W, val: u16) -> Result<(), MqttError> {
    dst.write_all(&val.to_be_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn encode_vbi() {
        do_test_encode_vbi(0, vec![0x00]);
        do_test_encode_vbi(16, vec![16]);
        do_test_encode_vbi(127, vec![0x7F]);
        do_test_encode_vbi(128, vec![0x80, 0x01]);
        do_test_encode_vbi(129, vec![129, 1]);
        do_test_encode_vbi(16_383, vec![0xFF, 0x7F]);
        do_test_encode_vbi(16_384, vec![0x80, 0x80, 0x01]);
        do_test_encode_vbi(2_097_151, vec![0xFF, 0xFF, 0x7F]);
        do_test_encode_vbi(2_097_152, vec![0x80, 0x80, 0x80, 0x01]);
        do_test_encode_vbi(268_435_455, vec![0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn encode_above_max() {
        assert!(matches!(VariableByteInteger::new(268_435_456), Err(MqttError::MalformedLength)));

        let too_big = VariableByteInteger { value: u32::MAX };
        assert!(matches!(Vec::try_from(too_big), Err(MqttError::MalformedLength)));
    }

    #[test]
    fn decode_vbi() {
        do_test_decode_vbi(&[0x00], 0);
        do_test_decode_vbi(&[78], 78);
        do_test_decode_vbi(&[129, 1], 129);
        do_test_decode_vbi(&[0x80, 0x80, 0x80, 0x01], 2_097_152);
        do_test_decode_vbi(&[0xFF, 0xFF, 0xFF, 0x7F], 268_435_455);
    }

    #[test]
    fn decode_stops_at_last_byte() {
        let mut src = Cursor::new(vec![0x80, 0x01, 0x2A]);
        assert_eq!(128, VariableByteInteger::decode(&mut src).unwrap().value);
        assert_eq!(2, src.position());
    }

    #[test]
    fn decode_fifth_byte_is_malformed() {
        let mut src = Cursor::new(vec![0x80, 0x80, 0x80, 0x80, 0x01]);
        assert!(matches!(VariableByteInteger::decode(&mut src), Err(MqttError::MalformedLength)));
        // the fifth byte is left alone
        assert_eq!(4, src.position());
    }

    #[test]
    fn decode_truncated() {
        let mut src = Cursor::new(vec![0x80, 0x80]);
        assert!(matches!(VariableByteInteger::decode(&mut src), Err(MqttError::Transport(_))));
    }

    #[test]
    fn round_trip_over_whole_range() {
        // every byte-count boundary plus a coarse sweep of the rest
        let mut values = vec![0, 1, 127, 128, 16_383, 16_384, 2_097_151, 2_097_152, VariableByteInteger::MAX];
        values.extend((0..VariableByteInteger::MAX).step_by(9_973));

        for value in values {
            let mut encoded = Vec::new();
            VariableByteInteger::new(value).unwrap().encode(&mut encoded).unwrap();
            let decoded = VariableByteInteger::decode(&mut Cursor::new(encoded)).unwrap();
            assert_eq!(value, decoded.value);
        }
    }

    #[test]
    fn vbi_size() {
        assert_eq!(1, VariableByteInteger{value: 84}.encoded_len());
        assert_eq!(1, VariableByteInteger{value: 127}.encoded_len());
        assert_eq!(2, VariableByteInteger{value: 128}.encoded_len());
        assert_eq!(2, VariableByteInteger{value: 16_383}.encoded_len());
        assert_eq!(3, VariableByteInteger{value: 16_384}.encoded_len());
        assert_eq!(3, VariableByteInteger{value: 2_097_151}.encoded_len());
        assert_eq!(4, VariableByteInteger{value: 2_097_152}.encoded_len());
        assert_eq!(4, VariableByteInteger{value: 268_435_455}.encoded_len());
    }

    #[test]
    fn two_byte_integers() -> Result<(), MqttError> {
        let mut dst = Vec::new();
        write_u16(&mut dst, 3600)?;
        assert_eq!(vec![0x0E, 0x10], dst);
        assert_eq!(3600, read_u16(&mut Cursor::new(dst))?);

        assert!(matches!(read_u16(&mut Cursor::new(vec![1])), Err(MqttError::Transport(_))));
        Ok(())
    }

    fn do_test_encode_vbi(value: u32, expect: Vec<u8>) {
        let mut actual = Vec::new();
        VariableByteInteger::new(value).unwrap().encode(&mut actual).unwrap();
        assert_eq!(expect, actual, "error trying to encode {}", value);
    }

    fn do_test_decode_vbi(bytes: &[u8], expect: u32) {
        let actual = VariableByteInteger::decode(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(expect, actual.value, "error trying to decode into {}", expect);
    }
}
