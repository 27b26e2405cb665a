use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io::{Error, ErrorKind, Read, Result, Write};

/// Write an unsigned LEB128 value
///
/// Container formats only ever store 32-bit quantities this way, so that is all we support.
pub fn write_uleb128<W: Write>(writer: &mut W, mut value: u32) -> Result<()> {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            return writer.write_u8(byte);
        }
        writer.write_u8(byte | 0x80)?;
    }
}

/// Read an unsigned LEB128 value
///
/// At most five bytes are consumed. Bits beyond the 32nd are rejected rather than truncated.
pub fn read_uleb128<R: Read>(reader: &mut R) -> Result<u32> {
    let mut result: u32 = 0;
    for i in 0..5 {
        let byte = reader.read_u8()?;
        let payload = (byte & 0x7F) as u32;
        if i == 4 && payload > 0x0F {
            return Err(Error::new(ErrorKind::InvalidData, "uleb128 overflows 32 bits"));
        }
        result |= payload << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }
    Err(Error::new(ErrorKind::InvalidData, "uleb128 longer than 5 bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encoded(value: u32) -> Vec<u8> {
        let mut out = vec![];
        write_uleb128(&mut out, value).unwrap();
        out
    }

    #[test]
    fn known_encodings() {
        assert_eq!(encoded(0), vec![0x00]);
        assert_eq!(encoded(1), vec![0x01]);
        assert_eq!(encoded(127), vec![0x7F]);
        assert_eq!(encoded(128), vec![0x80, 0x01]);
        assert_eq!(encoded(16256), vec![0x80, 0x7F]);
        assert_eq!(encoded(0xFFFF_FFFF), vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn reads_back_what_was_written() {
        let mut bytes = vec![];
        for value in [0, 5, 300, 65_536, u32::MAX] {
            write_uleb128(&mut bytes, value).unwrap();
        }
        let mut cursor = Cursor::new(&bytes[..]);
        for value in [0, 5, 300, 65_536, u32::MAX] {
            assert_eq!(read_uleb128(&mut cursor).unwrap(), value);
        }
    }

    #[test]
    fn rejects_overlong_values() {
        let mut cursor = Cursor::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0x1F][..]);
        assert!(read_uleb128(&mut cursor).is_err());

        let mut cursor = Cursor::new(&[0x80, 0x80][..]);
        assert_eq!(
            read_uleb128(&mut cursor).unwrap_err().kind(),
            ErrorKind::UnexpectedEof
        );
    }
}
