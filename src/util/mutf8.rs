use std::cmp::Ordering;

/// Modified UTF-8, shared by DEX string data and class file `CONSTANT_Utf8` entries.
///
/// See [this `DataInput` section for details][0]. The differences from standard UTF-8:
///
///  * the null character `\u0000` is encoded in the 2-byte form, so encoded strings never contain
///    a zero byte
///  * only the 1-byte, 2-byte, and 3-byte forms are used
///  * supplementary characters are encoded as a surrogate pair, each half in the 3-byte form
///
/// [0]: https://docs.oracle.com/en/java/javase/17/docs/api/java.base/java/io/DataInput.html#modified-utf-8
pub fn encode_modified_utf8(string: &str) -> Vec<u8> {
    let mut buffer: Vec<u8> = Vec::with_capacity(string.len());
    for unit in string.encode_utf16() {
        match unit {
            0x0001..=0x007F => buffer.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                buffer.push((unit >> 6 & 0x1F) as u8 | 0b1100_0000);
                buffer.push((unit & 0x3F) as u8 | 0b1000_0000);
            }
            _ => {
                buffer.push((unit >> 12 & 0x0F) as u8 | 0b1110_0000);
                buffer.push((unit >> 6 & 0x3F) as u8 | 0b1000_0000);
                buffer.push((unit & 0x3F) as u8 | 0b1000_0000);
            }
        }
    }
    buffer
}

/// Decode modified UTF-8 back into a string
///
/// Unpaired surrogates can be encoded in modified UTF-8 but have no representation in a Rust
/// `String`, so they are reported as errors.
pub fn decode_modified_utf8(bytes: &[u8]) -> Result<String, String> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied().enumerate();

    while let Some((at, byte)) = iter.next() {
        let unit = match byte {
            0x00 => return Err(format!("Unexpected null byte at {}", at)),
            0x01..=0x7F => byte as u16,
            0xC0..=0xDF => {
                let low = continuation(&mut iter, at)?;
                ((byte & 0x1F) as u16) << 6 | low
            }
            0xE0..=0xEF => {
                let mid = continuation(&mut iter, at)?;
                let low = continuation(&mut iter, at)?;
                ((byte & 0x0F) as u16) << 12 | mid << 6 | low
            }
            _ => return Err(format!("Invalid lead byte {:#04x} at {}", byte, at)),
        };
        units.push(unit);
    }

    String::from_utf16(&units).map_err(|err| err.to_string())
}

fn continuation(iter: &mut impl Iterator<Item = (usize, u8)>, lead: usize) -> Result<u16, String> {
    match iter.next() {
        Some((_, byte)) if byte & 0b1100_0000 == 0b1000_0000 => Ok((byte & 0x3F) as u16),
        Some((at, byte)) => Err(format!("Bad continuation byte {:#04x} at {}", byte, at)),
        None => Err(format!("Truncated sequence starting at {}", lead)),
    }
}

/// Number of UTF-16 code units in the string (the length recorded in DEX string data)
pub fn utf16_len(string: &str) -> usize {
    string.encode_utf16().count()
}

/// Order strings by UTF-16 code units, which is how DEX string tables must be sorted
pub fn cmp_utf16(left: &str, right: &str) -> Ordering {
    left.encode_utf16().cmp(right.encode_utf16())
}
