/*!
The initial byte of every item: a 3-bit major type and 5 bits of additional information.

Additional information 0-23 is the value itself, 24-27 announce 1, 2, 4 or 8
big-endian bytes, and 31 marks an indefinite length (or, for major type 7, the
break that closes an indefinite-length item).
*/

use super::*;

/// The reserved byte terminating an indefinite-length item.
pub const BREAK: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Major {
    UInt,
    NegInt,
    Bytes,
    Text,
    Array,
    Map,
    Tag,
    Simple,
}

impl Major {
    pub fn from_byte(b: u8) -> Self {
        match b >> 5 {
            0 => Major::UInt,
            1 => Major::NegInt,
            2 => Major::Bytes,
            3 => Major::Text,
            4 => Major::Array,
            5 => Major::Map,
            6 => Major::Tag,
            _ => Major::Simple,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Major::UInt => 0,
            Major::NegInt => 1,
            Major::Bytes => 2,
            Major::Text => 3,
            Major::Array => 4,
            Major::Map => 5,
            Major::Tag => 6,
            Major::Simple => 7,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Major::UInt => "unsigned integer",
            Major::NegInt => "negative integer",
            Major::Bytes => "byte string",
            Major::Text => "text string",
            Major::Array => "array",
            Major::Map => "map",
            Major::Tag => "tag",
            Major::Simple => "simple value",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    Definite(u64),
    Indefinite,
}

/// A decoded initial byte plus any trailing argument bytes.
///
/// For integers and tags the argument is the value, for strings and
/// containers it is the length (pairs, for maps), and for simple values it is
/// the simple value code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub major: Major,
    pub length: Length,
}

impl Header {
    pub fn value(&self) -> Option<u64> {
        match self.length {
            Length::Definite(v) => Some(v),
            Length::Indefinite => None,
        }
    }

    pub fn is_indefinite(&self) -> bool {
        self.length == Length::Indefinite
    }
}

/// Completes a header whose initial byte has already been read.
///
/// The caller must have dealt with [`BREAK`] before calling.
pub(crate) fn read(buffer: &mut Buffer, initial: u8) -> Result<Header, Error> {
    let major = Major::from_byte(initial);
    let length = match (major, initial & 0x1F) {
        (_, info @ 0..=23) => Length::Definite(info as u64),
        (Major::Simple, 24) => {
            let code = buffer.getc()?;
            if code < 32 {
                return Err(Error::Parse(initial));
            }
            Length::Definite(code as u64)
        }
        (Major::Simple, 25..=27) => return Err(Error::Unsupported("floating-point value")),
        (_, 24) => Length::Definite(buffer.getc()? as u64),
        (_, 25) => {
            let mut b = [0u8; 2];
            buffer.read(&mut b)?;
            Length::Definite(u16::from_be_bytes(b) as u64)
        }
        (_, 26) => {
            let mut b = [0u8; 4];
            buffer.read(&mut b)?;
            Length::Definite(u32::from_be_bytes(b) as u64)
        }
        (_, 27) => {
            let mut b = [0u8; 8];
            buffer.read(&mut b)?;
            Length::Definite(u64::from_be_bytes(b))
        }
        (Major::Bytes | Major::Text | Major::Array | Major::Map, 31) => Length::Indefinite,
        _ => return Err(Error::Parse(initial)),
    };
    Ok(Header { major, length })
}

/// Writes a header using the shortest encoding that holds `value`.
pub(crate) fn write(buffer: &mut Buffer, major: Major, value: u64) -> Result<(), Error> {
    let m = major.bits() << 5;
    if value < 24 {
        buffer.write(&[m | value as u8])
    } else if value <= u8::MAX as u64 {
        buffer.write(&[m | 24, value as u8])
    } else if value <= u16::MAX as u64 {
        let mut b = [m | 25, 0, 0];
        b[1..].copy_from_slice(&(value as u16).to_be_bytes());
        buffer.write(&b)
    } else if value <= u32::MAX as u64 {
        let mut b = [m | 26, 0, 0, 0, 0];
        b[1..].copy_from_slice(&(value as u32).to_be_bytes());
        buffer.write(&b)
    } else {
        let mut b = [m | 27, 0, 0, 0, 0, 0, 0, 0, 0];
        b[1..].copy_from_slice(&value.to_be_bytes());
        buffer.write(&b)
    }
}

pub(crate) fn write_indefinite(buffer: &mut Buffer, major: Major) -> Result<(), Error> {
    buffer.write(&[(major.bits() << 5) | 31])
}

#[cfg(test)]
mod test {
    use super::*;

    fn encoded(major: Major, value: u64) -> Vec<u8> {
        let mut b = Buffer::memory();
        write(&mut b, major, value).unwrap();
        b.into_vec().unwrap()
    }

    #[test]
    fn shortest_width() {
        assert_eq!(encoded(Major::UInt, 23).len(), 1);
        assert_eq!(encoded(Major::UInt, 24).len(), 2);
        assert_eq!(encoded(Major::UInt, 255).len(), 2);
        assert_eq!(encoded(Major::UInt, 256).len(), 3);
        assert_eq!(encoded(Major::UInt, 65535).len(), 3);
        assert_eq!(encoded(Major::UInt, 65536).len(), 5);
        assert_eq!(encoded(Major::UInt, u32::MAX as u64).len(), 5);
        assert_eq!(encoded(Major::UInt, u32::MAX as u64 + 1).len(), 9);
    }

    #[test]
    fn read_back() {
        for value in [0, 23, 24, 255, 256, 65535, 65536, u32::MAX as u64, u64::MAX] {
            let data = encoded(Major::Tag, value);
            let mut b = Buffer::from_vec(data);
            let initial = b.getc().unwrap();
            assert_eq!(
                read(&mut b, initial).unwrap(),
                Header {
                    major: Major::Tag,
                    length: Length::Definite(value)
                }
            );
            assert!(b.is_eof().unwrap());
        }
    }

    #[test]
    fn reserved_codes() {
        for initial in [0x1c, 0x1d, 0x1e, 0x1f, 0x3f, 0xdf, 0xfc] {
            let mut b = Buffer::from_vec(Vec::new());
            assert!(matches!(read(&mut b, initial), Err(Error::Parse(i)) if i == initial));
        }
        let mut b = Buffer::from_vec(vec![0x10]);
        assert!(matches!(read(&mut b, 0xf8), Err(Error::Parse(0xf8))));
        let mut b = Buffer::from_vec(vec![0x3c, 0x00]);
        assert!(matches!(read(&mut b, 0xf9), Err(Error::Unsupported(_))));
    }
}
