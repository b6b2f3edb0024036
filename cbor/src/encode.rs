use super::*;
use stream::Config;

pub trait ToCbor {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error>;
}

/// Writes items to a [`Buffer`], tracking open containers on the [`Stream`].
#[derive(Debug)]
pub struct Encoder {
    stream: Stream,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::memory()
    }
}

fn write_head(s: &mut Stream, major: Major, value: u64) -> Result<(), Error> {
    s.enter(major, false)?;
    trace!("Encoding {} {value}", major.name());
    header::write(s.buffer_mut(), major, value)
}

fn write_int(s: &mut Stream, value: i64) -> Result<(), Error> {
    if value >= 0 {
        write_head(s, Major::UInt, value as u64)
    } else {
        // -1 - i64::MIN is i64::MAX, so every negative value fits
        write_head(s, Major::NegInt, (-1 - value) as u64)
    }
}

fn write_string(s: &mut Stream, major: Major, data: &[u8]) -> Result<(), Error> {
    write_head(s, major, data.len() as u64)?;
    s.buffer_mut().write(data)
}

fn write_sval(s: &mut Stream, code: u8) -> Result<(), Error> {
    if (24..32).contains(&code) {
        return Err(Error::Range(code as i128));
    }
    write_head(s, Major::Simple, code as u64)
}

fn begin(s: &mut Stream, kind: Container, len: Option<u64>) -> Result<(), Error> {
    s.enter(kind.major(), len.is_none())?;
    s.blocks_mut()
        .push(kind, len.is_none(), len.unwrap_or_default())?;
    debug!("Encoding {} of length {len:?}", kind.name());
    match len {
        Some(len) => header::write(s.buffer_mut(), kind.major(), len),
        None => header::write_indefinite(s.buffer_mut(), kind.major()),
    }
}

fn end(s: &mut Stream, kind: Container) -> Result<(), Error> {
    let indefinite = s.check_close(kind)?;
    s.blocks_mut().pop()?;
    debug!("Encoded end of {}", kind.name());
    if indefinite {
        s.buffer_mut().write(&[header::BREAK])
    } else {
        Ok(())
    }
}

fn write_item(s: &mut Stream, item: &Item, depth: usize) -> Result<(), Error> {
    if depth > s.max_depth() {
        return Err(Error::Depth(s.max_depth()));
    }
    match item {
        Item::UInt(v) => write_head(s, Major::UInt, *v),
        Item::Int(v) => write_int(s, *v),
        Item::Bytes(b) => write_string(s, Major::Bytes, b),
        Item::Text(t) => write_string(s, Major::Text, t.as_bytes()),
        Item::Array(items) => {
            begin(s, Container::Array, Some(items.len() as u64))?;
            for i in items {
                write_item(s, i, depth + 1)?;
            }
            end(s, Container::Array)
        }
        Item::Map(pairs) => {
            begin(s, Container::Map, Some(pairs.len() as u64))?;
            for (k, v) in pairs {
                write_item(s, k, depth + 1)?;
                write_item(s, v, depth + 1)?;
            }
            end(s, Container::Map)
        }
        Item::Tag(tag, inner) => {
            write_head(s, Major::Tag, *tag)?;
            write_item(s, inner, depth + 1)
        }
        Item::Simple(v) => write_sval(s, v.code()),
    }
}

impl Encoder {
    pub fn new(buffer: Buffer) -> Self {
        Self {
            stream: Stream::new(buffer),
        }
    }

    pub fn with_config(buffer: Buffer, config: &Config) -> Self {
        Self {
            stream: Stream::with_config(buffer, config),
        }
    }

    /// An encoder over `writer`, buffered in [`Config::buffer_size`] byte writes.
    pub fn writer<W: std::io::Write + Send + 'static>(writer: W, config: &Config) -> Self {
        Self::with_config(Buffer::writer_with_capacity(writer, config.buffer_size), config)
    }

    /// An encoder writing to memory; see [`Encoder::build`].
    pub fn memory() -> Self {
        Self::new(Buffer::memory())
    }

    pub fn stream(&self) -> &Stream {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut Stream {
        &mut self.stream
    }

    pub fn offset(&self) -> u64 {
        self.stream.buffer().offset()
    }

    pub fn flush(&mut self) -> Result<(), Error> {
        self.stream.run(|s| s.buffer_mut().flush())
    }

    /// Checks that every container has been closed, flushes, and returns the buffer.
    pub fn finish(self) -> Result<Buffer, Error> {
        self.stream.close()
    }

    /// Finishes a memory encoder and returns the encoded bytes.
    pub fn build(self) -> Result<Vec<u8>, Error> {
        self.finish()?.into_vec()
    }

    pub fn encode_uint(&mut self, value: u64) -> Result<(), Error> {
        self.stream.run(|s| write_head(s, Major::UInt, value))
    }

    pub fn encode_int(&mut self, value: i64) -> Result<(), Error> {
        self.stream.run(|s| write_int(s, value))
    }

    pub fn encode_bytes(&mut self, data: &[u8]) -> Result<(), Error> {
        self.stream.run(|s| write_string(s, Major::Bytes, data))
    }

    pub fn encode_text(&mut self, text: &str) -> Result<(), Error> {
        self.stream
            .run(|s| write_string(s, Major::Text, text.as_bytes()))
    }

    /// Opens an indefinite-length byte string; follow with [`Encoder::encode_bytes`] chunks.
    pub fn encode_bytes_begin_indef(&mut self) -> Result<(), Error> {
        self.stream.run(|s| begin(s, Container::Bytes, None))
    }

    pub fn encode_bytes_end(&mut self) -> Result<(), Error> {
        self.stream.run(|s| end(s, Container::Bytes))
    }

    /// Opens an indefinite-length text string; follow with [`Encoder::encode_text`] chunks.
    pub fn encode_text_begin_indef(&mut self) -> Result<(), Error> {
        self.stream.run(|s| begin(s, Container::Text, None))
    }

    pub fn encode_text_end(&mut self) -> Result<(), Error> {
        self.stream.run(|s| end(s, Container::Text))
    }

    pub fn encode_array_begin(&mut self, len: u64) -> Result<(), Error> {
        self.stream.run(|s| begin(s, Container::Array, Some(len)))
    }

    pub fn encode_array_begin_indef(&mut self) -> Result<(), Error> {
        self.stream.run(|s| begin(s, Container::Array, None))
    }

    pub fn encode_array_end(&mut self) -> Result<(), Error> {
        self.stream.run(|s| end(s, Container::Array))
    }

    /// Opens a map of `len` key/value pairs.
    pub fn encode_map_begin(&mut self, len: u64) -> Result<(), Error> {
        self.stream.run(|s| begin(s, Container::Map, Some(len)))
    }

    pub fn encode_map_begin_indef(&mut self) -> Result<(), Error> {
        self.stream.run(|s| begin(s, Container::Map, None))
    }

    pub fn encode_map_end(&mut self) -> Result<(), Error> {
        self.stream.run(|s| end(s, Container::Map))
    }

    /// Writes a simple value. Codes 24 to 31 are reserved and fail with [`Error::Range`].
    pub fn encode_sval(&mut self, code: u8) -> Result<(), Error> {
        self.stream.run(|s| write_sval(s, code))
    }

    pub fn encode_bool(&mut self, value: bool) -> Result<(), Error> {
        self.encode_sval(Simple::from(value).code())
    }

    pub fn encode_null(&mut self) -> Result<(), Error> {
        self.encode_sval(Simple::Null.code())
    }

    pub fn encode_undefined(&mut self) -> Result<(), Error> {
        self.encode_sval(Simple::Undefined.code())
    }

    /// Writes a tag; exactly one item must follow.
    pub fn encode_tag(&mut self, tag: u64) -> Result<(), Error> {
        self.stream.run(|s| write_head(s, Major::Tag, tag))
    }

    pub fn encode_item(&mut self, item: &Item) -> Result<(), Error> {
        self.stream.run(|s| write_item(s, item, 0))
    }

    pub fn emit<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: ToCbor + ?Sized,
    {
        value.to_cbor(self)
    }

    pub fn emit_slice<T>(&mut self, values: &[T]) -> Result<(), Error>
    where
        T: ToCbor,
    {
        self.encode_array_begin(values.len() as u64)?;
        for value in values {
            value.to_cbor(self)?;
        }
        self.encode_array_end()
    }

    /// Writes an array around `f`, definite when `count` is given.
    pub fn emit_array<F, E>(&mut self, count: Option<usize>, f: F) -> Result<(), E>
    where
        F: FnOnce(&mut Self) -> Result<(), E>,
        E: From<Error>,
    {
        match count {
            Some(count) => self.encode_array_begin(count as u64)?,
            None => self.encode_array_begin_indef()?,
        }
        f(self)?;
        self.encode_array_end()?;
        Ok(())
    }

    /// Writes a map around `f`; `count` is in pairs.
    pub fn emit_map<F, E>(&mut self, count: Option<usize>, f: F) -> Result<(), E>
    where
        F: FnOnce(&mut Self) -> Result<(), E>,
        E: From<Error>,
    {
        match count {
            Some(count) => self.encode_map_begin(count as u64)?,
            None => self.encode_map_begin_indef()?,
        }
        f(self)?;
        self.encode_map_end()?;
        Ok(())
    }
}

macro_rules! impl_uint_to_cbor {
    ($($ty:ty),*) => {
        $(
            impl ToCbor for $ty {
                fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
                    encoder.encode_uint(*self as u64)
                }
            }
        )*
    };
}

impl_uint_to_cbor!(u8, u16, u32, u64, usize);

macro_rules! impl_int_to_cbor {
    ($($ty:ty),*) => {
        $(
            impl ToCbor for $ty {
                fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
                    encoder.encode_int(*self as i64)
                }
            }
        )*
    };
}

impl_int_to_cbor!(i8, i16, i32, i64, isize);

impl ToCbor for bool {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.encode_bool(*self)
    }
}

impl ToCbor for str {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.encode_text(self)
    }
}

impl ToCbor for String {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.encode_text(self)
    }
}

impl ToCbor for [u8] {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.encode_bytes(self)
    }
}

impl ToCbor for Vec<u8> {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.encode_bytes(self)
    }
}

impl<const N: usize> ToCbor for [u8; N] {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.encode_bytes(self)
    }
}

impl<T> ToCbor for Option<T>
where
    T: ToCbor,
{
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        match self {
            Some(value) => value.to_cbor(encoder),
            None => encoder.encode_null(),
        }
    }
}

impl ToCbor for Simple {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.encode_sval(self.code())
    }
}

impl ToCbor for Item {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.encode_item(self)
    }
}

impl<T> ToCbor for &T
where
    T: ToCbor + ?Sized,
{
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        (**self).to_cbor(encoder)
    }
}

/// Encodes a single value to a new byte vector.
pub fn to_vec<T>(value: &T) -> Result<Vec<u8>, Error>
where
    T: ToCbor + ?Sized,
{
    let mut e = Encoder::memory();
    value.to_cbor(&mut e)?;
    e.build()
}
