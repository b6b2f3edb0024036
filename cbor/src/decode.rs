use super::*;
use header::BREAK;
use num_traits::FromPrimitive;
use stream::Config;

pub trait FromCbor: Sized {
    fn from_cbor(decoder: &mut Decoder) -> Result<Self, Error>;
}

/// Reads items from a [`Buffer`], tracking open containers on the [`Stream`].
///
/// When the current container (or, at the top level, the input) has no more
/// items, reads fail with [`Error::NoMore`] without consuming anything.
#[derive(Debug)]
pub struct Decoder {
    stream: Stream,
}

fn unexpected(expected: &'static str, found: Major) -> Error {
    Error::Item {
        expected,
        found: found.name(),
    }
}

fn peek_byte(s: &mut Stream) -> Result<Option<u8>, Error> {
    if s.buffer_mut().is_eof()? {
        Ok(None)
    } else {
        s.buffer_mut().peek().map(Some)
    }
}

fn at_end(s: &mut Stream) -> Result<bool, Error> {
    if s.tag_pending() || s.payload_pending().is_some() {
        return Ok(false);
    }
    match s.blocks().current() {
        Some(frame) if frame.is_full() => Ok(true),
        Some(frame) if frame.indefinite => Ok(peek_byte(s)? == Some(BREAK)),
        Some(_) => Ok(false),
        None => Ok(peek_byte(s)?.is_none()),
    }
}

fn next_header(s: &mut Stream) -> Result<Header, Error> {
    if s.payload_pending().is_some() {
        return Err(Error::Operation("string payload has not been read"));
    }
    if !s.tag_pending() && s.blocks().current().is_some_and(|f| f.is_full()) {
        return Err(Error::NoMore);
    }
    let initial = match s.buffer_mut().getc() {
        Err(Error::Eof) if s.is_balanced() => return Err(Error::NoMore),
        r => r?,
    };
    if initial == BREAK {
        return match s.blocks().current() {
            Some(frame) if frame.indefinite && !s.tag_pending() => {
                s.buffer_mut().ungetc(initial);
                Err(Error::NoMore)
            }
            _ => Err(Error::Item {
                expected: "data item",
                found: "break",
            }),
        };
    }
    let header = header::read(s.buffer_mut(), initial)?;
    s.enter(header.major, header.is_indefinite())?;
    trace!("Decoded {} {:?}", header.major.name(), header.length);
    Ok(header)
}

fn open(s: &mut Stream, kind: Container, header: &Header) -> Result<(), Error> {
    s.blocks_mut().push(
        kind,
        header.is_indefinite(),
        header.value().unwrap_or_default(),
    )?;
    debug!("Decoding {} of length {:?}", kind.name(), header.length);
    Ok(())
}

fn close(s: &mut Stream, kind: Container) -> Result<(), Error> {
    if s.check_close(kind)? {
        let b = s.buffer_mut().getc()?;
        if b != BREAK {
            s.buffer_mut().ungetc(b);
            return Err(unexpected("break", Major::from_byte(b)));
        }
    }
    s.blocks_mut().pop()?;
    debug!("Decoded end of {}", kind.name());
    Ok(())
}

fn predecode(s: &mut Stream) -> Result<Header, Error> {
    let header = next_header(s)?;
    match (header.major, header.length) {
        (Major::Array, _) => open(s, Container::Array, &header)?,
        (Major::Map, _) => open(s, Container::Map, &header)?,
        (Major::Bytes, Length::Indefinite) => open(s, Container::Bytes, &header)?,
        (Major::Text, Length::Indefinite) => open(s, Container::Text, &header)?,
        (Major::Bytes | Major::Text, Length::Definite(len)) => s.set_payload_pending(Some(len)),
        _ => {}
    }
    Ok(header)
}

fn read_payload(s: &mut Stream) -> Result<Vec<u8>, Error> {
    let len = s
        .payload_pending()
        .ok_or(Error::Operation("no string header awaits its payload"))?;
    let data = s.buffer_mut().read_vec(len)?;
    s.set_payload_pending(None);
    Ok(data)
}

fn negative(value: u64) -> i128 {
    -1 - value as i128
}

fn read_uint<T: FromPrimitive>(s: &mut Stream) -> Result<T, Error> {
    let header = next_header(s)?;
    match (header.major, header.length) {
        (Major::UInt, Length::Definite(v)) => T::from_u64(v).ok_or(Error::Range(v as i128)),
        (Major::NegInt, Length::Definite(v)) => Err(Error::Range(negative(v))),
        (major, _) => Err(unexpected("unsigned integer", major)),
    }
}

fn read_int<T: FromPrimitive>(s: &mut Stream) -> Result<T, Error> {
    let header = next_header(s)?;
    let n = match (header.major, header.length) {
        (Major::UInt, Length::Definite(v)) => v as i128,
        (Major::NegInt, Length::Definite(v)) => negative(v),
        (major, _) => return Err(unexpected("integer", major)),
    };
    T::from_i128(n).ok_or(Error::Range(n))
}

fn read_scalar(s: &mut Stream, major: Major) -> Result<u64, Error> {
    let header = next_header(s)?;
    match header.length {
        Length::Definite(v) if header.major == major => Ok(v),
        _ => Err(unexpected(major.name(), header.major)),
    }
}

// Reads the payload of a string whose header has been consumed
fn read_string(s: &mut Stream, kind: Container, header: &Header) -> Result<Vec<u8>, Error> {
    match header.length {
        Length::Definite(len) => s.buffer_mut().read_vec(len),
        Length::Indefinite => {
            open(s, kind, header)?;
            let mut data = Vec::new();
            loop {
                match next_header(s) {
                    Ok(Header {
                        length: Length::Definite(len),
                        ..
                    }) => s.buffer_mut().read_append(&mut data, len)?,
                    Ok(_) => return Err(Error::Indefinite),
                    Err(Error::NoMore) => break,
                    Err(e) => return Err(e),
                }
            }
            close(s, kind)?;
            Ok(data)
        }
    }
}

fn read_bytes(s: &mut Stream, kind: Container) -> Result<Vec<u8>, Error> {
    let header = next_header(s)?;
    if header.major != kind.major() {
        return Err(unexpected(kind.name(), header.major));
    }
    read_string(s, kind, &header)
}

fn into_text(data: Vec<u8>) -> Result<String, Error> {
    String::from_utf8(data).map_err(|e| e.utf8_error().into())
}

fn begin(s: &mut Stream, kind: Container, indefinite_only: bool) -> Result<Option<u64>, Error> {
    let header = next_header(s)?;
    if header.major != kind.major() {
        return Err(unexpected(kind.name(), header.major));
    }
    if indefinite_only && !header.is_indefinite() {
        return Err(Error::Item {
            expected: match kind {
                Container::Map => "indefinite-length map",
                _ => "indefinite-length array",
            },
            found: match kind {
                Container::Map => "definite-length map",
                _ => "definite-length array",
            },
        });
    }
    open(s, kind, &header)?;
    Ok(header.value())
}

// Reads members until the container reports no more
fn read_members(s: &mut Stream, kind: Container, depth: usize) -> Result<Item, Error> {
    let hint = s
        .blocks()
        .current()
        .and_then(|f| f.remaining())
        .unwrap_or(0)
        .min(1024) as usize;
    let item = if kind == Container::Map {
        let mut pairs = Vec::with_capacity(hint / 2);
        loop {
            let key = match read_item(s, depth) {
                Ok(key) => key,
                Err(Error::NoMore) => break,
                Err(e) => return Err(e),
            };
            match read_item(s, depth) {
                Ok(value) => pairs.push((key, value)),
                // The close below reports the odd count
                Err(Error::NoMore) => break,
                Err(e) => return Err(e),
            }
        }
        Item::Map(pairs)
    } else {
        let mut items = Vec::with_capacity(hint);
        loop {
            match read_item(s, depth) {
                Ok(item) => items.push(item),
                Err(Error::NoMore) => break,
                Err(e) => return Err(e),
            }
        }
        Item::Array(items)
    };
    close(s, kind)?;
    Ok(item)
}

fn read_item(s: &mut Stream, depth: usize) -> Result<Item, Error> {
    if depth > s.max_depth() {
        return Err(Error::Depth(s.max_depth()));
    }
    let header = next_header(s)?;
    let value = header.value().unwrap_or_default();
    match header.major {
        Major::UInt => Ok(Item::UInt(value)),
        Major::NegInt => {
            let n = negative(value);
            i64::try_from(n).map(Item::Int).map_err(|_| Error::Range(n))
        }
        Major::Bytes => read_string(s, Container::Bytes, &header).map(Item::Bytes),
        Major::Text => read_string(s, Container::Text, &header)
            .and_then(into_text)
            .map(Item::Text),
        Major::Array => {
            open(s, Container::Array, &header)?;
            read_members(s, Container::Array, depth + 1)
        }
        Major::Map => {
            open(s, Container::Map, &header)?;
            read_members(s, Container::Map, depth + 1)
        }
        Major::Tag => Ok(Item::Tag(value, Box::new(read_item(s, depth + 1)?))),
        Major::Simple => Ok(Item::Simple(Simple::from_code(value as u8))),
    }
}

impl Decoder {
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

    /// A decoder over `reader`, refilled [`Config::buffer_size`] bytes at a time.
    pub fn reader<R: std::io::Read + Send + 'static>(reader: R, config: &Config) -> Self {
        Self::with_config(Buffer::reader_with_capacity(reader, config.buffer_size), config)
    }

    pub fn from_vec(data: Vec<u8>) -> Self {
        Self::new(Buffer::from_vec(data))
    }

    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Buffer::from_slice(data))
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

    /// Checks that every container has been closed and returns the buffer.
    pub fn finish(self) -> Result<Buffer, Error> {
        self.stream.close()
    }

    pub fn decode<T: FromCbor>(&mut self) -> Result<T, Error> {
        T::from_cbor(self)
    }

    /// The next byte, without consuming it; `None` at the end of input.
    pub fn peek_byte(&mut self) -> Result<Option<u8>, Error> {
        self.stream.run(peek_byte)
    }

    /// True when the current container, or the input, has no more items.
    pub fn at_end(&mut self) -> Result<bool, Error> {
        self.stream.run(at_end)
    }

    /// The major type of the next item, or `None` when [`Decoder::at_end`].
    pub fn peek_major(&mut self) -> Result<Option<Major>, Error> {
        self.stream.run(|s| {
            if s.payload_pending().is_some() {
                return Err(Error::Operation("string payload has not been read"));
            }
            if at_end(s)? {
                return Ok(None);
            }
            match peek_byte(s)? {
                Some(b) => Ok(Some(Major::from_byte(b))),
                None => Err(Error::Eof),
            }
        })
    }

    /// Reads the next header, opening a frame for arrays, maps and
    /// indefinite-length strings.
    ///
    /// After the header of a definite-length byte or text string, the payload
    /// must be read with [`Decoder::decode_payload`] before anything else.
    pub fn predecode(&mut self) -> Result<Header, Error> {
        self.stream.run(predecode)
    }

    /// Reads the raw payload of the string whose header [`Decoder::predecode`]
    /// just returned. Text payloads are not checked for UTF-8.
    pub fn decode_payload(&mut self) -> Result<Vec<u8>, Error> {
        self.stream.run(read_payload)
    }

    pub fn decode_uint<T: FromPrimitive>(&mut self) -> Result<T, Error> {
        self.stream.run(read_uint::<T>)
    }

    pub fn decode_int<T: FromPrimitive>(&mut self) -> Result<T, Error> {
        self.stream.run(read_int::<T>)
    }

    pub fn decode_uint8(&mut self) -> Result<u8, Error> {
        self.decode_uint()
    }

    pub fn decode_uint16(&mut self) -> Result<u16, Error> {
        self.decode_uint()
    }

    pub fn decode_uint32(&mut self) -> Result<u32, Error> {
        self.decode_uint()
    }

    pub fn decode_uint64(&mut self) -> Result<u64, Error> {
        self.decode_uint()
    }

    pub fn decode_int8(&mut self) -> Result<i8, Error> {
        self.decode_int()
    }

    pub fn decode_int16(&mut self) -> Result<i16, Error> {
        self.decode_int()
    }

    pub fn decode_int32(&mut self) -> Result<i32, Error> {
        self.decode_int()
    }

    pub fn decode_int64(&mut self) -> Result<i64, Error> {
        self.decode_int()
    }

    pub fn decode_sval(&mut self) -> Result<u8, Error> {
        self.stream
            .run(|s| read_scalar(s, Major::Simple).map(|v| v as u8))
    }

    pub fn decode_simple(&mut self) -> Result<Simple, Error> {
        self.decode_sval().map(Simple::from_code)
    }

    pub fn decode_bool(&mut self) -> Result<bool, Error> {
        self.stream.run(|s| match read_scalar(s, Major::Simple)? {
            20 => Ok(false),
            21 => Ok(true),
            _ => Err(Error::Item {
                expected: "boolean",
                found: "simple value",
            }),
        })
    }

    /// Reads a tag; exactly one item must be decoded after it.
    pub fn decode_tag(&mut self) -> Result<u64, Error> {
        self.stream.run(|s| read_scalar(s, Major::Tag))
    }

    /// Reads a byte string, joining the chunks of an indefinite-length one.
    pub fn decode_bytes(&mut self) -> Result<Vec<u8>, Error> {
        self.stream.run(|s| read_bytes(s, Container::Bytes))
    }

    pub fn decode_text(&mut self) -> Result<String, Error> {
        self.stream
            .run(|s| read_bytes(s, Container::Text).and_then(into_text))
    }

    /// Closes an indefinite-length byte string opened by [`Decoder::predecode`].
    pub fn decode_bytes_end(&mut self) -> Result<(), Error> {
        self.stream.run(|s| close(s, Container::Bytes))
    }

    /// Closes an indefinite-length text string opened by [`Decoder::predecode`].
    pub fn decode_text_end(&mut self) -> Result<(), Error> {
        self.stream.run(|s| close(s, Container::Text))
    }

    /// Opens an array, returning its length or `None` when indefinite.
    pub fn decode_array_begin(&mut self) -> Result<Option<u64>, Error> {
        self.stream.run(|s| begin(s, Container::Array, false))
    }

    pub fn decode_array_begin_indef(&mut self) -> Result<(), Error> {
        self.stream
            .run(|s| begin(s, Container::Array, true).map(|_| ()))
    }

    pub fn decode_array_end(&mut self) -> Result<(), Error> {
        self.stream.run(|s| close(s, Container::Array))
    }

    /// Opens a map, returning its length in pairs or `None` when indefinite.
    pub fn decode_map_begin(&mut self) -> Result<Option<u64>, Error> {
        self.stream.run(|s| begin(s, Container::Map, false))
    }

    pub fn decode_map_begin_indef(&mut self) -> Result<(), Error> {
        self.stream.run(|s| begin(s, Container::Map, true).map(|_| ()))
    }

    pub fn decode_map_end(&mut self) -> Result<(), Error> {
        self.stream.run(|s| close(s, Container::Map))
    }

    pub fn decode_item(&mut self) -> Result<Item, Error> {
        self.stream.run(|s| read_item(s, 0))
    }

    pub fn skip_item(&mut self) -> Result<(), Error> {
        self.decode_item().map(|_| ())
    }

    /// Calls `f` for every remaining item of the current container, then closes it.
    pub fn decode_members<F, E>(&mut self, kind: Container, mut f: F) -> Result<(), E>
    where
        F: FnMut(&mut Self) -> Result<(), E>,
        E: From<Error>,
    {
        while !self.at_end()? {
            f(self)?;
        }
        self.stream.run(|s| close(s, kind))?;
        Ok(())
    }
}

macro_rules! impl_uint_from_cbor {
    ($($ty:ty),*) => {
        $(
            impl FromCbor for $ty {
                fn from_cbor(decoder: &mut Decoder) -> Result<Self, Error> {
                    decoder.decode_uint()
                }
            }
        )*
    };
}

impl_uint_from_cbor!(u8, u16, u32, u64, usize);

macro_rules! impl_int_from_cbor {
    ($($ty:ty),*) => {
        $(
            impl FromCbor for $ty {
                fn from_cbor(decoder: &mut Decoder) -> Result<Self, Error> {
                    decoder.decode_int()
                }
            }
        )*
    };
}

impl_int_from_cbor!(i8, i16, i32, i64, isize);

impl FromCbor for bool {
    fn from_cbor(decoder: &mut Decoder) -> Result<Self, Error> {
        decoder.decode_bool()
    }
}

impl FromCbor for String {
    fn from_cbor(decoder: &mut Decoder) -> Result<Self, Error> {
        decoder.decode_text()
    }
}

impl FromCbor for Vec<u8> {
    fn from_cbor(decoder: &mut Decoder) -> Result<Self, Error> {
        decoder.decode_bytes()
    }
}

impl FromCbor for Simple {
    fn from_cbor(decoder: &mut Decoder) -> Result<Self, Error> {
        decoder.decode_simple()
    }
}

impl FromCbor for Item {
    fn from_cbor(decoder: &mut Decoder) -> Result<Self, Error> {
        decoder.decode_item()
    }
}

impl<T> FromCbor for Option<T>
where
    T: FromCbor,
{
    fn from_cbor(decoder: &mut Decoder) -> Result<Self, Error> {
        // null and undefined both read as None
        match decoder.peek_byte()? {
            Some(0xF6) | Some(0xF7) => decoder.decode_sval().map(|_| None),
            _ => T::from_cbor(decoder).map(Some),
        }
    }
}

/// Decodes exactly one value from `data`.
pub fn from_slice<T>(data: &[u8]) -> Result<T, Error>
where
    T: FromCbor,
{
    let mut d = Decoder::from_slice(data);
    let value = T::from_cbor(&mut d)?;
    if !d.at_end()? {
        return Err(Error::Operation("trailing bytes after the item"));
    }
    d.finish()?;
    Ok(value)
}
