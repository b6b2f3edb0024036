/*!
Human-readable renderings of CBOR, in the spirit of RFC 7049 diagnostic notation.

[`Tokens`] walks a [`Decoder`](decode::Decoder) one header at a time, and
[`Dumper`] turns those tokens into indented text. [`format_item`] renders an
already decoded [`Item`] on a single line.
*/

use super::*;
use decode::Decoder;
use std::{fmt, io};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DumpOptions {
    // Longest byte or text string shown in full, None for no limit
    pub truncate: Option<usize>,
    // Spaces per nesting level
    pub indent: usize,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            truncate: Some(16),
            indent: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    UInt(u64),
    Int(i64),
    Bytes(Vec<u8>),
    Text(String),
    ArrayBegin(Option<u64>),
    MapBegin(Option<u64>),
    End,
    Tag(u64),
    Simple(Simple),
}

/// A single pass over the remaining items of a decoder.
///
/// Each item is peeked, then decoded with the matching typed call.
/// Iteration stops after the first error.
pub struct Tokens<'a> {
    decoder: &'a mut Decoder,
    open: Vec<Container>,
    done: bool,
}

impl Tokens<'_> {
    fn step(&mut self) -> Result<Option<Token>, Error> {
        let d = &mut *self.decoder;
        if let Some(kind) = self.open.last().copied() {
            if d.at_end()? {
                self.open.pop();
                match kind {
                    Container::Map => d.decode_map_end()?,
                    _ => d.decode_array_end()?,
                }
                return Ok(Some(Token::End));
            }
        }
        let Some(major) = d.peek_major()? else {
            return Ok(None);
        };
        Ok(Some(match major {
            Major::UInt => Token::UInt(d.decode_uint64()?),
            Major::NegInt => Token::Int(d.decode_int64()?),
            Major::Bytes => Token::Bytes(d.decode_bytes()?),
            Major::Text => Token::Text(d.decode_text()?),
            Major::Array => {
                let len = d.decode_array_begin()?;
                self.open.push(Container::Array);
                Token::ArrayBegin(len)
            }
            Major::Map => {
                let len = d.decode_map_begin()?;
                self.open.push(Container::Map);
                Token::MapBegin(len)
            }
            Major::Tag => Token::Tag(d.decode_tag()?),
            Major::Simple => Token::Simple(d.decode_simple()?),
        }))
    }
}

impl Iterator for Tokens<'_> {
    type Item = Result<Token, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl Decoder {
    pub fn tokens(&mut self) -> Tokens<'_> {
        Tokens {
            decoder: self,
            open: Vec::new(),
            done: false,
        }
    }
}

enum Level {
    Array { count: u64 },
    Map { count: u64 },
    Tag,
}

/// Renders [`Token`]s as indented text, one container member per line.
pub struct Dumper<W: io::Write> {
    out: W,
    options: DumpOptions,
    levels: Vec<Level>,
    top_count: u64,
}

impl<W: io::Write> Dumper<W> {
    pub fn new(out: W, options: DumpOptions) -> Self {
        Self {
            out,
            options,
            levels: Vec::new(),
            top_count: 0,
        }
    }

    fn put(&mut self, s: &str) -> Result<(), Error> {
        self.out.write_all(s.as_bytes()).map_err(Error::Write)
    }

    fn newline(&mut self) -> Result<(), Error> {
        let depth = self
            .levels
            .iter()
            .filter(|l| !matches!(l, Level::Tag))
            .count();
        let line = format!("\n{:width$}", "", width = depth * self.options.indent);
        self.put(&line)
    }

    // Separator before the next member of whatever is open
    fn separate(&mut self) -> Result<(), Error> {
        match self.levels.last_mut() {
            None => {
                self.top_count += 1;
                if self.top_count > 1 {
                    self.put("\n")?;
                }
                Ok(())
            }
            Some(Level::Tag) => Ok(()),
            Some(Level::Array { count }) => {
                *count += 1;
                if *count > 1 {
                    self.put(",")?;
                }
                self.newline()
            }
            Some(Level::Map { count }) => {
                *count += 1;
                if *count % 2 == 0 {
                    return self.put(": ");
                }
                if *count > 1 {
                    self.put(",")?;
                }
                self.newline()
            }
        }
    }

    // Closes every tag whose item has just been written
    fn complete(&mut self) -> Result<(), Error> {
        while let Some(Level::Tag) = self.levels.last() {
            self.levels.pop();
            self.put(")")?;
        }
        Ok(())
    }

    pub fn token(&mut self, token: &Token) -> Result<(), Error> {
        if *token == Token::End {
            let (closer, count) = match self.levels.pop() {
                Some(Level::Array { count }) => ("]", count),
                Some(Level::Map { count }) => ("}", count),
                _ => return Err(Error::Operation("end without an open container")),
            };
            if count > 0 {
                self.newline()?;
            }
            self.put(closer)?;
            return self.complete();
        }

        self.separate()?;
        match token {
            Token::ArrayBegin(len) => {
                self.put(if len.is_some() { "[" } else { "[_" })?;
                self.levels.push(Level::Array { count: 0 });
                Ok(())
            }
            Token::MapBegin(len) => {
                self.put(if len.is_some() { "{" } else { "{_" })?;
                self.levels.push(Level::Map { count: 0 });
                Ok(())
            }
            Token::Tag(tag) => {
                self.put(&format!("{tag}("))?;
                self.levels.push(Level::Tag);
                Ok(())
            }
            scalar => {
                let mut s = String::new();
                write_scalar(&mut s, scalar, self.options.truncate)
                    .map_err(|_| Error::Write(io::Error::other("formatting failed")))?;
                self.put(&s)?;
                self.complete()
            }
        }
    }

    /// Ends the last line and flushes the output.
    pub fn finish(mut self) -> Result<W, Error> {
        if self.top_count > 0 {
            self.put("\n")?;
        }
        self.out.flush().map_err(Error::Write)?;
        Ok(self.out)
    }
}

/// Writes every remaining item of `decoder` to `out`.
pub fn dump<W: io::Write>(
    decoder: &mut Decoder,
    out: W,
    options: &DumpOptions,
) -> Result<W, Error> {
    let mut dumper = Dumper::new(out, options.clone());
    for token in decoder.tokens() {
        dumper.token(&token?)?;
    }
    dumper.finish()
}

fn write_scalar<F: fmt::Write>(f: &mut F, token: &Token, truncate: Option<usize>) -> fmt::Result {
    match token {
        Token::UInt(v) => write!(f, "{v}"),
        Token::Int(v) => write!(f, "{v}"),
        Token::Bytes(b) => write_bytes(f, b, truncate),
        Token::Text(t) => write_text(f, t, truncate),
        Token::Simple(v) => write_simple(f, *v),
        _ => Ok(()),
    }
}

fn write_bytes<F: fmt::Write>(f: &mut F, data: &[u8], truncate: Option<usize>) -> fmt::Result {
    match truncate {
        Some(n) if data.len() > n => write!(f, "h'{}'...", hex::encode(&data[..n])),
        _ => write!(f, "h'{}'", hex::encode(data)),
    }
}

fn write_text<F: fmt::Write>(f: &mut F, text: &str, truncate: Option<usize>) -> fmt::Result {
    match truncate {
        Some(n) if text.len() > n => {
            let mut end = n;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            write!(f, "\"{}\"...", text[..end].escape_debug())
        }
        _ => write!(f, "\"{}\"", text.escape_debug()),
    }
}

fn write_simple<F: fmt::Write>(f: &mut F, value: Simple) -> fmt::Result {
    match value {
        Simple::False => f.write_str("false"),
        Simple::True => f.write_str("true"),
        Simple::Null => f.write_str("null"),
        Simple::Undefined => f.write_str("undefined"),
        Simple::Unassigned(c) => write!(f, "simple({c})"),
    }
}

pub(crate) fn write_item<F: fmt::Write>(
    f: &mut F,
    item: &Item,
    truncate: Option<usize>,
) -> fmt::Result {
    match item {
        Item::UInt(v) => write!(f, "{v}"),
        Item::Int(v) => write!(f, "{v}"),
        Item::Bytes(b) => write_bytes(f, b, truncate),
        Item::Text(t) => write_text(f, t, truncate),
        Item::Array(items) => {
            f.write_char('[')?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_item(f, item, truncate)?;
            }
            f.write_char(']')
        }
        Item::Map(pairs) => {
            f.write_char('{')?;
            for (i, (k, v)) in pairs.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_item(f, k, truncate)?;
                f.write_str(": ")?;
                write_item(f, v, truncate)?;
            }
            f.write_char('}')
        }
        Item::Tag(tag, inner) => {
            write!(f, "{tag}(")?;
            write_item(f, inner, truncate)?;
            f.write_char(')')
        }
        Item::Simple(v) => write_simple(f, *v),
    }
}

/// Renders `item` on one line, truncating long strings.
pub fn format_item(item: &Item, truncate: Option<usize>) -> String {
    let mut s = String::new();
    // Writing to a String cannot fail
    let _ = write_item(&mut s, item, truncate);
    s
}

#[cfg(test)]
mod test {
    use super::*;
    use hex_literal::hex;

    fn dumped(data: &[u8], options: &DumpOptions) -> String {
        let mut d = Decoder::from_slice(data);
        String::from_utf8(dump(&mut d, Vec::new(), options).unwrap()).unwrap()
    }

    #[test]
    fn nested() {
        // [1, [2, 3], {_ "a": h'00'}]
        assert_eq!(
            dumped(&hex!("83 01 82 02 03 bf 61 61 41 00 ff"), &DumpOptions::default()),
            "[\n  1,\n  [\n    2,\n    3\n  ],\n  {_\n    \"a\": h'00'\n  }\n]\n"
        );
    }

    #[test]
    fn top_level_sequence() {
        assert_eq!(
            dumped(&hex!("01 80 c1 1a514b67b0 f6"), &DumpOptions::default()),
            "1\n[]\n1(1363896240)\nnull\n"
        );
    }

    #[test]
    fn truncation() {
        let options = DumpOptions {
            truncate: Some(2),
            indent: 4,
        };
        assert_eq!(
            dumped(&hex!("82 43 010203 63 616263"), &options),
            "[\n    h'0102'...,\n    \"ab\"...\n]\n"
        );
    }

    #[test]
    fn tokens_stop_on_error() {
        let mut d = Decoder::from_slice(&hex!("82 01"));
        let tokens: Vec<_> = d.tokens().collect();
        assert_eq!(tokens.len(), 3);
        assert!(matches!(tokens[0], Ok(Token::ArrayBegin(Some(2)))));
        assert!(matches!(tokens[1], Ok(Token::UInt(1))));
        assert!(matches!(tokens[2], Err(Error::Eof)));
    }

    #[test]
    fn compact() {
        let item = Item::Text("a long piece of text".into());
        assert_eq!(format_item(&item, Some(6)), "\"a long\"...");
        assert_eq!(format_item(&Item::Simple(Simple::Unassigned(99)), None), "simple(99)");
        assert_eq!(format_item(&Item::Text("é".into()), Some(1)), "\"\"...");
    }
}
