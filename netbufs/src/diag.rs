/*!
Text rendering of NetBufs records, naming every id the schema knows.

```text
group 1 route
  2 route.prefix: "10.0.0.0/8"
  4 route.as_path: [65000, 65001]
end
```
*/

use super::*;
use cbor::{
    decode::Decoder,
    diag::{DumpOptions, format_item},
    item::Item,
};
use std::io;

struct Writer<'a, W: io::Write> {
    out: W,
    schema: &'a Schema,
    options: &'a DumpOptions,
}

impl<W: io::Write> Writer<'_, W> {
    fn line(&mut self, depth: usize, text: &str) -> Result<(), Error> {
        writeln!(
            self.out,
            "{:width$}{text}",
            "",
            width = depth * self.options.indent
        )
        .map_err(|e| cbor::Error::Write(e).into())
    }

    // A value is shown as a nested group when it is an array starting with a known group id
    fn nested<'i>(&self, item: &'i Item) -> Option<(u64, &'i [Item])> {
        match item.as_array()? {
            [Item::UInt(id), members @ ..] if self.schema.group(*id).is_some() => {
                Some((*id, members))
            }
            _ => None,
        }
    }

    fn group(&mut self, depth: usize, id: u64, members: &[Item]) -> Result<(), Error> {
        let name = self.schema.path(id).unwrap_or("?");
        self.line(depth, &format!("group {id} {name}"))?;

        for pair in members.chunks(2) {
            let key = match &pair[0] {
                Item::UInt(k) => format!("{k} {}", self.schema.path(*k).unwrap_or("?")),
                other => format!("? {}", format_item(other, self.options.truncate)),
            };
            match pair.get(1) {
                None => self.line(depth + 1, &format!("{key}: <missing>"))?,
                Some(value) => match self.nested(value) {
                    Some((child, members)) => {
                        self.line(depth + 1, &format!("{key}:"))?;
                        self.group(depth + 2, child, members)?;
                    }
                    None => self.line(
                        depth + 1,
                        &format!("{key}: {}", format_item(value, self.options.truncate)),
                    )?,
                },
            }
        }
        self.line(depth, "end")
    }

    fn top(&mut self, item: &Item) -> Result<(), Error> {
        match item.as_array() {
            Some([Item::UInt(id), members @ ..]) => self.group(0, *id, members),
            _ => {
                let text = format_item(item, self.options.truncate);
                self.line(0, &text)
            }
        }
    }
}

/// Renders every remaining top-level item of `decoder` to `out`.
///
/// Top-level arrays that start with an unsigned integer are shown as groups,
/// anything else in plain diagnostic notation.
pub fn render<W: io::Write>(
    decoder: &mut Decoder,
    schema: &Schema,
    out: W,
    options: &DumpOptions,
) -> Result<W, Error> {
    let mut w = Writer {
        out,
        schema,
        options,
    };
    loop {
        match decoder.decode_item() {
            Ok(item) => w.top(&item)?,
            Err(cbor::Error::NoMore) => break,
            Err(e) => return Err(e.into()),
        }
    }
    w.out.flush().map_err(cbor::Error::Write)?;
    Ok(w.out)
}
