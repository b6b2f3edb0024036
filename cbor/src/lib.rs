/*!
A streaming CBOR (RFC 7049) encoder and decoder.

Values are pushed through an [`Encoder`](encode::Encoder) or pulled through a
[`Decoder`](decode::Decoder), both of which own a [`Stream`](stream::Stream): a
[`Buffer`](buffer::Buffer) over a file, pipe or memory region, plus a
[`BlockStack`](block_stack::BlockStack) tracking every open container so that
well-formedness is enforced symmetrically in both directions.

```
use netbufs_cbor::{decode::Decoder, encode::Encoder, item::Item};

let mut e = Encoder::memory();
e.encode_array_begin_indef().unwrap();
e.encode_uint(1).unwrap();
e.encode_text("Hi").unwrap();
e.encode_array_end().unwrap();
let data = e.build().unwrap();
assert_eq!(data, [0x9f, 0x01, 0x62, 0x48, 0x69, 0xff]);

let mut d = Decoder::from_slice(&data);
assert_eq!(
    d.decode_item().unwrap(),
    Item::Array(vec![Item::UInt(1), Item::Text("Hi".into())])
);
```
*/

use tracing::{debug, trace, warn};

pub mod block_stack;
pub mod buffer;
pub mod decode;
pub mod diag;
pub mod encode;
pub mod header;
pub mod item;
pub mod stream;

mod error;

pub use error::{Error, ErrorKind};

use block_stack::Container;
use buffer::Buffer;
use header::{Header, Length, Major};
use item::{Item, Simple};
use stream::Stream;


#[cfg(test)]
mod encode_tests;
