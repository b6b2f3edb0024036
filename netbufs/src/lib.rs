/*!
NetBufs: keyed records over streaming CBOR.

A [`Schema`] names small integer ids, grouped into named [`Group`]s of
[`Attribute`]s. A [`Sender`] writes each group as an indefinite-length array
holding the group id and then `key, value` pairs; a [`Receiver`] reads them
back in whatever order they were sent.

```
use netbufs::{Receiver, Schema, Sender};
use netbufs_cbor::{decode::Decoder, encode::Encoder};

let schema = Schema::builder()
    .group(1, "peer", |g| g.required(2, "address").optional(3, "asn"))
    .build()
    .unwrap();

let mut e = Encoder::memory();
let mut s = Sender::new(&mut e, &schema);
s.send_group(1).unwrap();
s.send(3, &65000u32).unwrap();
s.send(2, "192.0.2.1").unwrap();
s.send_group_end().unwrap();
let data = e.build().unwrap();

let mut d = Decoder::from_vec(data);
let mut r = Receiver::new(&mut d, &schema);
let mut address = String::new();
r.recv_group(1).unwrap();
while let Some(key) = r.recv_key().unwrap() {
    match key {
        2 => address = r.recv().unwrap(),
        _ => r.skip().unwrap(),
    }
}
r.recv_group_end().unwrap();
assert_eq!(address, "192.0.2.1");
```
*/

use netbufs_cbor as cbor;
use tracing::{debug, warn};

mod error;
pub mod diag;
pub mod recv;
pub mod schema;
pub mod send;

pub use error::Error;
pub use recv::{Receiver, Validation};
pub use schema::{Attribute, Group, Schema};
pub use send::Sender;

#[cfg(test)]
mod protocol_tests;
