#![no_main]

use libfuzzer_sys::fuzz_target;
use netbufs_cbor::{decode::Decoder, encode::Encoder};

fuzz_target!(|data: &[u8]| {
    let mut items = Vec::new();
    let mut d = Decoder::from_slice(data);
    while let Ok(item) = d.decode_item() {
        items.push(item);
    }

    let mut e = Encoder::memory();
    for item in &items {
        e.encode_item(item).expect("Decoded items must re-encode");
    }
    let encoded = e.build().expect("Encoder must be balanced");

    let mut d = Decoder::from_vec(encoded);
    for item in &items {
        assert_eq!(&d.decode_item().expect("Re-encoded items must decode"), item);
    }
    assert!(d.at_end().expect("Re-encoded data must end cleanly"));
});
