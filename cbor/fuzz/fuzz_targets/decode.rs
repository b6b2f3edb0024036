#![no_main]

use libfuzzer_sys::fuzz_target;
use netbufs_cbor::{decode::Decoder, diag};

fuzz_target!(|data: &[u8]| {
    let mut d = Decoder::from_slice(data);
    while let Ok(item) = d.decode_item() {
        _ = diag::format_item(&item, Some(16));
    }

    let mut d = Decoder::from_slice(data);
    _ = diag::dump(&mut d, std::io::sink(), &diag::DumpOptions::default());
});
