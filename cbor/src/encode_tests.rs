use super::encode::*;
use super::item::{Item, Simple};
use super::{Error, ErrorKind};
use hex_literal::hex;

fn emit<T: ToCbor + ?Sized>(value: &T) -> Vec<u8> {
    to_vec(value).unwrap()
}

fn build<F>(f: F) -> Vec<u8>
where
    F: FnOnce(&mut Encoder) -> Result<(), Error>,
{
    let mut e = Encoder::memory();
    f(&mut e).unwrap();
    e.build().unwrap()
}

// Runs `f`, which must fail, and returns what it failed with
fn fails<F>(f: F) -> Error
where
    F: FnOnce(&mut Encoder) -> Result<(), Error>,
{
    let mut e = Encoder::memory();
    f(&mut e).unwrap_err()
}

#[test]
fn rfc_tests() {
    // RFC 7049, Appendix A, less the floating-point and bignum vectors

    assert_eq!(emit(&0), hex!("00"));
    assert_eq!(emit(&1), hex!("01"));
    assert_eq!(emit(&10), hex!("0a"));
    assert_eq!(emit(&23), hex!("17"));
    assert_eq!(emit(&24), hex!("1818"));
    assert_eq!(emit(&25), hex!("1819"));
    assert_eq!(emit(&100), hex!("1864"));
    assert_eq!(emit(&1000), hex!("1903e8"));
    assert_eq!(emit(&1000000), hex!("1a000f4240"));
    assert_eq!(emit(&1000000000000u64), hex!("1b000000e8d4a51000"));
    assert_eq!(emit(&18446744073709551615u64), hex!("1bffffffffffffffff"));
    assert_eq!(emit(&-1), hex!("20"));
    assert_eq!(emit(&-10), hex!("29"));
    assert_eq!(emit(&-100), hex!("3863"));
    assert_eq!(emit(&-1000), hex!("3903e7"));

    assert_eq!(emit(&false), hex!("f4"));
    assert_eq!(emit(&true), hex!("f5"));
    assert_eq!(emit(&None::<i32>), hex!("f6"));
    assert_eq!(emit(&Simple::Undefined), hex!("f7"));
    assert_eq!(emit(&Simple::Unassigned(16)), hex!("f0"));
    assert_eq!(emit(&Simple::Unassigned(255)), hex!("f8ff"));

    assert_eq!(
        build(|e| {
            e.encode_tag(0)?;
            e.encode_text("2013-03-21T20:04:00Z")
        }),
        hex!("c074323031332d30332d32315432303a30343a30305a")
    );
    assert_eq!(
        build(|e| {
            e.encode_tag(1)?;
            e.encode_uint(1363896240)
        }),
        hex!("c11a514b67b0")
    );
    assert_eq!(
        build(|e| {
            e.encode_tag(23)?;
            e.encode_bytes(&hex!("01020304"))
        }),
        hex!("d74401020304")
    );
    assert_eq!(
        build(|e| {
            e.encode_tag(32)?;
            e.encode_text("http://www.example.com")
        }),
        hex!("d82076687474703a2f2f7777772e6578616d706c652e636f6d")
    );

    assert_eq!(emit(&[0u8; 0]), hex!("40"));
    assert_eq!(emit(&hex!("01020304")), hex!("4401020304"));
    assert_eq!(emit(""), hex!("60"));
    assert_eq!(emit("a"), hex!("6161"));
    assert_eq!(emit("IETF"), hex!("6449455446"));
    assert_eq!(emit("\"\\"), hex!("62225c"));
    assert_eq!(emit("\u{00fc}"), hex!("62c3bc"));
    assert_eq!(emit("\u{6c34}"), hex!("63e6b0b4"));
    assert_eq!(emit("\u{10151}"), hex!("64f0908591"));

    assert_eq!(build(|e| e.emit_array(Some(0), |_| Ok(()))), hex!("80"));
    assert_eq!(build(|e| e.emit_slice(&[1, 2, 3])), hex!("83010203"));
    assert_eq!(
        build(|e| {
            e.emit_array(Some(3), |a| {
                a.emit(&1)?;
                a.emit_slice(&[2, 3])?;
                a.emit_slice(&[4, 5])
            })
        }),
        hex!("8301820203820405")
    );
    assert_eq!(
        build(|e| e.emit_slice(&(1..=25).collect::<Vec<u32>>())),
        hex!("98190102030405060708090a0b0c0d0e0f101112131415161718181819")
    );

    assert_eq!(build(|e| e.emit_map(Some(0), |_| Ok(()))), hex!("a0"));
    assert_eq!(
        build(|e| {
            e.emit_map(Some(2), |m| {
                m.emit(&1)?;
                m.emit(&2)?;
                m.emit(&3)?;
                m.emit(&4)
            })
        }),
        hex!("a201020304")
    );
    assert_eq!(
        build(|e| {
            e.emit_map(Some(2), |m| {
                m.emit("a")?;
                m.emit(&1)?;
                m.emit("b")?;
                m.emit_slice(&[2, 3])
            })
        }),
        hex!("a26161016162820203")
    );
    assert_eq!(
        build(|e| {
            e.emit_array(Some(2), |a| {
                a.emit("a")?;
                a.emit_map(Some(1), |m| {
                    m.emit("b")?;
                    m.emit("c")
                })
            })
        }),
        hex!("826161a161626163")
    );
    assert_eq!(
        emit(&Item::Map(
            ["a", "b", "c", "d", "e"]
                .iter()
                .map(|k| (Item::from(*k), Item::from(k.to_uppercase())))
                .collect()
        )),
        hex!("a56161614161626142616361436164614461656145")
    );

    assert_eq!(
        build(|e| {
            e.encode_bytes_begin_indef()?;
            e.encode_bytes(&hex!("0102"))?;
            e.encode_bytes(&hex!("030405"))?;
            e.encode_bytes_end()
        }),
        hex!("5f42010243030405ff")
    );
    assert_eq!(
        build(|e| {
            e.encode_text_begin_indef()?;
            e.encode_text("strea")?;
            e.encode_text("ming")?;
            e.encode_text_end()
        }),
        hex!("7f657374726561646d696e67ff")
    );
    assert_eq!(build(|e| e.emit_array(None, |_| Ok(()))), hex!("9fff"));
    assert_eq!(
        build(|e| {
            e.emit_array(None, |a| {
                a.emit(&1)?;
                a.emit_slice(&[2, 3])?;
                a.emit_array(None, |a| {
                    a.emit(&4)?;
                    a.emit(&5)
                })
            })
        }),
        hex!("9f018202039f0405ffff")
    );
    assert_eq!(
        build(|e| {
            e.emit_array(Some(3), |a| {
                a.emit(&1)?;
                a.emit_array(None, |a| {
                    a.emit(&2)?;
                    a.emit(&3)
                })?;
                a.emit_slice(&[4, 5])
            })
        }),
        hex!("83019f0203ff820405")
    );
    assert_eq!(
        build(|e| {
            e.emit_array(None, |a| (1..=25u8).try_for_each(|i| a.emit(&i)))
        }),
        hex!("9f0102030405060708090a0b0c0d0e0f101112131415161718181819ff")
    );
    assert_eq!(
        build(|e| {
            e.emit_map(None, |m| {
                m.emit("a")?;
                m.emit(&1)?;
                m.emit("b")?;
                m.emit_array(None, |a| {
                    a.emit(&2)?;
                    a.emit(&3)
                })
            })
        }),
        hex!("bf61610161629f0203ffff")
    );
    assert_eq!(
        build(|e| {
            e.emit_map(None, |m| {
                m.emit("Fun")?;
                m.emit(&true)?;
                m.emit("Amt")?;
                m.emit(&-2)
            })
        }),
        hex!("bf6346756ef563416d7421ff")
    );
}

#[test]
fn minimal_width() {
    assert_eq!(emit(&23u64).len(), 1);
    assert_eq!(emit(&24u64).len(), 2);
    assert_eq!(emit(&256u64).len(), 3);
    assert_eq!(emit(&65536u64).len(), 5);
    assert_eq!(emit(&0u8), hex!("00"));
    assert_eq!(emit(&1000u16), hex!("1903e8"));
    assert_eq!(emit("Hi"), hex!("624869"));
}

#[test]
fn signed_extremes() {
    assert_eq!(emit(&i64::MIN), hex!("3b7fffffffffffffff"));
    assert_eq!(emit(&i64::MAX), hex!("1b7fffffffffffffff"));
    assert_eq!(emit(&i32::MIN), hex!("3a7fffffff"));
    assert_eq!(emit(&i32::MAX), hex!("1a7fffffff"));
    assert_eq!(emit(&Item::Int(-24)), hex!("37"));
    assert_eq!(emit(&Item::Int(-25)), hex!("3818"));
}

#[test]
fn container_balance() {
    let mut e = Encoder::memory();
    e.encode_array_begin(1).unwrap();
    e.encode_map_begin_indef().unwrap();
    assert_eq!(e.stream().blocks().depth(), 2);
    e.encode_map_end().unwrap();
    e.encode_array_end().unwrap();
    assert!(e.stream().is_balanced());
    assert_eq!(e.build().unwrap(), hex!("81bfff"));

    assert!(matches!(
        fails(|e| {
            e.encode_array_begin_indef()?;
            e.encode_map_end()
        }),
        Error::Operation(_)
    ));
    assert!(matches!(fails(|e| e.encode_array_end()), Error::Operation(_)));
    assert!(matches!(
        fails(|e| {
            e.encode_array_begin(2)?;
            e.encode_uint(1)?;
            e.encode_array_end()
        }),
        Error::NItems {
            seen: 1,
            expected: 2
        }
    ));
    assert!(matches!(
        fails(|e| {
            e.encode_array_begin(1)?;
            e.encode_uint(1)?;
            e.encode_uint(2)
        }),
        Error::NItems { .. }
    ));
}

#[test]
fn map_parity() {
    assert!(matches!(
        fails(|e| {
            e.encode_map_begin_indef()?;
            e.encode_text("key")?;
            e.encode_map_end()
        }),
        Error::NItems { .. }
    ));
    assert!(matches!(
        fails(|e| {
            e.encode_map_begin(1)?;
            e.encode_text("key")?;
            e.encode_map_end()
        }),
        Error::NItems {
            seen: 1,
            expected: 2
        }
    ));
}

#[test]
fn tags_take_one_item() {
    assert!(matches!(
        fails(|e| {
            e.encode_array_begin_indef()?;
            e.encode_tag(1)?;
            e.encode_array_end()
        }),
        Error::Operation(_)
    ));

    let mut e = Encoder::memory();
    e.encode_array_begin(1).unwrap();
    e.encode_tag(1).unwrap();
    e.encode_tag(2).unwrap();
    e.encode_uint(3).unwrap();
    e.encode_array_end().unwrap();
    assert_eq!(e.build().unwrap(), hex!("81c1c203"));

    let mut e = Encoder::memory();
    e.encode_tag(1).unwrap();
    assert!(matches!(e.build(), Err(Error::Operation(_))));
}

#[test]
fn string_chunks() {
    assert!(matches!(
        fails(|e| {
            e.encode_bytes_begin_indef()?;
            e.encode_text("no")
        }),
        Error::Item { .. }
    ));
    assert!(matches!(
        fails(|e| {
            e.encode_text_begin_indef()?;
            e.encode_text_begin_indef()
        }),
        Error::Indefinite
    ));
    assert!(matches!(
        fails(|e| {
            e.encode_text_begin_indef()?;
            e.encode_array_begin(0)
        }),
        Error::Item { .. }
    ));
}

#[test]
fn simple_values() {
    assert_eq!(build(|e| e.encode_null()), hex!("f6"));
    assert_eq!(build(|e| e.encode_undefined()), hex!("f7"));
    assert_eq!(build(|e| e.encode_sval(32)), hex!("f820"));
    for code in 24..32 {
        assert!(matches!(fails(|e| e.encode_sval(code)), Error::Range(_)));
    }
}

#[test]
fn poisoned_after_error() {
    let mut e = Encoder::memory();
    assert!(e.encode_array_end().is_err());
    assert_eq!(e.stream().last_error(), Some(ErrorKind::Operation));
    assert!(matches!(e.encode_uint(1), Err(Error::Operation(_))));
}

#[test]
fn failed_encoder_does_not_build() {
    let mut e = Encoder::memory();
    e.encode_uint(1).unwrap();
    assert!(matches!(e.encode_sval(24), Err(Error::Range(_))));
    assert!(e.stream().is_balanced());
    assert!(matches!(e.build(), Err(Error::Operation(_))));
}

#[test]
fn writer_uses_configured_window() {
    let config = crate::stream::Config {
        buffer_size: 3,
        ..Default::default()
    };
    let e = Encoder::writer(std::io::sink(), &config);
    assert_eq!(e.stream().buffer().capacity(), 3);
}

#[test]
fn depth_limit() {
    let config = crate::stream::Config {
        max_depth: 2,
        ..Default::default()
    };
    let mut e = Encoder::with_config(crate::buffer::Buffer::memory(), &config);
    let nested = Item::Array(vec![Item::Array(vec![Item::Array(vec![])])]);
    assert!(matches!(e.encode_item(&nested), Err(Error::Depth(2))));

    let mut e = Encoder::with_config(crate::buffer::Buffer::memory(), &config);
    e.encode_item(&Item::Array(vec![Item::Array(vec![])]))
        .unwrap();
    assert_eq!(e.build().unwrap(), hex!("8180"));
}
