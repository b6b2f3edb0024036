use super::*;
use cbor::{decode::Decoder, diag::DumpOptions, encode::Encoder, item::Item};
use hex_literal::hex;

fn schema() -> Schema {
    Schema::builder()
        .group(1, "route", |g| {
            g.required(2, "prefix")
                .optional(3, "med")
                .optional(4, "as_path")
        })
        .group(10, "table", |g| g.required(11, "name").optional(12, "route"))
        .build()
        .unwrap()
}

fn send<F>(f: F) -> Vec<u8>
where
    F: FnOnce(&mut Sender) -> Result<(), Error>,
{
    let schema = schema();
    let mut e = Encoder::memory();
    f(&mut Sender::new(&mut e, &schema)).unwrap();
    e.build().unwrap()
}

#[test]
fn group_wire_format() {
    assert_eq!(
        send(|s| {
            s.send_group(1)?;
            s.send(2, "a")?;
            s.send(3, &5u8)?;
            s.send_group_end()
        }),
        hex!("9f 01 02 6161 03 05 ff")
    );
    assert_eq!(
        send(|s| {
            s.send_group_with(10, |s| {
                s.send(11, "t")?;
                s.send_key(12)?;
                s.send_group_with(1, |s| s.send_item(2, &Item::from("b")))
            })
        }),
        hex!("9f 0a 0b 6174 0c 9f 01 02 6162 ff ff")
    );
}

#[test]
fn send_errors() {
    let schema = schema();
    let mut e = Encoder::memory();
    let mut s = Sender::new(&mut e, &schema);
    assert!(matches!(s.send_key(2), Err(Error::NoGroup)));
    assert!(matches!(s.send_group(2), Err(Error::UnknownGroup(2))));
    assert!(matches!(s.send_group_end(), Err(Error::NoGroup)));
}

#[test]
fn any_order() {
    let schema = schema();
    let mut d = Decoder::from_slice(&hex!("9f 01 04 820102 03 18ff 02 6161 ff"));
    let mut r = Receiver::new(&mut d, &schema);
    let (mut prefix, mut med, mut as_path) = (String::new(), 0u32, Item::Array(vec![]));
    r.recv_group_with(1, |r, key| -> Result<(), Error> {
        match key {
            2 => prefix = r.recv()?,
            3 => med = r.recv()?,
            4 => as_path = r.recv_item()?,
            _ => r.skip()?,
        }
        Ok(())
    })
    .unwrap();
    assert_eq!(prefix, "a");
    assert_eq!(med, 255);
    assert_eq!(as_path, Item::Array(vec![Item::UInt(1), Item::UInt(2)]));
    assert_eq!(r.recv_any_group().unwrap(), None);
}

#[test]
fn nested_groups() {
    let data = send(|s| {
        s.send_group(10)?;
        s.send(11, "t")?;
        for prefix in ["x", "y"] {
            s.send_key(12)?;
            s.send_group_with(1, |s| s.send(2, prefix))?;
        }
        s.send_group_end()
    });

    let schema = schema();
    let mut d = Decoder::from_vec(data);
    let mut r = Receiver::new(&mut d, &schema).with_validation(Validation::Required);
    let mut prefixes = Vec::new();
    r.recv_group(10).unwrap();
    while let Some(key) = r.recv_key().unwrap() {
        match key {
            12 => r
                .recv_group_with(1, |r, key| -> Result<(), Error> {
                    assert_eq!(key, 2);
                    prefixes.push(r.recv::<String>()?);
                    Ok(())
                })
                .unwrap(),
            _ => r.skip().unwrap(),
        }
    }
    r.recv_group_end().unwrap();
    assert_eq!(prefixes, ["x", "y"]);
}

#[test]
fn definite_groups() {
    let schema = schema();
    let mut d = Decoder::from_slice(&hex!("83 01 02 6161"));
    let mut r = Receiver::new(&mut d, &schema);
    r.recv_group(1).unwrap();
    assert_eq!(r.recv_key().unwrap(), Some(2));
    assert_eq!(r.recv::<String>().unwrap(), "a");
    assert_eq!(r.recv_key().unwrap(), None);
    r.recv_group_end().unwrap();
}

#[test]
fn wrong_group() {
    let schema = schema();
    let mut d = Decoder::from_slice(&hex!("9f 0a ff"));
    let mut r = Receiver::new(&mut d, &schema);
    assert!(matches!(
        r.recv_group(1),
        Err(Error::UnexpectedGroup {
            expected: 1,
            found: 10
        })
    ));

    let mut d = Decoder::from_slice(&[]);
    let mut r = Receiver::new(&mut d, &schema);
    assert!(matches!(r.recv_key(), Err(Error::NoGroup)));
    assert!(matches!(
        r.recv_group(1),
        Err(Error::Cbor(cbor::Error::NoMore))
    ));
}

#[test]
fn required_attributes() {
    let schema = schema();
    let data = hex!("9f 01 03 01 ff");

    // Unvalidated by default
    let mut d = Decoder::from_slice(&data);
    let mut r = Receiver::new(&mut d, &schema);
    r.recv_group_with(1, |r, _| r.skip()).unwrap();

    let mut d = Decoder::from_slice(&data);
    let mut r = Receiver::new(&mut d, &schema).with_validation(Validation::Required);
    match r.recv_group_with(1, |r, _| r.skip()) {
        Err(Error::MissingRequired { group, path }) => {
            assert_eq!(group, "route");
            assert_eq!(path, "route.prefix");
        }
        other => panic!("Unexpected result {other:?}"),
    }
}

#[test]
fn next_group_after_missing_required() {
    let schema = schema();
    let mut d = Decoder::from_slice(&hex!("9f 01 03 01 ff 9f 01 02 6161 ff"));
    let mut r = Receiver::new(&mut d, &schema).with_validation(Validation::Required);
    assert!(matches!(
        r.recv_group_with(1, |r, _| r.skip()),
        Err(Error::MissingRequired { .. })
    ));
    assert_eq!(r.decoder().stream().blocks().depth(), 0);

    assert_eq!(r.recv_any_group().unwrap(), Some(1));
    assert_eq!(r.recv_key().unwrap(), Some(2));
    assert_eq!(r.recv::<String>().unwrap(), "a");
    assert_eq!(r.recv_key().unwrap(), None);
    r.recv_group_end().unwrap();
    assert_eq!(r.recv_any_group().unwrap(), None);
}

#[test]
fn render() {
    let mut data = send(|s| {
        s.send_group(10)?;
        s.send(11, "t")?;
        s.send_key(12)?;
        s.send_group_with(1, |s| {
            s.send(2, "10.0.0.0/8")?;
            s.send_item(4, &Item::Array(vec![Item::UInt(65000)]))
        })?;
        s.send(99, &true)?;
        s.send_group_end()
    });
    data.push(0x07);

    let schema = schema();
    let mut d = Decoder::from_vec(data);
    let out = diag::render(&mut d, &schema, Vec::new(), &DumpOptions::default()).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "group 10 table\n\
         \x20 11 table.name: \"t\"\n\
         \x20 12 table.route:\n\
         \x20   group 1 route\n\
         \x20     2 route.prefix: \"10.0.0.0/8\"\n\
         \x20     4 route.as_path: [65000]\n\
         \x20   end\n\
         \x20 99 ?: true\n\
         end\n\
         7\n"
    );
}
