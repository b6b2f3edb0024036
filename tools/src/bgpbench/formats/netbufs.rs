//! Routes as NetBufs `route` groups, named by `schemas/bgp.toml`.

use super::*;
use crate::route::{Origin, Prefix};
use ::netbufs::{Receiver, Schema, Sender, Validation};
use anyhow::{anyhow, bail};
use netbufs_cbor::{decode::Decoder, encode::Encoder};
use netbufs_tools::settings;
use std::net::Ipv4Addr;

const SCHEMA: &str = include_str!("../../../schemas/bgp.toml");

const ROUTE: u64 = 1;
const PREFIX: u64 = 2;
const NEXT_HOP: u64 = 3;
const ORIGIN: u64 = 4;
const AS_PATH: u64 = 5;
const LOCAL_PREF: u64 = 6;
const MED: u64 = 7;
const COMMUNITY: u64 = 8;
const COMMUNITY_GROUP: u64 = 20;
const ASN: u64 = 21;
const VALUE: u64 = 22;

pub struct NetBufs {
    schema: Schema,
}

impl NetBufs {
    pub fn new() -> anyhow::Result<Self> {
        let schema = settings::parse_schema(SCHEMA)?;
        for (path, id) in [
            ("route", ROUTE),
            ("route.prefix", PREFIX),
            ("route.next_hop", NEXT_HOP),
            ("route.origin", ORIGIN),
            ("route.as_path", AS_PATH),
            ("route.local_pref", LOCAL_PREF),
            ("route.med", MED),
            ("route.community", COMMUNITY),
            ("community", COMMUNITY_GROUP),
            ("community.asn", ASN),
            ("community.value", VALUE),
        ] {
            if schema.id(path) != Some(id) {
                bail!("Schema does not bind '{path}' to {id}");
            }
        }
        Ok(Self { schema })
    }

    fn send(s: &mut Sender, r: &Route) -> Result<(), ::netbufs::Error> {
        s.send(PREFIX, &r.prefix.to_string())?;
        if let Some(hop) = &r.next_hop {
            s.send(NEXT_HOP, &hop.to_string())?;
        }
        s.send(ORIGIN, &r.origin.code())?;
        if !r.as_path.is_empty() {
            s.send_key(AS_PATH)?;
            s.encoder().emit_slice(&r.as_path)?;
        }
        if let Some(v) = r.local_pref {
            s.send(LOCAL_PREF, &v)?;
        }
        if let Some(v) = r.med {
            s.send(MED, &v)?;
        }
        for (asn, value) in &r.communities {
            s.send_key(COMMUNITY)?;
            s.send_group_with(COMMUNITY_GROUP, |s| {
                s.send(ASN, asn)?;
                s.send(VALUE, value)
            })?;
        }
        Ok(())
    }

    fn recv(r: &mut Receiver) -> anyhow::Result<Route> {
        // Overwritten below: validation fails the group if the prefix never arrives
        let mut route = Route::new(Prefix {
            addr: Ipv4Addr::UNSPECIFIED.into(),
            len: 0,
        });
        while let Some(key) = r.recv_key()? {
            match key {
                PREFIX => route.prefix = r.recv::<String>()?.parse()?,
                NEXT_HOP => route.next_hop = Some(r.recv::<String>()?.parse()?),
                ORIGIN => {
                    let code: u8 = r.recv()?;
                    route.origin =
                        Origin::from_code(code).ok_or_else(|| anyhow!("Unknown origin {code}"))?;
                }
                AS_PATH => {
                    let d = r.decoder();
                    d.decode_array_begin()?;
                    while !d.at_end()? {
                        route.as_path.push(d.decode_uint32()?);
                    }
                    d.decode_array_end()?;
                }
                LOCAL_PREF => route.local_pref = Some(r.recv()?),
                MED => route.med = Some(r.recv()?),
                COMMUNITY => {
                    let (mut asn, mut value) = (0u16, 0u16);
                    r.recv_group_with(COMMUNITY_GROUP, |r, key| -> Result<(), ::netbufs::Error> {
                        match key {
                            ASN => asn = r.recv()?,
                            VALUE => value = r.recv()?,
                            _ => r.skip()?,
                        }
                        Ok(())
                    })?;
                    route.communities.push((asn, value));
                }
                _ => r.skip()?,
            }
        }
        Ok(route)
    }
}

impl Format for NetBufs {
    fn name(&self) -> &'static str {
        "netbufs"
    }

    fn encode(&self, routes: &[Route]) -> anyhow::Result<Vec<u8>> {
        let mut e = Encoder::memory();
        let mut s = Sender::new(&mut e, &self.schema);
        for route in routes {
            s.send_group_with(ROUTE, |s| Self::send(s, route))?;
        }
        Ok(e.build()?)
    }

    fn decode(&self, data: &[u8]) -> anyhow::Result<Vec<Route>> {
        let mut d = Decoder::from_slice(data);
        let mut r = Receiver::new(&mut d, &self.schema).with_validation(Validation::Required);
        let mut routes = Vec::new();
        while let Some(id) = r.recv_any_group()? {
            if id != ROUTE {
                bail!("Expected a route group, found group {id}");
            }
            routes.push(Self::recv(&mut r)?);
            r.recv_group_end()?;
        }
        d.finish()?;
        Ok(routes)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn layout() {
        let mut route = Route::new("10.0.0.0/8".parse().unwrap());
        route.communities = vec![(1, 2)];
        assert_eq!(
            NetBufs::new().unwrap().encode(&[route]).unwrap(),
            hex!(
                "9f 01
                    02 6a 31302e302e302e302f38
                    04 00
                    08 9f 14 15 01 16 02 ff
                ff"
            )
        );
    }

    #[test]
    fn missing_prefix() {
        let err = NetBufs::new()
            .unwrap()
            .decode(&hex!("9f 01 04 00 ff"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<::netbufs::Error>(),
            Some(::netbufs::Error::MissingRequired { .. })
        ));
    }

    #[test]
    fn unknown_attributes_skipped() {
        let routes = NetBufs::new()
            .unwrap()
            .decode(&hex!("9f 01 02 6a 31302e302e302e302f38 04 01 18 63 82 01 02 ff"))
            .unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].prefix.to_string(), "10.0.0.0/8");
    }
}
