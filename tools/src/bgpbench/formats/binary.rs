//! Fixed-layout big-endian packing, the baseline the other formats are measured against.

use super::*;
use crate::route::{Origin, Prefix};
use anyhow::{anyhow, bail};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

const FLAG_NEXT_HOP: u8 = 0x01;
const FLAG_LOCAL_PREF: u8 = 0x02;
const FLAG_MED: u8 = 0x04;

pub struct Binary;

fn put_addr(out: &mut Vec<u8>, addr: &IpAddr) {
    match addr {
        IpAddr::V4(a) => {
            out.push(4);
            out.extend_from_slice(&a.octets());
        }
        IpAddr::V6(a) => {
            out.push(6);
            out.extend_from_slice(&a.octets());
        }
    }
}

struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> anyhow::Result<&'a [u8]> {
        if self.data.len() < n {
            bail!("Truncated route data");
        }
        let (head, tail) = self.data.split_at(n);
        self.data = tail;
        Ok(head)
    }

    fn array<const N: usize>(&mut self) -> anyhow::Result<[u8; N]> {
        let mut a = [0; N];
        a.copy_from_slice(self.take(N)?);
        Ok(a)
    }

    fn u8(&mut self) -> anyhow::Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> anyhow::Result<u16> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    fn u32(&mut self) -> anyhow::Result<u32> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    fn addr(&mut self) -> anyhow::Result<IpAddr> {
        match self.u8()? {
            4 => Ok(Ipv4Addr::from(self.array::<4>()?).into()),
            6 => Ok(Ipv6Addr::from(self.array::<16>()?).into()),
            family => Err(anyhow!("Unknown address family {family}")),
        }
    }
}

impl Format for Binary {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn encode(&self, routes: &[Route]) -> anyhow::Result<Vec<u8>> {
        let mut out = Vec::new();
        out.extend_from_slice(&u32::try_from(routes.len())?.to_be_bytes());
        for r in routes {
            put_addr(&mut out, &r.prefix.addr);
            out.push(r.prefix.len);
            out.push(r.origin.code());

            let mut flags = 0;
            if r.next_hop.is_some() {
                flags |= FLAG_NEXT_HOP;
            }
            if r.local_pref.is_some() {
                flags |= FLAG_LOCAL_PREF;
            }
            if r.med.is_some() {
                flags |= FLAG_MED;
            }
            out.push(flags);
            if let Some(hop) = &r.next_hop {
                put_addr(&mut out, hop);
            }
            if let Some(v) = r.local_pref {
                out.extend_from_slice(&v.to_be_bytes());
            }
            if let Some(v) = r.med {
                out.extend_from_slice(&v.to_be_bytes());
            }

            out.extend_from_slice(&u16::try_from(r.as_path.len())?.to_be_bytes());
            for asn in &r.as_path {
                out.extend_from_slice(&asn.to_be_bytes());
            }
            out.extend_from_slice(&u16::try_from(r.communities.len())?.to_be_bytes());
            for (asn, value) in &r.communities {
                out.extend_from_slice(&asn.to_be_bytes());
                out.extend_from_slice(&value.to_be_bytes());
            }
        }
        Ok(out)
    }

    fn decode(&self, data: &[u8]) -> anyhow::Result<Vec<Route>> {
        let mut r = Reader { data };
        let count = r.u32()?;
        let mut routes = Vec::new();
        for _ in 0..count {
            let addr = r.addr()?;
            let mut route = Route::new(Prefix { addr, len: r.u8()? });
            route.origin = Origin::from_code(r.u8()?).ok_or_else(|| anyhow!("Unknown origin"))?;

            let flags = r.u8()?;
            if flags & FLAG_NEXT_HOP != 0 {
                route.next_hop = Some(r.addr()?);
            }
            if flags & FLAG_LOCAL_PREF != 0 {
                route.local_pref = Some(r.u32()?);
            }
            if flags & FLAG_MED != 0 {
                route.med = Some(r.u32()?);
            }

            for _ in 0..r.u16()? {
                route.as_path.push(r.u32()?);
            }
            for _ in 0..r.u16()? {
                route.communities.push((r.u16()?, r.u16()?));
            }
            routes.push(route);
        }
        if !r.data.is_empty() {
            bail!("{} trailing bytes", r.data.len());
        }
        Ok(routes)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn layout() {
        let mut route = Route::new("10.0.0.0/8".parse().unwrap());
        route.med = Some(5);
        route.as_path = vec![1];
        assert_eq!(
            Binary.encode(&[route]).unwrap(),
            [
                0, 0, 0, 1, // count
                4, 10, 0, 0, 0, 8, // prefix
                0, FLAG_MED, 0, 0, 0, 5, // origin, flags, med
                0, 1, 0, 0, 0, 1, // as_path
                0, 0, // communities
            ]
        );
        assert!(Binary.decode(&[0, 0, 0, 0, 0]).is_err());
    }
}
