//! Each route as a fixed eight element CBOR array, routes as a CBOR sequence.

use super::*;
use crate::route::{Origin, Prefix, from_octets, octets};
use netbufs_cbor::{
    Error,
    block_stack::Container,
    decode::{Decoder, FromCbor},
    encode::{Encoder, ToCbor},
};
use std::net::IpAddr;

pub struct Cbor;

fn to_addr(bytes: Vec<u8>) -> Result<IpAddr, Error> {
    from_octets(&bytes).ok_or(Error::Range(bytes.len() as i128))
}

impl ToCbor for Route {
    fn to_cbor(&self, e: &mut Encoder) -> Result<(), Error> {
        e.emit_array(Some(8), |e| {
            e.emit(&octets(&self.prefix.addr))?;
            e.emit(&self.prefix.len)?;
            e.emit(&self.next_hop.as_ref().map(octets))?;
            e.emit(&self.origin.code())?;
            e.emit_slice(&self.as_path)?;
            e.emit(&self.local_pref)?;
            e.emit(&self.med)?;
            e.emit_array(Some(self.communities.len()), |e| -> Result<(), Error> {
                for (asn, value) in &self.communities {
                    e.emit_array(Some(2), |e| {
                        e.emit(asn)?;
                        e.emit(value)
                    })?;
                }
                Ok(())
            })
        })
    }
}

impl FromCbor for Route {
    fn from_cbor(d: &mut Decoder) -> Result<Self, Error> {
        // A definite length other than 8 fails with NItems at the end
        d.decode_array_begin()?;
        let mut route = Route::new(Prefix {
            addr: to_addr(d.decode_bytes()?)?,
            len: d.decode_uint8()?,
        });
        route.next_hop = d.decode::<Option<Vec<u8>>>()?.map(to_addr).transpose()?;
        let code = d.decode_uint8()?;
        route.origin = Origin::from_code(code).ok_or(Error::Range(code.into()))?;

        d.decode_array_begin()?;
        d.decode_members(Container::Array, |d| {
            route.as_path.push(d.decode_uint32()?);
            Ok::<_, Error>(())
        })?;

        route.local_pref = d.decode()?;
        route.med = d.decode()?;

        d.decode_array_begin()?;
        d.decode_members(Container::Array, |d| {
            d.decode_array_begin()?;
            let community = (d.decode_uint16()?, d.decode_uint16()?);
            d.decode_array_end()?;
            route.communities.push(community);
            Ok::<_, Error>(())
        })?;

        d.decode_array_end()?;
        Ok(route)
    }
}

impl Format for Cbor {
    fn name(&self) -> &'static str {
        "cbor"
    }

    fn encode(&self, routes: &[Route]) -> anyhow::Result<Vec<u8>> {
        let mut e = Encoder::memory();
        for route in routes {
            e.emit(route)?;
        }
        Ok(e.build()?)
    }

    fn decode(&self, data: &[u8]) -> anyhow::Result<Vec<Route>> {
        let mut d = Decoder::from_slice(data);
        let mut routes = Vec::new();
        while !d.at_end()? {
            routes.push(d.decode()?);
        }
        d.finish()?;
        Ok(routes)
    }
}
