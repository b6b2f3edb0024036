use super::*;
use crate::route::{Origin, Prefix, from_octets, octets};
use anyhow::anyhow;
use prost::Message;
use std::net::IpAddr;

pub struct Protobuf;

#[derive(Clone, PartialEq, Message)]
struct RouteTable {
    #[prost(message, repeated, tag = "1")]
    routes: Vec<RouteMsg>,
}

#[derive(Clone, PartialEq, Message)]
struct RouteMsg {
    #[prost(bytes = "vec", tag = "1")]
    prefix: Vec<u8>,
    #[prost(uint32, tag = "2")]
    prefix_len: u32,
    #[prost(bytes = "vec", optional, tag = "3")]
    next_hop: Option<Vec<u8>>,
    #[prost(uint32, tag = "4")]
    origin: u32,
    #[prost(uint32, repeated, tag = "5")]
    as_path: Vec<u32>,
    #[prost(uint32, optional, tag = "6")]
    local_pref: Option<u32>,
    #[prost(uint32, optional, tag = "7")]
    med: Option<u32>,
    #[prost(message, repeated, tag = "8")]
    communities: Vec<CommunityMsg>,
}

#[derive(Clone, PartialEq, Message)]
struct CommunityMsg {
    #[prost(uint32, tag = "1")]
    asn: u32,
    #[prost(uint32, tag = "2")]
    value: u32,
}

fn to_addr(bytes: &[u8]) -> anyhow::Result<IpAddr> {
    from_octets(bytes).ok_or_else(|| anyhow!("{} byte address", bytes.len()))
}

impl From<&Route> for RouteMsg {
    fn from(r: &Route) -> Self {
        Self {
            prefix: octets(&r.prefix.addr),
            prefix_len: r.prefix.len.into(),
            next_hop: r.next_hop.as_ref().map(octets),
            origin: r.origin.code().into(),
            as_path: r.as_path.clone(),
            local_pref: r.local_pref,
            med: r.med,
            communities: r
                .communities
                .iter()
                .map(|(asn, value)| CommunityMsg {
                    asn: (*asn).into(),
                    value: (*value).into(),
                })
                .collect(),
        }
    }
}

impl TryFrom<RouteMsg> for Route {
    type Error = anyhow::Error;

    fn try_from(m: RouteMsg) -> Result<Self, Self::Error> {
        let origin = u8::try_from(m.origin)
            .ok()
            .and_then(Origin::from_code)
            .ok_or_else(|| anyhow!("Unknown origin {}", m.origin))?;
        Ok(Route {
            prefix: Prefix {
                addr: to_addr(&m.prefix)?,
                len: m.prefix_len.try_into()?,
            },
            next_hop: m.next_hop.as_deref().map(to_addr).transpose()?,
            origin,
            as_path: m.as_path,
            local_pref: m.local_pref,
            med: m.med,
            communities: m
                .communities
                .into_iter()
                .map(|c| -> anyhow::Result<(u16, u16)> {
                    Ok((c.asn.try_into()?, c.value.try_into()?))
                })
                .collect::<anyhow::Result<_>>()?,
        })
    }
}

impl Format for Protobuf {
    fn name(&self) -> &'static str {
        "protobuf"
    }

    fn encode(&self, routes: &[Route]) -> anyhow::Result<Vec<u8>> {
        Ok(RouteTable {
            routes: routes.iter().map(RouteMsg::from).collect(),
        }
        .encode_to_vec())
    }

    fn decode(&self, data: &[u8]) -> anyhow::Result<Vec<Route>> {
        RouteTable::decode(data)?
            .routes
            .into_iter()
            .map(Route::try_from)
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn out_of_range() {
        let table = RouteTable {
            routes: vec![RouteMsg {
                prefix: vec![10, 0, 0, 0],
                prefix_len: 8,
                communities: vec![CommunityMsg {
                    asn: 70000,
                    value: 1,
                }],
                ..Default::default()
            }],
        };
        assert!(Protobuf.decode(&table.encode_to_vec()).is_err());
    }
}
