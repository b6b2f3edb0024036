use super::route::Route;

mod binary;
mod cbor;
mod netbufs;
mod protobuf;

/// A wire format the benchmark can time.
pub trait Format {
    fn name(&self) -> &'static str;

    fn encode(&self, routes: &[Route]) -> anyhow::Result<Vec<u8>>;

    fn decode(&self, data: &[u8]) -> anyhow::Result<Vec<Route>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Kind {
    /// Hand-packed big-endian fields
    Binary,
    /// Plain CBOR arrays, one per route
    Cbor,
    /// NetBufs keyed groups over CBOR
    Netbufs,
    /// Protocol Buffers
    Protobuf,
}

impl Kind {
    pub fn all() -> Vec<Kind> {
        vec![Kind::Binary, Kind::Cbor, Kind::Netbufs, Kind::Protobuf]
    }

    pub fn format(self) -> anyhow::Result<Box<dyn Format>> {
        Ok(match self {
            Kind::Binary => Box::new(binary::Binary),
            Kind::Cbor => Box::new(cbor::Cbor),
            Kind::Netbufs => Box::new(netbufs::NetBufs::new()?),
            Kind::Protobuf => Box::new(protobuf::Protobuf),
        })
    }
}
