use std::{fmt, net::IpAddr, str::FromStr};

/// BGP ORIGIN attribute
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    #[default]
    Igp,
    Egp,
    Incomplete,
}

impl Origin {
    pub fn code(self) -> u8 {
        match self {
            Origin::Igp => 0,
            Origin::Egp => 1,
            Origin::Incomplete => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Origin::Igp),
            1 => Some(Origin::Egp),
            2 => Some(Origin::Incomplete),
            _ => None,
        }
    }
}

impl FromStr for Origin {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IGP" => Ok(Origin::Igp),
            "EGP" => Ok(Origin::Egp),
            "Incomplete" | "INCOMPLETE" | "?" => Ok(Origin::Incomplete),
            _ => Err(anyhow::anyhow!("Unknown origin '{s}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prefix {
    pub addr: IpAddr,
    pub len: u8,
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.len)
    }
}

impl FromStr for Prefix {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, len) = s
            .split_once('/')
            .ok_or_else(|| anyhow::anyhow!("Prefix '{s}' has no length"))?;
        let addr: IpAddr = addr.parse()?;
        let len: u8 = len.parse()?;
        let max = if addr.is_ipv4() { 32 } else { 128 };
        if len > max {
            anyhow::bail!("Prefix length {len} is too long for {addr}");
        }
        Ok(Prefix { addr, len })
    }
}

pub fn octets(addr: &IpAddr) -> Vec<u8> {
    match addr {
        IpAddr::V4(a) => a.octets().to_vec(),
        IpAddr::V6(a) => a.octets().to_vec(),
    }
}

/// The inverse of [`octets`]: 4 bytes for IPv4, 16 for IPv6.
pub fn from_octets(octets: &[u8]) -> Option<IpAddr> {
    if let Ok(a) = <[u8; 4]>::try_from(octets) {
        Some(IpAddr::from(a))
    } else if let Ok(a) = <[u8; 16]>::try_from(octets) {
        Some(IpAddr::from(a))
    } else {
        None
    }
}

/// One path to a prefix, with the attributes the benchmark carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub prefix: Prefix,
    pub next_hop: Option<IpAddr>,
    pub origin: Origin,
    pub as_path: Vec<u32>,
    pub local_pref: Option<u32>,
    pub med: Option<u32>,
    pub communities: Vec<(u16, u16)>,
}

impl Route {
    pub fn new(prefix: Prefix) -> Self {
        Self {
            prefix,
            next_hop: None,
            origin: Origin::default(),
            as_path: Vec::new(),
            local_pref: None,
            med: None,
            communities: Vec::new(),
        }
    }
}
