use std::net::IpAddr;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Prefixes produced by parsing a single host specification.
///
/// Holds one prefix for a literal address and two for the wildcard.
pub type Prefixes = SmallVec<[IpNet; 2]>;

/// Inclusive port range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PortRange {
    /// First port (inclusive)
    pub first: u16,
    /// Last port (inclusive)
    pub last: u16,
}

impl PortRange {
    /// Every port, 0 through 65535.
    pub const ANY: PortRange = PortRange {
        first: 0,
        last: u16::MAX,
    };

    pub fn new(first: u16, last: u16) -> Self {
        Self { first, last }
    }

    /// Range holding a single port
    pub fn single(port: u16) -> Self {
        Self::new(port, port)
    }

    /// Check if the port falls within this range
    pub fn contains(&self, port: u16) -> bool {
        self.first <= port && port <= self.last
    }
}

/// Raw destination entry: host text, optional bit-length and ports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetPortSpec {
    /// Host specification (IP literal or `*`)
    #[serde(rename = "IP")]
    pub ip: String,
    /// Prefix length override; 32 when absent
    #[serde(rename = "Bits", default, skip_serializing_if = "Option::is_none")]
    pub bits: Option<i32>,
    #[serde(rename = "Ports")]
    pub ports: PortRange,
}

impl NetPortSpec {
    pub fn new(ip: impl Into<String>, ports: PortRange) -> Self {
        Self {
            ip: ip.into(),
            bits: None,
            ports,
        }
    }

    /// Set an explicit prefix length.
    pub fn with_bits(mut self, bits: i32) -> Self {
        self.bits = Some(bits);
        self
    }
}

/// Raw filter rule as delivered by the control plane
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRule {
    /// Source host specifications
    #[serde(rename = "SrcIPs", default)]
    pub src_ips: Vec<String>,
    /// Per-source prefix lengths, matched to `src_ips` by index.
    /// May be shorter than `src_ips`; missing entries mean 32.
    #[serde(rename = "SrcBits", default, skip_serializing_if = "Vec::is_empty")]
    pub src_bits: Vec<i32>,
    /// Destination host and port specifications
    #[serde(rename = "DstPorts", default)]
    pub dst_ports: Vec<NetPortSpec>,
}

/// A destination prefix paired with the ports allowed on it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetPortRange {
    pub net: IpNet,
    pub ports: PortRange,
}

impl NetPortRange {
    pub fn new(net: IpNet, ports: PortRange) -> Self {
        Self { net, ports }
    }

    /// Check if the address and port both fall within this destination
    pub fn contains(&self, ip: IpAddr, port: u16) -> bool {
        self.ports.contains(port) && self.net.contains(&ip)
    }
}

/// Normalized filter rule.
///
/// Both sequences keep the order of the raw rule they came from, but
/// evaluation is set membership over each of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Match {
    /// Allowed sources
    pub srcs: Vec<IpNet>,
    /// Allowed destination and port combinations
    pub dsts: Vec<NetPortRange>,
}

impl Match {
    /// Check if the source address is allowed by this rule
    pub fn matches_src(&self, src: IpAddr) -> bool {
        self.srcs.iter().any(|net| net.contains(&src))
    }

    /// Check if the destination address and port are allowed by this rule
    pub fn matches_dst(&self, dst: IpAddr, port: u16) -> bool {
        self.dsts.iter().any(|d| d.contains(dst, port))
    }

    /// Check if a packet from `src` to `dst:port` is allowed by this rule
    pub fn matches(&self, src: IpAddr, dst: IpAddr, port: u16) -> bool {
        self.matches_src(src) && self.matches_dst(dst, port)
    }

    /// True when nothing in the raw rule survived parsing.
    pub fn is_empty(&self) -> bool {
        self.srcs.is_empty() && self.dsts.is_empty()
    }
}
