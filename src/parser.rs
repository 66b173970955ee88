use std::fs;
use std::net::IpAddr;
use std::path::Path;

use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use smallvec::smallvec;

use crate::error::{FilterError, ParseError, Result};
use crate::types::{Prefixes, RawRule};

/// Host specification meaning any address of either family
pub const WILDCARD: &str = "*";

/// Prefix length used when a rule gives none
pub const DEFAULT_BITS: i32 = 32;

/// Parse a host specification into network prefixes.
///
/// `*` yields `0.0.0.0/0` and `::/0` and ignores `default_bits`. Anything
/// else must be a literal IPv4 or IPv6 address other than the all-zero
/// address, and `default_bits` must fit its family.
pub fn parse_ip(host: &str, default_bits: i32) -> std::result::Result<Prefixes, ParseError> {
    if host == WILDCARD {
        return Ok(smallvec![
            IpNet::V4(Ipv4Net::default()),
            IpNet::V6(Ipv6Net::default()),
        ]);
    }

    let ip: IpAddr = host
        .parse()
        .map_err(|_| ParseError::InvalidAddress(host.to_string()))?;
    if ip.is_unspecified() {
        return Err(ParseError::AmbiguousWildcard(host.to_string()));
    }

    let max_bits = match ip {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };
    let invalid_len = || ParseError::InvalidPrefixLength {
        bits: default_bits,
        host: host.to_string(),
    };
    if !(0..=max_bits).contains(&default_bits) {
        return Err(invalid_len());
    }
    let bits = u8::try_from(default_bits).map_err(|_| invalid_len())?;
    let net = IpNet::new(ip, bits).map_err(|_| invalid_len())?;

    Ok(smallvec![net])
}

/// Parse raw filter rules from a JSON array.
pub fn parse_rules_json(text: &str) -> Result<Vec<RawRule>> {
    let rules: Vec<RawRule> = serde_json::from_str(text)?;

    for (index, rule) in rules.iter().enumerate() {
        for dst in &rule.dst_ports {
            if dst.ports.first > dst.ports.last {
                return Err(FilterError::ConfigError(format!(
                    "rule {}: invalid port range for {:?}: {} > {}",
                    index, dst.ip, dst.ports.first, dst.ports.last
                )));
            }
        }
    }

    Ok(rules)
}

/// Parse raw filter rules from a JSON file.
pub fn parse_rules_from_file(path: impl AsRef<Path>) -> Result<Vec<RawRule>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| {
        FilterError::ConfigError(format!(
            "Failed to read rules file '{}': {}",
            path.display(),
            e
        ))
    })?;
    parse_rules_json(&text)
}
