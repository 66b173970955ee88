use tracing::{debug, trace};

use crate::error::{ParseError, Result};
use crate::parser::{parse_ip, parse_rules_json, DEFAULT_BITS};
use crate::types::{Match, NetPortRange, RawRule};

/// Result of translating a batch of raw rules.
///
/// `matches` always has one entry per input rule, in input order, and is
/// usable even when `error` is set: entries that failed to parse are simply
/// missing from their `Match`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translation {
    /// One normalized rule per raw rule
    pub matches: Vec<Match>,
    /// First parse failure of the pass, if any
    pub error: Option<ParseError>,
}

impl Translation {
    /// Split into the matches and the first error.
    pub fn into_parts(self) -> (Vec<Match>, Option<ParseError>) {
        (self.matches, self.error)
    }

    /// True when every entry of every rule parsed.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Discard the partial result if anything failed to parse.
    pub fn into_result(self) -> std::result::Result<Vec<Match>, ParseError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.matches),
        }
    }

    /// Keep the first error only.
    fn record(&mut self, err: ParseError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}

/// Convert raw filter rules into matches.
///
/// Malformed source or destination entries are skipped and translation goes
/// on with the rest of the batch. Only the first failure is reported.
pub fn matches_from_rules(rules: &[RawRule]) -> Translation {
    let mut out = Translation {
        matches: Vec::with_capacity(rules.len()),
        error: None,
    };

    for (index, rule) in rules.iter().enumerate() {
        let mut m = Match::default();

        for (i, src) in rule.src_ips.iter().enumerate() {
            let bits = rule.src_bits.get(i).copied().unwrap_or(DEFAULT_BITS);
            match parse_ip(src, bits) {
                Ok(nets) => m.srcs.extend(nets),
                Err(err) => {
                    debug!(rule = index, src = %src, error = %err, "skipping source");
                    out.record(err);
                }
            }
        }

        for dst in &rule.dst_ports {
            let bits = dst.bits.unwrap_or(DEFAULT_BITS);
            match parse_ip(&dst.ip, bits) {
                Ok(nets) => m
                    .dsts
                    .extend(nets.into_iter().map(|net| NetPortRange::new(net, dst.ports))),
                Err(err) => {
                    debug!(rule = index, dst = %dst.ip, error = %err, "skipping destination");
                    out.record(err);
                }
            }
        }

        out.matches.push(m);
    }

    trace!(
        rules = rules.len(),
        complete = out.is_complete(),
        "translated filter rules"
    );
    out
}

/// Parse a JSON rule document and translate it.
///
/// A document that cannot be loaded is an error; parse failures inside it
/// are reported through the returned [`Translation`].
pub fn translate_json(text: &str) -> Result<Translation> {
    let rules = parse_rules_json(text)?;
    Ok(matches_from_rules(&rules))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NetPortSpec, PortRange};
    use ipnet::IpNet;

    fn net(s: &str) -> IpNet {
        s.parse().unwrap()
    }

    fn rule(srcs: &[&str], dsts: Vec<NetPortSpec>) -> RawRule {
        RawRule {
            src_ips: srcs.iter().map(|s| s.to_string()).collect(),
            src_bits: vec![],
            dst_ports: dsts,
        }
    }

    #[test]
    fn test_wildcard_src_single_dst() {
        let rules = vec![rule(
            &["*"],
            vec![NetPortSpec::new("10.0.0.1", PortRange::new(1, 1000))],
        )];
        let (matches, err) = matches_from_rules(&rules).into_parts();
        assert!(err.is_none());
        assert_eq!(
            matches,
            vec![Match {
                srcs: vec![net("0.0.0.0/0"), net("::/0")],
                dsts: vec![NetPortRange::new(net("10.0.0.1/32"), PortRange::new(1, 1000))],
            }]
        );
    }

    #[test]
    fn test_zero_src_is_rejected() {
        let rules = vec![rule(&["0.0.0.0"], vec![])];
        let (matches, err) = matches_from_rules(&rules).into_parts();
        assert_eq!(matches.len(), 1);
        assert!(matches[0].srcs.is_empty());
        assert_eq!(err, Some(ParseError::AmbiguousWildcard("0.0.0.0".into())));
    }

    #[test]
    fn test_src_bits_by_index() {
        let mut r = rule(&["10.0.0.1", "10.0.0.2", "fd00::1"], vec![]);
        r.src_bits = vec![8];
        let t = matches_from_rules(&[r]);
        assert!(t.is_complete());
        // Entries past the end of src_bits fall back to 32, v6 included.
        assert_eq!(
            t.matches[0].srcs,
            vec![net("10.0.0.1/8"), net("10.0.0.2/32"), net("fd00::1/32")]
        );
    }

    #[test]
    fn test_src_bits_longer_than_srcs() {
        let mut r = rule(&["10.0.0.1"], vec![]);
        r.src_bits = vec![24, 99, -5];
        let t = matches_from_rules(&[r]);
        assert!(t.is_complete());
        assert_eq!(t.matches[0].srcs, vec![net("10.0.0.1/24")]);
    }

    #[test]
    fn test_dst_bits_override() {
        let rules = vec![rule(
            &["*"],
            vec![
                NetPortSpec::new("fd00::1", PortRange::single(22)).with_bits(64),
                NetPortSpec::new("192.168.0.1", PortRange::ANY),
            ],
        )];
        let t = matches_from_rules(&rules);
        assert!(t.is_complete());
        assert_eq!(
            t.matches[0].dsts,
            vec![
                NetPortRange::new(net("fd00::1/64"), PortRange::single(22)),
                NetPortRange::new(net("192.168.0.1/32"), PortRange::ANY),
            ]
        );
    }

    #[test]
    fn test_wildcard_dst_expands_to_both_families() {
        let rules = vec![rule(&["100.64.0.1"], vec![NetPortSpec::new("*", PortRange::single(53))])];
        let t = matches_from_rules(&rules);
        assert_eq!(
            t.matches[0].dsts,
            vec![
                NetPortRange::new(net("0.0.0.0/0"), PortRange::single(53)),
                NetPortRange::new(net("::/0"), PortRange::single(53)),
            ]
        );
    }

    #[test]
    fn test_first_error_wins() {
        let rules = vec![
            rule(&["bogus"], vec![]),
            rule(
                &["10.0.0.1"],
                vec![NetPortSpec::new("::", PortRange::ANY)],
            ),
        ];
        let t = matches_from_rules(&rules);
        assert_eq!(t.error, Some(ParseError::InvalidAddress("bogus".into())));
        // The second rule is still processed.
        assert_eq!(t.matches[1].srcs, vec![net("10.0.0.1/32")]);
        assert!(t.matches[1].dsts.is_empty());
    }

    #[test]
    fn test_bad_entry_only_drops_itself() {
        let rules = vec![rule(
            &["10.0.0.1", "10.0.0.300", "10.0.0.3"],
            vec![
                NetPortSpec::new("10.1.0.1", PortRange::single(80)).with_bits(33),
                NetPortSpec::new("10.1.0.2", PortRange::single(80)),
            ],
        )];
        let t = matches_from_rules(&rules);
        assert_eq!(t.error, Some(ParseError::InvalidAddress("10.0.0.300".into())));
        assert_eq!(t.matches[0].srcs, vec![net("10.0.0.1/32"), net("10.0.0.3/32")]);
        assert_eq!(
            t.matches[0].dsts,
            vec![NetPortRange::new(net("10.1.0.2/32"), PortRange::single(80))]
        );
    }

    #[test]
    fn test_dst_error_recorded_when_srcs_clean() {
        let rules = vec![rule(
            &["10.0.0.1"],
            vec![NetPortSpec::new("10.1.0.1", PortRange::single(80)).with_bits(33)],
        )];
        let t = matches_from_rules(&rules);
        assert_eq!(
            t.error,
            Some(ParseError::InvalidPrefixLength {
                bits: 33,
                host: "10.1.0.1".into()
            })
        );
    }

    #[test]
    fn test_empty_input() {
        let t = matches_from_rules(&[]);
        assert!(t.matches.is_empty());
        assert!(t.is_complete());
    }

    #[test]
    fn test_empty_rule_still_produces_match() {
        let t = matches_from_rules(&[RawRule::default(), rule(&["::1"], vec![])]);
        assert_eq!(t.matches.len(), 2);
        assert!(t.matches[0].is_empty());
        assert_eq!(t.matches[1].srcs, vec![net("::1/32")]);
    }

    #[test]
    fn test_into_result() {
        let ok = matches_from_rules(&[rule(&["*"], vec![])]).into_result();
        assert_eq!(ok.unwrap().len(), 1);

        let err = matches_from_rules(&[rule(&["nope"], vec![])]).into_result();
        assert_eq!(err.unwrap_err(), ParseError::InvalidAddress("nope".into()));
    }

    #[test]
    fn test_translate_json() {
        let text = r#"[{"SrcIPs": ["*"], "DstPorts": [{"IP": "10.0.0.1", "Ports": {"First": 1, "Last": 1000}}]}]"#;
        let t = translate_json(text).unwrap();
        assert!(t.is_complete());
        assert_eq!(t.matches[0].srcs.len(), 2);
        assert_eq!(t.matches[0].dsts[0].ports, PortRange::new(1, 1000));
    }

    #[test]
    fn test_translate_json_load_failure() {
        assert!(translate_json("not json").is_err());
    }
}
