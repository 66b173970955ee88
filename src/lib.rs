//! ACL Filter Rules - normalize raw packet filter rules into matchable form
//!
//! Raw rules name sources and destinations as text: IP literals, an optional
//! prefix length, and the `*` wildcard. This crate turns them into
//! [`Match`] values holding concrete prefixes and explicit port ranges.
//!
//! Translation is best-effort. Every raw rule yields one [`Match`], entries
//! that fail to parse are left out of it, and the first failure of the batch
//! is returned alongside the result.
//!
//! # Example
//!
//! ```rust
//! use acl_filter_rules::{matches_from_rules, NetPortSpec, PortRange, RawRule};
//!
//! let rules = vec![RawRule {
//!     src_ips: vec!["*".to_string()],
//!     src_bits: vec![],
//!     dst_ports: vec![NetPortSpec::new("10.0.0.1", PortRange::new(1, 1000))],
//! }];
//!
//! let (matches, err) = matches_from_rules(&rules).into_parts();
//! assert!(err.is_none());
//! assert_eq!(matches[0].srcs.len(), 2); // 0.0.0.0/0 and ::/0
//! assert!(matches[0].matches(
//!     "100.64.0.1".parse().unwrap(),
//!     "10.0.0.1".parse().unwrap(),
//!     22,
//! ));
//! ```
//!
//! # Host Specifications
//!
//! | Text | Result |
//! |------|--------|
//! | `*` | `0.0.0.0/0` and `::/0` |
//! | `10.0.0.1` | `10.0.0.1/bits`, bits defaulting to 32 |
//! | `fd00::1` | `fd00::1/bits`, bits defaulting to 32 |
//! | `0.0.0.0`, `::` | rejected, use `*` |

pub mod error;
pub mod parser;
pub mod translate;
pub mod types;

// Re-export commonly used items
pub use error::{FilterError, ParseError, Result};
pub use parser::{parse_ip, parse_rules_from_file, parse_rules_json, DEFAULT_BITS, WILDCARD};
pub use translate::{matches_from_rules, translate_json, Translation};
pub use types::{Match, NetPortRange, NetPortSpec, PortRange, Prefixes, RawRule};
