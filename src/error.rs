use thiserror::Error;

/// Failure to turn one host specification into network prefixes.
///
/// Every variant carries the offending host text so the first error of a
/// translation pass can be surfaced to an operator as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Not a syntactically valid IPv4 or IPv6 literal
    #[error("ports={0:?}: invalid IP address")]
    InvalidAddress(String),

    /// Literal all-zero address, which must be written as `*`
    #[error("ports={0:?}: to allow all IP addresses, use *:port, not {0}:port")]
    AmbiguousWildcard(String),

    /// Bit-length negative or wider than the address family
    #[error("invalid CIDR size {bits} for host {host:?}")]
    InvalidPrefixLength { bits: i32, host: String },
}

impl ParseError {
    /// The host text that failed to parse.
    pub fn host(&self) -> &str {
        match self {
            ParseError::InvalidAddress(host) => host,
            ParseError::AmbiguousWildcard(host) => host,
            ParseError::InvalidPrefixLength { host, .. } => host,
        }
    }
}

/// Filter rule error types
#[derive(Error, Debug)]
pub enum FilterError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FilterError>;
