//! Backend and target address normalization.
//!
//! Every address used as a lookup key (route tables, tracker records, session
//! keys) goes through [`normalize_address`] first, so `Host1` and `host1:22`
//! name the same backend.

use std::net::Ipv6Addr;

/// Port assumed when an address has none.
pub const DEFAULT_PORT: u16 = 22;

/// Error type for address parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("empty address")]
    Empty,

    #[error("invalid host '{0}'")]
    InvalidHost(String),

    #[error("invalid port in '{0}'")]
    InvalidPort(String),
}

/// Normalize `host`, `host:port`, `[v6]` or `[v6]:port` into canonical `host:port`.
pub fn normalize_address(raw: &str) -> Result<String, AddressError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AddressError::Empty);
    }

    let (host, port) = match raw.strip_prefix('[') {
        Some(rest) => {
            let (inner, after) = rest
                .split_once(']')
                .ok_or_else(|| AddressError::InvalidHost(raw.to_string()))?;
            if inner.parse::<Ipv6Addr>().is_err() {
                return Err(AddressError::InvalidHost(raw.to_string()));
            }
            let port = match after {
                "" => None,
                _ => Some(
                    after
                        .strip_prefix(':')
                        .ok_or_else(|| AddressError::InvalidPort(raw.to_string()))?,
                ),
            };
            (format!("[{}]", inner.to_ascii_lowercase()), port)
        }
        None => {
            let (host, port) = match raw.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (raw, None),
            };
            if !is_valid_hostname(host) {
                return Err(AddressError::InvalidHost(raw.to_string()));
            }
            (host.to_ascii_lowercase(), port)
        }
    };

    let port = match port {
        None => DEFAULT_PORT,
        Some(p) => match p.parse::<u16>() {
            Ok(port) if port != 0 => port,
            _ => return Err(AddressError::InvalidPort(raw.to_string())),
        },
    };

    Ok(format!("{}:{}", host, port))
}

fn is_valid_hostname(host: &str) -> bool {
    !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'))
}
