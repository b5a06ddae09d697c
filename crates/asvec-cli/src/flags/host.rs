//! `host[:port]` parsing for `--host` and `--seeds`.

use std::sync::LazyLock;

use asvec_client::HostPort;
use regex::Regex;

use super::FlagError;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

// Bracketed forms come first: the bare-host pattern would also match IPv6.
static PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        r"^\[(?P<host>.*)\]:(?P<port>\d+)$",
        r"^\[(?P<host>.*)\]$",
        r"^(?P<host>[^:]*):(?P<port>\d+)$",
        r"^(?P<host>[^:]*)$",
    ]
    .map(|pattern| Regex::new(pattern).expect("host pattern is valid"))
});

/// Parses `host`, `host:port`, `[ipv6]` or `[ipv6]:port`. A missing or zero
/// port becomes [`DEFAULT_PORT`].
pub fn parse_host_port(text: &str) -> Result<HostPort, FlagError> {
    for pattern in PATTERNS.iter() {
        let Some(captures) = pattern.captures(text) else {
            continue;
        };
        let host = captures.name("host").map_or("", |m| m.as_str());
        let port = match captures.name("port") {
            Some(m) => m
                .as_str()
                .parse::<u16>()
                .map_err(|e| FlagError::invalid("host[:port]", text, format!("failed to parse port: {e}")))?,
            None => 0,
        };
        let port = if port == 0 { DEFAULT_PORT } else { port };
        return Ok(HostPort::new(host, port));
    }
    Err(FlagError::invalid(
        "host[:port]",
        text,
        "does not match any expected formats",
    ))
}

/// Parses a comma-separated seed list, preserving order.
pub fn parse_seeds(text: &str) -> Result<Vec<HostPort>, FlagError> {
    text.split(',').map(parse_host_port).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_forms() {
        let cases = [
            ("127.0.0.1", "127.0.0.1", 5000),
            ("127.0.0.1:3000", "127.0.0.1", 3000),
            ("localhost", "localhost", 5000),
            ("localhost:3001", "localhost", 3001),
            ("[::1]", "::1", 5000),
            ("[2001:db8::1]:3002", "2001:db8::1", 3002),
            ("example.com:0", "example.com", 5000),
        ];
        for (text, host, port) in cases {
            assert_eq!(parse_host_port(text).unwrap(), HostPort::new(host, port), "{text}");
        }
    }

    #[test]
    fn test_host_rejects() {
        assert!(parse_host_port("127.0.0.2:3002:").is_err());
        assert!(parse_host_port("::1").is_err());
        assert!(parse_host_port("host:99999").is_err());
        assert!(parse_host_port("host:port").is_err());
    }

    #[test]
    fn test_seeds_keep_order() {
        let seeds = parse_seeds("2.2.2.2:3000,1.1.1.1").unwrap();
        assert_eq!(
            seeds,
            vec![HostPort::new("2.2.2.2", 3000), HostPort::new("1.1.1.1", 5000)]
        );
        assert!(parse_seeds("1.1.1.1,bad:host:").is_err());
    }
}
