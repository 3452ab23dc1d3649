//! Target and source address strings.
//!
//! A target reads `[transport://]host[:port]`. The port is only split off
//! when the remainder is a well-formed `host:port` pair, so a bare IPv6
//! address such as `::1` is taken as a host on the default port.

use crate::error::{Error, Result};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Port used when a target names none.
pub const DEFAULT_PORT: u16 = 161;

/// Transport used when a target names none.
pub const DEFAULT_TRANSPORT: &str = "udp";

/// An agent to scrape.
///
/// ```
/// use snmp_exporter::scraper::Target;
///
/// let t: Target = "tcp://[2001:db8::1]:1161".parse().unwrap();
/// assert_eq!(t.transport, "tcp");
/// assert_eq!(t.host, "2001:db8::1");
/// assert_eq!(t.port, 1161);
///
/// let t: Target = "switch1".parse().unwrap();
/// assert_eq!((t.transport.as_str(), t.host.as_str(), t.port), ("udp", "switch1", 161));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub transport: String,
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn parse(input: &str) -> Result<Self> {
        let (transport, rest) = match input.split_once("://") {
            Some((transport, rest)) => (transport, rest),
            None => (DEFAULT_TRANSPORT, input),
        };

        let (host, port) = match split_host_port(rest) {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|e| {
                    Error::InvalidTarget {
                        input: input.into(),
                        message: format!("error converting port number {port:?}: {e}").into(),
                    }
                    .boxed()
                })?;
                (host, port)
            }
            None => (rest, DEFAULT_PORT),
        };

        Ok(Self {
            transport: transport.to_string(),
            host: host.to_string(),
            port,
        })
    }
}

impl FromStr for Target {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "{}://[{}]:{}", self.transport, self.host, self.port)
        } else {
            write!(f, "{}://{}:{}", self.transport, self.host, self.port)
        }
    }
}

/// Split `host:port`, with the host optionally in brackets.
///
/// `None` when the input is not such a pair: no colon, an unbracketed host
/// with colons, or stray brackets.
fn split_host_port(s: &str) -> Option<(&str, &str)> {
    let colon = s.rfind(':')?;
    let (host, port) = if s.starts_with('[') {
        let end = s.find(']')?;
        if end + 1 != colon {
            return None;
        }
        if s[1..].contains('[') || s[end + 1..].contains(']') {
            return None;
        }
        (&s[1..end], &s[colon + 1..])
    } else {
        let host = &s[..colon];
        if host.contains(':') || s.contains('[') || s.contains(']') {
            return None;
        }
        (host, &s[colon + 1..])
    };
    Some((host, port))
}

/// Local address requests are sent from: `ip[:port]`.
///
/// A missing, empty or zero port lets the OS pick one.
///
/// ```
/// use snmp_exporter::scraper::SourceAddress;
///
/// let a: SourceAddress = "10.0.0.5:0".parse().unwrap();
/// assert_eq!(a.port, None);
/// let a: SourceAddress = "[::1]:1500".parse().unwrap();
/// assert_eq!(a.port, Some(1500));
/// assert!("not-an-ip".parse::<SourceAddress>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceAddress {
    pub ip: IpAddr,
    pub port: Option<u16>,
}

impl SourceAddress {
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |message: String| {
            Error::InvalidTarget {
                input: input.into(),
                message: message.into(),
            }
            .boxed()
        };

        let (host, port) = split_host_port(input).unwrap_or((input, ""));
        let ip = host
            .parse::<IpAddr>()
            .map_err(|e| invalid(format!("invalid source IP {host:?}: {e}")))?;
        let port = match port {
            "" => None,
            p => match p.parse::<u16>() {
                Ok(0) => None,
                Ok(p) => Some(p),
                Err(e) => return Err(invalid(format!("invalid source port {p:?}: {e}"))),
            },
        };
        Ok(Self { ip, port })
    }
}

impl FromStr for SourceAddress {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let port = self.port.unwrap_or(0);
        match self.ip {
            IpAddr::V4(ip) => write!(f, "{ip}:{port}"),
            IpAddr::V6(ip) => write!(f, "[{ip}]:{port}"),
        }
    }
}
