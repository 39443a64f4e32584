use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;

use crate::error::AddressError;

/// A validated query target. Only IPv4 is supported by the protocol header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressSpec {
    ip: [u8; 4],
    port: u16,
}

impl AddressSpec {
    /// Parse an `a.b.c.d:port` host string.
    ///
    /// Example usage:
    /// ```
    /// use sampquery::address::AddressSpec;
    ///
    /// let spec = AddressSpec::parse("127.0.0.1:7777").unwrap();
    /// assert_eq!(spec.octets(), [127, 0, 0, 1]);
    /// assert_eq!(spec.port(), 7777);
    /// ```
    pub fn parse(host: &str) -> Result<Self, AddressError> {
        let (ip_part, port_part) = match host.split_once(':') {
            Some((ip, port)) if !ip.is_empty() && !port.is_empty() && !port.contains(':') => {
                (ip, port)
            }
            _ => return Err(AddressError::MissingSeparator(host.to_owned())),
        };

        let ip = parse_octets(ip_part)?;
        let port = parse_port(port_part)?;

        Ok(AddressSpec { ip, port })
    }

    pub fn octets(&self) -> [u8; 4] {
        self.ip
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::from(self.ip), self.port))
    }
}

impl FromStr for AddressSpec {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AddressSpec::parse(s)
    }
}

impl fmt::Display for AddressSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.ip;
        write!(f, "{a}.{b}.{c}.{d}:{}", self.port)
    }
}

fn is_decimal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_octets(s: &str) -> Result<[u8; 4], AddressError> {
    let malformed = || AddressError::MalformedOctet(s.to_owned());

    let mut octets = [0u8; 4];
    let mut parts = s.split('.');
    for octet in octets.iter_mut() {
        let part = parts.next().ok_or_else(malformed)?;
        if !is_decimal(part) {
            return Err(malformed());
        }
        *octet = part.parse::<u8>().map_err(|_| malformed())?;
    }
    if parts.next().is_some() {
        return Err(malformed());
    }

    Ok(octets)
}

fn parse_port(s: &str) -> Result<u16, AddressError> {
    if !is_decimal(s) {
        return Err(AddressError::MalformedPort(s.to_owned()));
    }
    match s.parse::<u16>() {
        Ok(0) | Err(_) => Err(AddressError::PortOutOfRange(s.to_owned())),
        Ok(p) => Ok(p),
    }
}
