//! Network Module
//!
//! Node addressing, the typed command protocol spoken by data-store
//! control endpoints, the TCP client, and DNS-based peer discovery.

pub mod client;
pub mod command;
pub mod discovery;

pub use client::{ControlClient, Transport};
pub use command::{Command, Credentials, CredentialScope, GroupState, GroupStatus, Reply};

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Well-known TCP port of the data-store control endpoint
pub const CONTROL_PORT: u16 = 27017;

/// Network address of a data-store node
///
/// Immutable once resolved for a process lifetime; the port is the
/// fixed control-endpoint port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeAddress {
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl NodeAddress {
    /// Create an address on the well-known control port
    pub fn new(ip: Ipv4Addr) -> Self {
        Self {
            ip,
            port: CONTROL_PORT,
        }
    }

    /// Convert to a socket address for connecting
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.ip, self.port))
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

impl FromStr for NodeAddress {
    type Err = crate::Error;

    /// Parse `ip` or `ip:port`; a bare IP gets the well-known port
    fn from_str(s: &str) -> crate::Result<Self> {
        let (ip_part, port) = match s.split_once(':') {
            Some((ip, port)) => {
                let port = port
                    .parse()
                    .map_err(|_| crate::Error::Config(format!("invalid port in address: {s}")))?;
                (ip, port)
            }
            None => (s, CONTROL_PORT),
        };

        let ip = ip_part
            .parse()
            .map_err(|_| crate::Error::Config(format!("invalid IPv4 address: {s}")))?;

        Ok(Self { ip, port })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_roundtrip() {
        let addr = NodeAddress::new(Ipv4Addr::new(10, 0, 0, 5));
        assert_eq!(addr.to_string(), "10.0.0.5:27017");
        assert_eq!(addr.to_string().parse::<NodeAddress>().unwrap(), addr);
    }

    #[test]
    fn test_parse_bare_ip_gets_control_port() {
        let addr: NodeAddress = "192.168.1.20".parse().unwrap();
        assert_eq!(addr.port, CONTROL_PORT);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("not-an-ip".parse::<NodeAddress>().is_err());
        assert!("10.0.0.1:notaport".parse::<NodeAddress>().is_err());
    }
}
