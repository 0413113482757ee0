//! Peer Discovery
//!
//! Resolves the logical service name to the current set of peer
//! addresses. An empty answer is a valid, meaningful state (the group
//! may not exist yet), so this module never retries and never raises -
//! callers that need a non-empty set apply their own policy.

use super::{NodeAddress, CONTROL_PORT};

/// Resolve `service_name` to all currently registered peer addresses.
///
/// Returns the deduplicated addresses in resolution order. A name that
/// resolves to nothing (or fails to resolve at all) yields an empty
/// set, not an error.
pub async fn discover_peers(service_name: &str) -> Vec<NodeAddress> {
    let answers = match tokio::net::lookup_host((service_name, CONTROL_PORT)).await {
        Ok(answers) => answers,
        Err(e) => {
            tracing::debug!("Discovery of {} resolved to nothing: {}", service_name, e);
            return Vec::new();
        }
    };

    let mut peers: Vec<NodeAddress> = Vec::new();
    for addr in answers {
        if let std::net::SocketAddr::V4(v4) = addr {
            let peer = NodeAddress::new(*v4.ip());
            if !peers.contains(&peer) {
                peers.push(peer);
            }
        }
    }

    tracing::debug!("Discovery of {} found {} peer(s)", service_name, peers.len());
    peers
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn test_localhost_resolves_to_loopback() {
        let peers = discover_peers("localhost").await;
        assert!(peers.contains(&NodeAddress::new(Ipv4Addr::LOCALHOST)));

        // No duplicates even when the resolver returns several records
        let mut unique = peers.clone();
        unique.dedup();
        assert_eq!(peers, unique);
    }

    #[tokio::test]
    async fn test_unresolvable_name_is_empty_not_error() {
        let peers = discover_peers("no-such-service.invalid").await;
        assert!(peers.is_empty());
    }
}
