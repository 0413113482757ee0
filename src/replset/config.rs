//! Replica Group Configuration
//!
//! Deterministic construction of the configuration document submitted
//! when a brand-new group is formed. All non-determinism (discovery
//! order, address resolution) is resolved by the caller; this module
//! is pure.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::net::NodeAddress;

/// One member of a replica group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub member_id: u32,
    pub host: NodeAddress,
}

/// Configuration document for a replica group
///
/// Invariants: member ids are unique and start at 0, the local node
/// always occupies id 0, and hosts are unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaGroupConfig {
    pub group_id: String,
    pub members: Vec<Member>,
}

impl ReplicaGroupConfig {
    /// The local node's address (always member id 0)
    pub fn self_host(&self) -> NodeAddress {
        self.members[0].host
    }
}

/// Build the configuration for a new group.
///
/// The local node takes member id 0. Discovered peers follow with
/// strictly increasing ids from 1, in the order supplied; any peer
/// equal to `self_addr` is skipped (discovery often includes the
/// caller), as is any duplicate host.
pub fn build_config(
    group_id: &str,
    self_addr: NodeAddress,
    peers: &[NodeAddress],
) -> ReplicaGroupConfig {
    let mut members = vec![Member {
        member_id: 0,
        host: self_addr,
    }];

    for peer in peers {
        if members.iter().any(|m| m.host == *peer) {
            continue;
        }
        members.push(Member {
            member_id: members.len() as u32,
            host: *peer,
        });
    }

    ReplicaGroupConfig {
        group_id: group_id.to_string(),
        members,
    }
}

/// Connection descriptor for an existing group: group id plus the
/// comma-joined peer address list that currently answers for it
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSeed {
    pub group_id: String,
    pub hosts: Vec<NodeAddress>,
}

impl GroupSeed {
    pub fn new(group_id: impl Into<String>, hosts: Vec<NodeAddress>) -> Self {
        Self {
            group_id: group_id.into(),
            hosts,
        }
    }
}

impl fmt::Display for GroupSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hosts: Vec<String> = self.hosts.iter().map(|h| h.to_string()).collect();
        write!(f, "{}/{}", self.group_id, hosts.join(","))
    }
}
