//! Replwarden - Replica Set Bootstrap & Membership Controller
//!
//! A bootstrap and membership controller for a self-organizing
//! replicated data-store cluster running in an elastic,
//! orchestrator-managed environment where node addresses are not known
//! ahead of time. It discovers peers through DNS, forms or joins a
//! replica group, keeps this node's membership consistent with the
//! group, and provisions authentication material, tolerating transient
//! unavailability of peers and of the slow-starting data-store process.
//!
//! # Architecture
//!
//! The controller is sequential: each step blocks on a bounded polling
//! loop (or, for group formation, an intentionally unbounded readiness
//! wait) before the next begins. It owns only local state - the
//! self-address cache and the key file. Peer sets and group status are
//! read-only external views, queried fresh every time.
//!
//! # Components
//!
//! - Self-address resolution with a durable cache
//! - Liveness probing of control endpoints
//! - DNS-based peer discovery
//! - Deterministic replica-group configuration building
//! - Cluster initiation with an unbounded ready wait
//! - Best-effort join/leave membership mutation
//! - Credential and key-file provisioning

pub mod config;
pub mod error;
pub mod net;
pub mod node;
pub mod poll;
pub mod probe;
pub mod provision;
pub mod replset;

pub use config::Settings;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::error::{Error, Result};
    pub use crate::net::{Command, ControlClient, GroupStatus, NodeAddress, Reply, Transport};
    pub use crate::probe::ProbeDirection;
    pub use crate::provision::{CredentialProvisioner, KeyfileOutcome};
    pub use crate::replset::{build_config, Membership, ReplicaGroupConfig};
}
