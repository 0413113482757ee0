//! Replica Group Control
//!
//! Building the replica-group configuration, initiating a brand-new
//! group, and mutating this node's membership in an existing one.

pub mod config;
pub mod initiator;
pub mod membership;

pub use config::{build_config, GroupSeed, Member, ReplicaGroupConfig};
pub use initiator::initiate;
pub use membership::{JoinOutcome, LeaveOutcome, Membership};
