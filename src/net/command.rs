//! Control Protocol
//!
//! Typed request/response messages exchanged with a data-store control
//! endpoint. Requests are structured values serialized to JSON at the
//! socket boundary (one message per line), so credential and address
//! values are never interpolated into free-form command text.

use serde::{Deserialize, Serialize};

use super::NodeAddress;
use crate::replset::ReplicaGroupConfig;

/// A request to a control endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// No-op liveness check
    Ping,

    /// Read the current group status
    GroupStatus,

    /// Form a brand-new replica group from a standalone node
    InitiateGroup { config: ReplicaGroupConfig },

    /// Add a member to an existing group (authenticated)
    AddMember {
        group_id: String,
        host: NodeAddress,
        username: String,
        password: String,
    },

    /// Remove a member from an existing group (authenticated)
    RemoveMember {
        group_id: String,
        host: NodeAddress,
        username: String,
        password: String,
    },

    /// Create a user
    CreateUser { credentials: Credentials },

    /// Reset an existing user's password
    SetPassword { credentials: Credentials },
}

impl Command {
    /// Short name for logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping => "ping",
            Command::GroupStatus => "group_status",
            Command::InitiateGroup { .. } => "initiate_group",
            Command::AddMember { .. } => "add_member",
            Command::RemoveMember { .. } => "remove_member",
            Command::CreateUser { .. } => "create_user",
            Command::SetPassword { .. } => "set_password",
        }
    }
}

/// A reply from a control endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum Reply {
    /// Command accepted
    Ok,

    /// Group status snapshot
    Status { status: GroupStatus },

    /// Command refused
    Error { message: String },
}

/// Point-in-time group status reported by the data store
///
/// Read-only external state; polled fresh on every query, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStatus {
    pub startup_in_progress: bool,
    pub state: GroupState,
}

impl GroupStatus {
    /// Whether the group is in a stable, usable state
    pub fn is_ready(&self) -> bool {
        !self.startup_in_progress && self.state.is_ready()
    }
}

/// Replication state of a node within its group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupState {
    Startup,
    Primary,
    Secondary,
    Other,
}

impl GroupState {
    pub fn is_ready(&self) -> bool {
        matches!(self, GroupState::Primary | GroupState::Secondary)
    }
}

impl std::fmt::Display for GroupState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupState::Startup => write!(f, "STARTUP"),
            GroupState::Primary => write!(f, "PRIMARY"),
            GroupState::Secondary => write!(f, "SECONDARY"),
            GroupState::Other => write!(f, "OTHER"),
        }
    }
}

/// Scope of a provisioned user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialScope {
    Admin,
    Database,
}

/// Credentials for a one-shot provisioning operation
///
/// No local record is kept; success or failure is observed only
/// through the control endpoint's reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub scope: CredentialScope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}
