//! Cluster Initiator
//!
//! Forms a brand-new replica group by submitting the configuration to
//! the still-standalone local node, then waits for the group to reach
//! a stable, usable state. This path must run on exactly one node in
//! the lifetime of a group; the controller does not enforce that
//! itself, and a double-initiate rejected by the data store is
//! propagated as a hard error.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::net::{Command, Reply, Transport};

use super::ReplicaGroupConfig;

/// Submit `config` to the local node and block until the group reports
/// ready (startup finished, state PRIMARY or SECONDARY).
///
/// The readiness wait is intentionally unbounded: primary election can
/// legitimately take a long, variable time, and giving up early would
/// corrupt group formation. Each failed status poll is treated as
/// "not ready yet", not as an error.
pub async fn initiate(
    transport: &dyn Transport,
    config: &ReplicaGroupConfig,
    poll_interval: Duration,
) -> Result<()> {
    let local = config.self_host();
    tracing::info!(
        "Initiating group {} with {} member(s) via {}",
        config.group_id,
        config.members.len(),
        local
    );

    let command = Command::InitiateGroup {
        config: config.clone(),
    };
    match transport.send(&local, command).await? {
        Reply::Ok => {}
        Reply::Error { message } => {
            return Err(Error::Rejected {
                command: "initiate_group".to_string(),
                reason: message,
            });
        }
        other => {
            return Err(Error::UnexpectedReply {
                command: "initiate_group".to_string(),
                reply: format!("{other:?}"),
            });
        }
    }

    loop {
        match transport.send(&local, Command::GroupStatus).await {
            Ok(Reply::Status { status }) if status.is_ready() => {
                tracing::info!("Group {} is ready ({})", config.group_id, status.state);
                return Ok(());
            }
            Ok(Reply::Status { status }) => {
                tracing::debug!(
                    "Group {} not ready yet (startup_in_progress={}, state={})",
                    config.group_id,
                    status.startup_in_progress,
                    status.state
                );
            }
            Ok(other) => {
                tracing::debug!("Status poll returned unexpected reply: {:?}", other);
            }
            Err(e) => {
                tracing::debug!("Status poll failed, treating as not ready: {}", e);
            }
        }

        tokio::time::sleep(poll_interval).await;
    }
}
