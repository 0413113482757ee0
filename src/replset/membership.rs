//! Membership Mutator
//!
//! Add/remove operations that change this node's membership in an
//! already-existing group, driven against whichever discovered peer
//! currently answers as the group's control point.
//!
//! Known race: nothing serializes concurrent initiate/join/leave
//! across nodes. Admission of conflicting configuration changes is
//! delegated entirely to the data store; this module applies no
//! locking of its own.

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::net::{discovery, Command, NodeAddress, Reply, Transport};

use super::GroupSeed;

/// Outcome of a join request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The group acknowledged the add
    Joined,
    /// Discovery found no peers; there is no group to join yet
    NoGroupFound,
}

/// Outcome of a leave request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The group acknowledged the removal
    Left,
    /// Discovery found no peers; there is no group to leave
    NoGroupFound,
    /// The departure announcement failed; shutdown proceeds anyway
    Unacknowledged,
}

/// Membership operations against an existing group
pub struct Membership<'a> {
    transport: &'a dyn Transport,
    settings: &'a Settings,
}

impl<'a> Membership<'a> {
    pub fn new(transport: &'a dyn Transport, settings: &'a Settings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Add this node to the group.
    ///
    /// An unlocatable group is a typed no-op, not an error, so startup
    /// can proceed on the first node. A rejected or undeliverable add
    /// is a hard error: an unacknowledged join must never pass as
    /// success.
    pub async fn join(&self, self_addr: &NodeAddress) -> Result<JoinOutcome> {
        let Some(seed) = self.locate_group().await else {
            tracing::info!("No peers discovered, nothing to join");
            return Ok(JoinOutcome::NoGroupFound);
        };

        let command = Command::AddMember {
            group_id: seed.group_id.clone(),
            host: *self_addr,
            username: self.settings.admin_username.clone(),
            password: self.admin_password()?,
        };

        self.mutate(&seed, command).await?;
        tracing::info!("Joined group {} as {}", seed.group_id, self_addr);
        Ok(JoinOutcome::Joined)
    }

    /// Remove this node from the group, best-effort.
    ///
    /// A node that cannot reach any peer to announce its own departure
    /// must not block shutdown, so mutation failures are reported as a
    /// typed `Unacknowledged` outcome rather than an error.
    pub async fn leave(&self, self_addr: &NodeAddress) -> Result<LeaveOutcome> {
        let Some(seed) = self.locate_group().await else {
            tracing::info!("No peers discovered, nothing to leave");
            return Ok(LeaveOutcome::NoGroupFound);
        };

        let command = Command::RemoveMember {
            group_id: seed.group_id.clone(),
            host: *self_addr,
            username: self.settings.admin_username.clone(),
            password: self.admin_password()?,
        };

        match self.mutate(&seed, command).await {
            Ok(()) => {
                tracing::info!("Left group {}", seed.group_id);
                Ok(LeaveOutcome::Left)
            }
            Err(e) => {
                tracing::warn!("Departure from {} not acknowledged: {}", seed.group_id, e);
                Ok(LeaveOutcome::Unacknowledged)
            }
        }
    }

    /// Discover the group's current control point
    async fn locate_group(&self) -> Option<GroupSeed> {
        let peers = discovery::discover_peers(&self.settings.service_name).await;
        if peers.is_empty() {
            return None;
        }

        let seed = GroupSeed::new(self.settings.group_id.clone(), peers);
        tracing::debug!("Located group at {}", seed);
        Some(seed)
    }

    /// Issue a mutation against the first seed host that answers.
    ///
    /// An explicit refusal from an answering host ends the attempt; an
    /// unreachable host just means the next one is tried.
    async fn mutate(&self, seed: &GroupSeed, command: Command) -> Result<()> {
        let name = command.name();
        let mut last_err = None;

        for host in &seed.hosts {
            match self.transport.send(host, command.clone()).await {
                Ok(Reply::Ok) => return Ok(()),
                Ok(Reply::Error { message }) => {
                    return Err(Error::Rejected {
                        command: name.to_string(),
                        reason: message,
                    });
                }
                Ok(other) => {
                    return Err(Error::UnexpectedReply {
                        command: name.to_string(),
                        reply: format!("{other:?}"),
                    });
                }
                Err(e) => {
                    tracing::debug!("{} unreachable for {}: {}", host, name, e);
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Network("no reachable control point".to_string())))
    }

    fn admin_password(&self) -> Result<String> {
        self.settings
            .admin_password
            .clone()
            .ok_or_else(|| Error::Config("admin password is required for membership changes".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::client::testing::ScriptedTransport;
    use std::net::Ipv4Addr;

    fn settings(service: &str) -> Settings {
        let mut settings = Settings::from_vars(|_| None);
        settings.service_name = service.to_string();
        settings.admin_password = Some("secret".to_string());
        settings
    }

    fn self_addr() -> NodeAddress {
        NodeAddress::new(Ipv4Addr::new(10, 0, 0, 5))
    }

    #[tokio::test]
    async fn test_join_with_no_peers_is_typed_noop() {
        let transport = ScriptedTransport::new(vec![]);
        let settings = settings("no-such-service.invalid");
        let membership = Membership::new(&transport, &settings);

        let outcome = membership.join(&self_addr()).await.unwrap();

        assert_eq!(outcome, JoinOutcome::NoGroupFound);
        // No network mutation attempted
        assert_eq!(transport.sent(), 0);
    }

    #[tokio::test]
    async fn test_leave_with_no_peers_is_typed_noop() {
        let transport = ScriptedTransport::new(vec![]);
        let settings = settings("no-such-service.invalid");
        let membership = Membership::new(&transport, &settings);

        let outcome = membership.leave(&self_addr()).await.unwrap();

        assert_eq!(outcome, LeaveOutcome::NoGroupFound);
        assert_eq!(transport.sent(), 0);
    }

    #[tokio::test]
    async fn test_join_acknowledged() {
        // "localhost" resolves, so the seed has at least one host
        let transport = ScriptedTransport::new(vec![Ok(Reply::Ok)]);
        let settings = settings("localhost");
        let membership = Membership::new(&transport, &settings);

        let outcome = membership.join(&self_addr()).await.unwrap();

        assert_eq!(outcome, JoinOutcome::Joined);
        let log = transport.log.lock().unwrap();
        assert!(matches!(log[0].1, Command::AddMember { .. }));
    }

    #[tokio::test]
    async fn test_join_rejection_is_hard_error() {
        let transport = ScriptedTransport::new(vec![Ok(Reply::Error {
            message: "host already a member".to_string(),
        })]);
        let settings = settings("localhost");
        let membership = Membership::new(&transport, &settings);

        let result = membership.join(&self_addr()).await;
        assert!(result.unwrap_err().is_rejection());
    }

    #[tokio::test]
    async fn test_leave_failure_is_suppressed() {
        let transport = ScriptedTransport::new(vec![Err(ScriptedTransport::refused())]);
        let settings = settings("localhost");
        let membership = Membership::new(&transport, &settings);

        let outcome = membership.leave(&self_addr()).await.unwrap();
        assert_eq!(outcome, LeaveOutcome::Unacknowledged);
    }

    #[tokio::test]
    async fn test_join_without_admin_password_is_config_error() {
        let transport = ScriptedTransport::new(vec![]);
        let mut settings = settings("localhost");
        settings.admin_password = None;
        let membership = Membership::new(&transport, &settings);

        let result = membership.join(&self_addr()).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
