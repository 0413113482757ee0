//! Liveness Prober
//!
//! Bounded polling of a node's control endpoint with a no-op command.
//! An attempt succeeds when the observed reachability matches the
//! requested direction: `Up` means the ping was answered, `Down` means
//! it was not. A process that has not started yet simply reads as a
//! `Down` observation, never as an error.

use std::fmt;
use std::time::Duration;

use crate::error::Result;
use crate::net::{Command, NodeAddress, Transport};
use crate::poll;

/// Desired reachability observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeDirection {
    Up,
    Down,
}

impl fmt::Display for ProbeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeDirection::Up => write!(f, "UP"),
            ProbeDirection::Down => write!(f, "DOWN"),
        }
    }
}

/// Probe `target` until it is observed in the requested direction.
///
/// Returns on the first matching observation; returns `Timeout` after
/// `max_attempts` non-matching observations. Performs no side effects
/// beyond network I/O.
pub async fn probe(
    transport: &dyn Transport,
    direction: ProbeDirection,
    target: &NodeAddress,
    max_attempts: u32,
    interval: Duration,
) -> Result<()> {
    let what = format!("{target} {direction}");

    poll::retry_bounded(&what, max_attempts, interval, move || async move {
        // Any reply at all proves the endpoint is answering; a failed
        // request (refused, timed out) reads as DOWN
        let observed = match transport.send(target, Command::Ping).await {
            Ok(_) => ProbeDirection::Up,
            Err(_) => ProbeDirection::Down,
        };

        (observed == direction).then_some(())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::client::testing::ScriptedTransport;
    use crate::net::Reply;
    use std::net::Ipv4Addr;

    fn target() -> NodeAddress {
        NodeAddress::new(Ipv4Addr::new(10, 0, 0, 5))
    }

    #[tokio::test]
    async fn test_up_succeeds_on_kth_attempt() {
        // Refused twice, then answering: success on attempt 3
        let transport = ScriptedTransport::new(vec![
            Err(ScriptedTransport::refused()),
            Err(ScriptedTransport::refused()),
            Ok(Reply::Ok),
        ]);

        let result = probe(
            &transport,
            ProbeDirection::Up,
            &target(),
            5,
            Duration::from_millis(1),
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(transport.sent(), 3);
    }

    #[tokio::test]
    async fn test_up_times_out_after_exact_attempts() {
        let transport = ScriptedTransport::new(vec![
            Err(ScriptedTransport::refused()),
            Err(ScriptedTransport::refused()),
            Err(ScriptedTransport::refused()),
        ]);

        let result = probe(
            &transport,
            ProbeDirection::Up,
            &target(),
            3,
            Duration::from_millis(1),
        )
        .await;

        assert!(result.unwrap_err().is_timeout());
        assert_eq!(transport.sent(), 3);
    }

    #[tokio::test]
    async fn test_down_matches_unstarted_process() {
        // A process that never started: refused reads as DOWN at once
        let transport = ScriptedTransport::new(vec![Err(ScriptedTransport::refused())]);

        let result = probe(
            &transport,
            ProbeDirection::Down,
            &target(),
            5,
            Duration::from_millis(1),
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(transport.sent(), 1);
    }

    #[tokio::test]
    async fn test_down_waits_for_shutdown() {
        let transport = ScriptedTransport::new(vec![
            Ok(Reply::Ok),
            Ok(Reply::Ok),
            Err(ScriptedTransport::refused()),
        ]);

        let result = probe(
            &transport,
            ProbeDirection::Down,
            &target(),
            5,
            Duration::from_millis(1),
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(transport.sent(), 3);
    }
}
