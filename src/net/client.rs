//! Control Client
//!
//! TCP client for issuing commands against a node's control endpoint.
//! One command per connection, newline-delimited JSON framing.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::{Framed, LinesCodec};

use super::{Command, NodeAddress, Reply};
use crate::error::{Error, Result};

/// Transport seam for issuing commands
///
/// The controller components talk to this trait so tests can script
/// replies without a live endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a command and wait for the reply
    async fn send(&self, target: &NodeAddress, command: Command) -> Result<Reply>;
}

/// TCP client for control endpoints
pub struct ControlClient {
    /// Connection timeout
    connect_timeout: Duration,
    /// Request timeout (covers connect + round trip)
    request_timeout: Duration,
}

impl ControlClient {
    /// Create a new control client
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            request_timeout,
        }
    }

    async fn send_inner(&self, target: &NodeAddress, command: Command) -> Result<Reply> {
        let stream = self.connect(target).await?;
        let mut framed = Framed::new(stream, LinesCodec::new());

        let line = serde_json::to_string(&command)?;
        framed
            .send(line)
            .await
            .map_err(|e| Error::Network(format!("send to {target} failed: {e}")))?;

        match framed.next().await {
            Some(Ok(line)) => Ok(serde_json::from_str(&line)?),
            Some(Err(e)) => Err(Error::Network(format!("read from {target} failed: {e}"))),
            None => Err(Error::Network(format!("{target} closed the connection"))),
        }
    }

    /// Connect to a control endpoint
    async fn connect(&self, target: &NodeAddress) -> Result<TcpStream> {
        let result = timeout(self.connect_timeout, TcpStream::connect(target.socket_addr())).await;

        match result {
            Ok(Ok(stream)) => {
                stream.set_nodelay(true)?;
                Ok(stream)
            }
            Ok(Err(e)) => Err(Error::ConnectionFailed {
                address: target.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(Error::ConnectionTimeout(target.to_string())),
        }
    }
}

impl Default for ControlClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(10))
    }
}

#[async_trait]
impl Transport for ControlClient {
    async fn send(&self, target: &NodeAddress, command: Command) -> Result<Reply> {
        let result = timeout(self.request_timeout, self.send_inner(target, command)).await;

        match result {
            Ok(inner) => inner,
            Err(_) => Err(Error::ConnectionTimeout(target.to_string())),
        }
    }
}

/// Scripted transport for exercising controller components without a
/// live endpoint. Replies are consumed in order; the log records every
/// command sent.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    pub struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<Reply>>>,
        pub log: Mutex<Vec<(NodeAddress, Command)>>,
    }

    impl ScriptedTransport {
        pub fn new(replies: Vec<Result<Reply>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                log: Mutex::new(Vec::new()),
            }
        }

        /// Number of commands sent so far
        pub fn sent(&self) -> usize {
            self.log.lock().unwrap().len()
        }

        /// Shorthand for a connection-refused observation
        pub fn refused() -> Error {
            Error::ConnectionFailed {
                address: "test".to_string(),
                reason: "connection refused".to_string(),
            }
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, target: &NodeAddress, command: Command) -> Result<Reply> {
            self.log.lock().unwrap().push((*target, command));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Network("transport script exhausted".to_string())))
        }
    }
}
