//! Credential Provisioner
//!
//! Creates and resets administrative and application-level users
//! against the local node. Creation is strictly one-shot: a duplicate
//! user rejected by the data store propagates as a hard error rather
//! than being treated as idempotent success. Resets are feature-gated:
//! absent fields mean "not configured" and the call is a silent no-op.

use crate::error::{Error, Result};
use crate::net::{Command, CredentialScope, Credentials, NodeAddress, Reply, Transport};

/// Credential operations against the local node
pub struct CredentialProvisioner<'a> {
    transport: &'a dyn Transport,
    local: NodeAddress,
}

impl<'a> CredentialProvisioner<'a> {
    pub fn new(transport: &'a dyn Transport, local: NodeAddress) -> Self {
        Self { transport, local }
    }

    /// Create the administrator account. Expected to run exactly once
    /// at first boot; a rejection (e.g. duplicate user) is fatal.
    pub async fn create_admin(&self, username: &str, password: &str) -> Result<()> {
        require("admin username", username)?;
        require("admin password", password)?;

        self.create(Credentials {
            username: username.to_string(),
            password: password.to_string(),
            scope: CredentialScope::Admin,
            database: None,
        })
        .await
    }

    /// Create an application-level user scoped to `database`
    pub async fn create_user(&self, username: &str, password: &str, database: &str) -> Result<()> {
        require("username", username)?;
        require("password", password)?;
        require("database name", database)?;

        self.create(Credentials {
            username: username.to_string(),
            password: password.to_string(),
            scope: CredentialScope::Database,
            database: Some(database.to_string()),
        })
        .await
    }

    /// Reset the administrator password. No-op when not configured.
    pub async fn reset_admin_password(&self, username: &str, password: Option<&str>) -> Result<()> {
        let Some(password) = password.filter(|p| !p.is_empty()) else {
            tracing::debug!("Admin password reset not configured, skipping");
            return Ok(());
        };

        self.set_password(Credentials {
            username: username.to_string(),
            password: password.to_string(),
            scope: CredentialScope::Admin,
            database: None,
        })
        .await
    }

    /// Reset an application user's password. No-op when any required
    /// field is not configured.
    pub async fn reset_user_password(
        &self,
        username: Option<&str>,
        password: Option<&str>,
        database: Option<&str>,
    ) -> Result<()> {
        let (Some(username), Some(password), Some(database)) = (
            username.filter(|v| !v.is_empty()),
            password.filter(|v| !v.is_empty()),
            database.filter(|v| !v.is_empty()),
        ) else {
            tracing::debug!("User password reset not configured, skipping");
            return Ok(());
        };

        self.set_password(Credentials {
            username: username.to_string(),
            password: password.to_string(),
            scope: CredentialScope::Database,
            database: Some(database.to_string()),
        })
        .await
    }

    async fn create(&self, credentials: Credentials) -> Result<()> {
        let username = credentials.username.clone();
        let command = Command::CreateUser { credentials };

        match self.transport.send(&self.local, command).await? {
            Reply::Ok => {
                tracing::info!("Created user {}", username);
                Ok(())
            }
            Reply::Error { message } => Err(Error::Rejected {
                command: "create_user".to_string(),
                reason: message,
            }),
            other => Err(Error::UnexpectedReply {
                command: "create_user".to_string(),
                reply: format!("{other:?}"),
            }),
        }
    }

    async fn set_password(&self, credentials: Credentials) -> Result<()> {
        let username = credentials.username.clone();
        let command = Command::SetPassword { credentials };

        // A refused reset is logged and swallowed: the account may
        // simply not exist on this node yet
        match self.transport.send(&self.local, command).await? {
            Reply::Ok => {
                tracing::info!("Reset password for {}", username);
            }
            Reply::Error { message } => {
                tracing::warn!("Password reset for {} refused: {}", username, message);
            }
            other => {
                tracing::warn!("Unexpected reply to password reset: {:?}", other);
            }
        }
        Ok(())
    }
}

/// Fail fast on a missing required field - a user-visible
/// configuration error, before anything is partially created
fn require(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::Config(format!("{what} must not be empty")));
    }
    Ok(())
}
