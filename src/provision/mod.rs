//! Provisioning
//!
//! One-shot, per-node-lifecycle provisioning of authentication
//! material: administrative and application credentials against the
//! local data store, and the shared-secret key file on disk.

pub mod credentials;
pub mod keyfile;

pub use credentials::CredentialProvisioner;
pub use keyfile::{ensure_keyfile, KeyfileOutcome};
