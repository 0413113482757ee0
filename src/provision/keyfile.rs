//! Keyfile Provisioner
//!
//! Ensures the shared-secret authentication file exists with
//! owner-only permissions before the node joins its group. The file is
//! created once and never rotated here. When the data-store
//! configuration already declares its own key-file directive the
//! provisioner stays hands-off.

use std::fs;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;

use crate::error::{Error, Result};

/// What the caller must do after provisioning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyfileOutcome {
    /// The data-store config declares its own key file; nothing written
    ExternallyConfigured,
    /// Key file written; data-store invocations must point at it
    Provisioned,
}

/// Ensure the key file at `dest_path` exists with 0600 permissions.
///
/// No-op when `config_path` already declares a key-file directive.
/// Fatal when `key_value` is absent (authentication cannot be
/// bootstrapped without it) or the destination cannot be written - the
/// latter with effective uid/gid, group list, and directory owner/mode
/// diagnostics, since that is almost always a deployment
/// misconfiguration.
pub fn ensure_keyfile(
    config_path: &Path,
    key_value: Option<&str>,
    dest_path: &Path,
) -> Result<KeyfileOutcome> {
    if config_declares_keyfile(config_path)? {
        tracing::info!(
            "Key file already declared in {:?}, leaving it alone",
            config_path
        );
        return Ok(KeyfileOutcome::ExternallyConfigured);
    }

    let key = key_value
        .filter(|k| !k.is_empty())
        .ok_or_else(|| Error::Config("key value is required to bootstrap authentication".into()))?;

    if let Err(e) = fs::write(dest_path, key) {
        return Err(Error::KeyfileUnwritable {
            path: dest_path.display().to_string(),
            detail: format!("{e}; {}", write_diagnostics(dest_path)),
        });
    }

    fs::set_permissions(dest_path, fs::Permissions::from_mode(0o600))?;
    tracing::info!("Provisioned key file at {:?} (mode 0600)", dest_path);
    Ok(KeyfileOutcome::Provisioned)
}

/// Check the data-store configuration for an explicit key-file
/// directive. A missing config file simply means no directive.
fn config_declares_keyfile(config_path: &Path) -> Result<bool> {
    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    Ok(has_keyfile_directive(&content))
}

fn has_keyfile_directive(content: &str) -> bool {
    content.lines().any(|line| {
        let line = line.trim();
        !line.starts_with('#') && (line.starts_with("keyFile") || line.starts_with("key_file"))
    })
}

/// Describe who we are and who owns the destination, for the error
/// message when the write fails
fn write_diagnostics(dest_path: &Path) -> String {
    let euid = nix::unistd::geteuid();
    let egid = nix::unistd::getegid();
    let groups = nix::unistd::getgroups()
        .map(|gs| {
            gs.iter()
                .map(|g| g.to_string())
                .collect::<Vec<_>>()
                .join(",")
        })
        .unwrap_or_else(|_| "unknown".to_string());

    let dir = dest_path.parent().unwrap_or(Path::new("/"));
    let dir_info = match fs::metadata(dir) {
        Ok(meta) => format!(
            "directory {:?} owned by uid {} gid {} mode {:o}",
            dir,
            meta.uid(),
            meta.gid(),
            meta.mode() & 0o7777
        ),
        Err(e) => format!("directory {dir:?} not inspectable: {e}"),
    };

    format!("running as uid {euid} gid {egid} groups [{groups}]; {dir_info}")
}
