//! Replwarden - Replica Set Bootstrap & Membership Controller
//!
//! Sidecar entrypoint that bootstraps this node into its replica
//! group: resolves the node's own address, waits for the local data
//! store, provisions the key file, then initiates a new group or joins
//! the existing one.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use replwarden::config::Settings;
use replwarden::error::Result;
use replwarden::net::{discovery, Command, ControlClient, NodeAddress, Reply, Transport};
use replwarden::node::SelfAddressCache;
use replwarden::probe::{self, ProbeDirection};
use replwarden::provision::{ensure_keyfile, CredentialProvisioner, KeyfileOutcome};
use replwarden::replset::{build_config, initiate, JoinOutcome, LeaveOutcome, Membership};

/// Replwarden - Replica Set Bootstrap & Membership Controller
#[derive(Parser)]
#[command(name = "replwarden")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML settings file (default: read the environment)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bootstrap this node: provision, then initiate or join the group
    Start {
        /// Force group origination even when peers are discovered
        #[arg(long)]
        originate: bool,
    },

    /// Announce this node's departure from the group (best-effort)
    Leave,

    /// Query a node's group status
    Status {
        /// Node address to query (ip or ip:port)
        #[arg(short, long, default_value = "127.0.0.1")]
        address: String,
    },

    /// Reset configured admin/application passwords (no-op when unset)
    ResetCredentials,

    /// Initialize a new settings file
    Init {
        /// Output path for the settings file
        #[arg(short, long, default_value = "replwarden.toml")]
        output: PathBuf,
    },

    /// Validate settings
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load settings: {e}");
            return Err(e);
        }
    };

    // Quiet toggle drops the default level; an explicit --log-level wins
    let level = if settings.features.quiet && cli.log_level == "info" {
        "warn"
    } else {
        &cli.log_level
    };
    init_logging(level);

    match cli.command {
        Commands::Start { originate } => run_start(&settings, originate).await,
        Commands::Leave => run_leave(&settings).await,
        Commands::Status { address } => run_status(address).await,
        Commands::ResetCredentials => run_reset_credentials(&settings).await,
        Commands::Init { output } => run_init(output),
        Commands::Validate => run_validate(&settings),
    }
}

/// Initialize logging
fn init_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Load settings from the given file, or from the environment
fn load_settings(path: Option<&std::path::Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::from_file(path),
        None => Settings::from_env(),
    }
}

/// Bootstrap this node into its replica group
async fn run_start(settings: &Settings, originate: bool) -> Result<()> {
    tracing::info!("Starting replwarden for group {}", settings.group_id);

    // Everything downstream depends on knowing who we are
    let cache = SelfAddressCache::new(&settings.address_cache);
    let self_addr = match cache
        .resolve(settings.poll_attempts, settings.poll_interval())
        .await
    {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("Could not resolve this node's address: {}", e);
            return Err(e);
        }
    };
    tracing::info!("This node is {}", self_addr);

    // ... and on the local data store accepting commands
    let client = ControlClient::default();
    if let Err(e) = probe::probe(
        &client,
        ProbeDirection::Up,
        &self_addr,
        settings.poll_attempts,
        settings.poll_interval(),
    )
    .await
    {
        tracing::error!("Local data store never came up: {}", e);
        return Err(e);
    }

    // Authentication material, once per node lifecycle
    let outcome = ensure_keyfile(
        &settings.datastore_conf,
        settings.key_value.as_deref(),
        &settings.keyfile_path,
    )?;
    let keyfile = match outcome {
        KeyfileOutcome::Provisioned => Some(settings.keyfile_path.as_path()),
        KeyfileOutcome::ExternallyConfigured => None,
    };
    tracing::info!(
        "Data-store launch arguments: {}",
        settings.datastore_args(keyfile).join(" ")
    );

    let peers = discovery::discover_peers(&settings.service_name).await;
    let others: Vec<NodeAddress> = peers.iter().filter(|p| **p != self_addr).copied().collect();

    if originate || others.is_empty() {
        // Brand-new group: this node originates it. Nothing here
        // serializes two nodes both deciding to originate; the data
        // store rejects the loser and that rejection is fatal.
        let config = build_config(&settings.group_id, self_addr, &peers);
        initiate(&client, &config, settings.poll_interval()).await?;

        provision_first_boot_credentials(settings, &client, self_addr).await?;
    } else {
        tracing::info!("Found existing group ({} peer(s)), joining", others.len());
        let membership = Membership::new(&client, settings);
        match membership.join(&self_addr).await? {
            JoinOutcome::Joined => {}
            JoinOutcome::NoGroupFound => {
                tracing::warn!("Group vanished between discovery and join, continuing");
            }
        }
    }

    tracing::info!("Bootstrap complete");
    Ok(())
}

/// Create the admin and application users on the freshly formed group
async fn provision_first_boot_credentials(
    settings: &Settings,
    client: &dyn Transport,
    self_addr: NodeAddress,
) -> Result<()> {
    let provisioner = CredentialProvisioner::new(client, self_addr);

    if let Some(password) = settings.admin_password.as_deref() {
        provisioner
            .create_admin(&settings.admin_username, password)
            .await?;
    } else {
        tracing::info!("No admin password configured, skipping admin creation");
    }

    if let (Some(username), Some(password), Some(database)) = (
        settings.app_username.as_deref(),
        settings.app_password.as_deref(),
        settings.app_database.as_deref(),
    ) {
        provisioner.create_user(username, password, database).await?;
    }

    Ok(())
}

/// Announce this node's departure, best-effort
async fn run_leave(settings: &Settings) -> Result<()> {
    let cache = SelfAddressCache::new(&settings.address_cache);
    let self_addr = cache
        .resolve(settings.poll_attempts, settings.poll_interval())
        .await?;

    let client = ControlClient::default();
    let membership = Membership::new(&client, settings);

    match membership.leave(&self_addr).await? {
        LeaveOutcome::Left => tracing::info!("Departure acknowledged"),
        LeaveOutcome::NoGroupFound => tracing::info!("No group located, nothing to announce"),
        LeaveOutcome::Unacknowledged => {
            tracing::warn!("Departure not acknowledged, shutting down anyway")
        }
    }

    Ok(())
}

/// Query and print a node's group status
async fn run_status(address: String) -> Result<()> {
    let target: NodeAddress = address.parse()?;
    let client = ControlClient::default();

    match client.send(&target, Command::GroupStatus).await? {
        Reply::Status { status } => {
            println!("Node:     {target}");
            println!("State:    {}", status.state);
            println!("Starting: {}", status.startup_in_progress);
            println!("Ready:    {}", status.is_ready());
            Ok(())
        }
        Reply::Error { message } => {
            eprintln!("Status query refused: {message}");
            Err(replwarden::Error::Rejected {
                command: "group_status".to_string(),
                reason: message,
            })
        }
        other => Err(replwarden::Error::UnexpectedReply {
            command: "group_status".to_string(),
            reply: format!("{other:?}"),
        }),
    }
}

/// Reset configured passwords against the local node
async fn run_reset_credentials(settings: &Settings) -> Result<()> {
    let cache = SelfAddressCache::new(&settings.address_cache);
    let self_addr = cache
        .resolve(settings.poll_attempts, settings.poll_interval())
        .await?;

    let client = ControlClient::default();
    probe::probe(
        &client,
        ProbeDirection::Up,
        &self_addr,
        settings.poll_attempts,
        settings.poll_interval(),
    )
    .await?;

    let provisioner = CredentialProvisioner::new(&client, self_addr);
    provisioner
        .reset_admin_password(&settings.admin_username, settings.admin_password.as_deref())
        .await?;
    provisioner
        .reset_user_password(
            settings.app_username.as_deref(),
            settings.app_password.as_deref(),
            settings.app_database.as_deref(),
        )
        .await?;

    Ok(())
}

/// Initialize a settings file
fn run_init(output: PathBuf) -> Result<()> {
    let content = r#"# Replwarden Settings
# Generated settings file

group_id = "rs0"
service_name = "replwarden"

admin_username = "admin"
# admin_password = "changeme"

# app_username = "app"
# app_password = "changeme"
# app_database = "appdb"

# key_value = "shared-secret"
keyfile_path = "/data/db/replwarden.key"
datastore_conf = "/etc/datastore.conf"
address_cache = "/data/db/self-address"

poll_attempts = 90
poll_interval_secs = 1

[features]
prealloc = false
small_files = false
quiet = false
text_search = false
"#;

    std::fs::write(&output, content)?;
    println!("Settings file created: {}", output.display());
    println!("\nEdit the file, then start with: replwarden start --config {}", output.display());

    Ok(())
}

/// Validate settings
fn run_validate(settings: &Settings) -> Result<()> {
    match settings.validate() {
        Ok(()) => {
            println!("Settings are valid");
            println!("  Group:      {}", settings.group_id);
            println!("  Service:    {}", settings.service_name);
            println!("  Admin user: {}", settings.admin_username);
            println!(
                "  Admin password: {}",
                if settings.admin_password.is_some() { "set" } else { "(unset)" }
            );
            println!(
                "  Key value:  {}",
                if settings.key_value.is_some() { "set" } else { "(unset)" }
            );
            println!("  Key file:   {}", settings.keyfile_path.display());
            println!("  Poll:       {} x {}s", settings.poll_attempts, settings.poll_interval_secs);
            Ok(())
        }
        Err(e) => {
            eprintln!("Settings error: {e}");
            Err(e)
        }
    }
}
