use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nomen_gateway::{AppState, MessagingClient};
use nomen_ledger::{HttpLedgerClient, LedgerRead, Signer};
use nomen_registrar::Registrar;

mod config;

use config::NodeConfig;

/// Nomen subname provisioning node.
#[derive(Parser, Debug)]
#[command(name = "nomen-node")]
#[command(about = "Provisions subnames under a parent name and serves the gateway API")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = NodeConfig::load(cli.config.as_ref())?;
    let signer = Arc::new(Signer::new(config.signer_key()?));
    info!(
        signer = %signer.address(),
        parent = %config.zone.parent_name,
        rpc = %config.rpc.url,
        "starting nomen node"
    );

    let client = Arc::new(HttpLedgerClient::new(config.rpc.url.clone()));

    // Startup probe: an unreachable endpoint is a configuration error and
    // fails the process now, not per-request later.
    client
        .nonce_of(&signer.address())
        .await
        .context("ledger rpc endpoint unreachable at startup")?;

    let messaging = match &config.messaging.url {
        Some(url) => Some(MessagingClient::new(url.clone())),
        None => {
            warn!("messaging agent url not configured; proxy routes will answer 503");
            None
        }
    };

    let registrar = Arc::new(Registrar::new(
        client.clone(),
        client.clone(),
        signer,
        config.zone.clone(),
        config.receipt_wait(),
    ));

    let state = Arc::new(AppState {
        registrar,
        messaging,
        start_time: Instant::now(),
    });

    nomen_gateway::serve(config.gateway.listen, state).await
}
