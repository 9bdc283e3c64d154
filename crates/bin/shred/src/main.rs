//! shred - terminal custodial wallet for hedera

use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{Context, Result};
use shred::config::Config;
use shred::core::{IdleGuard, SessionMachine};
use shred::shell::tui::{renderer::Renderer, EffectExecutor, TuiShell};
use shred_ledger::HederaGateway;
use shred_vault::{SecureVault, WalletRegistry};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("shred: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = Config::load()?;
    let registry = WalletRegistry::new(config.wallet_dir()?);
    registry.ensure_dir()?;
    init_tracing(&config)?;
    info!(network = %config.network, dir = %registry.dir().display(), "starting shred");

    let gateway = HederaGateway::new(config.network, config.mirror_url(), config.relay_url())
        .context("building network client")?;

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let executor = EffectExecutor::new(Arc::new(gateway), registry.clone(), event_tx);
    let machine = SessionMachine::new(
        SecureVault::new(),
        registry,
        IdleGuard::new(config.idle_timeout(), Instant::now()),
        config.settings(),
    );

    let mut shell = TuiShell::new(
        machine,
        executor,
        event_rx,
        Renderer::new(config.network.to_string()),
        config.tick(),
    )?;
    shell.run().await
}

/// The terminal belongs to the tui, so logs go to a file
fn init_tracing(config: &Config) -> Result<()> {
    let path = config.log_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shred=info,shred_vault=info,shred_ledger=info".into()),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
