//! VMC relay entry point.
//!
//! Receives a VMC (OSC over UDP) motion stream on one port and re-sends every
//! datagram to a list of consumers, dropping rotation updates of tracked bones
//! that changed by no more than the configured threshold.
//!
//! # Usage
//!
//! ```text
//! vmc-relay [OPTIONS]
//!
//! Options:
//!   --config <PATH>          Config file (TOML, or legacy JSON) [default: config.toml]
//!   --listen-port <PORT>     Inbound UDP port
//!   --destination <ADDR>     Consumer host:port, repeatable; replaces the configured list
//!   --threshold <RADIANS>    Rotation change needed to forward a tracked bone
//!   --log-level <LEVEL>      error | warn | info | debug | trace
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable              | Flag            |
//! |-----------------------|-----------------|
//! | `VMC_RELAY_CONFIG`    | `--config`      |
//! | `VMC_RELAY_LISTEN`    | `--listen-port` |
//! | `VMC_RELAY_THRESHOLD` | `--threshold`   |
//!
//! `RUST_LOG`, when set, replaces the configured log level.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load config, apply CLI overrides, validate
//!  └─ open destinations            (connected UDP sockets)
//!  └─ bind listener                (inbound UDP socket)
//!  └─ start_relay                  ("vmc-relay" OS thread)
//!       └─ RelayPipeline::process  classify → filter → fan out
//!  └─ wait for Ctrl-C / SIGTERM, then join the relay thread
//! ```

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vmc_core::{BoneClassifier, RotationFilter};
use vmc_relay::application::fan_out::FanOut;
use vmc_relay::application::relay_datagram::RelayPipeline;
use vmc_relay::infrastructure::network::relay_listener::{start_relay, RelayListener};
use vmc_relay::infrastructure::network::udp_destination::open_destinations;
use vmc_relay::infrastructure::storage::config::{load_config, AppConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// VMC motion-capture relay.
///
/// Fans one VMC stream out to several consumers and suppresses bone
/// rotations that barely changed.
#[derive(Debug, Parser)]
#[command(
    name = "vmc-relay",
    about = "Relays VMC motion data to several consumers, filtering redundant bone rotations",
    version
)]
struct Cli {
    /// Configuration file.  A `.json` path is read in the legacy flat format.
    #[arg(long, default_value = "config.toml", env = "VMC_RELAY_CONFIG")]
    config: PathBuf,

    /// Inbound UDP port.  Overrides `relay.listen_port`.
    #[arg(long, env = "VMC_RELAY_LISTEN")]
    listen_port: Option<u16>,

    /// Destination `host:port`.  Repeat for several; replaces `relay.destinations`.
    #[arg(long = "destination")]
    destinations: Vec<String>,

    /// Rotation threshold in radians.  Overrides `filter.threshold`.
    #[arg(long, env = "VMC_RELAY_THRESHOLD")]
    threshold: Option<f32>,

    /// Log level.  Overrides `logging.log_level`.
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Applies the command-line overrides on top of `config`.
    fn apply_overrides(self, mut config: AppConfig) -> AppConfig {
        if let Some(port) = self.listen_port {
            config.relay.listen_port = port;
        }
        if !self.destinations.is_empty() {
            config.relay.destinations = self.destinations;
        }
        if let Some(threshold) = self.threshold {
            config.filter.threshold = threshold;
        }
        if let Some(level) = self.log_level {
            config.logging.log_level = level;
        }
        config
    }

    /// Loads the config file, applies overrides and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the final
    /// configuration is invalid.
    fn resolve_config(self) -> anyhow::Result<AppConfig> {
        let config = load_config(&self.config)
            .with_context(|| format!("failed to load config from {}", self.config.display()))?;
        let config = self.apply_overrides(config);
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().resolve_config()?;

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.log_level)),
        )
        .init();

    info!(
        listen_port = config.relay.listen_port,
        destinations = ?config.relay.destinations,
        threshold = config.filter.threshold,
        tracked_bones = ?config.filter.tracked_bones,
        "VMC relay starting"
    );

    // ── Pipeline ──────────────────────────────────────────────────────────────
    let sinks = open_destinations(&config.relay.destinations)
        .context("failed to open destinations")?;
    let pipeline = RelayPipeline::new(
        BoneClassifier::new(config.filter.tracked_bones.iter().cloned()),
        RotationFilter::new(config.filter.threshold),
        FanOut::new(sinks),
    );

    // ── Inbound socket and relay thread ───────────────────────────────────────
    let listen_addr = config.listen_addr()?;
    let listener = RelayListener::bind(listen_addr, config.listener_settings())
        .context("failed to start listener")?;

    // Shutdown flag checked by the relay thread between datagrams.
    let running = Arc::new(AtomicBool::new(true));
    let handle = start_relay(listener, pipeline, Arc::clone(&running))?;

    // ── Ctrl-C / SIGTERM handler ──────────────────────────────────────────────
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(()) => {
                info!("shutdown signal received");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for shutdown signal: {e}"),
        }
    });

    info!("VMC relay ready.  Press Ctrl-C to exit.");

    let stats = tokio::task::spawn_blocking(move || handle.join())
        .await
        .context("failed to join relay thread")?
        .map_err(|_| anyhow::anyhow!("relay thread panicked"))?
        .context("relay stopped with an error")?;

    info!(stats = %stats, "VMC relay stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or on SIGTERM where available.
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result,
            _ = terminate.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
