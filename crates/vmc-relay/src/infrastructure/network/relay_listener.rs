//! Inbound UDP listener and the relay receive loop.
//!
//! The relay binds one UDP socket on the listen port and processes datagrams
//! one at a time on a dedicated OS thread.  Each datagram goes through the
//! [`RelayPipeline`] before the next one is read, so the filter state never
//! needs a lock.
//!
//! # Read timeout
//!
//! The socket is configured with a read timeout (1 second by default).  The
//! `recv_from` call blocks for at most that long before returning a timeout
//! error.  On each timeout we check the `running` flag; if the application
//! is shutting down we exit the loop cleanly.  The same wake-up drives the
//! idle warning and the periodic statistics log.

use std::net::{SocketAddr, UdpSocket};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, info, warn};
use vmc_core::ProtocolError;

use crate::application::relay_datagram::{DatagramOutcome, RelayPipeline, RelayStats};

/// Name of the thread running the receive loop.
pub const RELAY_THREAD_NAME: &str = "vmc-relay";

/// Error type for the inbound side of the relay.  All variants are fatal.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The UDP socket could not be bound or configured.
    #[error("failed to bind relay socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// An unrecoverable I/O error occurred while receiving.
    #[error("recv error: {0}")]
    Recv(#[source] std::io::Error),
    /// The relay thread could not be started.
    #[error("failed to spawn relay thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Timing and buffer settings for the receive loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerSettings {
    /// Receive buffer size; longer datagrams are truncated by the OS.
    pub max_datagram_size: usize,
    /// Upper bound on one blocking receive.
    pub read_timeout: Duration,
    /// Silence after which one warning is logged.
    pub idle_warning: Duration,
    /// Period of the statistics log.  `None` disables it.
    pub stats_interval: Option<Duration>,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            max_datagram_size: 1536,
            read_timeout: Duration::from_millis(1000),
            idle_warning: Duration::from_secs(5),
            stats_interval: Some(Duration::from_secs(30)),
        }
    }
}

/// The bound inbound socket.
#[derive(Debug)]
pub struct RelayListener {
    socket: UdpSocket,
    settings: ListenerSettings,
}

impl RelayListener {
    /// Binds `addr` and applies the read timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Bind`] if the socket cannot be bound or
    /// configured.
    pub fn bind(addr: SocketAddr, settings: ListenerSettings) -> Result<Self, RelayError> {
        let socket = UdpSocket::bind(addr).map_err(|source| RelayError::Bind { addr, source })?;
        socket
            .set_read_timeout(Some(settings.read_timeout))
            .map_err(|source| RelayError::Bind { addr, source })?;
        Ok(Self { socket, settings })
    }

    /// The address actually bound (useful when binding port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Runs the receive loop on the calling thread until `running` is cleared
    /// or a fatal receive error occurs.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Recv`] for receive errors other than timeouts,
    /// interruptions and ICMP feedback from earlier sends.
    pub fn run(
        self,
        mut pipeline: RelayPipeline,
        running: Arc<AtomicBool>,
    ) -> Result<RelayStats, RelayError> {
        let mut buf = vec![0u8; self.settings.max_datagram_size];
        let mut last_data = Instant::now();
        let mut idle_warned = false;
        let mut last_stats = Instant::now();

        if let Ok(addr) = self.socket.local_addr() {
            info!(
                %addr,
                destinations = pipeline.destination_count(),
                "relay listening"
            );
        }

        while running.load(Ordering::Relaxed) {
            match self.socket.recv_from(&mut buf) {
                Ok((len, src)) => {
                    last_data = Instant::now();
                    idle_warned = false;
                    let outcome = pipeline.process(&buf[..len]);
                    log_outcome(&outcome, src);
                }
                Err(e) if is_timeout_error(&e) => {}
                Err(e) if is_peer_feedback(&e) => {
                    debug!(error = %e, "ignoring ICMP feedback on relay socket");
                }
                Err(e) => {
                    error!(error = %e, "relay socket failed");
                    return Err(RelayError::Recv(e));
                }
            }

            if !idle_warned && last_data.elapsed() >= self.settings.idle_warning {
                warn!("no data received, is the sender connected?");
                idle_warned = true;
            }

            if let Some(interval) = self.settings.stats_interval {
                if last_stats.elapsed() >= interval {
                    info!(stats = %pipeline.stats(), "relay statistics");
                    last_stats = Instant::now();
                }
            }
        }

        let stats = pipeline.stats();
        info!(stats = %stats, "relay stopped");
        Ok(stats)
    }
}

/// Spawns [`RelayListener::run`] on a named OS thread.
///
/// # Errors
///
/// Returns [`RelayError::Spawn`] if the thread cannot be created.
pub fn start_relay(
    listener: RelayListener,
    pipeline: RelayPipeline,
    running: Arc<AtomicBool>,
) -> Result<JoinHandle<Result<RelayStats, RelayError>>, RelayError> {
    std::thread::Builder::new()
        .name(RELAY_THREAD_NAME.to_string())
        .spawn(move || listener.run(pipeline, running))
        .map_err(RelayError::Spawn)
}

fn log_outcome(outcome: &DatagramOutcome, src: SocketAddr) {
    match outcome {
        DatagramOutcome::Rejected(ProtocolError::BundleNotSupported) => {
            warn!(%src, "dropping OSC bundle, bundles are not supported");
        }
        DatagramOutcome::Rejected(e) => {
            warn!(%src, error = %e, "dropping undecodable datagram");
        }
        DatagramOutcome::Suppressed { bone, reason } => {
            debug!(%src, bone = %bone, ?reason, "bone update suppressed");
        }
        DatagramOutcome::PassedThrough(_) | DatagramOutcome::Forwarded { .. } => {}
    }
}

/// Returns `true` for OS timeout / would-block errors that should be retried.
fn is_timeout_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock
            | std::io::ErrorKind::TimedOut
            | std::io::ErrorKind::Interrupted
    )
}

/// ICMP errors for an earlier send surface on the next receive on some
/// platforms.  They say nothing about the inbound stream.
fn is_peer_feedback(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::ConnectionRefused
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
