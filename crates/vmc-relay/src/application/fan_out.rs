//! Fan-out of one datagram to every configured destination.
//!
//! Destinations are reached through the [`DatagramSink`] trait so the relay
//! pipeline never touches sockets directly.  The production implementation is
//! [`crate::infrastructure::network::udp_destination::UdpDestination`]; tests
//! use the generated `MockDatagramSink`.
//!
//! A failing destination never prevents delivery to the others.

use thiserror::Error;
use tracing::warn;

/// A write-only datagram endpoint.
#[cfg_attr(test, mockall::automock)]
pub trait DatagramSink: Send {
    /// Sends `bytes` as one datagram.  Returns the number of bytes written.
    fn send(&self, bytes: &[u8]) -> std::io::Result<usize>;

    /// Human-readable peer description used in logs and error reports.
    fn describe(&self) -> String;
}

/// A write to one destination failed.
#[derive(Debug, Error)]
#[error("failed to forward datagram to {destination}: {source}")]
pub struct DestinationWriteError {
    pub destination: String,
    #[source]
    pub source: std::io::Error,
}

/// Outcome of forwarding one datagram.
#[derive(Debug, Default)]
pub struct ForwardReport {
    /// Destinations written successfully.
    pub delivered: usize,
    /// One entry per destination that failed, in destination order.
    pub failures: Vec<DestinationWriteError>,
}

impl ForwardReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Ordered, fixed set of destinations.
pub struct FanOut {
    sinks: Vec<Box<dyn DatagramSink>>,
}

impl FanOut {
    pub fn new(sinks: Vec<Box<dyn DatagramSink>>) -> Self {
        Self { sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Writes `bytes` to every destination in order.
    pub fn forward(&self, bytes: &[u8]) -> ForwardReport {
        let mut report = ForwardReport::default();
        for sink in &self.sinks {
            match sink.send(bytes) {
                Ok(_) => report.delivered += 1,
                Err(source) => {
                    let destination = sink.describe();
                    warn!(%destination, error = %source, "destination write failed");
                    report.failures.push(DestinationWriteError {
                        destination,
                        source,
                    });
                }
            }
        }
        report
    }
}

impl std::fmt::Debug for FanOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.sinks.iter().map(|s| s.describe()))
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
