//! RelayPipeline: the per-datagram decision path.
//!
//! For every inbound datagram the pipeline
//!
//! 1. classifies it ([`BoneClassifier`]),
//! 2. runs tracked bone updates through the [`RotationFilter`],
//! 3. hands everything that survives to the [`FanOut`] unmodified.
//!
//! The pipeline owns the [`FilterState`] and the run counters.  It performs no
//! socket I/O itself; destinations are injected as [`DatagramSink`]s, so the
//! whole path is unit-testable with mocks.
//!
//! [`DatagramSink`]: crate::application::fan_out::DatagramSink

use std::fmt;

use vmc_core::{
    BoneClassifier, Classification, FilterDecision, FilterState, ProtocolError, RotationDelta,
    RotationFilter, SuppressReason,
};

use crate::application::fan_out::{FanOut, ForwardReport};

/// Counters accumulated over one relay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub received: u64,
    /// Non-candidate datagrams forwarded as-is.
    pub passed_through: u64,
    /// Candidate datagrams forwarded after exceeding the threshold.
    pub forwarded: u64,
    pub suppressed_first: u64,
    pub suppressed_unchanged: u64,
    pub suppressed_below_threshold: u64,
    /// Datagrams dropped because they could not be decoded.
    pub rejected: u64,
    /// Individual destination writes that failed.
    pub destination_failures: u64,
}

impl RelayStats {
    pub fn suppressed(&self) -> u64 {
        self.suppressed_first + self.suppressed_unchanged + self.suppressed_below_threshold
    }
}

impl fmt::Display for RelayStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "received={} passed_through={} forwarded={} suppressed={} (first={} unchanged={} below_threshold={}) rejected={} destination_failures={}",
            self.received,
            self.passed_through,
            self.forwarded,
            self.suppressed(),
            self.suppressed_first,
            self.suppressed_unchanged,
            self.suppressed_below_threshold,
            self.rejected,
            self.destination_failures,
        )
    }
}

/// What happened to one datagram.
#[derive(Debug)]
pub enum DatagramOutcome {
    /// Not a tracked bone update; sent to every destination unchanged.
    PassedThrough(ForwardReport),
    /// Tracked bone update that moved enough; sent to every destination.
    Forwarded {
        bone: String,
        delta: RotationDelta,
        report: ForwardReport,
    },
    /// Tracked bone update dropped by the filter.
    Suppressed { bone: String, reason: SuppressReason },
    /// Could not be decoded; dropped.
    Rejected(ProtocolError),
}

/// Classifier, filter and destinations wired together.
#[derive(Debug)]
pub struct RelayPipeline {
    classifier: BoneClassifier,
    filter: RotationFilter,
    state: FilterState,
    fan_out: FanOut,
    stats: RelayStats,
}

impl RelayPipeline {
    pub fn new(classifier: BoneClassifier, filter: RotationFilter, fan_out: FanOut) -> Self {
        Self {
            classifier,
            filter,
            state: FilterState::new(),
            fan_out,
            stats: RelayStats::default(),
        }
    }

    /// Processes one datagram end to end.
    pub fn process(&mut self, datagram: &[u8]) -> DatagramOutcome {
        self.stats.received += 1;

        let bone = match self.classifier.classify(datagram) {
            Ok(Classification::PassThrough) => {
                let report = self.send(datagram);
                self.stats.passed_through += 1;
                return DatagramOutcome::PassedThrough(report);
            }
            Ok(Classification::Candidate(bone)) => bone,
            Err(e) => {
                self.stats.rejected += 1;
                return DatagramOutcome::Rejected(e);
            }
        };

        match self
            .filter
            .should_forward(&mut self.state, &bone.name, bone.rotation)
        {
            FilterDecision::Forward(delta) => {
                let report = self.send(datagram);
                self.stats.forwarded += 1;
                DatagramOutcome::Forwarded {
                    bone: bone.name,
                    delta,
                    report,
                }
            }
            FilterDecision::Suppress(reason) => {
                match reason {
                    SuppressReason::FirstObservation => self.stats.suppressed_first += 1,
                    SuppressReason::Unchanged => self.stats.suppressed_unchanged += 1,
                    SuppressReason::BelowThreshold => self.stats.suppressed_below_threshold += 1,
                }
                DatagramOutcome::Suppressed {
                    bone: bone.name,
                    reason,
                }
            }
        }
    }

    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    pub fn filter_state(&self) -> &FilterState {
        &self.state
    }

    pub fn destination_count(&self) -> usize {
        self.fan_out.len()
    }

    fn send(&mut self, datagram: &[u8]) -> ForwardReport {
        let report = self.fan_out.forward(datagram);
        self.stats.destination_failures += report.failures.len() as u64;
        report
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
