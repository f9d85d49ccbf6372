//! Per-bone rotation delta filter.
//!
//! For each tracked bone the filter remembers the last observed orientation
//! as Euler angles and only lets an update through when one of its axes moved
//! by more than the configured threshold.
//!
//! # Decision order
//!
//! 1. No history for the bone: remember the orientation, suppress.
//! 2. Orientation identical to the stored one: suppress, state untouched.
//! 3. Largest per-axis change strictly above the threshold: forward.
//! 4. Otherwise suppress.
//!
//! Steps 1, 3 and 4 overwrite the stored orientation.
//!
//! # Limitation
//!
//! "No history" is recognised by a stored `x` (pitch) of exactly `0.0`, which
//! is also the value of an absent entry.  A real orientation with zero pitch
//! is therefore treated as a first observation every time it is seen.

use std::collections::HashMap;

use tracing::info;

use crate::domain::rotation::{EulerAngles, Quaternion};

/// Last observed orientation per bone name.
///
/// Owned by a single pipeline; entries are only ever inserted or overwritten.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    last: HashMap<String, EulerAngles>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored orientation for `bone`, if any.
    pub fn get(&self, bone: &str) -> Option<EulerAngles> {
        self.last.get(bone).copied()
    }

    pub fn len(&self) -> usize {
        self.last.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }

    fn store(&mut self, bone: &str, euler: EulerAngles) {
        match self.last.get_mut(bone) {
            Some(slot) => *slot = euler,
            None => {
                self.last.insert(bone.to_string(), euler);
            }
        }
    }
}

/// Why an update was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuppressReason {
    FirstObservation,
    Unchanged,
    BelowThreshold,
}

/// An orientation change large enough to forward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationDelta {
    pub previous: EulerAngles,
    pub current: EulerAngles,
    /// Per-axis absolute difference.
    pub diff: EulerAngles,
    /// Largest component of `diff`.
    pub max: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterDecision {
    Forward(RotationDelta),
    Suppress(SuppressReason),
}

impl FilterDecision {
    pub fn is_forward(&self) -> bool {
        matches!(self, FilterDecision::Forward(_))
    }
}

/// Threshold-based rotation filter.  Stateless itself; the history lives in
/// a [`FilterState`] passed by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationFilter {
    threshold: f32,
}

impl RotationFilter {
    /// `threshold` is in radians and compared with a strict `>`.
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Converts `rotation` to Euler angles and evaluates it for `bone`.
    pub fn should_forward(
        &self,
        state: &mut FilterState,
        bone: &str,
        rotation: Quaternion,
    ) -> FilterDecision {
        self.evaluate(state, bone, rotation.to_euler_yxz())
    }

    /// Evaluates an orientation already expressed as Euler angles.
    pub fn evaluate(
        &self,
        state: &mut FilterState,
        bone: &str,
        current: EulerAngles,
    ) -> FilterDecision {
        let previous = state.get(bone).unwrap_or_default();

        if previous.x == 0.0 {
            state.store(bone, current);
            return FilterDecision::Suppress(SuppressReason::FirstObservation);
        }
        if previous == current {
            return FilterDecision::Suppress(SuppressReason::Unchanged);
        }

        let diff = current.abs_diff(previous);
        let max = diff.max_component();
        state.store(bone, current);

        if max > self.threshold {
            info!(
                bone,
                old_x = previous.x,
                old_y = previous.y,
                old_z = previous.z,
                new_x = current.x,
                new_y = current.y,
                new_z = current.z,
                diff_x = diff.x,
                diff_y = diff.y,
                diff_z = diff.z,
                max,
                "bone rotation changed"
            );
            FilterDecision::Forward(RotationDelta {
                previous,
                current,
                diff,
                max,
            })
        } else {
            FilterDecision::Suppress(SuppressReason::BelowThreshold)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
