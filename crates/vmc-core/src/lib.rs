//! # vmc-core
//!
//! Shared library for the VMC relay containing the OSC wire codec, the
//! bone-transform classifier and the rotation delta filter.
//!
//! It has zero dependencies on OS APIs, network sockets or an async runtime.
//!
//! # Architecture overview (for beginners)
//!
//! VMC (Virtual Motion Capture) is a convention for streaming avatar poses
//! over OSC, a small binary message format carried in UDP datagrams.  The
//! relay built on top of this crate receives that stream once and re-sends it
//! to several consumers, dropping bone rotation updates that barely changed.
//!
//! This crate defines:
//!
//! - **`protocol`** – How bytes travel over the network.  OSC messages are an
//!   address string, a type-tag string and a list of big-endian arguments,
//!   each padded to four bytes.  The codec decodes them into typed Rust values
//!   and can also read them in place without allocating.
//!
//! - **`domain`** – Pure decision logic: which datagrams are bone updates we
//!   track, and which of those changed enough to be worth forwarding.

// Declare the two top-level modules.  Rust will look for each in a
// subdirectory with the same name (e.g., src/protocol/mod.rs).
pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `vmc_core::RotationFilter` instead of `vmc_core::domain::filter::RotationFilter`.
pub use domain::bone::{BoneClassifier, BoneTransform, Classification, DEFAULT_TRACKED_BONES};
pub use domain::filter::{
    FilterDecision, FilterState, RotationDelta, RotationFilter, SuppressReason,
};
pub use domain::rotation::{EulerAngles, Quaternion, Vec3};
pub use protocol::codec::{decode_message, encode_message, ProtocolError};
pub use protocol::messages::{Argument, OscMessage};
pub use protocol::reader::MessageView;
