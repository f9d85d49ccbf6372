//! Domain logic for the VMC relay.
//!
//! This module contains pure logic with no infrastructure dependencies: no
//! sockets, no files, no clocks.
//!
//! # What lives here? (for beginners)
//!
//! A VMC sender streams one UDP datagram per bone, tens of times per second.
//! The relay's job is to decide, for every datagram, whether a consumer needs
//! to see it.  That decision is made in two steps, each in its own module:
//!
//! - [`bone`] looks at the raw bytes and answers "is this a rotation update
//!   for a bone we are watching?"  Anything else passes straight through.
//! - [`filter`] remembers the last orientation of every watched bone and
//!   answers "did it move enough to matter?"
//!
//! [`rotation`] supplies the quaternion and Euler-angle math the filter needs.
//!
//! Code in outer layers (the relay's application and infrastructure modules)
//! depends on the domain, but the domain never depends on them, so every
//! decision here can be unit-tested with plain byte slices.

/// Quaternions, vectors and the Y-X-Z Euler decomposition.
pub mod rotation;

/// Two-tier classification of datagrams into pass-through and candidates.
///
/// See [`bone::BoneClassifier`] for the main type.
pub mod bone;

/// Per-bone rotation delta filter.
pub mod filter;
