//! Application layer use cases for the relay.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure decision rules in `vmc_core`) and the infrastructure (sockets and
//! files).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil a goal (e.g., "forward this
//!   datagram unless it is a bone rotation that barely moved").
//! - **Depend on abstractions** (traits) rather than concrete implementations,
//!   so the infrastructure can be swapped without changing this code.
//! - **Contain no OS calls, no network I/O, no file system access**.
//!
//! # Sub-modules
//!
//! - **`relay_datagram`** – Classifies, filters and forwards one datagram.
//!   This runs for every packet the sender emits, so it is the hot path.
//!
//! - **`fan_out`** – Delivers a datagram to every destination through the
//!   `DatagramSink` trait, isolating failures per destination.

pub mod fan_out;
pub mod relay_datagram;
