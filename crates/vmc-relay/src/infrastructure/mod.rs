//! Infrastructure layer for the relay.
//!
//! Contains OS-facing adapters: UDP sockets and configuration file storage.
//!
//! **Dependency rule**: this layer may depend on `application` and `vmc_core`,
//! but MUST NOT be imported by the `application` or domain layers.

pub mod network;
pub mod storage;
