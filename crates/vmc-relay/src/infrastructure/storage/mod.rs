//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module handles:
//!
//! - Reading the TOML configuration file given on the command line.
//! - Reading the older flat JSON format so existing setups keep working.
//! - Providing sensible defaults when the file does not exist yet (first run).

pub mod config;
