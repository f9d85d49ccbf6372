//! Network infrastructure for the relay.
//!
//! # Sub-modules
//!
//! - **`relay_listener`** – Binds the inbound UDP socket and runs the receive
//!   loop on a dedicated thread, feeding every datagram to the pipeline.
//!
//! - **`udp_destination`** – Connected outbound UDP sockets, one per
//!   configured consumer.  These implement `DatagramSink`.

pub mod relay_listener;
pub mod udp_destination;
