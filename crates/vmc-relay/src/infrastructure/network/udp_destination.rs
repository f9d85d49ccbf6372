//! Outbound UDP destinations.
//!
//! Each destination is a UDP socket bound to an ephemeral local port and
//! `connect`ed to its consumer, so sending is a single `send` call and the OS
//! filters replies from other peers.
//!
//! # Connected UDP sockets (for beginners)
//!
//! UDP is connectionless: `connect` sends nothing on the wire.  It only
//! records a default peer address in the kernel.  A side effect is that ICMP
//! "port unreachable" messages for that peer are reported back on the socket,
//! which is why a consumer that is not running shows up as a
//! `ConnectionRefused` error on a later `send`.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use thiserror::Error;
use tracing::info;

use crate::application::fan_out::DatagramSink;

/// Error type for opening destinations at startup.
#[derive(Debug, Error)]
pub enum DestinationError {
    /// The address could not be resolved to a socket address.
    #[error("failed to resolve destination {addr}: {source}")]
    Resolve {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    /// The local sending socket could not be bound.
    #[error("failed to bind sending socket for {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// The socket could not be connected to the destination.
    #[error("failed to connect to destination {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// A connected, write-only UDP socket.
#[derive(Debug)]
pub struct UdpDestination {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpDestination {
    /// Resolves `addr` (`host:port`) and connects a fresh socket to it.
    ///
    /// # Errors
    ///
    /// Returns a [`DestinationError`] for resolution, bind or connect failures.
    pub fn connect(addr: &str) -> Result<Self, DestinationError> {
        let peer = resolve(addr)?;
        let local: SocketAddr = if peer.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket =
            UdpSocket::bind(local).map_err(|source| DestinationError::Bind { addr: peer, source })?;
        socket
            .connect(peer)
            .map_err(|source| DestinationError::Connect { addr: peer, source })?;
        Ok(Self { socket, peer })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl DatagramSink for UdpDestination {
    fn send(&self, bytes: &[u8]) -> std::io::Result<usize> {
        self.socket.send(bytes)
    }

    fn describe(&self) -> String {
        self.peer.to_string()
    }
}

/// Opens one [`UdpDestination`] per address, in order.
///
/// # Errors
///
/// Fails on the first address that cannot be opened.
pub fn open_destinations(addrs: &[String]) -> Result<Vec<Box<dyn DatagramSink>>, DestinationError> {
    addrs
        .iter()
        .map(|addr| {
            let destination = UdpDestination::connect(addr)?;
            info!(peer = %destination.peer(), "destination ready");
            Ok(Box::new(destination) as Box<dyn DatagramSink>)
        })
        .collect()
}

fn resolve(addr: &str) -> Result<SocketAddr, DestinationError> {
    let resolve_err = |source| DestinationError::Resolve {
        addr: addr.to_string(),
        source,
    };
    addr.to_socket_addrs()
        .map_err(resolve_err)?
        .next()
        .ok_or_else(|| {
            resolve_err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no addresses returned",
            ))
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
