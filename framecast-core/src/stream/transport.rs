//! Datagram transport.
//!
//! Workers share one [`DatagramSink`] handle and call it concurrently;
//! implementations must serialize individual sends internally without
//! external locking. No ordering across sends from different workers is
//! implied — the wire header carries everything a receiver needs to cope.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::net::UdpSocket;

use crate::error::CastError;

// ── DatagramSink ─────────────────────────────────────────────────

/// Fire-and-forget datagram send, safe for concurrent callers.
#[async_trait]
pub trait DatagramSink: Send + Sync {
    /// Transmit one datagram. Fails with [`CastError::Transport`] on an
    /// unrecoverable socket error; callers log and continue.
    async fn send(&self, datagram: &[u8]) -> Result<(), CastError>;
}

// ── UdpSink ──────────────────────────────────────────────────────

/// UDP implementation targeting a fixed destination.
///
/// `UdpSocket::send_to` takes `&self`, so a single socket behind an
/// `Arc` serves every worker without a mutex.
#[derive(Debug)]
pub struct UdpSink {
    socket: UdpSocket,
    destination: SocketAddr,
    datagrams_sent: AtomicU64,
    bytes_sent: AtomicU64,
}

impl UdpSink {
    /// Wrap an already-bound socket targeting `destination`.
    pub fn new(socket: UdpSocket, destination: SocketAddr) -> Self {
        Self {
            socket,
            destination,
            datagrams_sent: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
        }
    }

    /// Bind an ephemeral local socket and target `destination`.
    pub async fn connect(destination: SocketAddr) -> Result<Self, CastError> {
        let bind_addr = if destination.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        Ok(Self::new(socket, destination))
    }

    /// The destination this sink targets.
    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    /// Total datagrams sent since construction.
    pub fn datagrams_sent(&self) -> u64 {
        self.datagrams_sent.load(Ordering::Relaxed)
    }

    /// Total bytes sent since construction.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DatagramSink for UdpSink {
    async fn send(&self, datagram: &[u8]) -> Result<(), CastError> {
        self.socket.send_to(datagram, self.destination).await?;
        self.datagrams_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(datagram.len() as u64, Ordering::Relaxed);
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────
