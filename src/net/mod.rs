//! # Network Module
//!
//! Datagram transport to the driver station.
//!
//! The engine only ever polls: a receive returns at once, with `None` when
//! nothing is queued, and a send never waits for the socket.

use std::io;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::info;

use crate::error::Result;

/// Default UDP port driver stations send to
pub const DEFAULT_PORT: u16 = 22211;

/// Non-blocking datagram endpoint
#[cfg_attr(test, mockall::automock)]
pub trait DatagramLink {
    /// Receive one datagram into `buf` if one is queued
    ///
    /// Returns the datagram length and its sender, or `None` when idle.
    fn try_recv(&mut self, buf: &mut [u8]) -> io::Result<Option<(usize, SocketAddr)>>;

    /// Send one datagram without waiting
    fn send_to(&mut self, frame: &[u8], peer: SocketAddr) -> io::Result<usize>;
}

/// UDP socket registered with the tokio reactor
///
/// Readiness is tracked by the runtime, so the poll loop must yield to it
/// (e.g. await an interval tick) between polls.
#[derive(Debug)]
pub struct UdpLink {
    socket: UdpSocket,
}

impl UdpLink {
    /// Bind the listening socket
    ///
    /// # Errors
    ///
    /// Returns error if the address is in use or not local
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        info!("Listening for driver station on {}", socket.local_addr()?);
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Wait until a datagram is queued
    pub async fn readable(&self) -> io::Result<()> {
        self.socket.readable().await
    }
}

impl DatagramLink for UdpLink {
    fn try_recv(&mut self, buf: &mut [u8]) -> io::Result<Option<(usize, SocketAddr)>> {
        match self.socket.try_recv_from(buf) {
            Ok(received) => Ok(Some(received)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn send_to(&mut self, frame: &[u8], peer: SocketAddr) -> io::Result<usize> {
        self.socket.try_send_to(frame, peer)
    }
}
