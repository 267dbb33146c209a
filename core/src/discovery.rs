//! # Device Discovery Service
//!
//! Finds OTA-capable devices on the local broadcast domain.
//!
//! A probe cycle sends one `REQUEST IP` datagram to the /24 broadcast address
//! of the chosen interface and then records every answer until the socket
//! stays silent for the configured receive timeout. Deciding whether to
//! rescan or to accept the candidates is left to the caller.

use std::fmt;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use otaflash_common::config::DiscoveryConfig;
use otaflash_common::network::broadcast;
use otaflash_common::network::target::Target;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::DiscoveryError;

/// One datagram received during a probe cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryResponse {
    /// Datagram payload decoded as text.
    pub payload: String,
    pub source: SocketAddr,
}

impl DiscoveryResponse {
    /// Reads the payload as a target address.
    ///
    /// Devices pad their answer with NULs or line endings, both are stripped.
    /// Returns `None` for a payload that is blank once stripped.
    pub fn target(&self) -> Option<Target> {
        let addr = self
            .payload
            .trim_matches(|c: char| c == '\0' || c.is_whitespace());
        (!addr.is_empty()).then(|| Target::new(addr))
    }
}

impl fmt::Display for DiscoveryResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.payload)
    }
}

/// Owns the probe socket for the lifetime of a discovery session.
pub struct DiscoveryService {
    socket: UdpSocket,
    destination: SocketAddr,
    cfg: DiscoveryConfig,
}

impl DiscoveryService {
    /// Binds to `local` and aims probes at its class C broadcast address.
    pub async fn bind(local: Ipv4Addr, cfg: DiscoveryConfig) -> Result<Self, DiscoveryError> {
        let destination = broadcast::broadcast_target(local, cfg.broadcast_port);
        let bind_addr = SocketAddrV4::new(local, 0);
        Self::bind_with_destination(bind_addr.into(), destination.into(), cfg).await
    }

    /// Binds to `bind_addr` and sends probes to an explicit `destination`.
    pub async fn bind_with_destination(
        bind_addr: SocketAddr,
        destination: SocketAddr,
        cfg: DiscoveryConfig,
    ) -> Result<Self, DiscoveryError> {
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|source| DiscoveryError::Bind {
                addr: bind_addr,
                source,
            })?;
        socket
            .set_broadcast(true)
            .map_err(DiscoveryError::EnableBroadcast)?;

        debug!("Discovery socket bound on {bind_addr}");
        Ok(Self {
            socket,
            destination,
            cfg,
        })
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Runs one send-then-collect pass and returns the answers in arrival order.
    ///
    /// Repeated payloads are kept as separate entries.
    pub async fn probe_cycle(&mut self) -> Result<Vec<DiscoveryResponse>, DiscoveryError> {
        self.discard_stale()?;

        self.socket
            .send_to(&self.cfg.probe, self.destination)
            .await
            .map_err(|source| DiscoveryError::Send {
                addr: self.destination,
                source,
            })?;
        info!(
            "Broadcast \"{}\" sent to {}",
            String::from_utf8_lossy(&self.cfg.probe),
            self.destination
        );

        let mut buffer = vec![0u8; self.cfg.recv_buffer];
        let mut responses: Vec<DiscoveryResponse> = Vec::new();

        loop {
            match timeout(self.cfg.recv_timeout, self.socket.recv_from(&mut buffer)).await {
                Ok(Ok((len, source))) => {
                    let payload = String::from_utf8_lossy(&buffer[..len]).into_owned();
                    info!("Received response: {payload} (from {source})");
                    responses.push(DiscoveryResponse { payload, source });
                }
                Ok(Err(e)) if oversized(&e) => {
                    warn!("Dropped a response larger than {} bytes", buffer.len())
                }
                Ok(Err(e)) => return Err(DiscoveryError::Receive(e)),
                Err(_elapsed) => break,
            }
        }

        debug!("Probe cycle collected {} responses", responses.len());
        Ok(responses)
    }

    /// Drops answers that arrived after the previous cycle stopped listening.
    fn discard_stale(&self) -> Result<(), DiscoveryError> {
        let mut scratch = vec![0u8; self.cfg.recv_buffer];
        loop {
            match self.socket.try_recv_from(&mut scratch) {
                Ok((_, source)) => debug!("Discarding late response from {source}"),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if oversized(&e) => debug!("Discarding oversized late response"),
                Err(e) => return Err(DiscoveryError::Receive(e)),
            }
        }
    }
}

/// Windows reports a datagram larger than the buffer as `WSAEMSGSIZE` and
/// drops it, where Linux and macOS hand back the truncated payload.
fn oversized(error: &io::Error) -> bool {
    const WSAEMSGSIZE: i32 = 10040;
    cfg!(windows) && error.raw_os_error() == Some(WSAEMSGSIZE)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
