use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort a whole discovery attempt.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to bind discovery socket on {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },
    #[error("failed to enable broadcast on discovery socket: {0}")]
    EnableBroadcast(io::Error),
    #[error("failed to send probe to {addr}: {source}")]
    Send { addr: SocketAddr, source: io::Error },
    #[error("failed to receive discovery response: {0}")]
    Receive(io::Error),
}

/// Why a device did not accept the start of a transfer.
#[derive(Debug, Error)]
pub enum HandshakeFailure {
    #[error("could not send start command: {0}")]
    Write(io::Error),
    #[error("could not read acknowledgement: {0}")]
    Read(io::Error),
    #[error("connection closed after {received} of 4 acknowledgement bytes")]
    ShortRead { received: usize },
    #[error("unexpected acknowledgement {0:02X?}")]
    BadAck([u8; 4]),
}

/// The error that ended a single transfer session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("connection failed: {0}")]
    Connect(io::Error),
    #[error("handshake failed: {0}")]
    Handshake(HandshakeFailure),
    #[error("transfer failed after {sent} bytes: {error}")]
    Transfer { sent: usize, error: io::Error },
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("no target selected")]
    NoTargets,
}

#[derive(Debug, Error)]
pub enum FirmwareError {
    #[error("failed to read firmware from {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
}
