//! Firmware delivery over the OTA protocol.
//!
//! A [`session`] pushes the image to one device; the [`orchestrator`] runs
//! one session per target concurrently and collects their reports. Sessions
//! obtain their connection through a [`Connector`], so anything that speaks
//! `AsyncRead + AsyncWrite` can stand in for a TCP socket.

use std::fmt;

use otaflash_common::network::target::Target;
use tokio::sync::mpsc;

use crate::error::SessionError;

pub mod connector;
pub mod orchestrator;
pub mod session;

pub use connector::{Connector, TcpConnector};
pub use orchestrator::{Orchestrator, TransferSummary};
pub use session::TransferSession;

/// Final classification of a session. Set once, never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferOutcome {
    Success,
    ConnectFailed,
    HandshakeFailed,
    TransferIoError,
}

impl TransferOutcome {
    pub fn is_success(self) -> bool {
        self == TransferOutcome::Success
    }
}

impl fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TransferOutcome::Success => "transfer complete",
            TransferOutcome::ConnectFailed => "connect failed",
            TransferOutcome::HandshakeFailed => "handshake failed",
            TransferOutcome::TransferIoError => "transfer error",
        };
        f.write_str(text)
    }
}

impl SessionError {
    pub fn outcome(&self) -> TransferOutcome {
        match self {
            SessionError::Connect(_) => TransferOutcome::ConnectFailed,
            SessionError::Handshake(_) => TransferOutcome::HandshakeFailed,
            SessionError::Transfer { .. } => TransferOutcome::TransferIoError,
        }
    }
}

/// What a session reports to the caller while it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    /// Emitted after every chunk has been written and flushed.
    Progress {
        target: Target,
        bytes_sent: usize,
        total_bytes: usize,
    },
    /// Emitted exactly once per session.
    Finished {
        target: Target,
        outcome: TransferOutcome,
    },
}

pub type EventSender = mpsc::UnboundedSender<TransferEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<TransferEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Terminal state of one session.
#[derive(Debug)]
pub struct TransferReport {
    pub target: Target,
    pub outcome: TransferOutcome,
    pub bytes_sent: usize,
    pub total_bytes: usize,
    /// The error that ended the session, `None` on success.
    pub error: Option<SessionError>,
}

impl TransferReport {
    pub(crate) fn new(
        target: Target,
        bytes_sent: usize,
        total_bytes: usize,
        result: Result<(), SessionError>,
    ) -> Self {
        let (outcome, error) = match result {
            Ok(()) => (TransferOutcome::Success, None),
            Err(e) => (e.outcome(), Some(e)),
        };
        Self {
            target,
            outcome,
            bytes_sent,
            total_bytes,
            error,
        }
    }
}
