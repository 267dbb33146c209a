//! Single-device OTA session.
//!
//! Wire sequence, client side:
//! 1. connect to the device's OTA port
//! 2. send `ota`
//! 3. read exactly `ACK\0`
//! 4. stream the image in chunks of at most `chunk_size` bytes
//! 5. shut down the write side
//!
//! The stream is owned by [`TransferSession::run`] and dropped exactly once,
//! whichever step ends the session.

use std::io;

use otaflash_common::config::{OTA_ACK, OTA_COMMAND};
use otaflash_common::network::target::Target;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use super::{Connector, EventSender, TransferEvent, TransferReport};
use crate::error::{HandshakeFailure, SessionError};
use crate::firmware::Firmware;

pub struct TransferSession {
    target: Target,
    firmware: Firmware,
    chunk_size: usize,
    events: Option<EventSender>,
    bytes_sent: usize,
}

impl TransferSession {
    pub fn new(
        target: Target,
        firmware: Firmware,
        chunk_size: usize,
        events: Option<EventSender>,
    ) -> Self {
        Self {
            target,
            firmware,
            chunk_size: chunk_size.max(1),
            events,
            bytes_sent: 0,
        }
    }

    /// Delivers the image and reports how far it got.
    pub async fn run<C>(mut self, connector: &C) -> TransferReport
    where
        C: Connector + ?Sized,
    {
        let endpoint = connector.endpoint(&self.target);
        info!("Connecting to {endpoint}...");

        let result = match connector.connect(&self.target).await {
            Ok(mut stream) => {
                info!("{} Connected", self.target);
                self.deliver(&mut stream).await
            }
            Err(e) => Err(SessionError::Connect(e)),
        };

        match &result {
            Ok(()) => info!("{} : Transmit complete", self.target),
            Err(e @ SessionError::Connect(_)) => error!("{} : {e}", self.target),
            Err(e) => warn!("{} : {e}", self.target),
        }

        let report = TransferReport::new(
            self.target.clone(),
            self.bytes_sent,
            self.firmware.len(),
            result,
        );
        self.emit(TransferEvent::Finished {
            target: report.target.clone(),
            outcome: report.outcome,
        });
        report
    }

    async fn deliver<S>(&mut self, stream: &mut S) -> Result<(), SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.handshake(stream)
            .await
            .map_err(SessionError::Handshake)?;

        info!("Start transmitting to {}", self.target);
        let firmware = self.firmware.clone();
        let total = firmware.len();

        for chunk in firmware.as_bytes().chunks(self.chunk_size) {
            self.write_chunk(stream, chunk).await?;
            self.bytes_sent += chunk.len();

            debug!(
                "{} : {} / {}, {}%",
                self.target,
                self.bytes_sent,
                total,
                self.bytes_sent * 100 / total
            );
            self.emit(TransferEvent::Progress {
                target: self.target.clone(),
                bytes_sent: self.bytes_sent,
                total_bytes: total,
            });
        }

        stream
            .shutdown()
            .await
            .map_err(|error| self.transfer_error(error))
    }

    async fn handshake<S>(&self, stream: &mut S) -> Result<(), HandshakeFailure>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        stream
            .write_all(OTA_COMMAND)
            .await
            .map_err(HandshakeFailure::Write)?;
        stream.flush().await.map_err(HandshakeFailure::Write)?;
        info!("Send OTA message to {}", self.target);

        info!("Waiting for ACK message from {}", self.target);
        let ack = read_ack(stream).await?;
        if ack != OTA_ACK {
            return Err(HandshakeFailure::BadAck(ack));
        }
        Ok(())
    }

    async fn write_chunk<S>(&self, stream: &mut S, chunk: &[u8]) -> Result<(), SessionError>
    where
        S: AsyncWrite + Unpin,
    {
        stream
            .write_all(chunk)
            .await
            .map_err(|error| self.transfer_error(error))?;
        stream
            .flush()
            .await
            .map_err(|error| self.transfer_error(error))
    }

    fn transfer_error(&self, error: io::Error) -> SessionError {
        SessionError::Transfer {
            sent: self.bytes_sent,
            error,
        }
    }

    fn emit(&self, event: TransferEvent) {
        if let Some(tx) = &self.events {
            // The caller may have stopped listening; the transfer carries on.
            let _ = tx.send(event);
        }
    }
}

/// Reads the 4-byte acknowledgement, tolerating partial reads.
async fn read_ack<S>(stream: &mut S) -> Result<[u8; 4], HandshakeFailure>
where
    S: AsyncRead + Unpin,
{
    let mut ack = [0u8; 4];
    let mut received = 0;

    while received < ack.len() {
        match stream.read(&mut ack[received..]).await {
            Ok(0) => return Err(HandshakeFailure::ShortRead { received }),
            Ok(n) => received += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(HandshakeFailure::Read(e)),
        }
    }

    Ok(ack)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
