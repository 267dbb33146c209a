use std::sync::Arc;

use otaflash_common::config::TransferConfig;
use otaflash_common::network::target::{Target, TargetSet};
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::{Connector, EventSender, TransferEvent, TransferOutcome, TransferReport, TransferSession};
use crate::error::{OrchestratorError, SessionError};
use crate::firmware::Firmware;

/// Runs one [`TransferSession`] per target and waits for all of them.
pub struct Orchestrator<C> {
    connector: Arc<C>,
    cfg: TransferConfig,
}

impl<C: Connector> Orchestrator<C> {
    pub fn new(connector: C, cfg: TransferConfig) -> Self {
        Self {
            connector: Arc::new(connector),
            cfg,
        }
    }

    /// Pushes `firmware` to every target concurrently.
    ///
    /// Returns once every session is terminal. A failing target only shows
    /// up in its own report; the only error is an empty target set, in
    /// which case nothing is started.
    pub async fn run(
        &self,
        targets: TargetSet,
        firmware: &Firmware,
        events: Option<EventSender>,
    ) -> Result<TransferSummary, OrchestratorError> {
        if targets.is_empty() {
            error!("NO target IP, Quit");
            return Err(OrchestratorError::NoTargets);
        }

        info!("Starting OTA for {} target(s)", targets.len());
        let mut handles: Vec<(Target, JoinHandle<TransferReport>)> = Vec::with_capacity(targets.len());

        for target in targets {
            let session = TransferSession::new(
                target.clone(),
                firmware.clone(),
                self.cfg.chunk_size,
                events.clone(),
            );
            let connector = Arc::clone(&self.connector);
            let handle = tokio::spawn(async move { session.run(&*connector).await });
            handles.push((target, handle));
        }

        let mut reports: Vec<TransferReport> = Vec::with_capacity(handles.len());
        for (target, handle) in handles {
            let report = match handle.await {
                Ok(report) => report,
                Err(join_error) => {
                    error!("{target} : session aborted: {join_error}");
                    aborted(target, firmware.len(), join_error, events.as_ref())
                }
            };
            reports.push(report);
        }

        info!("All OTA sessions finished");
        Ok(TransferSummary { reports })
    }
}

/// Report for a session task that panicked or was cancelled.
fn aborted(
    target: Target,
    total_bytes: usize,
    join_error: tokio::task::JoinError,
    events: Option<&EventSender>,
) -> TransferReport {
    if let Some(tx) = events {
        let _ = tx.send(TransferEvent::Finished {
            target: target.clone(),
            outcome: TransferOutcome::TransferIoError,
        });
    }
    let error = SessionError::Transfer {
        sent: 0,
        error: std::io::Error::other(join_error.to_string()),
    };
    TransferReport::new(target, 0, total_bytes, Err(error))
}

/// Per-target reports, in the order the targets were given.
#[derive(Debug)]
pub struct TransferSummary {
    reports: Vec<TransferReport>,
}

impl TransferSummary {
    pub fn reports(&self) -> &[TransferReport] {
        &self.reports
    }

    pub fn get(&self, target: &Target) -> Option<&TransferReport> {
        self.reports.iter().find(|r| &r.target == target)
    }

    pub fn outcome(&self, target: &Target) -> Option<TransferOutcome> {
        self.get(target).map(|r| r.outcome)
    }

    pub fn succeeded(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.reports.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
