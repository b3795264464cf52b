// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print session: the Connect → Probe → Send → Probe state machine.
//
// The connection lives in a slot owned by `run`, outside the pipeline
// future. Whether the pipeline finishes, hits the deadline or is cancelled,
// that future is dropped first and the slot is released afterwards, once.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use printgate_core::types::{JobId, PrintJob, PrintOutcome, SessionState, StatusVerdict};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::connect::{ConnectionManager, PrinterConnection};
use crate::probe::StatusProbe;
use crate::transport::Dialer;

/// What a finished session reports back.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub job_id: JobId,
    pub outcome: PrintOutcome,
    pub final_state: SessionState,
    /// Every state entered, in order, starting with `Init`.
    pub visited: Vec<SessionState>,
    pub elapsed: Duration,
}

/// One print job's trip to the printer.
pub struct PrintSession<D: Dialer> {
    job: PrintJob,
    connector: Arc<ConnectionManager<D>>,
    probe: StatusProbe,
    cancel: CancellationToken,
    visited: Vec<SessionState>,
}

impl<D: Dialer> PrintSession<D> {
    pub fn new(
        job: PrintJob,
        connector: Arc<ConnectionManager<D>>,
        probe: StatusProbe,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            job,
            connector,
            probe,
            cancel,
            visited: vec![SessionState::Init],
        }
    }

    /// Drive the session to a terminal state.
    #[instrument(
        name = "print_session",
        skip(self),
        fields(
            job_id = %self.job.id,
            address = %self.job.target_address,
            bytes = self.job.payload.len()
        )
    )]
    pub async fn run(mut self) -> SessionReport {
        let started = Instant::now();
        let mut slot: Option<PrinterConnection<D::Link>> = None;

        let outcome = {
            let pipeline = drive(
                &self.job,
                &self.connector,
                self.probe,
                &self.cancel,
                &mut slot,
                &mut self.visited,
            );
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("print session cancelled");
                    PrintOutcome::Timeout
                }
                result = tokio::time::timeout_at(self.job.deadline, pipeline) => match result {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!("print session deadline expired");
                        PrintOutcome::Timeout
                    }
                },
            }
        };

        if let Some(conn) = slot.take() {
            conn.release().await;
        }

        let final_state = if outcome.is_success() {
            SessionState::Succeeded
        } else {
            SessionState::Failed
        };
        self.visited.push(final_state);

        let elapsed = started.elapsed();
        info!(
            outcome = %outcome,
            elapsed_ms = elapsed.as_millis() as u64,
            "print session finished"
        );

        SessionReport {
            job_id: self.job.id,
            outcome,
            final_state,
            visited: self.visited,
            elapsed,
        }
    }
}

async fn drive<D: Dialer>(
    job: &PrintJob,
    connector: &ConnectionManager<D>,
    probe: StatusProbe,
    cancel: &CancellationToken,
    slot: &mut Option<PrinterConnection<D::Link>>,
    visited: &mut Vec<SessionState>,
) -> PrintOutcome {
    visited.push(SessionState::Connecting);
    let conn = match connector.connect(&job.target_address).await {
        Ok(conn) => slot.insert(conn),
        Err(e) => {
            warn!(error = %e, "printer unreachable");
            return PrintOutcome::PrinterOffline;
        }
    };

    visited.push(SessionState::PreProbing);
    let verdict = probe.check(conn).await;
    info!(phase = "pre", verdict = verdict.label(), "status probe");
    match verdict {
        StatusVerdict::Ready => {}
        StatusVerdict::NotReady { .. } => return PrintOutcome::PrinterNotReady,
        StatusVerdict::CommError(_) => return PrintOutcome::PrinterOffline,
    }
    if job.is_expired() || cancel.is_cancelled() {
        return PrintOutcome::Timeout;
    }

    visited.push(SessionState::Sending);
    if let Err(e) = conn.write_all(&job.payload).await {
        warn!(error = %e, "payload write failed");
        if link_is_dead(&e) {
            return PrintOutcome::WriteFailure;
        }
        // Part of the payload may have reached the device; record its state.
        visited.push(SessionState::PostProbing);
        let verdict = probe.check(conn).await;
        info!(phase = "post", verdict = verdict.label(), "status after failed write");
        return PrintOutcome::WriteFailure;
    }

    visited.push(SessionState::PostProbing);
    let verdict = probe.check(conn).await;
    info!(phase = "post", verdict = verdict.label(), "status probe");
    match verdict {
        StatusVerdict::Ready => PrintOutcome::Success,
        StatusVerdict::NotReady { .. } | StatusVerdict::CommError(_) => {
            PrintOutcome::MidPrintAmbiguous
        }
    }
}

/// Errors after which nothing more can be written on the link.
fn link_is_dead(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
    )
}
