// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print relay: the engine's entry point.
//
// Decodes the client message, waits for the printer's gate and runs one
// `PrintSession`. The gate wait counts against the session deadline.

use std::sync::Arc;
use std::time::Duration;

use printgate_core::config::RelayConfig;
use printgate_core::types::{PrintJob, PrintOutcome, RetryPolicy, SessionState};
use printgate_security::fingerprint;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::connect::ConnectionManager;
use crate::gate::PrinterGate;
use crate::payload::PayloadDecoder;
use crate::probe::StatusProbe;
use crate::session::{PrintSession, SessionReport};
use crate::transport::Dialer;

struct RelayInner<D: Dialer> {
    decoder: PayloadDecoder,
    connector: Arc<ConnectionManager<D>>,
    probe: StatusProbe,
    gate: PrinterGate,
    printer_address: String,
    session_deadline: Duration,
}

/// Shared handle to the relay engine. Cheap to clone.
pub struct PrintRelay<D: Dialer> {
    inner: Arc<RelayInner<D>>,
}

impl<D: Dialer> Clone for PrintRelay<D> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<D: Dialer> PrintRelay<D> {
    pub fn new(
        dialer: D,
        policy: RetryPolicy,
        probe: StatusProbe,
        decoder: PayloadDecoder,
        printer_address: impl Into<String>,
        session_deadline: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                decoder,
                connector: Arc::new(ConnectionManager::new(dialer, policy)),
                probe,
                gate: PrinterGate::new(),
                printer_address: printer_address.into(),
                session_deadline,
            }),
        }
    }

    pub fn from_config(config: &RelayConfig, dialer: D) -> Self {
        Self::new(
            dialer,
            config.retry_policy(),
            StatusProbe::new(config.probe_timeout()),
            PayloadDecoder::new(config.flush_marker_bytes()),
            config.printer_address.clone(),
            config.session_deadline(),
        )
    }

    pub fn printer_address(&self) -> &str {
        &self.inner.printer_address
    }

    /// Print `message` on the configured printer.
    ///
    /// Always yields a report; failures are expressed as the outcome.
    #[instrument(skip_all, fields(address = %self.inner.printer_address))]
    pub async fn submit(&self, message: &str, cancel: CancellationToken) -> SessionReport {
        let inner = &self.inner;
        let payload = inner.decoder.decode(message);
        let job = PrintJob::new(payload, inner.printer_address.clone(), inner.session_deadline);
        info!(
            job_id = %job.id,
            bytes = job.payload.len(),
            fingerprint = %fingerprint(&job.payload),
            "print job accepted"
        );

        let started = Instant::now();
        let guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            acquired = tokio::time::timeout_at(job.deadline, inner.gate.acquire(&job.target_address)) => {
                acquired.ok()
            }
        };
        let Some(_guard) = guard else {
            warn!(job_id = %job.id, "gave up waiting for the printer");
            return SessionReport {
                job_id: job.id,
                outcome: PrintOutcome::Timeout,
                final_state: SessionState::Failed,
                visited: vec![SessionState::Init, SessionState::Failed],
                elapsed: started.elapsed(),
            };
        };

        PrintSession::new(job, inner.connector.clone(), inner.probe, cancel)
            .run()
            .await
    }
}
