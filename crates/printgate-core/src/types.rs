// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Printgate relay.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use uuid::Uuid;

/// Unique identifier for a print job (log correlation only, never persisted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A decoded print job, bound to one printer and one end-to-end deadline.
///
/// Created per inbound request and dropped when the session ends.
#[derive(Debug, Clone)]
pub struct PrintJob {
    pub id: JobId,
    /// Bytes sent to the device, flush marker included.
    pub payload: Vec<u8>,
    /// `host:port` of the printer.
    pub target_address: String,
    /// Monotonic deadline every pipeline step is checked against.
    pub deadline: Instant,
}

impl PrintJob {
    pub fn new(payload: Vec<u8>, target_address: impl Into<String>, budget: Duration) -> Self {
        Self {
            id: JobId::new(),
            payload,
            target_address: target_address.into(),
            deadline: Instant::now() + budget,
        }
    }

    /// Time left before the deadline (zero once it has passed).
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }
}

/// How hard the connection manager tries to reach the printer.
///
/// `backoff` lists the pauses between successive dial attempts, so a policy
/// with N entries makes at most N + 1 attempts. An empty list is fast-fail:
/// one attempt, bounded by `connect_timeout`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound for a single dial attempt.
    pub connect_timeout: Duration,
    /// Pauses inserted between attempts, in order.
    pub backoff: Vec<Duration>,
}

impl RetryPolicy {
    /// Single attempt, no retry.
    pub fn fast_fail(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            backoff: Vec::new(),
        }
    }

    /// Retry after each listed pause.
    pub fn resilient(connect_timeout: Duration, backoff: Vec<Duration>) -> Self {
        Self {
            connect_timeout,
            backoff,
        }
    }

    /// Total number of dial attempts this policy allows.
    pub fn max_attempts(&self) -> usize {
        self.backoff.len() + 1
    }

    pub fn is_fast_fail(&self) -> bool {
        self.backoff.is_empty()
    }
}

/// The device's readiness as reported by one status probe.
#[derive(Debug)]
pub enum StatusVerdict {
    /// The device answered with a ready status byte.
    Ready,
    /// The device answered, but not with a ready status (e.g. out of paper).
    NotReady { status: u8 },
    /// The device did not answer: write/read failed, timed out, or hit EOF.
    CommError(std::io::Error),
}

impl StatusVerdict {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Short label for structured logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::NotReady { .. } => "not_ready",
            Self::CommError(_) => "comm_error",
        }
    }
}

/// Terminal result of a print session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintOutcome {
    /// Pre-probe ready, payload written, post-probe ready.
    Success,
    /// Could not connect, or the device did not answer the pre-probe.
    PrinterOffline,
    /// The device reported it is not ready before anything was sent.
    PrinterNotReady,
    /// The payload write failed.
    WriteFailure,
    /// The payload was written but the post-probe did not confirm readiness.
    /// The job may or may not have printed.
    MidPrintAmbiguous,
    /// The session deadline passed or the request was cancelled.
    Timeout,
    /// The pipeline itself failed (task panic, join error).
    InternalError,
}

impl PrintOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::PrinterOffline => "printer_offline",
            Self::PrinterNotReady => "printer_not_ready",
            Self::WriteFailure => "write_failure",
            Self::MidPrintAmbiguous => "mid_print_ambiguous",
            Self::Timeout => "timeout",
            Self::InternalError => "internal_error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::fmt::Display for PrintOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// States of the print session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Init,
    Connecting,
    PreProbing,
    Sending,
    PostProbing,
    Succeeded,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempts_are_backoff_plus_one() {
        let fast = RetryPolicy::fast_fail(Duration::from_secs(3));
        assert!(fast.is_fast_fail());
        assert_eq!(fast.max_attempts(), 1);

        let resilient = RetryPolicy::resilient(
            Duration::from_secs(10),
            vec![Duration::from_secs(2), Duration::from_secs(4)],
        );
        assert!(!resilient.is_fast_fail());
        assert_eq!(resilient.max_attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn job_remaining_saturates_at_zero() {
        let job = PrintJob::new(b"x\n".to_vec(), "printer:9100", Duration::from_secs(1));
        assert!(!job.is_expired());
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(job.remaining(), Duration::ZERO);
        assert!(job.is_expired());
    }

    #[test]
    fn outcome_serializes_snake_case() {
        let json = serde_json::to_string(&PrintOutcome::MidPrintAmbiguous).unwrap();
        assert_eq!(json, "\"mid_print_ambiguous\"");
        assert_eq!(PrintOutcome::PrinterOffline.to_string(), "printer_offline");
    }

    #[test]
    fn only_ready_verdict_is_ready() {
        assert!(StatusVerdict::Ready.is_ready());
        assert!(!StatusVerdict::NotReady { status: 0 }.is_ready());
        let comm = StatusVerdict::CommError(std::io::ErrorKind::TimedOut.into());
        assert!(!comm.is_ready());
        assert_eq!(comm.label(), "comm_error");
    }
}
