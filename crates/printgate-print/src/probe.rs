// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer status probe: ESC/POS real-time status query (DLE EOT 1).
//
// The printer answers a single status byte. 0x16 and 0x12 mean online with
// paper; anything else means the printer is up but not ready. A probe that
// gets no byte back at all (error, EOF or timeout) is a communication error.

use std::io;
use std::time::Duration;

use printgate_core::types::StatusVerdict;
use tracing::{debug, instrument, warn};

use crate::connect::PrinterConnection;
use crate::transport::PrinterLink;

/// DLE EOT 1: transmit printer status.
pub const STATUS_QUERY: [u8; 3] = [0x10, 0x04, 0x01];

/// Status bytes that mean "online, paper present".
pub const READY_STATUS: [u8; 2] = [0x16, 0x12];

/// Default deadline for one probe exchange.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const READ_BUF_LEN: usize = 1024;

/// Sends the status query and interprets the reply.
#[derive(Debug, Clone, Copy)]
pub struct StatusProbe {
    timeout: Duration,
}

impl Default for StatusProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

impl StatusProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Query the printer on `conn`. Never fails: every problem becomes
    /// [`StatusVerdict::CommError`]. The write and the read together are
    /// bounded by the probe timeout.
    #[instrument(skip(self, conn), fields(address = conn.address()))]
    pub async fn check<L: PrinterLink>(&self, conn: &mut PrinterConnection<L>) -> StatusVerdict {
        let exchange = async {
            conn.write_all(&STATUS_QUERY).await?;
            let mut buf = [0u8; READ_BUF_LEN];
            let n = conn.read(&mut buf).await?;
            Ok::<_, io::Error>(classify_response(&buf[..n]))
        };

        let verdict = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(e)) => StatusVerdict::CommError(e),
            Err(_) => StatusVerdict::CommError(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no status reply within {}ms", self.timeout.as_millis()),
            )),
        };

        match &verdict {
            StatusVerdict::Ready => debug!("printer ready"),
            StatusVerdict::NotReady { status } => {
                warn!(status = %format!("{status:#04x}"), "printer not ready")
            }
            StatusVerdict::CommError(e) => warn!(error = %e, "status probe failed"),
        }
        verdict
    }
}

/// Interpret a raw status reply. Only the first byte is significant.
pub fn classify_response(reply: &[u8]) -> StatusVerdict {
    match reply.first() {
        None => StatusVerdict::CommError(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "printer closed the connection without a status byte",
        )),
        Some(b) if READY_STATUS.contains(b) => StatusVerdict::Ready,
        Some(&status) => StatusVerdict::NotReady { status },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connect::ConnectionManager;
    use crate::mock::{MockDialer, Reply};
    use printgate_core::types::RetryPolicy;

    async fn connect(dialer: MockDialer) -> PrinterConnection<crate::mock::MockLink> {
        ConnectionManager::new(dialer, RetryPolicy::fast_fail(Duration::from_secs(1)))
            .connect("printer:9100")
            .await
            .unwrap()
    }

    #[test]
    fn ready_bytes() {
        assert!(classify_response(&[0x16]).is_ready());
        assert!(classify_response(&[0x12]).is_ready());
        assert!(classify_response(&[0x12, 0x00, 0xff]).is_ready());
    }

    #[test]
    fn other_bytes_are_not_ready() {
        match classify_response(&[0x1e]) {
            StatusVerdict::NotReady { status } => assert_eq!(status, 0x1e),
            other => panic!("expected NotReady, got {other:?}"),
        }
        assert!(matches!(
            classify_response(&[0x00, 0x16]),
            StatusVerdict::NotReady { status: 0x00 }
        ));
    }

    #[test]
    fn empty_reply_is_comm_error() {
        match classify_response(&[]) {
            StatusVerdict::CommError(e) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("expected CommError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn probe_sends_status_query() {
        let dialer = MockDialer::new().replies([Reply::status(0x16)]);
        let counters = dialer.counters();
        let mut conn = connect(dialer).await;

        let verdict = StatusProbe::default().check(&mut conn).await;
        assert!(verdict.is_ready());
        assert_eq!(counters.writes(), vec![STATUS_QUERY.to_vec()]);
        conn.release().await;
    }

    #[tokio::test]
    async fn eof_and_read_errors_are_comm_errors() {
        let dialer = MockDialer::new().replies([Reply::Eof, Reply::Error(io::ErrorKind::ConnectionReset)]);
        let mut conn = connect(dialer).await;
        let probe = StatusProbe::default();

        assert!(matches!(probe.check(&mut conn).await, StatusVerdict::CommError(_)));
        match probe.check(&mut conn).await {
            StatusVerdict::CommError(e) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
            other => panic!("expected CommError, got {other:?}"),
        }
        conn.release().await;
    }

    #[tokio::test(start_paused = true)]
    async fn silent_printer_times_out() {
        let dialer = MockDialer::new().default_reply(Reply::Silent);
        let mut conn = connect(dialer).await;

        let started = tokio::time::Instant::now();
        let verdict = StatusProbe::new(Duration::from_secs(5)).check(&mut conn).await;
        match verdict {
            StatusVerdict::CommError(e) => assert_eq!(e.kind(), io::ErrorKind::TimedOut),
            other => panic!("expected CommError, got {other:?}"),
        }
        assert!(started.elapsed() >= Duration::from_secs(5));
        conn.release().await;
    }
}
