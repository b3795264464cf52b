// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Connection manager: dial the printer under a retry policy.
//
// Each attempt is bounded by the policy's connect timeout. After a failed
// attempt the manager sleeps for the next listed backoff and tries again.
// When the list is used up it gives up. A policy with N backoff entries
// therefore dials at most N + 1 times. The session deadline is enforced one
// level up, so a sleep or dial in flight is simply dropped when it passes.

use std::io;
use std::time::Duration;

use printgate_core::types::RetryPolicy;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::transport::{Dialer, PrinterLink};

/// The printer could not be reached within the retry policy.
#[derive(Debug, Error)]
#[error("printer {address} unreachable after {attempts} attempt(s): {last_error}")]
pub struct ConnectError {
    pub address: String,
    pub attempts: usize,
    pub last_error: io::Error,
}

/// An open, exclusively owned connection to a printer.
///
/// `release` consumes the connection, so it can run at most once. A
/// connection dropped without release still closes its socket through the
/// link's own `Drop`, which covers a cancelled session.
pub struct PrinterConnection<L: PrinterLink> {
    link: Option<L>,
    address: String,
}

impl<L: PrinterLink> PrinterConnection<L> {
    pub fn new(link: L, address: impl Into<String>) -> Self {
        Self {
            link: Some(link),
            address: address.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.link_mut()?.write_all(data).await
    }

    pub async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.link_mut()?.read(buf).await
    }

    /// Close the connection. Close errors are logged, not returned: the
    /// session outcome is already decided by the time this runs.
    pub async fn release(mut self) {
        if let Some(mut link) = self.link.take() {
            match link.close().await {
                Ok(()) => debug!(address = %self.address, "printer connection released"),
                Err(e) => {
                    debug!(address = %self.address, error = %e, "close failed on release")
                }
            }
        }
    }

    fn link_mut(&mut self) -> io::Result<&mut L> {
        self.link
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "connection released"))
    }
}

impl<L: PrinterLink> Drop for PrinterConnection<L> {
    fn drop(&mut self) {
        if self.link.is_some() {
            debug!(address = %self.address, "printer connection dropped without release");
        }
    }
}

/// Dials printers according to a [`RetryPolicy`].
pub struct ConnectionManager<D: Dialer> {
    dialer: D,
    policy: RetryPolicy,
}

impl<D: Dialer> ConnectionManager<D> {
    pub fn new(dialer: D, policy: RetryPolicy) -> Self {
        Self { dialer, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Dial `address`, retrying per policy.
    #[instrument(skip(self), fields(max_attempts = self.policy.max_attempts()))]
    pub async fn connect(&self, address: &str) -> Result<PrinterConnection<D::Link>, ConnectError> {
        let mut backoff = self.policy.backoff.iter();
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            let last_error = match self.dial_once(address).await {
                Ok(link) => {
                    info!(attempt, "connected to printer");
                    return Ok(PrinterConnection::new(link, address));
                }
                Err(e) => e,
            };

            match backoff.next() {
                Some(delay) => {
                    warn!(
                        attempt,
                        error = %last_error,
                        delay_ms = delay.as_millis() as u64,
                        "dial failed, backing off"
                    );
                    tokio::time::sleep(*delay).await;
                }
                None => {
                    warn!(attempt, error = %last_error, "dial failed, retry policy exhausted");
                    return Err(ConnectError {
                        address: address.to_string(),
                        attempts: attempt,
                        last_error,
                    });
                }
            }
        }
    }

    async fn dial_once(&self, address: &str) -> io::Result<D::Link> {
        let timeout: Duration = self.policy.connect_timeout;
        match tokio::time::timeout(timeout, self.dialer.dial(address)).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("connect timed out after {}ms", timeout.as_millis()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{DialStep, MockDialer};
    use tokio::time::Instant;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[tokio::test(start_paused = true)]
    async fn fast_fail_dials_once() {
        let dialer = MockDialer::new().refuse(5);
        let probe = dialer.counters();
        let manager = ConnectionManager::new(dialer, RetryPolicy::fast_fail(secs(3)));

        let err = manager.connect("printer:9100").await.err().unwrap();
        assert_eq!(err.attempts, 1);
        assert_eq!(probe.dials(), 1);
        assert_eq!(err.last_error.kind(), io::ErrorKind::ConnectionRefused);
    }

    #[tokio::test(start_paused = true)]
    async fn n_backoffs_mean_at_most_n_plus_one_dials() {
        let dialer = MockDialer::new().refuse(100);
        let counters = dialer.counters();
        let policy = RetryPolicy::resilient(secs(1), vec![secs(1), secs(2), secs(3)]);
        let manager = ConnectionManager::new(dialer, policy);

        let err = manager.connect("printer:9100").await.err().unwrap();
        assert_eq!(err.attempts, 4);
        assert_eq!(counters.dials(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn third_attempt_succeeds_after_backoff() {
        let dialer = MockDialer::new().refuse(2);
        let counters = dialer.counters();
        let policy = RetryPolicy::resilient(secs(10), vec![secs(2), secs(4)]);
        let manager = ConnectionManager::new(dialer, policy);

        let started = Instant::now();
        let conn = manager.connect("printer:9100").await.unwrap();
        assert!(started.elapsed() >= secs(6));
        assert_eq!(counters.dials(), 3);
        conn.release().await;
        assert_eq!(counters.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_dial_times_out_per_attempt() {
        let dialer = MockDialer::new().script([DialStep::Hang, DialStep::Accept]);
        let counters = dialer.counters();
        let policy = RetryPolicy::resilient(secs(3), vec![secs(1)]);
        let manager = ConnectionManager::new(dialer, policy);

        let started = Instant::now();
        let conn = manager.connect("printer:9100").await.unwrap();
        assert!(started.elapsed() >= secs(4));
        assert_eq!(counters.dials(), 2);
        conn.release().await;
    }

    #[tokio::test]
    async fn release_closes_link_once() {
        let dialer = MockDialer::new();
        let counters = dialer.counters();
        let manager = ConnectionManager::new(dialer, RetryPolicy::fast_fail(secs(1)));
        let mut conn = manager.connect("printer:9100").await.unwrap();
        conn.write_all(b"x").await.unwrap();
        conn.release().await;
        assert_eq!(counters.closes(), 1);
    }
}
