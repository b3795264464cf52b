// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Relay configuration.
//
// Loaded from an optional JSON file; every field has a default so a partial
// file (or none at all) is valid. Fast-fail and resilient connection
// behaviour are two settings of the same engine, selected by `connect.mode`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PrintgateError, Result};
use crate::types::RetryPolicy;

/// How the connection manager reaches the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectMode {
    /// One short attempt. Suited to interactive callers.
    FastFail,
    /// Several attempts with increasing pauses. Rides out a busy device.
    Resilient,
}

/// Connection settings for both modes; only the active mode's values are used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectConfig {
    pub mode: ConnectMode,
    /// Dial timeout in fast-fail mode.
    pub fast_fail_timeout_ms: u64,
    /// Per-attempt dial timeout in resilient mode.
    pub resilient_timeout_ms: u64,
    /// Pauses between attempts in resilient mode.
    pub resilient_backoff_ms: Vec<u64>,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            mode: ConnectMode::FastFail,
            fast_fail_timeout_ms: 3_000,
            resilient_timeout_ms: 10_000,
            resilient_backoff_ms: vec![2_000, 4_000],
        }
    }
}

impl ConnectConfig {
    /// The retry policy for the selected mode.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self.mode {
            ConnectMode::FastFail => {
                RetryPolicy::fast_fail(Duration::from_millis(self.fast_fail_timeout_ms))
            }
            ConnectMode::Resilient => RetryPolicy::resilient(
                Duration::from_millis(self.resilient_timeout_ms),
                self.resilient_backoff_ms
                    .iter()
                    .copied()
                    .map(Duration::from_millis)
                    .collect(),
            ),
        }
    }
}

/// Persistent relay settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Address the HTTP server binds to.
    pub listen_addr: String,
    /// `host:port` of the raw-TCP printer.
    pub printer_address: String,
    /// JSON file holding usernames and password hashes.
    pub users_file: PathBuf,
    /// Lifetime of an issued bearer token.
    pub token_ttl_secs: u64,
    /// End-to-end budget for one print session.
    pub session_deadline_secs: u64,
    /// Read deadline for a status probe (same for pre- and post-probe).
    pub probe_timeout_ms: u64,
    /// Appended to every payload to make the printer flush its buffer.
    pub flush_marker: String,
    pub connect: ConnectConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            printer_address: "localhost:9100".into(),
            users_file: PathBuf::from("users.json"),
            token_ttl_secs: 60 * 60,
            session_deadline_secs: 60,
            probe_timeout_ms: 5_000,
            flush_marker: "\n".into(),
            connect: ConnectConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Load from a JSON file and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.flush_marker.is_empty() {
            return Err(PrintgateError::Config("flush_marker must not be empty".into()));
        }
        if self.printer_address.trim().is_empty() {
            return Err(PrintgateError::Config("printer_address must be set".into()));
        }
        if self.probe_timeout_ms == 0 || self.session_deadline_secs == 0 {
            return Err(PrintgateError::Config(
                "probe_timeout_ms and session_deadline_secs must be positive".into(),
            ));
        }
        if self.token_ttl_secs == 0 {
            return Err(PrintgateError::Config("token_ttl_secs must be positive".into()));
        }
        match self.connect.mode {
            ConnectMode::FastFail if self.connect.fast_fail_timeout_ms == 0 => Err(
                PrintgateError::Config("connect.fast_fail_timeout_ms must be positive".into()),
            ),
            ConnectMode::Resilient if self.connect.resilient_timeout_ms == 0 => Err(
                PrintgateError::Config("connect.resilient_timeout_ms must be positive".into()),
            ),
            ConnectMode::Resilient if self.connect.resilient_backoff_ms.is_empty() => {
                Err(PrintgateError::Config(
                    "resilient mode needs at least one entry in connect.resilient_backoff_ms"
                        .into(),
                ))
            }
            _ => Ok(()),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.connect.retry_policy()
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn session_deadline(&self) -> Duration {
        Duration::from_secs(self.session_deadline_secs)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn flush_marker_bytes(&self) -> Vec<u8> {
        self.flush_marker.as_bytes().to_vec()
    }
}
