// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bearer tokens: generation and TTL-bound storage.
//
// One live token per user: issuing a new token replaces the old one.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use printgate_core::error::{PrintgateError, Result};
use ring::rand::{SecureRandom, SystemRandom};
use tracing::debug;

/// Token entropy in bytes (128 bits, hex encoded to 32 chars).
const TOKEN_BYTES: usize = 16;

/// Generate a random 128-bit token as lowercase hex.
pub fn generate_token() -> Result<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| PrintgateError::Token("system random source unavailable".into()))?;
    Ok(hex::encode(bytes))
}

/// Storage for issued tokens, keyed by username.
pub trait TokenStore: Send + Sync {
    /// Store `token` for `username`, replacing any previous token.
    fn set(&self, username: &str, token: &str, ttl: Duration) -> Result<()>;

    /// The live token for `username`, or `None` if missing or expired.
    fn get(&self, username: &str) -> Result<Option<String>>;

    /// Drop any token for `username`.
    fn remove(&self, username: &str) -> Result<()>;
}

struct StoredToken {
    token: String,
    expires_at: Instant,
}

/// Process-local token store. Expired entries are dropped lazily on lookup
/// and swept whenever a new token is stored.
#[derive(Default)]
pub struct InMemoryTokenStore {
    tokens: Mutex<HashMap<String, StoredToken>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, StoredToken>>> {
        self.tokens
            .lock()
            .map_err(|_| PrintgateError::Token("token map lock poisoned".into()))
    }
}

impl TokenStore for InMemoryTokenStore {
    fn set(&self, username: &str, token: &str, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut tokens = self.lock()?;
        tokens.retain(|_, t| t.expires_at > now);
        tokens.insert(
            username.to_string(),
            StoredToken {
                token: token.to_string(),
                expires_at: now + ttl,
            },
        );
        debug!(username, ttl_secs = ttl.as_secs(), "token stored");
        Ok(())
    }

    fn get(&self, username: &str) -> Result<Option<String>> {
        let mut tokens = self.lock()?;
        match tokens.get(username) {
            Some(t) if t.expires_at > Instant::now() => Ok(Some(t.token.clone())),
            Some(_) => {
                tokens.remove(username);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn remove(&self, username: &str) -> Result<()> {
        self.lock()?.remove(username);
        Ok(())
    }
}
