// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Authenticator: password login and bearer token validation.
//
// A token is only valid while its user still exists in the repository, so
// deleting a user revokes their outstanding token even though the token
// store itself knows nothing about users.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use printgate_core::error::{PrintgateError, Result};
use subtle::ConstantTimeEq;
use tracing::{info, instrument, warn};

use crate::password::verify_password;
use crate::token::{TokenStore, generate_token};
use crate::users::UserRepository;

/// A freshly issued bearer token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Validates credentials against injected user and token stores.
#[derive(Clone)]
pub struct Authenticator {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenStore>,
    ttl: Duration,
}

impl Authenticator {
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<dyn TokenStore>, ttl: Duration) -> Self {
        Self { users, tokens, ttl }
    }

    /// Verify a password and issue a token. `Ok(None)` means bad credentials.
    #[instrument(skip(self, password))]
    pub fn login(&self, username: &str, password: &str) -> Result<Option<IssuedToken>> {
        let Some(user) = self.users.find(username)? else {
            info!("login rejected: unknown user");
            return Ok(None);
        };
        if !verify_password(password, &user.password_hash) {
            info!("login rejected: wrong password");
            return Ok(None);
        }

        let token = generate_token()?;
        self.tokens.set(username, &token, self.ttl)?;
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| PrintgateError::Token(format!("token ttl out of range: {e}")))?;
        info!(ttl_secs = self.ttl.as_secs(), "token issued");
        Ok(Some(IssuedToken {
            token,
            expires_at: Utc::now() + ttl,
        }))
    }

    /// Whether `token` is the live token for `username`.
    ///
    /// Store failures count as invalid; they are logged, not surfaced.
    #[instrument(skip(self, token))]
    pub fn validate(&self, username: &str, token: &str) -> bool {
        if username.is_empty() || token.is_empty() {
            return false;
        }
        let stored = match self.tokens.get(username) {
            Ok(Some(stored)) => stored,
            Ok(None) => return false,
            Err(e) => {
                warn!(error = %e, "token lookup failed");
                return false;
            }
        };
        // Length mismatch short-circuits to false; token length is public.
        let matches: bool = stored.as_bytes().ct_eq(token.as_bytes()).into();
        if !matches {
            return false;
        }
        match self.users.find(username) {
            Ok(Some(_)) => true,
            Ok(None) => {
                info!("token presented for a deleted user; revoking");
                if let Err(e) = self.tokens.remove(username) {
                    warn!(error = %e, "token revocation failed");
                }
                false
            }
            Err(e) => {
                warn!(error = %e, "user lookup failed during token validation");
                false
            }
        }
    }

    /// Drop any live token for `username`.
    pub fn revoke(&self, username: &str) -> Result<()> {
        self.tokens.remove(username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::hash_password;
    use crate::token::InMemoryTokenStore;
    use crate::users::{InMemoryUserRepository, User};

    fn authenticator() -> (Authenticator, Arc<InMemoryUserRepository>) {
        let users = Arc::new(InMemoryUserRepository::new());
        users
            .upsert(User {
                username: "till-1".into(),
                password_hash: hash_password("s3cret").unwrap(),
            })
            .unwrap();
        let auth = Authenticator::new(
            users.clone(),
            Arc::new(InMemoryTokenStore::new()),
            Duration::from_secs(3600),
        );
        (auth, users)
    }

    #[test]
    fn login_then_validate() {
        let (auth, _) = authenticator();
        let issued = auth.login("till-1", "s3cret").unwrap().unwrap();
        assert!(issued.expires_at > Utc::now());
        assert!(auth.validate("till-1", &issued.token));
        assert!(!auth.validate("till-1", "not-the-token"));
        assert!(!auth.validate("other", &issued.token));
    }

    #[test]
    fn bad_password_issues_nothing() {
        let (auth, _) = authenticator();
        assert!(auth.login("till-1", "guess").unwrap().is_none());
        assert!(auth.login("nobody", "s3cret").unwrap().is_none());
    }

    #[test]
    fn relogin_invalidates_old_token() {
        let (auth, _) = authenticator();
        let first = auth.login("till-1", "s3cret").unwrap().unwrap();
        let second = auth.login("till-1", "s3cret").unwrap().unwrap();
        assert!(!auth.validate("till-1", &first.token));
        assert!(auth.validate("till-1", &second.token));
    }

    #[test]
    fn deleting_user_revokes_token() {
        let (auth, users) = authenticator();
        let issued = auth.login("till-1", "s3cret").unwrap().unwrap();
        users.remove("till-1").unwrap();
        assert!(!auth.validate("till-1", &issued.token));
    }

    #[test]
    fn token_of_different_length_rejected() {
        let (auth, _) = authenticator();
        let issued = auth.login("till-1", "s3cret").unwrap().unwrap();
        let truncated = &issued.token[..issued.token.len() - 1];
        let extended = format!("{}0", issued.token);
        assert!(!auth.validate("till-1", truncated));
        assert!(!auth.validate("till-1", &extended));
        assert!(auth.validate("till-1", &issued.token));
    }

    #[test]
    fn empty_credentials_rejected() {
        let (auth, _) = authenticator();
        assert!(!auth.validate("", ""));
        assert!(!auth.validate("till-1", ""));
    }
}
