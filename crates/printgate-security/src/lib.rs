// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! printgate-security: credentials for the print relay.
//!
//! Everything here sits in front of the relay engine: the user repository
//! (usernames and password hashes), bearer token issuance with a TTL, and
//! the authenticator that the `/print` route consults before a printer
//! connection is ever opened. Storage is behind traits so the file-backed
//! and in-memory implementations can be swapped at startup.

pub mod auth;
pub mod integrity;
pub mod password;
pub mod token;
pub mod users;

pub use auth::{Authenticator, IssuedToken};
pub use integrity::{fingerprint, hash_bytes};
pub use password::{hash_password, verify_password};
pub use token::{InMemoryTokenStore, TokenStore, generate_token};
pub use users::{InMemoryUserRepository, JsonFileUserRepository, User, UserRepository};
