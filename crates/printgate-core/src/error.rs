// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Printgate.
//
// These cover infrastructure failures (config, storage, startup). The outcome
// of an individual print job is not an error: see `types::PrintOutcome`.

use thiserror::Error;

/// Top-level error type for all Printgate operations.
#[derive(Debug, Error)]
pub enum PrintgateError {
    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Credentials --
    #[error("user store error: {0}")]
    UserStore(String),

    #[error("token store error: {0}")]
    Token(String),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    // -- Runtime --
    #[error("server error: {0}")]
    Server(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PrintgateError>;
