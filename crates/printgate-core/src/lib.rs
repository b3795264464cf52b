// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// printgate-core: core types, configuration and error definitions shared across
// all crates.

pub mod config;
pub mod error;
pub mod outcome;
pub mod types;

pub use config::RelayConfig;
pub use error::PrintgateError;
pub use outcome::{Disposition, classify};
pub use types::*;
