// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared handler state.

use printgate_print::{Dialer, PrintRelay};
use printgate_security::Authenticator;
use tokio_util::sync::CancellationToken;

/// Application state shared across handlers.
pub struct AppState<D: Dialer> {
    pub relay: PrintRelay<D>,
    pub auth: Authenticator,
    /// Root token; cancelled on shutdown. Each print request runs under a
    /// child of it.
    pub shutdown: CancellationToken,
}

impl<D: Dialer> AppState<D> {
    pub fn new(relay: PrintRelay<D>, auth: Authenticator, shutdown: CancellationToken) -> Self {
        Self {
            relay,
            auth,
            shutdown,
        }
    }
}

impl<D: Dialer> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            relay: self.relay.clone(),
            auth: self.auth.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}
