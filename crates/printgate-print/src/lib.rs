// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printgate Print: the relay engine.
//
// A print request flows Decode → Connect → Probe → Send → Probe. Each stage
// lives in its own module; `session` strings them together as an explicit
// state machine and `relay` is the entry point the HTTP layer calls.

pub mod connect;
pub mod gate;
pub mod payload;
pub mod probe;
pub mod relay;
pub mod session;
pub mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod mock;

pub use connect::{ConnectError, ConnectionManager, PrinterConnection};
pub use gate::PrinterGate;
pub use payload::PayloadDecoder;
pub use probe::StatusProbe;
pub use relay::PrintRelay;
pub use session::{PrintSession, SessionReport};
pub use transport::{Dialer, PrinterLink, TcpDialer};
