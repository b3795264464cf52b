// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Boundary mapping for print outcomes.
//
// Every `PrintOutcome` maps to a fixed HTTP status and message. The mapping
// is total and pure. A mid-print ambiguity gets its own message and severity
// so an operator knows to check the printed output by hand.

use crate::types::PrintOutcome;

/// What the operator should make of an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The job printed.
    Done,
    /// Printer unreachable or busy; trying again later may work.
    Transient,
    /// Someone must attend to the device (paper, cover, power).
    ActionRequired,
    /// The job may or may not have printed. Check the output before resending.
    VerifyManually,
    /// Fault in the relay itself.
    Internal,
}

/// Externally visible result for a print outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disposition {
    /// HTTP status code.
    pub status: u16,
    /// Message returned to the client.
    pub message: &'static str,
    pub severity: Severity,
}

/// Map an outcome to its boundary response.
pub fn classify(outcome: PrintOutcome) -> Disposition {
    match outcome {
        PrintOutcome::Success => Disposition {
            status: 200,
            message: "Printed OK",
            severity: Severity::Done,
        },
        PrintOutcome::PrinterOffline => Disposition {
            status: 503,
            message: "Printer Offline or No Paper",
            severity: Severity::Transient,
        },
        PrintOutcome::PrinterNotReady => Disposition {
            status: 503,
            message: "Printer Offline or No Paper",
            severity: Severity::ActionRequired,
        },
        PrintOutcome::WriteFailure => Disposition {
            status: 500,
            message: "Failed to send message to printer",
            severity: Severity::Transient,
        },
        PrintOutcome::MidPrintAmbiguous => Disposition {
            status: 500,
            message: "Possible Problem During Printing",
            severity: Severity::VerifyManually,
        },
        PrintOutcome::Timeout => Disposition {
            status: 504,
            message: "Request timed out",
            severity: Severity::Transient,
        },
        PrintOutcome::InternalError => Disposition {
            status: 500,
            message: "Internal server error",
            severity: Severity::Internal,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_200_printed_ok() {
        let d = classify(PrintOutcome::Success);
        assert_eq!(d.status, 200);
        assert_eq!(d.message, "Printed OK");
        assert_eq!(d.severity, Severity::Done);
    }

    #[test]
    fn offline_and_not_ready_are_503() {
        assert_eq!(classify(PrintOutcome::PrinterOffline).status, 503);
        assert_eq!(classify(PrintOutcome::PrinterNotReady).status, 503);
        assert_eq!(
            classify(PrintOutcome::PrinterNotReady).severity,
            Severity::ActionRequired
        );
    }

    #[test]
    fn ambiguous_is_distinct_from_success_and_offline() {
        let ambiguous = classify(PrintOutcome::MidPrintAmbiguous);
        assert_eq!(ambiguous.status, 500);
        assert_eq!(ambiguous.message, "Possible Problem During Printing");
        assert_eq!(ambiguous.severity, Severity::VerifyManually);
        assert_ne!(ambiguous, classify(PrintOutcome::Success));
        assert_ne!(ambiguous, classify(PrintOutcome::PrinterOffline));
        assert_ne!(ambiguous.message, classify(PrintOutcome::WriteFailure).message);
    }

    #[test]
    fn timeout_is_504() {
        assert_eq!(classify(PrintOutcome::Timeout).status, 504);
    }
}
