// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Payload decoding.
//
// Clients send either standard (padded) base64 or literal text. Anything
// that does not decode as base64 is printed verbatim. Decoding never fails,
// and every payload ends with the flush marker that makes the printer commit
// its receive buffer.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, warn};

/// Default flush marker: a single line feed.
pub const DEFAULT_FLUSH_MARKER: &[u8] = b"\n";

/// Turns client messages into device bytes.
#[derive(Debug, Clone)]
pub struct PayloadDecoder {
    flush_marker: Vec<u8>,
}

impl Default for PayloadDecoder {
    fn default() -> Self {
        Self {
            flush_marker: DEFAULT_FLUSH_MARKER.to_vec(),
        }
    }
}

impl PayloadDecoder {
    /// Use `flush_marker` as the trailer. An empty marker falls back to the
    /// default so the output is never empty.
    pub fn new(flush_marker: impl Into<Vec<u8>>) -> Self {
        let flush_marker = flush_marker.into();
        if flush_marker.is_empty() {
            warn!("empty flush marker, using line feed");
            return Self::default();
        }
        Self { flush_marker }
    }

    pub fn flush_marker(&self) -> &[u8] {
        &self.flush_marker
    }

    /// Decode `message` and append the flush marker.
    pub fn decode(&self, message: &str) -> Vec<u8> {
        let mut bytes = match STANDARD.decode(message) {
            Ok(decoded) => {
                debug!(len = decoded.len(), "message decoded as base64");
                decoded
            }
            Err(_) => {
                debug!(len = message.len(), "message is not base64, sending as text");
                message.as_bytes().to_vec()
            }
        };
        bytes.extend_from_slice(&self.flush_marker);
        bytes
    }
}
