// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Payload fingerprints: SHA-256 digests for log correlation.
//
// Job history is never stored, so the digest is the only trace of a payload
// that reaches the logs.

use sha2::{Digest, Sha256};

/// Hex length of the short fingerprint used in log fields.
const FINGERPRINT_LEN: usize = 16;

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Short prefix of [`hash_bytes`], enough to tell jobs apart in logs.
pub fn fingerprint(data: &[u8]) -> String {
    let mut full = hash_bytes(data);
    full.truncate(FINGERPRINT_LEN);
    full
}
