// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content fingerprints — SHA-256 digests used to identify image payloads in
// logs without printing the bytes.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
pub fn fingerprint(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// First 12 hex digits of the fingerprint, for log lines.
pub fn short_fingerprint(data: &[u8]) -> String {
    let mut digest = fingerprint(data);
    digest.truncate(12);
    digest
}
