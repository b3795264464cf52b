// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Password hashing (Argon2id, PHC string format).
//
// New hashes are always Argon2id. bcrypt hashes (`$2a$`, `$2b$`, `$2y$`)
// written by older user tools still verify, so existing users files keep
// working until each password is reset.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use printgate_core::error::{PrintgateError, Result};

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PrintgateError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check `password` against a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    if is_bcrypt(hash) {
        return bcrypt::verify(password, hash).unwrap_or(false);
    }
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn is_bcrypt(hash: &str) -> bool {
    ["$2a$", "$2b$", "$2y$"].iter().any(|p| hash.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("correct-horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct-horse", &hash));
        assert!(!verify_password("wrong-horse", &hash));
    }

    #[test]
    fn salts_differ() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("anything", "$2b$truncated"));
    }

    #[test]
    fn legacy_bcrypt_hash_verifies() {
        let legacy = bcrypt::hash("till-password", 4).unwrap();
        assert!(legacy.starts_with("$2b$"));
        assert!(verify_password("till-password", &legacy));
        assert!(!verify_password("other", &legacy));
    }
}
