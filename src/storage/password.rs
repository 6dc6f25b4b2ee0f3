// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing with PBKDF2-HMAC-SHA256.
//!
//! Hashes are stored as a self-describing string:
//!
//! ```text
//! pbkdf2-sha256$<iterations>$<salt, base64>$<derived key, base64>
//! ```
//!
//! The iteration count travels with the hash, so raising
//! [`DEFAULT_ITERATIONS`] does not invalidate existing accounts.

use std::num::NonZeroU32;

use base64ct::{Base64Unpadded, Encoding};
use ring::{
    digest::SHA256_OUTPUT_LEN,
    pbkdf2,
    rand::{SecureRandom, SystemRandom},
};

const ALGORITHM_ID: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;

/// Iteration count used for newly created hashes.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("system random number generator failed")]
    Rng,
}

/// Creates and verifies password hashes.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    iterations: NonZeroU32,
    rng: SystemRandom,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::with_iterations(DEFAULT_ITERATIONS)
    }
}

impl PasswordHasher {
    /// Create a hasher with a custom iteration count (tests use a low one).
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations: NonZeroU32::new(iterations).unwrap_or(NonZeroU32::MIN),
            rng: SystemRandom::new(),
        }
    }

    /// Hash a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let mut salt = [0u8; SALT_LEN];
        self.rng.fill(&mut salt).map_err(|_| PasswordError::Rng)?;

        let mut derived = [0u8; SHA256_OUTPUT_LEN];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            self.iterations,
            &salt,
            password.as_bytes(),
            &mut derived,
        );

        Ok(format!(
            "{ALGORITHM_ID}${}${}${}",
            self.iterations,
            Base64Unpadded::encode_string(&salt),
            Base64Unpadded::encode_string(&derived),
        ))
    }

    /// Check a password against a stored hash.
    ///
    /// Malformed hashes never verify. The comparison is constant-time.
    pub fn verify(&self, password: &str, encoded: &str) -> bool {
        let Some((iterations, salt, derived)) = parse_hash(encoded) else {
            return false;
        };

        pbkdf2::verify(
            pbkdf2::PBKDF2_HMAC_SHA256,
            iterations,
            &salt,
            password.as_bytes(),
            &derived,
        )
        .is_ok()
    }
}

fn parse_hash(encoded: &str) -> Option<(NonZeroU32, Vec<u8>, Vec<u8>)> {
    let mut parts = encoded.split('$');
    if parts.next()? != ALGORITHM_ID {
        return None;
    }
    let iterations = parts.next()?.parse::<NonZeroU32>().ok()?;
    let salt = Base64Unpadded::decode_vec(parts.next()?).ok()?;
    let derived = Base64Unpadded::decode_vec(parts.next()?).ok()?;
    if parts.next().is_some() || derived.len() != SHA256_OUTPUT_LEN {
        return None;
    }
    Some((iterations, salt, derived))
}
