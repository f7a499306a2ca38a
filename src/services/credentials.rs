// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing and verification.
//!
//! A password is stored as `HMAC-SHA512(key = salt, msg = utf8(password))`
//! where the salt is a fresh random HMAC key per credential. Plaintext is
//! never stored or logged.
//!
//! A memory-hard function (Argon2) would be stronger against offline
//! guessing; swapping it in only has to keep the `(hash, salt)` contract of
//! [`CredentialStore::verify_password`].

use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Salt length: one HMAC-SHA512 block, the natural key size.
pub const SALT_LEN: usize = 128;

/// Hash length: one SHA-512 digest.
pub const HASH_LEN: usize = 64;

/// Output of [`CredentialStore::hash_password`].
#[derive(Debug, Clone)]
pub struct PasswordCredential {
    pub hash: Vec<u8>,
    pub salt: Vec<u8>,
}

/// Turns plaintext passwords into salted keyed hashes and checks them.
#[derive(Clone)]
pub struct CredentialStore {
    rng: SystemRandom,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }

    /// Hash `plaintext` under a freshly generated salt.
    ///
    /// Imposes no length or charset rules; callers validate input.
    pub fn hash_password(&self, plaintext: &str) -> anyhow::Result<PasswordCredential> {
        let mut salt = vec![0u8; SALT_LEN];
        self.rng
            .fill(&mut salt)
            .map_err(|_| anyhow::anyhow!("System RNG failure while generating salt"))?;

        let hash = keyed_hash(&salt, plaintext)?.finalize().into_bytes().to_vec();

        Ok(PasswordCredential { hash, salt })
    }

    /// Whether `plaintext` hashes to `hash` under `salt`.
    ///
    /// The comparison is constant-time. A malformed stored hash is simply a
    /// mismatch.
    pub fn verify_password(&self, plaintext: &str, hash: &[u8], salt: &[u8]) -> bool {
        match keyed_hash(salt, plaintext) {
            Ok(mac) => mac.verify_slice(hash).is_ok(),
            Err(_) => false,
        }
    }
}

fn keyed_hash(salt: &[u8], plaintext: &str) -> anyhow::Result<HmacSha512> {
    let mut mac = HmacSha512::new_from_slice(salt)
        .map_err(|e| anyhow::anyhow!("HMAC init failed: {}", e))?;
    mac.update(plaintext.as_bytes());
    Ok(mac)
}
