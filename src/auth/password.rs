//! Password hashing
//!
//! One-way bcrypt hashing with a configurable work factor. Plaintext never
//! leaves this module and is never logged.

use std::fmt;

use bcrypt::{hash, verify};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Hashing failed inside bcrypt (bad cost, RNG failure). Not expected in
/// normal operation.
#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct HashingError(#[from] bcrypt::BcryptError);

/// A stored bcrypt hash. There is no way back to the plaintext.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashedCredential(String);

impl HashedCredential {
    /// Wrap a hash read back from storage.
    pub fn from_stored(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for HashedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedCredential(..)")
    }
}

/// Salted adaptive hasher with a fixed work factor.
#[derive(Debug, Clone, Copy)]
pub struct CredentialHasher {
    cost: u32,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl CredentialHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password. Two calls with the same input yield
    /// different hashes (random salt).
    pub fn hash(&self, plaintext: &str) -> Result<HashedCredential, HashingError> {
        Ok(HashedCredential(hash(plaintext, self.cost)?))
    }

    /// Check a candidate against a stored hash.
    ///
    /// A wrong password is `false`, never an error. A stored value that is
    /// not a parseable bcrypt hash is also `false`.
    pub fn verify(&self, plaintext: &str, stored: &HashedCredential) -> bool {
        match verify(plaintext, stored.as_str()) {
            Ok(matches) => matches,
            Err(e) => {
                warn!(error = %e, "Stored password hash could not be checked");
                false
            }
        }
    }
}
