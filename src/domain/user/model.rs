use chrono::{DateTime, Utc};

use crate::auth::{HashedCredential, IdentityClaims};

/// Role assigned when registration does not name one.
pub const DEFAULT_ROLE: &str = "user";

/// Role required by administrative routes.
pub const ADMIN_ROLE: &str = "admin";

/// Persisted user account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub username: String,
    /// Unique across all users
    pub email: String,
    pub password_hash: HashedCredential,
    /// Free-form role string, compared by exact match
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Snapshot of this record to embed in a session token.
    pub fn identity(&self) -> IdentityClaims {
        IdentityClaims {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
        }
    }
}
