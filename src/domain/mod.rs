pub mod user;

pub use user::{NewUser, User, UserChanges, UserStore, ADMIN_ROLE, DEFAULT_ROLE};

// Re-export DomainError from shared for convenience
pub use crate::shared::errors::{DomainError, DomainResult};
