//! Authentication and Authorization module
//!
//! Password hashing, signed session tokens, and the gate pipeline that
//! protects routes.

pub mod gate;
pub mod password;
pub mod token;

pub use gate::{
    authenticate, authorize, extract_bearer, AuthPipeline, AuthRejection, RequestContext,
    StageOutcome,
};
pub use password::{CredentialHasher, HashedCredential, HashingError};
pub use token::{IdentityClaims, TokenClaims, TokenError, TokenService, DEFAULT_TOKEN_TTL_SECS};
