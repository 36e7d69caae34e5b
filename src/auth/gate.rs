//! Authentication and authorization gates
//!
//! A protected route owns an [`AuthPipeline`]: an ordered list of stages,
//! each of which either continues with an enriched [`RequestContext`] or
//! short-circuits with an [`AuthRejection`]. A pipeline always starts with
//! authentication, so a role check can never run without an identity.

use axum::http::StatusCode;
use thiserror::Error;
use tracing::debug;

use super::token::{IdentityClaims, TokenService};

/// Scheme marker expected at the start of the `Authorization` header.
pub const BEARER_PREFIX: &str = "Bearer ";

/// User-visible rejection produced by a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthRejection {
    #[error("Unauthorized: No token provided")]
    NoCredential,
    #[error("Forbidden: Invalid token")]
    InvalidCredential,
    #[error("Forbidden: Insufficient role")]
    InsufficientRole,
}

impl AuthRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NoCredential => StatusCode::UNAUTHORIZED,
            Self::InvalidCredential | Self::InsufficientRole => StatusCode::FORBIDDEN,
        }
    }
}

/// Per-request state threaded through the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Set only by a successful authentication stage.
    pub identity: Option<IdentityClaims>,
}

impl RequestContext {
    pub fn identity(&self) -> Option<&IdentityClaims> {
        self.identity.as_ref()
    }
}

/// Result of running one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Continue(RequestContext),
    Reject(AuthRejection),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Stage {
    Authenticate,
    RequireRole(String),
}

/// Return the token after the bearer marker, if the header has that form.
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix(BEARER_PREFIX)
}

/// Authentication gate: resolve the `Authorization` header value to an
/// identity.
///
/// Absent or non-bearer headers are `NoCredential`. Every token failure
/// collapses into `InvalidCredential`; the specific reason is only logged.
pub fn authenticate(
    auth_header: Option<&str>,
    tokens: &TokenService,
) -> Result<IdentityClaims, AuthRejection> {
    let Some(token) = auth_header.and_then(extract_bearer) else {
        debug!("Request rejected: no bearer token");
        return Err(AuthRejection::NoCredential);
    };

    tokens.verify(token).map_err(|reason| {
        debug!(%reason, "Request rejected: token verification failed");
        AuthRejection::InvalidCredential
    })
}

/// Authorization gate: exact, case-sensitive role match.
pub fn authorize(identity: &IdentityClaims, required_role: &str) -> Result<(), AuthRejection> {
    if identity.role == required_role {
        Ok(())
    } else {
        debug!(
            user_id = identity.id,
            role = %identity.role,
            required_role,
            "Request rejected: insufficient role"
        );
        Err(AuthRejection::InsufficientRole)
    }
}

/// Ordered gate pipeline for one protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPipeline {
    stages: Vec<Stage>,
}

impl AuthPipeline {
    /// Pipeline that only requires a valid token.
    pub fn authenticated() -> Self {
        Self {
            stages: vec![Stage::Authenticate],
        }
    }

    /// Append a role requirement after authentication.
    pub fn require_role(mut self, role: impl Into<String>) -> Self {
        self.stages.push(Stage::RequireRole(role.into()));
        self
    }

    /// Run every stage in order, stopping at the first rejection.
    pub fn run(&self, auth_header: Option<&str>, tokens: &TokenService) -> StageOutcome {
        let mut ctx = RequestContext::default();

        for stage in &self.stages {
            ctx = match Self::run_stage(stage, ctx, auth_header, tokens) {
                StageOutcome::Continue(next) => next,
                rejected @ StageOutcome::Reject(_) => return rejected,
            };
        }

        StageOutcome::Continue(ctx)
    }

    fn run_stage(
        stage: &Stage,
        mut ctx: RequestContext,
        auth_header: Option<&str>,
        tokens: &TokenService,
    ) -> StageOutcome {
        match stage {
            Stage::Authenticate => match authenticate(auth_header, tokens) {
                Ok(identity) => {
                    ctx.identity = Some(identity);
                    StageOutcome::Continue(ctx)
                }
                Err(rejection) => StageOutcome::Reject(rejection),
            },
            Stage::RequireRole(role) => {
                // Unreachable through the public constructors.
                let Some(identity) = ctx.identity() else {
                    return StageOutcome::Reject(AuthRejection::NoCredential);
                };
                match authorize(identity, role) {
                    Ok(()) => StageOutcome::Continue(ctx),
                    Err(rejection) => StageOutcome::Reject(rejection),
                }
            }
        }
    }
}
