//! Authentication middleware for Axum
//!
//! Runs an [`AuthPipeline`] against the `Authorization` header. On success
//! the caller's [`IdentityClaims`] are stored in request extensions for
//! handlers to read with `Extension<IdentityClaims>`.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::auth::{AuthPipeline, AuthRejection, IdentityClaims, StageOutcome, TokenService};

use super::common::MessageResponse;

/// Middleware state: the token verifier plus the stages a route requires
#[derive(Clone)]
pub struct AuthGate {
    pub tokens: TokenService,
    pub pipeline: Arc<AuthPipeline>,
}

impl AuthGate {
    pub fn new(tokens: TokenService, pipeline: AuthPipeline) -> Self {
        Self {
            tokens,
            pipeline: Arc::new(pipeline),
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (self.status(), Json(MessageResponse::new(self.to_string()))).into_response()
    }
}

pub async fn require_auth(
    State(gate): State<AuthGate>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match gate.pipeline.run(auth_header, &gate.tokens) {
        StageOutcome::Continue(ctx) => {
            // Pipelines always start with authentication.
            let Some(identity) = ctx.identity else {
                return AuthRejection::NoCredential.into_response();
            };
            request.extensions_mut().insert::<IdentityClaims>(identity);
            next.run(request).await
        }
        StageOutcome::Reject(rejection) => rejection.into_response(),
    }
}
