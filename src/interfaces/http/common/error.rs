//! Mapping from domain errors to `{ "message": ... }` responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::domain::DomainError;

/// Body used by every non-data response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Handler error. Internal details are logged, never returned.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::Conflict(_) => StatusCode::FORBIDDEN,
            DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match &self.0 {
            DomainError::Validation(msg)
            | DomainError::Unauthorized(msg)
            | DomainError::Conflict(msg) => msg.clone(),
            DomainError::NotFound {
                entity,
                field: "id",
                value,
            } => format!("{} with ID {} not found", entity, value),
            DomainError::NotFound { entity, .. } => format!("{} was not found", entity),
            DomainError::Internal(_) => "Something went wrong".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let DomainError::Internal(detail) = &self.0 {
            error!(error = %detail, "Request failed");
        }
        (self.status(), Json(MessageResponse::new(self.message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: DomainError) -> (StatusCode, String) {
        let response = ApiError::from(err).into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: MessageResponse = serde_json::from_slice(&bytes).unwrap();
        (status, body.message)
    }

    #[tokio::test]
    async fn conflict_is_forbidden() {
        let (status, message) =
            body_of(DomainError::Conflict("The email already exists".into())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(message, "The email already exists");
    }

    #[tokio::test]
    async fn not_found_messages() {
        let (status, message) = body_of(DomainError::user_not_found(7)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(message, "User with ID 7 not found");

        let (_, message) = body_of(DomainError::NotFound {
            entity: "User",
            field: "email",
            value: "x@y.z".into(),
        })
        .await;
        assert_eq!(message, "User was not found");
    }

    #[tokio::test]
    async fn internal_detail_is_hidden() {
        let (status, message) =
            body_of(DomainError::Internal("Database error: disk full".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Something went wrong");
    }
}
