//! Account API handlers

use axum::{extract::State, http::StatusCode, Extension, Json};

use super::dto::{
    LoginRequest, LoginResponse, RegisterRequest, UpdateEmailRequest, UpdateRoleRequest, UserInfo,
};
use crate::application::{RegisterInput, SharedAccountService};
use crate::auth::IdentityClaims;
use crate::domain::DomainError;
use crate::interfaces::http::common::{ApiError, MessageResponse, ValidatedJson};

/// Account handler state
#[derive(Clone)]
pub struct AccountsState {
    pub service: SharedAccountService,
}

#[utoipa::path(
    post,
    path = "/register",
    tag = "Accounts",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = MessageResponse),
        (status = 400, description = "Missing fields", body = MessageResponse),
        (status = 403, description = "Email already in use", body = MessageResponse)
    )
)]
pub async fn register(
    State(state): State<AccountsState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let user = state
        .service
        .register(RegisterInput {
            username: request.username,
            email: request.email,
            password: request.password,
            role: request.role,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(format!(
            "User {} was created",
            user.username
        ))),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Accounts",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token issued", body = LoginResponse),
        (status = 401, description = "Incorrect password", body = MessageResponse),
        (status = 404, description = "Unknown email", body = MessageResponse)
    )
)]
pub async fn login(
    State(state): State<AccountsState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let outcome = state
        .service
        .login(&request.email, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        token: outcome.token,
        token_type: outcome.token_type,
        expires_in: outcome.expires_in,
    }))
}

#[utoipa::path(
    put,
    path = "/update-email",
    tag = "Accounts",
    request_body = UpdateEmailRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Email updated", body = UserInfo),
        (status = 401, description = "No token", body = MessageResponse),
        (status = 403, description = "Invalid token or email in use", body = MessageResponse),
        (status = 404, description = "Account no longer exists", body = MessageResponse)
    )
)]
pub async fn update_email(
    State(state): State<AccountsState>,
    Extension(caller): Extension<IdentityClaims>,
    ValidatedJson(request): ValidatedJson<UpdateEmailRequest>,
) -> Result<Json<UserInfo>, ApiError> {
    let user = state.service.update_email(&caller, &request.email).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    delete,
    path = "/delete-account",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 401, description = "No token", body = MessageResponse),
        (status = 403, description = "Invalid token", body = MessageResponse),
        (status = 404, description = "Account no longer exists", body = MessageResponse)
    )
)]
pub async fn delete_account(
    State(state): State<AccountsState>,
    Extension(caller): Extension<IdentityClaims>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.service.delete_account(&caller).await?;
    Ok(Json(MessageResponse::new(format!(
        "user with ID {} was deleted",
        caller.id
    ))))
}

#[utoipa::path(
    put,
    path = "/update-role",
    tag = "Accounts",
    request_body = UpdateRoleRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Role updated", body = MessageResponse),
        (status = 400, description = "Missing fields", body = MessageResponse),
        (status = 401, description = "No token", body = MessageResponse),
        (status = 403, description = "Invalid token or caller is not an admin", body = MessageResponse),
        (status = 404, description = "Unknown user", body = MessageResponse)
    )
)]
pub async fn update_role(
    State(state): State<AccountsState>,
    ValidatedJson(request): ValidatedJson<UpdateRoleRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    // `required` validation guarantees the id is present.
    let Some(user_id) = request.id else {
        return Err(DomainError::Validation("All fields are required".into()).into());
    };

    state.service.update_role(user_id, &request.role).await?;
    Ok(Json(MessageResponse::new(format!(
        "User with id {} was updated",
        user_id
    ))))
}
