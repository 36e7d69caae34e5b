//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::SharedAccountService;
use crate::auth::AuthPipeline;
use crate::domain::ADMIN_ROLE;
use crate::interfaces::http::common::MessageResponse;
use crate::interfaces::http::middleware::{require_auth, AuthGate};

use super::modules::{accounts, health};

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Session token from /login"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        accounts::register,
        accounts::login,
        accounts::update_email,
        accounts::delete_account,
        accounts::update_role,
    ),
    components(
        schemas(
            MessageResponse,
            health::HealthResponse,
            health::ComponentHealth,
            accounts::RegisterRequest,
            accounts::LoginRequest,
            accounts::LoginResponse,
            accounts::UpdateEmailRequest,
            accounts::UpdateRoleRequest,
            accounts::UserInfo,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Server health check endpoints"),
        (name = "Accounts", description = "Registration, login, self-service and role administration"),
    ),
    info(
        title = "Account Service API",
        version = "1.0.0",
        description = "User accounts with signed session tokens and role-gated administration",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes.
///
/// `db` is only used by the health check; pass `None` when the accounts
/// live in memory.
pub fn create_api_router(service: SharedAccountService, db: Option<DatabaseConnection>) -> Router {
    let tokens = service.tokens().clone();
    let state = accounts::AccountsState { service };

    let authenticated = AuthGate::new(tokens.clone(), AuthPipeline::authenticated());
    let admin_only = AuthGate::new(tokens, AuthPipeline::authenticated().require_role(ADMIN_ROLE));

    // Public
    let public_routes = Router::new()
        .route("/register", post(accounts::register))
        .route("/login", post(accounts::login))
        .with_state(state.clone());

    // Any authenticated caller
    let self_service_routes = Router::new()
        .route("/update-email", put(accounts::update_email))
        .route("/delete-account", delete(accounts::delete_account))
        .route_layer(middleware::from_fn_with_state(authenticated, require_auth))
        .with_state(state.clone());

    // Admins only
    let admin_routes = Router::new()
        .route("/update-role", put(accounts::update_role))
        .route_layer(middleware::from_fn_with_state(admin_only, require_auth))
        .with_state(state);

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(health::HealthState {
            db,
            started_at: Arc::new(Instant::now()),
        });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(public_routes)
        .merge(self_service_routes)
        .merge(admin_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, HeaderValue, Method, Request, StatusCode};
    use chrono::Duration;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::application::AccountService;
    use crate::auth::{CredentialHasher, TokenService};
    use crate::domain::UserStore;
    use crate::infrastructure::InMemoryUserStore;

    const SECRET: &str = "router-test-secret";

    fn app() -> Router {
        let store: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
        let service = AccountService::new(
            store,
            TokenService::new(SECRET, Duration::hours(1)),
            CredentialHasher::new(4),
        );
        create_api_router(Arc::new(service), None)
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn register(app: &Router, name: &str, email: &str, role: Option<&str>) {
        let mut body = json!({"username": name, "email": email, "password": "pa55word"});
        if let Some(role) = role {
            body["role"] = json!(role);
        }
        let (status, _) = call(app, Method::POST, "/register", None, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    async fn login(app: &Router, email: &str) -> String {
        let (status, body) = call(
            app,
            Method::POST,
            "/login",
            None,
            Some(json!({"email": email, "password": "pa55word"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn register_then_login() {
        let app = app();
        let (status, body) = call(
            &app,
            Method::POST,
            "/register",
            None,
            Some(json!({"username": "erin", "email": "e@x.com", "password": "pa55word"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "User erin was created");

        let (status, body) = call(
            &app,
            Method::POST,
            "/login",
            None,
            Some(json!({"email": "e@x.com", "password": "pa55word"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "Bearer");
        assert_eq!(body["expires_in"], 3600);

        let claims = TokenService::new(SECRET, Duration::hours(1))
            .verify(body["token"].as_str().unwrap())
            .unwrap();
        assert_eq!(claims.email, "e@x.com");
        assert_eq!(claims.role, "user");
    }

    #[tokio::test]
    async fn register_errors() {
        let app = app();
        let (status, body) = call(&app, Method::POST, "/register", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "All fields are required");

        register(&app, "erin", "e@x.com", None).await;
        let (status, body) = call(
            &app,
            Method::POST,
            "/register",
            None,
            Some(json!({"username": "other", "email": "e@x.com", "password": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "The email already exists");
    }

    #[tokio::test]
    async fn login_errors() {
        let app = app();
        register(&app, "erin", "e@x.com", None).await;

        let (status, _) = call(
            &app,
            Method::POST,
            "/login",
            None,
            Some(json!({"email": "nobody@x.com", "password": "pa55word"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(
            &app,
            Method::POST,
            "/login",
            None,
            Some(json!({"email": "e@x.com", "password": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Incorrect password");
    }

    #[tokio::test]
    async fn protected_routes_reject_missing_and_bad_tokens() {
        let app = app();

        let (status, body) = call(&app, Method::DELETE, "/delete-account", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Unauthorized: No token provided");

        let (status, body) =
            call(&app, Method::DELETE, "/delete-account", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Forbidden: Invalid token");

        let foreign = TokenService::new("some-other-secret", Duration::hours(1))
            .issue(&crate::auth::IdentityClaims {
                id: 1,
                username: "mallory".into(),
                email: "m@x.com".into(),
                role: "admin".into(),
            })
            .unwrap();
        let (status, _) = call(
            &app,
            Method::PUT,
            "/update-role",
            Some(&foreign),
            Some(json!({"id": 1, "role": "admin"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn non_utf8_authorization_header_counts_as_missing() {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri("/delete-account")
            .header(
                header::AUTHORIZATION,
                HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap(),
            )
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Unauthorized: No token provided");
    }

    #[tokio::test]
    async fn update_role_requires_admin() {
        let app = app();
        register(&app, "erin", "e@x.com", None).await;
        register(&app, "root", "root@x.com", Some("admin")).await;
        let user_token = login(&app, "e@x.com").await;
        let admin_token = login(&app, "root@x.com").await;

        let (status, body) = call(
            &app,
            Method::PUT,
            "/update-role",
            Some(&user_token),
            Some(json!({"id": 1, "role": "admin"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Forbidden: Insufficient role");

        let (status, body) = call(
            &app,
            Method::PUT,
            "/update-role",
            Some(&admin_token),
            Some(json!({"id": 1, "role": "admin"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User with id 1 was updated");

        // The old token still carries the old role.
        let (status, _) = call(
            &app,
            Method::PUT,
            "/update-role",
            Some(&user_token),
            Some(json!({"id": 2, "role": "user"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(
            &app,
            Method::PUT,
            "/update-role",
            Some(&admin_token),
            Some(json!({"id": 99, "role": "admin"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(
            &app,
            Method::PUT,
            "/update-role",
            Some(&admin_token),
            Some(json!({"role": "admin"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_email_then_delete() {
        let app = app();
        register(&app, "erin", "e@x.com", None).await;
        register(&app, "finn", "f@x.com", None).await;
        let token = login(&app, "e@x.com").await;

        let (status, body) = call(
            &app,
            Method::PUT,
            "/update-email",
            Some(&token),
            Some(json!({"email": "f@x.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "The email already exists");

        let (status, body) = call(
            &app,
            Method::PUT,
            "/update-email",
            Some(&token),
            Some(json!({"email": "erin@x.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "erin@x.com");
        assert_eq!(body["username"], "erin");
        assert_eq!(body["role"], "user");

        let (status, body) = call(&app, Method::DELETE, "/delete-account", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "user with ID 1 was deleted");

        // Token outlives the account; the store reports it gone.
        let (status, _) = call(&app, Method::DELETE, "/delete-account", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_without_database() {
        let (status, body) = call(&app(), Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body.get("database").is_none());
    }
}
