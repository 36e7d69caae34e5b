//! Account service: application-layer orchestration
//!
//! All account business logic lives here. HTTP handlers are thin wrappers
//! that delegate to this service.

use std::sync::Arc;

use tracing::info;

use crate::auth::{CredentialHasher, HashedCredential, IdentityClaims, TokenService};
use crate::domain::{
    DomainError, DomainResult, NewUser, User, UserChanges, UserStore, ADMIN_ROLE, DEFAULT_ROLE,
};

/// Input for creating an account. `role` falls back to [`DEFAULT_ROLE`].
#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

/// Service shared by the HTTP handlers.
pub type SharedAccountService = Arc<AccountService<dyn UserStore>>;

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn email_exists() -> DomainError {
    DomainError::Conflict("The email already exists".into())
}

/// Account use cases over any [`UserStore`]. The HTTP layer uses
/// `dyn UserStore`.
pub struct AccountService<S: UserStore + ?Sized> {
    store: Arc<S>,
    tokens: TokenService,
    hasher: CredentialHasher,
}

impl<S: UserStore + ?Sized> AccountService<S> {
    pub fn new(store: Arc<S>, tokens: TokenService, hasher: CredentialHasher) -> Self {
        Self {
            store,
            tokens,
            hasher,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    // bcrypt runs on the blocking pool.
    async fn hash_password(&self, password: String) -> DomainResult<HashedCredential> {
        let hasher = self.hasher;
        let hashed = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| DomainError::Internal(format!("Hashing task failed: {}", e)))??;
        Ok(hashed)
    }

    async fn verify_password(
        &self,
        password: String,
        stored: HashedCredential,
    ) -> DomainResult<bool> {
        let hasher = self.hasher;
        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
            .await
            .map_err(|e| DomainError::Internal(format!("Verification task failed: {}", e)))
    }

    // ── Registration ────────────────────────────────────────────

    /// Create an account. The email must not be in use.
    pub async fn register(&self, input: RegisterInput) -> DomainResult<User> {
        if is_blank(&input.username) || is_blank(&input.email) || input.password.is_empty() {
            return Err(DomainError::Validation("All fields are required".into()));
        }

        if self.store.find_by_email(&input.email).await?.is_some() {
            return Err(email_exists());
        }

        let password_hash = self.hash_password(input.password).await?;
        let role = input
            .role
            .filter(|r| !is_blank(r))
            .unwrap_or_else(|| DEFAULT_ROLE.to_string());

        let user = self
            .store
            .create(NewUser {
                username: input.username,
                email: input.email,
                password_hash,
                role,
            })
            .await
            .map_err(|e| match e {
                DomainError::Conflict(_) => email_exists(),
                other => other,
            })?;

        info!(user_id = user.id, username = %user.username, role = %user.role, "New user registered");
        Ok(user)
    }

    // ── Authentication ──────────────────────────────────────────

    /// Check credentials and issue a session token carrying the user's
    /// current identity.
    pub async fn login(&self, email: &str, password: &str) -> DomainResult<LoginOutcome> {
        if is_blank(email) || password.is_empty() {
            return Err(DomainError::Validation("All fields are required".into()));
        }

        let Some(user) = self.store.find_by_email(email).await? else {
            return Err(DomainError::NotFound {
                entity: "User",
                field: "email",
                value: email.to_string(),
            });
        };

        if !self
            .verify_password(password.to_string(), user.password_hash.clone())
            .await?
        {
            return Err(DomainError::Unauthorized("Incorrect password".into()));
        }

        let token = self
            .tokens
            .issue(&user.identity())
            .map_err(|e| DomainError::Internal(format!("Failed to create token: {}", e)))?;

        info!(user_id = user.id, "User logged in");
        Ok(LoginOutcome {
            token,
            token_type: "Bearer".into(),
            expires_in: self.tokens.expires_in(),
            user,
        })
    }

    // ── Self-service ────────────────────────────────────────────

    /// Change the caller's email and return the updated record.
    pub async fn update_email(&self, caller: &IdentityClaims, email: &str) -> DomainResult<User> {
        if is_blank(email) {
            return Err(DomainError::Validation("Email is required".into()));
        }

        if self.store.find_by_email(email).await?.is_some() {
            return Err(email_exists());
        }

        let affected = self
            .store
            .update(caller.id, UserChanges::email(email))
            .await
            .map_err(|e| match e {
                DomainError::Conflict(_) => email_exists(),
                other => other,
            })?;
        if affected == 0 {
            return Err(DomainError::user_not_found(caller.id));
        }

        let user = self
            .store
            .find_by_id(caller.id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(caller.id))?;

        info!(user_id = user.id, "Email updated");
        Ok(user)
    }

    /// Delete the caller's own account. Tokens already issued stay valid
    /// until they expire.
    pub async fn delete_account(&self, caller: &IdentityClaims) -> DomainResult<()> {
        if self.store.delete(caller.id).await? == 0 {
            return Err(DomainError::user_not_found(caller.id));
        }

        info!(user_id = caller.id, "Account deleted");
        Ok(())
    }

    // ── Administration ──────────────────────────────────────────

    /// Set another user's role. Callers must sit behind an admin gate.
    pub async fn update_role(&self, user_id: i32, role: &str) -> DomainResult<()> {
        if is_blank(role) {
            return Err(DomainError::Validation("All fields are required".into()));
        }

        if self.store.update(user_id, UserChanges::role(role)).await? == 0 {
            return Err(DomainError::user_not_found(user_id));
        }

        info!(user_id, role, "Role updated");
        Ok(())
    }

    /// Create an admin account unless one with this email already exists.
    /// Returns whether an account was created.
    pub async fn ensure_admin(&self, mut input: RegisterInput) -> DomainResult<bool> {
        if self.store.find_by_email(&input.email).await?.is_some() {
            return Ok(false);
        }

        input.role = Some(ADMIN_ROLE.to_string());
        self.register(input).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::infrastructure::InMemoryUserStore;

    fn service() -> AccountService<InMemoryUserStore> {
        AccountService::new(
            Arc::new(InMemoryUserStore::new()),
            TokenService::new("service-test-secret", Duration::hours(1)),
            CredentialHasher::new(4),
        )
    }

    fn input(email: &str, role: Option<&str>) -> RegisterInput {
        RegisterInput {
            username: "dave".to_string(),
            email: email.to_string(),
            password: "pa55word".to_string(),
            role: role.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn register_hashes_password_and_defaults_role() {
        let service = service();
        let user = service.register(input("d@x.com", None)).await.unwrap();

        assert_eq!(user.role, DEFAULT_ROLE);
        assert_ne!(user.password_hash.as_str(), "pa55word");
        assert!(CredentialHasher::new(4).verify("pa55word", &user.password_hash));
    }

    #[tokio::test]
    async fn register_keeps_requested_role() {
        let user = service()
            .register(input("boss@x.com", Some("admin")))
            .await
            .unwrap();
        assert_eq!(user.role, "admin");
    }

    #[tokio::test]
    async fn register_requires_all_fields() {
        let service = service();
        let mut missing = input("d@x.com", None);
        missing.password.clear();

        assert!(matches!(
            service.register(missing).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            service.register(input("  ", None)).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn register_rejects_taken_email() {
        let service = service();
        service.register(input("d@x.com", None)).await.unwrap();

        let err = service.register(input("d@x.com", None)).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(msg) if msg == "The email already exists"));
    }

    #[tokio::test]
    async fn login_issues_token_with_identity_snapshot() {
        let service = service();
        let user = service.register(input("d@x.com", None)).await.unwrap();

        let outcome = service.login("d@x.com", "pa55word").await.unwrap();
        assert_eq!(outcome.token_type, "Bearer");
        assert_eq!(outcome.expires_in, 3600);

        let claims = service.tokens().verify(&outcome.token).unwrap();
        assert_eq!(claims, user.identity());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn hashing_does_not_stall_the_runtime() {
        let service = Arc::new(AccountService::new(
            Arc::new(InMemoryUserStore::new()),
            TokenService::new("service-test-secret", Duration::hours(1)),
            CredentialHasher::new(10),
        ));

        let registering = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.register(input("slow@x.com", None)).await })
        };
        // Runs on the single runtime thread while the hash is in progress.
        let ticker = tokio::spawn(async { tokio::task::yield_now().await });
        ticker.await.unwrap();
        assert!(!registering.is_finished());

        registering.await.unwrap().unwrap();
        assert!(service.login("slow@x.com", "pa55word").await.is_ok());
    }

    #[tokio::test]
    async fn login_failures() {
        let service = service();
        service.register(input("d@x.com", None)).await.unwrap();

        assert!(matches!(
            service.login("nobody@x.com", "pa55word").await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            service.login("d@x.com", "wrong").await,
            Err(DomainError::Unauthorized(msg)) if msg == "Incorrect password"
        ));
        assert!(matches!(
            service.login("", "").await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn update_email_returns_fresh_record() {
        let service = service();
        let user = service.register(input("old@x.com", None)).await.unwrap();

        let updated = service
            .update_email(&user.identity(), "new@x.com")
            .await
            .unwrap();
        assert_eq!(updated.id, user.id);
        assert_eq!(updated.email, "new@x.com");
        assert!(service.login("new@x.com", "pa55word").await.is_ok());
    }

    #[tokio::test]
    async fn update_email_conflict_and_missing_user() {
        let service = service();
        let a = service.register(input("a@x.com", None)).await.unwrap();
        service.register(input("b@x.com", None)).await.unwrap();

        assert!(matches!(
            service.update_email(&a.identity(), "b@x.com").await,
            Err(DomainError::Conflict(_))
        ));

        service.delete_account(&a.identity()).await.unwrap();
        assert!(matches!(
            service.update_email(&a.identity(), "c@x.com").await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn delete_account_twice_is_not_found() {
        let service = service();
        let user = service.register(input("d@x.com", None)).await.unwrap();

        service.delete_account(&user.identity()).await.unwrap();
        assert!(matches!(
            service.delete_account(&user.identity()).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn update_role_does_not_touch_issued_tokens() {
        let service = service();
        let user = service.register(input("d@x.com", None)).await.unwrap();
        let before = service.login("d@x.com", "pa55word").await.unwrap();

        service.update_role(user.id, "admin").await.unwrap();

        assert_eq!(service.tokens().verify(&before.token).unwrap().role, "user");
        let after = service.login("d@x.com", "pa55word").await.unwrap();
        assert_eq!(service.tokens().verify(&after.token).unwrap().role, "admin");
    }

    #[tokio::test]
    async fn update_role_validation_and_missing_user() {
        let service = service();

        assert!(matches!(
            service.update_role(1, "").await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            service.update_role(42, "admin").await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn ensure_admin_is_idempotent() {
        let service = service();
        let admin = input("root@x.com", None);

        assert!(service.ensure_admin(admin.clone()).await.unwrap());
        assert!(!service.ensure_admin(admin).await.unwrap());

        let outcome = service.login("root@x.com", "pa55word").await.unwrap();
        assert_eq!(outcome.user.role, ADMIN_ROLE);
    }
}
