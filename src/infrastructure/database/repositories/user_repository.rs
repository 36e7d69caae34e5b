use async_trait::async_trait;
use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr,
};

use crate::auth::HashedCredential;
use crate::domain::{DomainError, DomainResult, NewUser, User, UserChanges, UserStore};
use crate::infrastructure::database::entities::user;

pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn user_model_to_domain(model: user::Model) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        password_hash: HashedCredential::from_stored(model.password_hash),
        role: model.role,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn write_err(e: DbErr) -> DomainError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            DomainError::Conflict("Email already exists".to_string())
        }
        _ => e.into(),
    }
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;

        Ok(model.map(user_model_to_domain))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<User>> {
        let model = user::Entity::find_by_id(id).one(&self.db).await?;

        Ok(model.map(user_model_to_domain))
    }

    async fn create(&self, new_user: NewUser) -> DomainResult<User> {
        let now = Utc::now();

        let active = user::ActiveModel {
            username: Set(new_user.username),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash.into_inner()),
            role: Set(new_user.role),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(&self.db).await.map_err(write_err)?;
        Ok(user_model_to_domain(model))
    }

    async fn update(&self, id: i32, changes: UserChanges) -> DomainResult<u64> {
        if changes.is_empty() {
            return Ok(0);
        }

        let mut query = user::Entity::update_many()
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id));

        if let Some(email) = changes.email {
            query = query.col_expr(user::Column::Email, Expr::value(email));
        }
        if let Some(role) = changes.role {
            query = query.col_expr(user::Column::Role, Expr::value(role));
        }

        let result = query.exec(&self.db).await.map_err(write_err)?;
        Ok(result.rows_affected)
    }

    async fn delete(&self, id: i32) -> DomainResult<u64> {
        let result = user::Entity::delete_by_id(id).exec(&self.db).await?;

        Ok(result.rows_affected)
    }
}
