use async_trait::async_trait;

use super::{NewUser, User, UserChanges};
use crate::shared::DomainResult;

/// Persistent user-record store.
///
/// `update` and `delete` report the number of affected rows; zero means no
/// user with that id exists.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>>;
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<User>>;

    async fn create(&self, user: NewUser) -> DomainResult<User>;
    async fn update(&self, id: i32, changes: UserChanges) -> DomainResult<u64>;
    async fn delete(&self, id: i32) -> DomainResult<u64>;
}
