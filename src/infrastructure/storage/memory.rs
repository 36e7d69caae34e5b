//! In-memory user store

use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::domain::{DomainError, DomainResult, NewUser, User, UserChanges, UserStore};

/// In-memory user store for development and testing.
///
/// Lock order is always `emails` before `users`.
pub struct InMemoryUserStore {
    users: DashMap<i32, User>,
    emails: DashMap<String, i32>,
    id_counter: AtomicI32,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            emails: DashMap::new(),
            id_counter: AtomicI32::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

fn email_taken(email: &str) -> DomainError {
    DomainError::Conflict(format!("Email {} already exists", email))
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let Some(id) = self.emails.get(email).map(|entry| *entry) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|user| user.clone()))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<User>> {
        Ok(self.users.get(&id).map(|user| user.clone()))
    }

    async fn create(&self, new_user: NewUser) -> DomainResult<User> {
        let Entry::Vacant(slot) = self.emails.entry(new_user.email.clone()) else {
            return Err(email_taken(&new_user.email));
        };

        let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let user = User {
            id,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            created_at: now,
            updated_at: now,
        };

        slot.insert(id);
        self.users.insert(id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: i32, changes: UserChanges) -> DomainResult<u64> {
        let Some(current_email) = self.users.get(&id).map(|user| user.email.clone()) else {
            return Ok(0);
        };

        let reserved = changes.email.as_ref().filter(|e| **e != current_email);
        if let Some(new_email) = reserved {
            match self.emails.entry(new_email.clone()) {
                Entry::Occupied(_) => return Err(email_taken(new_email)),
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
            self.emails.remove_if(&current_email, |_, owner| *owner == id);
        }

        let Some(mut user) = self.users.get_mut(&id) else {
            // Deleted concurrently; release the reservation.
            if let Some(new_email) = reserved {
                self.emails.remove_if(new_email, |_, owner| *owner == id);
            }
            return Ok(0);
        };
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        user.updated_at = Utc::now();

        Ok(1)
    }

    async fn delete(&self, id: i32) -> DomainResult<u64> {
        let Some((_, user)) = self.users.remove(&id) else {
            return Ok(0);
        };
        self.emails.remove(&user.email);
        Ok(1)
    }
}
