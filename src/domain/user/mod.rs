//! User aggregate
//!
//! Contains the User entity, write DTOs, and the store interface.

pub mod model;
pub mod store;

mod dto;

pub use dto::{NewUser, UserChanges};
pub use model::{User, ADMIN_ROLE, DEFAULT_ROLE};
pub use store::UserStore;
