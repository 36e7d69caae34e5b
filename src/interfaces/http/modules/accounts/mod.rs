//! Account module: registration, login and self-service

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
