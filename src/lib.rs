//! # Account Service
//!
//! User accounts with bcrypt-hashed credentials, HS256 session tokens and
//! role-gated administration over a small REST API.
//!
//! ## Architecture
//!
//! - **auth**: credential hashing, token service and the gate pipeline
//! - **domain**: the `User` entity and the `UserStore` port
//! - **application**: account use cases (`AccountService`)
//! - **infrastructure**: SeaORM/SQLite and in-memory user stores
//! - **interfaces**: HTTP routes with Swagger documentation
//! - **server**: runtime lifecycle used by the CLI

pub mod application;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig, ConfigError};

pub use application::{AccountService, SharedAccountService};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig, InMemoryUserStore, UserRepository};

// Re-export API router
pub use interfaces::http::create_api_router;
