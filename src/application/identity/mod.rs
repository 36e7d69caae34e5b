//! Identity module: account use cases
//!
//! Contains the `AccountService` which orchestrates registration, login,
//! self-service email change and deletion, and admin role changes.

pub mod service;

pub use service::{AccountService, LoginOutcome, RegisterInput, SharedAccountService};
