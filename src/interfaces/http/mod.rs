//! HTTP REST API interfaces
//!
//! - `common`: error envelope and the validating JSON extractor
//! - `middleware`: gate pipeline wired into axum
//! - `modules`: request handlers grouped by resource
//! - `router`: API router with Swagger documentation

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiDoc};
