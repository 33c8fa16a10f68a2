//! Middleware for the LensPool API
//!
//! Request tracing and authentication extractors.

pub mod auth;
mod tracing;

pub use auth::{AdminUser, AuthenticatedUser, OptionalUser};
pub use tracing::request_tracing;
