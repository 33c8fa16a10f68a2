//! Authentication module for LensPool
//!
//! Email/password accounts with bcrypt hashing and JWT access/refresh tokens.

mod jwt;
mod service;

pub use jwt::{
    generate_access_token, generate_refresh_token, get_user_id_from_claims, verify_token, Claims,
};
pub use service::AuthService;
