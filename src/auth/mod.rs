//! # Authentication Module
//!
//! Handles token issuance and validation, password hashing, and the
//! middleware that guards protected endpoints.

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;

pub use jwt::JwtService;
pub use middleware::{AuthMiddleware, Authenticator};
pub use password::PasswordService;
