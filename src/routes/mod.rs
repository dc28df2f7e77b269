// # Routes Module
//
// - HTTP route handlers, grouped by functionality.
//
// ## Available Route Modules
// - `health`: liveness and readiness endpoints
// - `auth`: registration, login and profile endpoints

/// Health check and monitoring endpoints
pub mod health;

/// Account registration, login and profile endpoints
pub mod auth;
