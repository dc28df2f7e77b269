//! # Services Module
//!
//! Business operations composed from the auth and database layers.

pub mod accounts;

pub use accounts::AccountService;
