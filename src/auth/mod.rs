//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - The OIDC authorization-code handshake (login, callback, logout)
//! - The nonce-cookie codec for in-flight login state
//! - Local email + password registration and login
//! - The SessionUser guard for protected routes

pub mod extractors;
pub mod handlers;
pub mod models;
pub mod nonce;
pub mod password;
pub mod routes;
pub mod validators;


pub use extractors::SessionUser;
pub use models::User;
pub use routes::auth_routes;
