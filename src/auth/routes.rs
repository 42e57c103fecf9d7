//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `GET /api/auth/login` - Redirect to the identity provider's hosted UI
/// - `POST /api/auth/login` - Local email + password login
/// - `GET /api/auth/callback` - OIDC callback (code exchange, session issue)
/// - `GET /api/auth/logout` - Logout (session delete + provider logout)
/// - `POST /api/auth/register` - Local registration
/// - `GET /api/me` - Get current user information
pub fn auth_routes() -> Router {
    Router::new()
        .route(
            "/api/auth/login",
            get(handlers::login_entry).post(handlers::password_login),
        )
        .route("/api/auth/callback", get(handlers::callback))
        .route("/api/auth/logout", get(handlers::logout))
        .route("/api/auth/register", post(handlers::register))
        .route("/api/me", get(handlers::me_handler))
}
