//! Profile routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the profile router
///
/// # Routes
/// - `GET /api/profile/credentials` - Profile plus connected platforms
/// - `POST /api/profile/credentials` - Save a platform credential
/// - `POST /api/profile` - Update display fields
pub fn profile_routes() -> Router {
    Router::new()
        .route(
            "/api/profile/credentials",
            get(handlers::get_credentials).post(handlers::upsert_credential),
        )
        .route("/api/profile", post(handlers::update_profile))
}
