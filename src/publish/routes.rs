//! Publish routes

use axum::{routing::post, Router};

use super::handlers;

/// Creates and returns the publish router
///
/// # Routes
/// - `POST /api/publish` - Fan a post out to the requested platforms
pub fn publish_routes() -> Router {
    Router::new().route("/api/publish", post(handlers::publish))
}
