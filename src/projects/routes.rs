//! Project routes

use axum::{routing::get, Router};

use super::handlers;

/// Creates and returns the projects router
///
/// # Routes
/// - `GET /api/projects` - List the caller's projects
/// - `POST /api/projects` - Create a project
/// - `GET /api/projects/:id` - Fetch one project
/// - `DELETE /api/projects/:id` - Delete a project
pub fn projects_routes() -> Router {
    Router::new()
        .route("/api/projects", get(handlers::list).post(handlers::create))
        .route(
            "/api/projects/:id",
            get(handlers::get_one).delete(handlers::delete),
        )
}
