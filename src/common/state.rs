// Application state shared across all modules

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::services::{OidcService, PublisherService};

/// Application state containing the database pool, the shared HTTP client,
/// services, and cookie/session configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// None when no identity provider is configured; the OIDC routes then
    /// answer with a configuration error while password auth keeps working.
    pub oidc_service: Option<Arc<OidcService>>,
    pub publisher_service: Arc<PublisherService>,
    /// Lifetime of newly issued sessions, seconds.
    pub session_ttl_secs: i64,
    /// Set the `Secure` attribute on cookies (true in production).
    pub cookie_secure: bool,
}
