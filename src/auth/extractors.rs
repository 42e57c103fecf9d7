//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::nonce::SESSION_COOKIE;
use crate::common::{safe_token_log, ApiError, AppState};
use crate::store::sessions::get_session_by_token;

/// Session guard
///
/// Reads the `session` cookie, resolves it against the session store and
/// checks expiry. Every failure mode (absent cookie, unknown token,
/// expired session, even a store error) rejects with the same
/// `401 Unauthorized`, so callers cannot distinguish why. Expiry is never
/// extended as a side effect of a read.
#[derive(Debug)]
pub struct SessionUser {
    pub user_id: String,
}

fn unauthorized() -> ApiError {
    ApiError::Unauthorized("Unauthorized".to_string())
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(state_lock): Extension<Arc<RwLock<AppState>>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let app_state = state_lock.read().await.clone();

        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| unauthorized())?;

        let token = match jar.get(SESSION_COOKIE) {
            Some(cookie) if !cookie.value().is_empty() => cookie.value().to_string(),
            _ => return Err(unauthorized()),
        };

        let session = match get_session_by_token(&app_state.db, &token).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!(token = %safe_token_log(&token), "Session token not found");
                return Err(unauthorized());
            }
            Err(e) => {
                warn!(error = %e, "Session lookup failed");
                return Err(unauthorized());
            }
        };

        if session.is_expired_at(Utc::now().timestamp_millis()) {
            debug!(
                user_id = %session.user_id,
                token = %safe_token_log(&token),
                "Session is expired"
            );
            return Err(unauthorized());
        }

        Ok(SessionUser {
            user_id: session.user_id,
        })
    }
}
