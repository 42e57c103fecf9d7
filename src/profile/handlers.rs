//! Profile and social-credential handlers

use axum::{
    extract::Extension,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::models::{Platform, SocialCredentialData, UpdateProfilePayload, UpsertCredentialPayload};
use crate::auth::SessionUser;
use crate::common::{safe_email_log, ApiError, AppState};
use crate::store::credentials::{get_social_credentials, upsert_social_credential};
use crate::store::users::{get_user_by_id, update_user_profile};

fn no_store(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn credential_view(platform: &str, data: &str, updated_at: i64) -> serde_json::Value {
    let parsed: serde_json::Value =
        serde_json::from_str(data).unwrap_or(serde_json::Value::Null);
    serde_json::json!({
        "platform": platform,
        "data": parsed,
        "updated_at": updated_at,
    })
}

/// GET /api/profile/credentials
/// Returns the logged-in user's profile plus their connected platforms.
///
/// # Response
/// ```json
/// {
///   "user": { ... },
///   "credentials": [ { "platform": "linkedin", "data": { ... } } ]
/// }
/// ```
pub async fn get_credentials(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: SessionUser,
) -> Result<Response, ApiError> {
    let state = state_lock.read().await.clone();

    let user = get_user_by_id(&state.db, &authed.user_id)
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let rows = get_social_credentials(&state.db, &authed.user_id)
        .await
        .map_err(ApiError::DatabaseError)?;
    let credentials: Vec<serde_json::Value> = rows
        .iter()
        .map(|row| credential_view(&row.platform, &row.data, row.updated_at))
        .collect();

    debug!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        connected = credentials.len(),
        "Profile credentials fetched"
    );

    let body = Json(serde_json::json!({ "user": user, "credentials": credentials }));
    Ok(no_store(body.into_response()))
}

/// POST /api/profile/credentials
/// Save a platform credential. The platform must be one of the supported
/// set (`twitter` is normalized to `x`) and the data must match that
/// platform's credential shape, so a malformed document fails here, at save
/// time, not at publish time.
pub async fn upsert_credential(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: SessionUser,
    Json(payload): Json<UpsertCredentialPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let platform = Platform::parse(&payload.platform).ok_or_else(|| {
        ApiError::BadRequest(format!("Unknown platform: {}", payload.platform))
    })?;

    let credential = SocialCredentialData::from_value(platform, payload.data)
        .map_err(|e| ApiError::ValidationError(format!("{} credentials: {}", platform.as_str(), e)))?;

    let row = upsert_social_credential(
        &state.db,
        &authed.user_id,
        credential.platform().as_str(),
        &credential.to_value(),
    )
    .await
    .map_err(ApiError::DatabaseError)?;

    info!(
        user_id = %authed.user_id,
        platform = %platform.as_str(),
        "Social credential saved"
    );

    Ok(Json(serde_json::json!({
        "credential": credential_view(&row.platform, &row.data, row.updated_at),
    })))
}

/// POST /api/profile
/// Update the user's display fields (name, picture).
///
/// # Request Body
/// ```json
/// { "name": "Avery", "picture": "/avatars/a.png" }
/// ```
pub async fn update_profile(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: SessionUser,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let name = payload.name.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let picture = payload
        .picture
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    if name.is_none() && picture.is_none() {
        return Err(ApiError::BadRequest(
            "Provide at least one of: { name, picture }".to_string(),
        ));
    }

    let user = update_user_profile(&state.db, &authed.user_id, name, picture)
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!(user_id = %user.id, "Profile updated");

    Ok(Json(serde_json::json!({ "user": user })))
}
