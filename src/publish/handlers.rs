//! Publish handlers

use axum::{extract::Extension, Json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::models::{outcome_entry, PublishRequest};
use crate::auth::SessionUser;
use crate::common::{ApiError, AppState};
use crate::profile::models::{Platform, SocialCredentialData};
use crate::services::publisher::{PublishError, PublishReceipt};
use crate::store::credentials::get_social_credential;

/// POST /api/publish
/// Fan a text post out to the requested platforms. Platforms resolve
/// independently; the response is always 200 with a per-platform result
/// map; one platform failing never aborts the others.
///
/// # Request Body
/// ```json
/// { "platforms": ["linkedin", "x"], "text": "New drop is live" }
/// ```
///
/// # Response
/// ```json
/// {
///   "results": {
///     "linkedin": { "ok": true, "id": "urn:li:share:123" },
///     "x": { "ok": false, "error": "No x credentials saved" }
///   }
/// }
/// ```
pub async fn publish(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: SessionUser,
    Json(payload): Json<PublishRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    if payload.text.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing text".to_string()));
    }
    if payload.platforms.is_empty() {
        return Err(ApiError::BadRequest(
            "Provide at least one platform".to_string(),
        ));
    }

    // Unknown platform names fail the whole request: that is a caller
    // bug, unlike a per-platform publish failure.
    let mut platforms = Vec::new();
    for raw in &payload.platforms {
        let platform = Platform::parse(raw)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown platform: {}", raw)))?;
        if !platforms.contains(&platform) {
            platforms.push(platform);
        }
    }

    let attempts = platforms.iter().map(|platform| {
        let state = state.clone();
        let text = payload.text.clone();
        let user_id = authed.user_id.clone();
        let platform = *platform;
        async move {
            let result = attempt_publish(&state, &user_id, platform, &text).await;
            (platform, result)
        }
    });

    let outcomes = futures::future::join_all(attempts).await;

    let mut results = BTreeMap::new();
    for (platform, result) in &outcomes {
        if let Err(e) = result {
            warn!(
                user_id = %authed.user_id,
                platform = %platform.as_str(),
                error = %e,
                "Publish attempt failed"
            );
        }
        results.insert(platform.as_str().to_string(), outcome_entry(result));
    }

    let published = outcomes.iter().filter(|(_, r)| r.is_ok()).count();
    info!(
        user_id = %authed.user_id,
        requested = outcomes.len(),
        published,
        "Publish fan-out finished"
    );

    Ok(Json(serde_json::json!({ "results": results })))
}

/// One platform's end-to-end attempt: resolve the stored credential,
/// validate its shape, post.
async fn attempt_publish(
    state: &AppState,
    user_id: &str,
    platform: Platform,
    text: &str,
) -> Result<PublishReceipt, PublishError> {
    let row = get_social_credential(&state.db, user_id, platform.as_str())
        .await
        .map_err(|e| PublishError::Upstream {
            platform: platform.as_str().to_string(),
            detail: format!("credential lookup failed: {}", e),
        })?
        .ok_or_else(|| PublishError::NotConnected(platform.as_str().to_string()))?;

    let value: serde_json::Value = serde_json::from_str(&row.data).map_err(|e| {
        PublishError::MalformedCredentials(platform.as_str().to_string(), e.to_string())
    })?;
    let credentials = SocialCredentialData::from_value(platform, value).map_err(|e| {
        PublishError::MalformedCredentials(platform.as_str().to_string(), e)
    })?;

    state
        .publisher_service
        .publish(platform, &credentials, text)
        .await
}
