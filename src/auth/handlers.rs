//! Authentication handlers

use axum::{
    extract::{Extension, Query},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::extractors::SessionUser;
use super::models::{CallbackParams, LoginParams, PasswordLoginPayload, RegisterPayload};
use super::nonce::{
    nonce_cookie, removal_cookie, session_cookie, LoginNonce, NONCE_COOKIE, SESSION_COOKIE,
};
use super::password::{hash_password, verify_password};
use super::validators::RegisterValidator;
use crate::common::{
    generate_user_id, safe_email_log, safe_token_log, sanitize_return_path, ApiError, AppState,
    Validator,
};
use crate::profile::models::{Platform, ProviderIdentity, SocialCredentialData};
use crate::services::OidcService;
use crate::store::credentials::upsert_social_credential;
use crate::store::sessions::{create_session, delete_session_by_token};
use crate::store::users::{
    create_local_user, find_user_by_email, get_user_by_id, upsert_user_on_login, UpsertUserOnLogin,
};

/// 302 redirect. The authorization-code flow is specified in terms of 302
/// responses, so this is used instead of axum's 303/307 helpers.
fn found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}

fn no_store(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn require_oidc(state: &AppState) -> Result<Arc<OidcService>, ApiError> {
    state.oidc_service.clone().ok_or_else(|| {
        ApiError::InternalServer("identity provider is not configured".to_string())
    })
}

/// GET /api/auth/login?returnTo=<path>
/// Starts the hosted-UI login: mints fresh authorization state, stores it
/// in the nonce cookie and redirects to the identity provider.
///
/// No database access happens here; the only side effect is the cookie.
pub async fn login_entry(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(params): Query<LoginParams>,
    jar: CookieJar,
) -> Result<(CookieJar, Response), ApiError> {
    let state = state_lock.read().await.clone();
    let oidc = require_oidc(&state)?;

    let return_to = sanitize_return_path(params.return_to.as_deref());
    let (url, nonce) = oidc.build_auth_url(Some(return_to)).await?;

    // Log the authorize endpoint without its query string; state and
    // nonce must not land in logs.
    info!(
        authorize = %format!("{}://{}{}", url.scheme(), url.host_str().unwrap_or(""), url.path()),
        "Redirecting to identity provider"
    );

    let jar = jar.add(nonce_cookie(nonce.serialize(), state.cookie_secure));
    Ok((jar, found(url.as_str())))
}

/// GET /api/auth/callback?code=<c>&state=<s>
/// Completes the handshake: validates the echoed state against the nonce
/// cookie, exchanges the code, upserts the user and issues the session.
///
/// The nonce cookie is consumed exactly once: it is expired on every
/// outcome, success or failure, before anything else can go wrong.
pub async fn callback(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(params): Query<CallbackParams>,
    jar: CookieJar,
) -> Response {
    let state = state_lock.read().await.clone();
    let secure = state.cookie_secure;

    let nonce = LoginNonce::parse(jar.get(NONCE_COOKIE).map(|c| c.value()));
    let jar = jar.add(removal_cookie(NONCE_COOKIE, secure));

    match run_callback(&state, params, nonce).await {
        Ok((session_token, redirect_to)) => {
            let jar = jar.add(session_cookie(
                session_token,
                state.session_ttl_secs,
                secure,
            ));
            (jar, found(&redirect_to)).into_response()
        }
        Err(e) => (jar, e).into_response(),
    }
}

/// Steps 2-8 of the callback, strictly sequential. Returns the session
/// token and the validated redirect target.
async fn run_callback(
    state: &AppState,
    params: CallbackParams,
    nonce: Option<LoginNonce>,
) -> Result<(String, String), ApiError> {
    let nonce = nonce.ok_or_else(|| {
        warn!("Callback without a readable login state cookie");
        ApiError::InvalidLoginState("Missing or invalid login state".to_string())
    })?;

    if let Some(provider_error) = params.error {
        let detail = params.error_description.unwrap_or_default();
        warn!(error = %provider_error, detail = %detail, "Identity provider returned an error");
        return Err(ApiError::IdentityProvider(format!(
            "provider returned error: {}",
            provider_error
        )));
    }

    let (code, echoed_state) = match (params.code, params.state) {
        (Some(code), Some(state)) if !code.is_empty() && !state.is_empty() => (code, state),
        _ => {
            return Err(ApiError::MissingAuthorizationCode(
                "Missing code/state".to_string(),
            ))
        }
    };

    // CSRF defense: the state echoed by the provider must be the one this
    // browser was sent out with.
    if echoed_state != nonce.state {
        warn!("State mismatch in OIDC callback");
        return Err(ApiError::StateMismatch("Invalid state".to_string()));
    }

    let oidc = require_oidc(state)?;
    let claims = oidc
        .exchange_code(&code, &nonce.code_verifier, &nonce.nonce)
        .await?;

    let sub = claims.subject().map_err(ApiError::from)?.to_string();
    let email = claims
        .resolve_email()
        .ok_or_else(|| ApiError::ClaimsError("No email in ID token".to_string()))?;
    let name = claims.resolve_name();
    let picture = claims.picture.clone();

    let user = upsert_user_on_login(
        &state.db,
        &UpsertUserOnLogin {
            user_id: sub.clone(),
            email: email.clone(),
            name: name.clone(),
            picture: picture.clone(),
        },
    )
    .await
    .map_err(ApiError::DatabaseError)?;

    // Link the provider identity to the account. Not critical for login,
    // so a failure is logged rather than failing the authentication.
    let identity = SocialCredentialData::Cognito(ProviderIdentity {
        sub: Some(sub),
        email: Some(email.clone()),
        name,
        picture,
        provider_name: None,
        provider_user_id: None,
    });
    if let Err(e) = upsert_social_credential(
        &state.db,
        &user.id,
        Platform::Cognito.as_str(),
        &identity.to_value(),
    )
    .await
    {
        error!(error = %e, user_id = %user.id, "Failed to record provider identity");
    }

    let session = create_session(&state.db, &user.id, state.session_ttl_secs)
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        "User authentication successful via OIDC"
    );

    let redirect_to = sanitize_return_path(nonce.return_to.as_deref());
    Ok((session.token, redirect_to))
}

/// GET /api/auth/logout
/// Deletes the session server-side (best effort), expires both cookies and
/// sends the browser to the provider's logout page. Callers asking for
/// JSON get the URL to navigate to instead of a redirect.
pub async fn logout(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    let state = state_lock.read().await.clone();
    let secure = state.cookie_secure;

    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let token = cookie.value().to_string();
        if let Err(e) = delete_session_by_token(&state.db, &token).await {
            // Best effort: the cookie is cleared regardless, a clean
            // logged-out state wins over strict consistency.
            warn!(
                error = %e,
                token = %safe_token_log(&token),
                "Server-side session delete failed during logout"
            );
        }
    }

    let jar = jar
        .add(removal_cookie(SESSION_COOKIE, secure))
        .add(removal_cookie(NONCE_COOKIE, secure));

    let fallback = "/api/auth/login".to_string();
    let redirect_to = match &state.oidc_service {
        Some(oidc) => {
            let post_logout = oidc
                .config()
                .logout_redirect_uri
                .clone()
                .unwrap_or_else(|| fallback.clone());
            match oidc.logout_url(&post_logout).await {
                Ok(url) => url.to_string(),
                Err(e) => {
                    warn!(error = %e, "Could not build provider logout URL");
                    fallback
                }
            }
        }
        None => fallback,
    };

    let wants_json = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("application/json"))
        .unwrap_or(false);

    if wants_json {
        let body = Json(serde_json::json!({ "redirectTo": redirect_to }));
        (jar, no_store(body.into_response())).into_response()
    } else {
        (jar, no_store(found(&redirect_to))).into_response()
    }
}

/// POST /api/auth/register
/// Local email + password registration.
///
/// # Request Body
/// ```json
/// {
///   "email": "creator@example.com",
///   "password": "........",
///   "name": "Avery"
/// }
/// ```
pub async fn register(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    jar: CookieJar,
    Json(payload): Json<RegisterPayload>,
) -> Result<(CookieJar, Json<serde_json::Value>), ApiError> {
    let state = state_lock.read().await.clone();

    let validation = RegisterValidator.validate(&payload);
    if !validation.is_valid {
        return Err(validation.into());
    }

    let email = payload.email.trim().to_lowercase();
    let existing = find_user_by_email(&state.db, &email)
        .await
        .map_err(ApiError::DatabaseError)?;
    if existing.is_some() {
        return Err(ApiError::BadRequest("Account already exists".to_string()));
    }

    let password_hash = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "Password hashing failed");
        ApiError::InternalServer("Failed to process password".to_string())
    })?;

    let user_id = generate_user_id();
    let user = create_local_user(
        &state.db,
        &user_id,
        &email,
        payload.name.as_deref(),
        &password_hash,
    )
    .await
    .map_err(ApiError::DatabaseError)?;

    let session = create_session(&state.db, &user.id, state.session_ttl_secs)
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        "New account registered"
    );

    let jar = jar.add(session_cookie(
        session.token,
        state.session_ttl_secs,
        state.cookie_secure,
    ));
    let body = serde_json::json!({
        "ok": true,
        "user": { "id": user.id, "email": user.email, "name": user.name },
    });
    Ok((jar, Json(body)))
}

/// POST /api/auth/login
/// Local email + password login. Unknown email, wrong password and
/// password-less (federated) accounts all answer with the same 401.
pub async fn password_login(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    jar: CookieJar,
    Json(payload): Json<PasswordLoginPayload>,
) -> Result<(CookieJar, Json<serde_json::Value>), ApiError> {
    let state = state_lock.read().await.clone();

    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password required".to_string(),
        ));
    }

    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let user = find_user_by_email(&state.db, payload.email.trim())
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(invalid)?;

    let password_ok = user
        .password_hash
        .as_deref()
        .map(|hash| verify_password(&payload.password, hash))
        .unwrap_or(false);
    if !password_ok {
        warn!(email = %safe_email_log(&user.email), "Password login rejected");
        return Err(invalid());
    }

    let session = create_session(&state.db, &user.id, state.session_ttl_secs)
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        "User authentication successful via password"
    );

    let jar = jar.add(session_cookie(
        session.token,
        state.session_ttl_secs,
        state.cookie_secure,
    ));
    let body = serde_json::json!({
        "ok": true,
        "user": { "id": user.id, "email": user.email, "name": user.name },
    });
    Ok((jar, Json(body)))
}

/// GET /api/me
/// Returns the current authenticated user.
///
/// # Response
/// ```json
/// {
///   "user": { ... }
/// }
/// ```
pub async fn me_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: SessionUser,
) -> Result<Response, ApiError> {
    let state = state_lock.read().await.clone();

    let user = get_user_by_id(&state.db, &authed.user_id)
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let body = Json(serde_json::json!({ "user": user }));
    Ok(no_store(body.into_response()))
}
