//! Session operations
//!
//! Tokens are opaque 48-byte CSPRNG values, URL-safe encoded; with >=256
//! bits of entropy a collision is not checked for. Expiry is the session
//! guard's responsibility at read time; the reaper task bounds how long
//! expired rows accumulate.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use rand::RngCore;
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::models::Session;

const TOKEN_BYTES: usize = 48;

/// Generate an unguessable session token (64 URL-safe characters).
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub async fn create_session(
    pool: &SqlitePool,
    user_id: &str,
    ttl_secs: i64,
) -> Result<Session, sqlx::Error> {
    let now = Utc::now().timestamp_millis();
    let session = Session {
        token: generate_session_token(),
        user_id: user_id.to_string(),
        created_at: now,
        expires_at: now + ttl_secs * 1000,
    };

    sqlx::query(
        "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&session.token)
    .bind(&session.user_id)
    .bind(session.created_at)
    .bind(session.expires_at)
    .execute(pool)
    .await?;

    Ok(session)
}

pub async fn get_session_by_token(
    pool: &SqlitePool,
    token: &str,
) -> Result<Option<Session>, sqlx::Error> {
    sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token = ?")
        .bind(token)
        .fetch_optional(pool)
        .await
}

/// Idempotent: deleting an unknown token is not an error.
pub async fn delete_session_by_token(pool: &SqlitePool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete sessions whose expiry has passed. Returns how many were removed.
pub async fn purge_expired_sessions(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let now = Utc::now().timestamp_millis();
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(now)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Spawn the background reaper that periodically purges expired sessions.
pub fn spawn_expiry_reaper(pool: SqlitePool, interval_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        // First tick fires immediately; skip it so startup stays quiet.
        interval.tick().await;
        loop {
            interval.tick().await;
            match purge_expired_sessions(&pool).await {
                Ok(0) => {}
                Ok(purged) => debug!(purged, "Session reaper removed expired sessions"),
                Err(e) => warn!(error = %e, "Session reaper sweep failed"),
            }
        }
    });
}
