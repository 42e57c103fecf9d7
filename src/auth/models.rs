//! Authentication data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User database model
///
/// `id` is the identity provider's `sub` for OIDC-created users and a
/// generated `U_` id for local registrations. The password hash never
/// leaves the server: it is skipped on serialization.
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub provider: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub last_login_at: Option<i64>,
}

/// Session database model
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub created_at: i64,
    pub expires_at: i64,
}

impl Session {
    /// Expiry is checked lazily by callers; the store never filters for it.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at
    }
}

/// POST /api/auth/register request body
#[derive(Deserialize, Debug)]
pub struct RegisterPayload {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// POST /api/auth/login request body
#[derive(Deserialize, Debug)]
pub struct PasswordLoginPayload {
    pub email: String,
    pub password: String,
}

/// GET /api/auth/login query parameters
#[derive(Deserialize, Debug)]
pub struct LoginParams {
    #[serde(rename = "returnTo")]
    pub return_to: Option<String>,
}

/// GET /api/auth/callback query parameters
#[derive(Deserialize, Debug)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}
