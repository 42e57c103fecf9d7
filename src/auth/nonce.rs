//! Nonce cookie codec
//!
//! The login redirect stashes the in-flight authorization state
//! (state, PKCE verifier, nonce, returnTo) in a short-lived browser
//! cookie; the callback consumes it exactly once. The value is
//! base64url-encoded JSON, URL-safe and unsigned. Integrity comes from the
//! state equality check plus the 10-minute lifetime and single-use
//! deletion, not from a signature.

use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};

pub const NONCE_COOKIE: &str = "oidc_nonce";
pub const SESSION_COOKIE: &str = "session";

/// Lifetime of the nonce cookie, seconds. A login attempt older than this
/// is treated as stale.
const NONCE_MAX_AGE_SECS: i64 = 600;

/// Transient per-login state, round-tripped through the browser only.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoginNonce {
    pub state: String,
    #[serde(rename = "codeVerifier")]
    pub code_verifier: String,
    pub nonce: String,
    #[serde(rename = "returnTo", default)]
    pub return_to: Option<String>,
}

impl LoginNonce {
    /// Encode as an opaque, URL-safe cookie value.
    pub fn serialize(&self) -> String {
        // Serialization of this struct cannot fail
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decode a cookie value. Malformed input of any kind is None, never
    /// an error; callers answer a missing nonce with a 400, not a 500.
    pub fn parse(value: Option<&str>) -> Option<Self> {
        let raw = value?;
        let bytes = URL_SAFE_NO_PAD.decode(raw).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

/// The nonce cookie set alongside the login redirect.
pub fn nonce_cookie(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((NONCE_COOKIE, value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .path("/")
        .max_age(time::Duration::seconds(NONCE_MAX_AGE_SECS))
        .build()
}

/// The session cookie set after a successful login.
pub fn session_cookie(token: String, ttl_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .path("/")
        .max_age(time::Duration::seconds(ttl_secs))
        .build()
}

/// An expired replacement used to clear either cookie. The attributes must
/// match the ones the cookie was set with or browsers keep the original.
pub fn removal_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LoginNonce {
        LoginNonce {
            state: "state-abc".to_string(),
            code_verifier: "verifier-xyz".to_string(),
            nonce: "nonce-123".to_string(),
            return_to: Some("/release".to_string()),
        }
    }

    #[test]
    fn test_serialize_parse_roundtrip() {
        let nonce = sample();
        let encoded = nonce.serialize();
        // URL-safe: usable as a cookie value without escaping
        assert!(encoded
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(LoginNonce::parse(Some(&encoded)), Some(nonce));
    }

    #[test]
    fn test_parse_returns_none_for_malformed_input() {
        assert_eq!(LoginNonce::parse(None), None);
        assert_eq!(LoginNonce::parse(Some("")), None);
        assert_eq!(LoginNonce::parse(Some("not base64!!")), None);
        // Valid base64url but not JSON
        let garbage = URL_SAFE_NO_PAD.encode(b"hello world");
        assert_eq!(LoginNonce::parse(Some(&garbage)), None);
        // Valid JSON but wrong shape
        let wrong = URL_SAFE_NO_PAD.encode(br#"{"state": 42}"#);
        assert_eq!(LoginNonce::parse(Some(&wrong)), None);
    }

    #[test]
    fn test_return_to_is_optional() {
        let mut nonce = sample();
        nonce.return_to = None;
        let parsed = LoginNonce::parse(Some(&nonce.serialize())).unwrap();
        assert_eq!(parsed.return_to, None);
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = nonce_cookie("value".to_string(), true);
        assert_eq!(cookie.name(), NONCE_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(
            cookie.max_age(),
            Some(time::Duration::seconds(NONCE_MAX_AGE_SECS))
        );

        let session = session_cookie("tok".to_string(), 3600, false);
        assert_eq!(session.max_age(), Some(time::Duration::seconds(3600)));
        assert_eq!(session.secure(), Some(false));

        let removal = removal_cookie(SESSION_COOKIE, false);
        assert_eq!(removal.max_age(), Some(time::Duration::ZERO));
    }
}
