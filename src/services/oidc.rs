// src/services/oidc.rs
//! OIDC client provider
//!
//! Implements the relying-party half of the authorization-code flow:
//! provider discovery (cached for the process lifetime), authorization-URL
//! construction with fresh state/nonce/PKCE material per call, the
//! code-for-token exchange with nonce and audience verification, and the
//! hosted-UI logout URL.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use rand::RngCore;
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::env;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::nonce::LoginNonce;
use crate::common::ApiError;

/// Outbound call budget for discovery and token exchange.
const UPSTREAM_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum OidcError {
    #[error("identity provider not configured: {0}")]
    NotConfigured(String),

    #[error("OIDC discovery failed: {0}")]
    Discovery(String),

    #[error("identity provider error: {0}")]
    Provider(String),

    #[error("identity provider timed out: {0}")]
    UpstreamTimeout(String),

    #[error("ID token missing required claim: {0}")]
    MissingClaim(&'static str),

    #[error("ID token rejected: {0}")]
    ClaimsRejected(String),

    #[error("ID token nonce does not match the login request")]
    NonceMismatch,

    #[error("invalid provider endpoint: {0}")]
    InvalidEndpoint(String),
}

impl From<OidcError> for ApiError {
    fn from(error: OidcError) -> Self {
        match error {
            OidcError::NotConfigured(msg) | OidcError::InvalidEndpoint(msg) => {
                ApiError::InternalServer(msg)
            }
            OidcError::Discovery(msg) | OidcError::Provider(msg) => ApiError::IdentityProvider(msg),
            OidcError::UpstreamTimeout(msg) => ApiError::UpstreamTimeout(msg),
            OidcError::MissingClaim(claim) => {
                ApiError::ClaimsError(format!("missing required claim: {}", claim))
            }
            OidcError::ClaimsRejected(msg) => ApiError::ClaimsError(msg),
            OidcError::NonceMismatch => {
                ApiError::ClaimsError("nonce mismatch in ID token".to_string())
            }
        }
    }
}

/// Static relying-party configuration, sourced from the environment.
#[derive(Debug, Clone)]
pub struct OidcConfig {
    /// Issuer base URL (discovery fallback).
    pub issuer: Option<String>,
    /// Hosted-UI domain; wins over the issuer for browser-facing URLs.
    pub domain: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: String,
    pub logout_redirect_uri: Option<String>,
}

impl OidcConfig {
    /// Reads OIDC_* variables. Either OIDC_ISSUER or OIDC_DOMAIN must be
    /// present along with client id/secret and the redirect URI.
    pub fn from_env() -> Result<Self, OidcError> {
        let issuer = env::var("OIDC_ISSUER")
            .ok()
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());
        let domain = env::var("OIDC_DOMAIN")
            .ok()
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());

        if issuer.is_none() && domain.is_none() {
            return Err(OidcError::NotConfigured(
                "set either OIDC_ISSUER or OIDC_DOMAIN".to_string(),
            ));
        }

        let client_id = env::var("OIDC_CLIENT_ID")
            .map_err(|_| OidcError::NotConfigured("OIDC_CLIENT_ID is not set".to_string()))?;
        let client_secret = env::var("OIDC_CLIENT_SECRET")
            .map_err(|_| OidcError::NotConfigured("OIDC_CLIENT_SECRET is not set".to_string()))?;
        let redirect_uri = env::var("OIDC_REDIRECT_URI")
            .map_err(|_| OidcError::NotConfigured("OIDC_REDIRECT_URI is not set".to_string()))?;

        Ok(Self {
            issuer,
            domain,
            client_id,
            client_secret,
            redirect_uri,
            scopes: env::var("OIDC_SCOPES").unwrap_or_else(|_| "openid email profile".to_string()),
            logout_redirect_uri: env::var("OIDC_LOGOUT_REDIRECT_URI").ok(),
        })
    }
}

/// Subset of the provider metadata document this flow needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    #[serde(default)]
    pub end_session_endpoint: Option<String>,
}

/// Claims extracted from the ID token payload.
///
/// The token is accepted only from the provider's token endpoint over TLS,
/// so the signature is not re-verified here; expiry, audience and nonce
/// are checked explicitly instead.
#[derive(Debug, Clone, Deserialize)]
pub struct IdTokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "cognito:username")]
    pub cognito_username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub nonce: Option<String>,
    #[serde(default)]
    pub aud: Option<serde_json::Value>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl IdTokenClaims {
    pub fn subject(&self) -> Result<&str, OidcError> {
        self.sub.as_deref().ok_or(OidcError::MissingClaim("sub"))
    }

    /// Cognito user pools put the username claim where plain providers put
    /// email; fall back to it for non-email identities.
    pub fn resolve_email(&self) -> Option<String> {
        self.email
            .clone()
            .or_else(|| self.cognito_username.clone())
            .filter(|e| !e.is_empty())
    }

    pub fn resolve_name(&self) -> Option<String> {
        self.name.clone().or_else(|| {
            match (&self.given_name, &self.family_name) {
                (Some(given), Some(family)) => Some(format!("{} {}", given, family)),
                (Some(given), None) => Some(given.clone()),
                _ => self.cognito_username.clone(),
            }
        })
    }

    fn audience_matches(&self, client_id: &str) -> bool {
        match &self.aud {
            Some(serde_json::Value::String(aud)) => aud == client_id,
            Some(serde_json::Value::Array(entries)) => entries
                .iter()
                .any(|entry| entry.as_str() == Some(client_id)),
            _ => false,
        }
    }
}

/// Token endpoint response for the authorization-code grant. Only the ID
/// token is consumed; sessions are opaque server-side tokens, so the
/// access/refresh tokens are not retained.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug)]
pub struct OidcService {
    config: OidcConfig,
    client: Client,
    metadata: OnceCell<ProviderMetadata>,
}

impl OidcService {
    pub fn new(config: OidcConfig, client: Client) -> Self {
        Self {
            config,
            client,
            metadata: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &OidcConfig {
        &self.config
    }

    /// Provider metadata, discovered once per process and cached.
    /// Concurrent first requests race benignly: discovery is deterministic
    /// and the cell only ever stores one winner.
    async fn metadata(&self) -> Result<&ProviderMetadata, OidcError> {
        self.metadata.get_or_try_init(|| self.discover()).await
    }

    async fn discover(&self) -> Result<ProviderMetadata, OidcError> {
        let candidates = discovery_candidates(&self.config);
        let mut last_error = None;

        for candidate in &candidates {
            debug!(url = %candidate, "Attempting OIDC discovery");
            match self.fetch_metadata(candidate).await {
                Ok(metadata) => {
                    info!(issuer = %metadata.issuer, "OIDC discovery succeeded");
                    return Ok(metadata);
                }
                Err(e @ OidcError::UpstreamTimeout(_)) => return Err(e),
                Err(e) => {
                    warn!(url = %candidate, error = %e, "OIDC discovery candidate failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            OidcError::Discovery("no discovery candidates configured".to_string())
        }))
    }

    async fn fetch_metadata(&self, url: &str) -> Result<ProviderMetadata, OidcError> {
        let response = self
            .client
            .get(url)
            .timeout(std::time::Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| map_transport_error(e, "discovery"))?;

        if !response.status().is_success() {
            return Err(OidcError::Discovery(format!(
                "metadata document returned {}",
                response.status()
            )));
        }

        response
            .json::<ProviderMetadata>()
            .await
            .map_err(|e| OidcError::Discovery(format!("malformed metadata document: {}", e)))
    }

    /// Build the authorization redirect. Every call mints a fresh state,
    /// nonce and PKCE pair; reuse across logins would defeat both the
    /// CSRF and the code-interception defenses.
    pub async fn build_auth_url(
        &self,
        return_to: Option<String>,
    ) -> Result<(Url, LoginNonce), OidcError> {
        let metadata = self.metadata().await?;

        let state = random_urlsafe(24);
        let nonce = random_urlsafe(24);
        let code_verifier = random_urlsafe(32);
        let code_challenge = pkce_challenge_s256(&code_verifier);

        let url = authorize_url(&self.config, metadata, &state, &nonce, &code_challenge)?;

        Ok((
            url,
            LoginNonce {
                state,
                code_verifier,
                nonce,
                return_to,
            },
        ))
    }

    /// Exchange the authorization code for tokens and return the verified
    /// ID-token claims. A provider failure here is terminal for the
    /// callback: the code is single-use, so recovery is a fresh login.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        expected_nonce: &str,
    ) -> Result<IdTokenClaims, OidcError> {
        let metadata = self.metadata().await?;

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code_verifier", code_verifier),
        ];

        let response = self
            .client
            .post(&metadata.token_endpoint)
            .form(&params)
            .timeout(std::time::Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| map_transport_error(e, "token exchange"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(OidcError::Provider(format!(
                "token endpoint returned {}: {}",
                status, snippet
            )));
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| OidcError::Provider(format!("malformed token response: {}", e)))?;

        let id_token = tokens
            .id_token
            .as_deref()
            .ok_or(OidcError::MissingClaim("id_token"))?;

        let claims = decode_id_token_claims(id_token)?;

        match claims.nonce.as_deref() {
            Some(nonce) if nonce == expected_nonce => {}
            _ => return Err(OidcError::NonceMismatch),
        }
        if !claims.audience_matches(&self.config.client_id) {
            return Err(OidcError::ClaimsRejected(
                "audience does not match client id".to_string(),
            ));
        }
        match claims.exp {
            Some(exp) if exp > Utc::now().timestamp() => {}
            _ => {
                return Err(OidcError::ClaimsRejected(
                    "ID token is expired".to_string(),
                ))
            }
        }

        Ok(claims)
    }

    /// Hosted-UI logout URL, sending the browser back to
    /// `post_logout_redirect` afterwards.
    pub async fn logout_url(&self, post_logout_redirect: &str) -> Result<Url, OidcError> {
        let metadata = self.metadata().await?;
        logout_url(&self.config, metadata, post_logout_redirect)
    }
}

/// Discovery candidates, most specific first: the hosted-UI domain knows
/// its own metadata paths; the issuer document is the standard fallback.
fn discovery_candidates(config: &OidcConfig) -> Vec<String> {
    let mut candidates = Vec::new();
    if let Some(domain) = &config.domain {
        candidates.push(format!("{}/.well-known/openid-configuration", domain));
        candidates.push(format!(
            "{}/oauth2/.well-known/openid-configuration",
            domain
        ));
    }
    if let Some(issuer) = &config.issuer {
        candidates.push(format!("{}/.well-known/openid-configuration", issuer));
    }
    candidates
}

/// Base URL for browser-facing pages (authorize, logout). The configured
/// hosted-UI domain wins; otherwise it is derived from the authorization
/// endpoint.
fn hosted_base(config: &OidcConfig, metadata: &ProviderMetadata) -> Result<Url, OidcError> {
    if let Some(domain) = &config.domain {
        return Url::parse(domain)
            .map_err(|e| OidcError::InvalidEndpoint(format!("OIDC_DOMAIN: {}", e)));
    }
    let auth = Url::parse(&metadata.authorization_endpoint)
        .map_err(|e| OidcError::InvalidEndpoint(format!("authorization_endpoint: {}", e)))?;
    let origin = format!(
        "{}://{}",
        auth.scheme(),
        auth.host_str()
            .ok_or_else(|| OidcError::InvalidEndpoint(
                "authorization_endpoint has no host".to_string()
            ))?
    );
    Url::parse(&origin).map_err(|e| OidcError::InvalidEndpoint(e.to_string()))
}

fn authorize_url(
    config: &OidcConfig,
    metadata: &ProviderMetadata,
    state: &str,
    nonce: &str,
    code_challenge: &str,
) -> Result<Url, OidcError> {
    let mut url = Url::parse(&metadata.authorization_endpoint)
        .map_err(|e| OidcError::InvalidEndpoint(format!("authorization_endpoint: {}", e)))?;

    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", &config.client_id)
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("scope", &config.scopes)
        .append_pair("state", state)
        .append_pair("nonce", nonce)
        .append_pair("code_challenge", code_challenge)
        .append_pair("code_challenge_method", "S256");

    // Providers that front their issuer with a hosted-UI domain expect the
    // browser on that host even when the metadata says otherwise.
    let base = hosted_base(config, metadata)?;
    if url.host_str() != base.host_str() {
        let _ = url.set_scheme(base.scheme());
        url.set_host(base.host_str())
            .map_err(|e| OidcError::InvalidEndpoint(e.to_string()))?;
        let _ = url.set_port(base.port());
    }

    Ok(url)
}

fn logout_url(
    config: &OidcConfig,
    metadata: &ProviderMetadata,
    post_logout_redirect: &str,
) -> Result<Url, OidcError> {
    // Prefer the advertised end-session endpoint; hosted-UI providers that
    // omit it use the conventional /logout page.
    let mut url = match &metadata.end_session_endpoint {
        Some(endpoint) => Url::parse(endpoint)
            .map_err(|e| OidcError::InvalidEndpoint(format!("end_session_endpoint: {}", e)))?,
        None => {
            let mut base = hosted_base(config, metadata)?;
            base.set_path("/logout");
            base
        }
    };

    url.query_pairs_mut()
        .append_pair("client_id", &config.client_id)
        .append_pair("logout_uri", post_logout_redirect);

    Ok(url)
}

/// Timeouts are retryable by re-initiating login; hard transport failures
/// are provider errors.
fn map_transport_error(error: reqwest::Error, stage: &str) -> OidcError {
    if error.is_timeout() {
        OidcError::UpstreamTimeout(format!("{} timed out: {}", stage, error))
    } else if stage == "discovery" {
        OidcError::Discovery(format!("{}: {}", stage, error))
    } else {
        OidcError::Provider(format!("{}: {}", stage, error))
    }
}

/// Random URL-safe string from `bytes` CSPRNG bytes.
fn random_urlsafe(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

/// PKCE S256 challenge for a verifier.
fn pkce_challenge_s256(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Decode the claims section of a compact JWT without verifying the
/// signature (see [`IdTokenClaims`] for the trust argument).
fn decode_id_token_claims(id_token: &str) -> Result<IdTokenClaims, OidcError> {
    let mut segments = id_token.split('.');
    let (_header, payload) = match (segments.next(), segments.next(), segments.next()) {
        (Some(header), Some(payload), Some(_signature)) => (header, payload),
        _ => {
            return Err(OidcError::ClaimsRejected(
                "ID token is not a compact JWT".to_string(),
            ))
        }
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| OidcError::ClaimsRejected("ID token payload is not base64url".to_string()))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| OidcError::ClaimsRejected(format!("ID token payload is not JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn test_config() -> OidcConfig {
        OidcConfig {
            issuer: Some("https://cognito-idp.us-east-1.amazonaws.com/pool".to_string()),
            domain: None,
            client_id: "client-123".to_string(),
            client_secret: "secret-456".to_string(),
            redirect_uri: "https://app.example.com/api/auth/callback".to_string(),
            scopes: "openid email profile".to_string(),
            logout_redirect_uri: None,
        }
    }

    fn test_metadata() -> ProviderMetadata {
        ProviderMetadata {
            issuer: "https://cognito-idp.us-east-1.amazonaws.com/pool".to_string(),
            authorization_endpoint: "https://auth.example.com/oauth2/authorize".to_string(),
            token_endpoint: "https://auth.example.com/oauth2/token".to_string(),
            end_session_endpoint: None,
        }
    }

    fn encode_claims(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{}.{}.signature", header, payload)
    }

    #[test]
    fn test_pkce_challenge_is_deterministic_and_43_chars() {
        let challenge = pkce_challenge_s256("some-verifier");
        assert_eq!(challenge.len(), 43);
        assert_eq!(challenge, pkce_challenge_s256("some-verifier"));
        assert_ne!(challenge, pkce_challenge_s256("other-verifier"));
    }

    #[test]
    fn test_random_urlsafe_is_fresh_per_call() {
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let value = random_urlsafe(24);
            assert_eq!(value.len(), 32);
            assert!(value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
            assert!(seen.insert(value), "random value repeated");
        }
    }

    #[test]
    fn test_discovery_candidates_prefer_domain() {
        let mut config = test_config();
        config.domain = Some("https://auth.example.com".to_string());
        let candidates = discovery_candidates(&config);
        assert_eq!(
            candidates,
            vec![
                "https://auth.example.com/.well-known/openid-configuration".to_string(),
                "https://auth.example.com/oauth2/.well-known/openid-configuration".to_string(),
                "https://cognito-idp.us-east-1.amazonaws.com/pool/.well-known/openid-configuration"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_authorize_url_carries_all_parameters() {
        let url = authorize_url(
            &test_config(),
            &test_metadata(),
            "state-1",
            "nonce-1",
            "challenge-1",
        )
        .unwrap();

        let query: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["client_id"], "client-123");
        assert_eq!(
            query["redirect_uri"],
            "https://app.example.com/api/auth/callback"
        );
        assert_eq!(query["scope"], "openid email profile");
        assert_eq!(query["state"], "state-1");
        assert_eq!(query["nonce"], "nonce-1");
        assert_eq!(query["code_challenge"], "challenge-1");
        assert_eq!(query["code_challenge_method"], "S256");
    }

    #[test]
    fn test_authorize_url_rebases_onto_hosted_domain() {
        let mut config = test_config();
        config.domain = Some("https://login.creatorflow.example".to_string());
        let url = authorize_url(&config, &test_metadata(), "s", "n", "c").unwrap();
        assert_eq!(url.host_str(), Some("login.creatorflow.example"));
        assert_eq!(url.path(), "/oauth2/authorize");
    }

    #[test]
    fn test_logout_url_uses_hosted_logout_page() {
        let url = logout_url(&test_config(), &test_metadata(), "https://app.example.com/")
            .unwrap();
        assert_eq!(url.host_str(), Some("auth.example.com"));
        assert_eq!(url.path(), "/logout");
        let query: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(query["client_id"], "client-123");
        assert_eq!(query["logout_uri"], "https://app.example.com/");
    }

    #[test]
    fn test_decode_id_token_claims() {
        let token = encode_claims(&serde_json::json!({
            "sub": "subject-1",
            "email": "creator@example.com",
            "nonce": "n-1",
            "aud": "client-123",
            "exp": 4_102_444_800i64,
        }));
        let claims = decode_id_token_claims(&token).unwrap();
        assert_eq!(claims.subject().unwrap(), "subject-1");
        assert_eq!(claims.resolve_email().as_deref(), Some("creator@example.com"));
        assert!(claims.audience_matches("client-123"));
        assert!(!claims.audience_matches("someone-else"));
    }

    #[test]
    fn test_decode_rejects_malformed_tokens() {
        assert!(decode_id_token_claims("not-a-jwt").is_err());
        assert!(decode_id_token_claims("a.b").is_err());
        assert!(decode_id_token_claims("a.!!!.c").is_err());
    }

    #[test]
    fn test_email_falls_back_to_cognito_username() {
        let token = encode_claims(&serde_json::json!({
            "sub": "subject-2",
            "cognito:username": "creator@example.com",
        }));
        let claims = decode_id_token_claims(&token).unwrap();
        assert_eq!(
            claims.resolve_email().as_deref(),
            Some("creator@example.com")
        );
    }

    #[test]
    fn test_name_resolution_composes_given_and_family() {
        let token = encode_claims(&serde_json::json!({
            "sub": "subject-3",
            "given_name": "Avery",
            "family_name": "Rivera",
        }));
        let claims = decode_id_token_claims(&token).unwrap();
        assert_eq!(claims.resolve_name().as_deref(), Some("Avery Rivera"));
    }

    #[test]
    fn test_aud_array_matches() {
        let token = encode_claims(&serde_json::json!({
            "sub": "subject-4",
            "aud": ["other", "client-123"],
        }));
        let claims = decode_id_token_claims(&token).unwrap();
        assert!(claims.audience_matches("client-123"));
    }

    #[tokio::test]
    async fn test_build_auth_url_mints_fresh_material_per_call() {
        let service = OidcService::new(test_config(), Client::new());
        service.metadata.set(test_metadata()).unwrap();

        let (_, first) = service.build_auth_url(None).await.unwrap();
        let (_, second) = service.build_auth_url(None).await.unwrap();
        assert_ne!(first.state, second.state);
        assert_ne!(first.nonce, second.nonce);
        assert_ne!(first.code_verifier, second.code_verifier);
        // Verifier has 43 chars (32 bytes, base64url) per RFC 7636 bounds
        assert_eq!(first.code_verifier.len(), 43);
    }
}
