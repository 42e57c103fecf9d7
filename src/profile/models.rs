//! Profile and social-credential data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The platforms a creator can connect. `twitter` is accepted as an alias
/// and normalized to `x` everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Cognito,
    Google,
    Linkedin,
    X,
    Instagram,
    Youtube,
    Tiktok,
}

impl Platform {
    /// Case-insensitive parse with the `twitter` -> `x` normalization.
    /// Unknown platforms are None; callers answer with a 400.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "cognito" => Some(Platform::Cognito),
            "google" => Some(Platform::Google),
            "linkedin" => Some(Platform::Linkedin),
            "x" | "twitter" => Some(Platform::X),
            "instagram" => Some(Platform::Instagram),
            "youtube" => Some(Platform::Youtube),
            "tiktok" => Some(Platform::Tiktok),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Cognito => "cognito",
            Platform::Google => "google",
            Platform::Linkedin => "linkedin",
            Platform::X => "x",
            Platform::Instagram => "instagram",
            Platform::Youtube => "youtube",
            Platform::Tiktok => "tiktok",
        }
    }
}

/// Social credential database row. `data` holds the validated credential
/// document as JSON text.
#[derive(FromRow, Serialize, Debug, Clone)]
pub struct SocialCredentialRow {
    pub user_id: String,
    pub platform: String,
    pub data: String,
    pub created_at: i64,
    pub updated_at: i64,
}

// ============================================================================
// Per-platform credential shapes
// ============================================================================
//
// Each platform's credential document is a closed record: unknown fields
// and missing required fields are rejected at save time instead of
// surfacing as a publish failure weeks later.

/// Identity snapshot written by the OIDC callback for the `cognito` slot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProviderIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_user_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GoogleCredentials {
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_account: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LinkedInCredentials {
    pub access_token: String,
    /// e.g. `urn:li:person:XXXXXXXX`
    pub member_urn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct XCredentials {
    /// OAuth2 user-context bearer token
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InstagramCredentials {
    pub access_token: String,
    pub ig_user_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct YouTubeCredentials {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TikTokCredentials {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_id: Option<String>,
}

/// A credential document, tagged by platform.
#[derive(Debug, Clone, PartialEq)]
pub enum SocialCredentialData {
    Cognito(ProviderIdentity),
    Google(GoogleCredentials),
    Linkedin(LinkedInCredentials),
    X(XCredentials),
    Instagram(InstagramCredentials),
    Youtube(YouTubeCredentials),
    Tiktok(TikTokCredentials),
}

impl SocialCredentialData {
    /// Validate an untyped payload against the platform's record shape.
    /// The Err value is a human-readable description of the shape problem.
    pub fn from_value(platform: Platform, data: serde_json::Value) -> Result<Self, String> {
        let result = match platform {
            Platform::Cognito => {
                serde_json::from_value(data).map(SocialCredentialData::Cognito)
            }
            Platform::Google => serde_json::from_value(data).map(SocialCredentialData::Google),
            Platform::Linkedin => {
                serde_json::from_value(data).map(SocialCredentialData::Linkedin)
            }
            Platform::X => serde_json::from_value(data).map(SocialCredentialData::X),
            Platform::Instagram => {
                serde_json::from_value(data).map(SocialCredentialData::Instagram)
            }
            Platform::Youtube => serde_json::from_value(data).map(SocialCredentialData::Youtube),
            Platform::Tiktok => serde_json::from_value(data).map(SocialCredentialData::Tiktok),
        };
        result.map_err(|e| e.to_string())
    }

    pub fn platform(&self) -> Platform {
        match self {
            SocialCredentialData::Cognito(_) => Platform::Cognito,
            SocialCredentialData::Google(_) => Platform::Google,
            SocialCredentialData::Linkedin(_) => Platform::Linkedin,
            SocialCredentialData::X(_) => Platform::X,
            SocialCredentialData::Instagram(_) => Platform::Instagram,
            SocialCredentialData::Youtube(_) => Platform::Youtube,
            SocialCredentialData::Tiktok(_) => Platform::Tiktok,
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        let result = match self {
            SocialCredentialData::Cognito(c) => serde_json::to_value(c),
            SocialCredentialData::Google(c) => serde_json::to_value(c),
            SocialCredentialData::Linkedin(c) => serde_json::to_value(c),
            SocialCredentialData::X(c) => serde_json::to_value(c),
            SocialCredentialData::Instagram(c) => serde_json::to_value(c),
            SocialCredentialData::Youtube(c) => serde_json::to_value(c),
            SocialCredentialData::Tiktok(c) => serde_json::to_value(c),
        };
        // Serialization of these closed records cannot fail
        result.unwrap_or(serde_json::Value::Null)
    }
}

/// POST /api/profile/credentials request body
#[derive(Deserialize, Debug)]
pub struct UpsertCredentialPayload {
    pub platform: String,
    pub data: serde_json::Value,
}

/// POST /api/profile request body
#[derive(Deserialize, Debug)]
pub struct UpdateProfilePayload {
    pub name: Option<String>,
    pub picture: Option<String>,
}
