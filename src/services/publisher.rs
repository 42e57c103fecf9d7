// src/services/publisher.rs
//! Per-platform social publishers
//!
//! Each publisher is a thin REST call using the caller's stored
//! credentials. Failures are values, not exceptions: every attempt
//! resolves to a receipt or a PublishError, and the publish route
//! aggregates them per platform without aborting the batch.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::profile::models::{
    LinkedInCredentials, Platform, SocialCredentialData, XCredentials,
};

const UPSTREAM_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("No {0} credentials saved")]
    NotConnected(String),

    #[error("Stored {0} credentials are malformed: {1}")]
    MalformedCredentials(String, String),

    #[error("Publishing to {0} is not supported")]
    Unsupported(String),

    #[error("{platform} error: {detail}")]
    Upstream { platform: String, detail: String },

    #[error("{0} request timed out")]
    UpstreamTimeout(String),
}

/// Receipt for a successful post.
#[derive(Debug, Clone)]
pub struct PublishReceipt {
    pub id: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug)]
pub struct PublisherService {
    client: Client,
}

impl PublisherService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Publish `text` to one platform using the stored credential
    /// document. A credential stored under a different platform's shape is
    /// a malformed-credentials failure, not a panic.
    pub async fn publish(
        &self,
        platform: Platform,
        credentials: &SocialCredentialData,
        text: &str,
    ) -> Result<PublishReceipt, PublishError> {
        match (platform, credentials) {
            (Platform::Linkedin, SocialCredentialData::Linkedin(creds)) => {
                self.publish_linkedin(creds, text).await
            }
            (Platform::X, SocialCredentialData::X(creds)) => self.publish_x(creds, text).await,
            (Platform::Linkedin, _) | (Platform::X, _) => Err(PublishError::MalformedCredentials(
                platform.as_str().to_string(),
                "credential document does not match the platform".to_string(),
            )),
            _ => Err(PublishError::Unsupported(platform.as_str().to_string())),
        }
    }

    /// Share a text post on LinkedIn via the ugcPosts endpoint.
    async fn publish_linkedin(
        &self,
        creds: &LinkedInCredentials,
        text: &str,
    ) -> Result<PublishReceipt, PublishError> {
        #[derive(Deserialize)]
        struct UgcPostResponse {
            #[serde(default)]
            id: Option<String>,
        }

        let body = serde_json::json!({
            "author": creds.member_urn,
            "lifecycleState": "PUBLISHED",
            "specificContent": {
                "com.linkedin.ugc.ShareContent": {
                    "shareCommentary": { "text": text },
                    "shareMediaCategory": "NONE",
                },
            },
            "visibility": {
                "com.linkedin.ugc.MemberNetworkVisibility": "CONNECTIONS",
            },
        });

        debug!(author = %creds.member_urn, "Posting to LinkedIn");

        let response = self
            .client
            .post("https://api.linkedin.com/v2/ugcPosts")
            .bearer_auth(&creds.access_token)
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&body)
            .timeout(std::time::Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| map_transport_error(e, Platform::Linkedin))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(http_status = %status, "LinkedIn post rejected");
            return Err(PublishError::Upstream {
                platform: "linkedin".to_string(),
                detail: format!("{}: {}", status, truncate(&detail)),
            });
        }

        let parsed: UgcPostResponse = response.json().await.map_err(|e| {
            PublishError::Upstream {
                platform: "linkedin".to_string(),
                detail: format!("malformed response: {}", e),
            }
        })?;

        info!("LinkedIn post published");
        Ok(PublishReceipt {
            id: parsed.id,
            url: None,
        })
    }

    /// Create a post on X via the v2 tweets endpoint (OAuth2 user-context
    /// bearer token).
    async fn publish_x(
        &self,
        creds: &XCredentials,
        text: &str,
    ) -> Result<PublishReceipt, PublishError> {
        #[derive(Deserialize)]
        struct TweetData {
            #[serde(default)]
            id: Option<String>,
        }
        #[derive(Deserialize)]
        struct TweetResponse {
            #[serde(default)]
            data: Option<TweetData>,
        }

        debug!("Posting to X");

        let response = self
            .client
            .post("https://api.twitter.com/2/tweets")
            .bearer_auth(&creds.access_token)
            .json(&serde_json::json!({ "text": text }))
            .timeout(std::time::Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| map_transport_error(e, Platform::X))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(http_status = %status, "X post rejected");
            return Err(PublishError::Upstream {
                platform: "x".to_string(),
                detail: format!("{}: {}", status, truncate(&detail)),
            });
        }

        let parsed: TweetResponse = response.json().await.map_err(|e| PublishError::Upstream {
            platform: "x".to_string(),
            detail: format!("malformed response: {}", e),
        })?;

        let id = parsed.data.and_then(|d| d.id);
        let url = id
            .as_ref()
            .map(|id| format!("https://x.com/i/web/status/{}", id));

        info!("X post published");
        Ok(PublishReceipt { id, url })
    }
}

fn map_transport_error(error: reqwest::Error, platform: Platform) -> PublishError {
    if error.is_timeout() {
        PublishError::UpstreamTimeout(platform.as_str().to_string())
    } else {
        PublishError::Upstream {
            platform: platform.as_str().to_string(),
            detail: error.to_string(),
        }
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(200).collect()
}
