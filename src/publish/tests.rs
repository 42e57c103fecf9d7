//! Tests for publish module
//!
//! These tests verify the per-platform result aggregation: failures are
//! values in the response map, never exceptions aborting the batch.

#[cfg(test)]
mod tests {
    use super::super::models::outcome_entry;
    use crate::services::publisher::{PublishError, PublishReceipt};

    #[test]
    fn test_outcome_entry_for_success_with_ids() {
        let result = Ok(PublishReceipt {
            id: Some("1234".to_string()),
            url: Some("https://x.com/i/web/status/1234".to_string()),
        });
        let entry = outcome_entry(&result);
        assert_eq!(entry["ok"], true);
        assert_eq!(entry["id"], "1234");
        assert_eq!(entry["url"], "https://x.com/i/web/status/1234");
    }

    #[test]
    fn test_outcome_entry_omits_absent_fields() {
        let result = Ok(PublishReceipt { id: None, url: None });
        let entry = outcome_entry(&result);
        assert_eq!(entry["ok"], true);
        assert!(entry.get("id").is_none());
        assert!(entry.get("url").is_none());
    }

    #[test]
    fn test_outcome_entry_for_failures() {
        let not_connected: Result<PublishReceipt, _> =
            Err(PublishError::NotConnected("x".to_string()));
        let entry = outcome_entry(&not_connected);
        assert_eq!(entry["ok"], false);
        assert_eq!(entry["error"], "No x credentials saved");

        let timeout: Result<PublishReceipt, _> =
            Err(PublishError::UpstreamTimeout("linkedin".to_string()));
        let entry = outcome_entry(&timeout);
        assert_eq!(entry["ok"], false);
        assert_eq!(entry["error"], "linkedin request timed out");
    }

    #[tokio::test]
    async fn test_publisher_rejects_mismatched_credentials() {
        use crate::profile::models::{Platform, ProviderIdentity, SocialCredentialData};
        use crate::services::publisher::PublisherService;

        let publisher = PublisherService::new(reqwest::Client::new());
        let wrong_shape = SocialCredentialData::Cognito(ProviderIdentity {
            sub: None,
            email: None,
            name: None,
            picture: None,
            provider_name: None,
            provider_user_id: None,
        });

        let result = publisher
            .publish(Platform::Linkedin, &wrong_shape, "hello")
            .await;
        assert!(matches!(
            result,
            Err(PublishError::MalformedCredentials(_, _))
        ));

        let unsupported = publisher
            .publish(Platform::Instagram, &wrong_shape, "hello")
            .await;
        assert!(matches!(unsupported, Err(PublishError::Unsupported(_))));
    }
}
