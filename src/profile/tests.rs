//! Tests for profile module
//!
//! These tests verify platform normalization and the per-platform
//! credential shapes.

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::profile::models::{LinkedInCredentials, SocialCredentialData};
    use serde_json::json;

    #[test]
    fn test_platform_parse_and_normalization() {
        assert_eq!(Platform::parse("linkedin"), Some(Platform::Linkedin));
        assert_eq!(Platform::parse("LinkedIn"), Some(Platform::Linkedin));
        assert_eq!(Platform::parse("x"), Some(Platform::X));
        assert_eq!(Platform::parse("twitter"), Some(Platform::X));
        assert_eq!(Platform::parse("TWITTER"), Some(Platform::X));
        assert_eq!(Platform::parse("youtube"), Some(Platform::Youtube));
        assert_eq!(Platform::parse("myspace"), None);
        assert_eq!(Platform::parse(""), None);
    }

    #[test]
    fn test_platform_as_str_roundtrip() {
        for platform in [
            Platform::Cognito,
            Platform::Google,
            Platform::Linkedin,
            Platform::X,
            Platform::Instagram,
            Platform::Youtube,
            Platform::Tiktok,
        ] {
            assert_eq!(Platform::parse(platform.as_str()), Some(platform));
        }
    }

    #[test]
    fn test_linkedin_credentials_accept_valid_shape() {
        let data = json!({
            "access_token": "tok-1",
            "member_urn": "urn:li:person:AAAA",
        });
        let credential = SocialCredentialData::from_value(Platform::Linkedin, data).unwrap();
        assert_eq!(credential.platform(), Platform::Linkedin);
        match credential {
            SocialCredentialData::Linkedin(creds) => {
                assert_eq!(creds.access_token, "tok-1");
                assert_eq!(creds.member_urn, "urn:li:person:AAAA");
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_credentials_reject_missing_required_field() {
        // member_urn is required for LinkedIn
        let data = json!({ "access_token": "tok-1" });
        assert!(SocialCredentialData::from_value(Platform::Linkedin, data).is_err());
    }

    #[test]
    fn test_credentials_reject_unknown_fields() {
        let data = json!({
            "access_token": "tok-1",
            "member_urn": "urn:li:person:AAAA",
            "surprise": true,
        });
        assert!(SocialCredentialData::from_value(Platform::Linkedin, data).is_err());
    }

    #[test]
    fn test_credentials_reject_non_object_payload() {
        assert!(SocialCredentialData::from_value(Platform::X, json!("just a string")).is_err());
        assert!(SocialCredentialData::from_value(Platform::X, json!(42)).is_err());
    }

    #[test]
    fn test_to_value_roundtrips() {
        let credential = SocialCredentialData::Linkedin(LinkedInCredentials {
            access_token: "tok-2".to_string(),
            member_urn: "urn:li:person:BBBB".to_string(),
            refresh_token: None,
            expires_at: Some(1_900_000_000),
        });
        let value = credential.to_value();
        let parsed = SocialCredentialData::from_value(Platform::Linkedin, value).unwrap();
        assert_eq!(parsed, credential);
    }

    #[test]
    fn test_provider_identity_snapshot_shape() {
        let data = json!({
            "sub": "subject-1",
            "email": "creator@example.com",
            "name": "Avery",
        });
        let credential = SocialCredentialData::from_value(Platform::Cognito, data).unwrap();
        assert_eq!(credential.platform(), Platform::Cognito);
    }
}
