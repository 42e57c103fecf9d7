//! Tests for projects module

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::common::Validator;

    fn request(title: &str) -> models::CreateProjectRequest {
        models::CreateProjectRequest {
            title: title.to_string(),
            description: None,
            cover_url: None,
            content_url: None,
        }
    }

    #[test]
    fn test_project_validator_requires_title() {
        let result = validators::ProjectValidator.validate(&request(""));
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "title"));

        let result = validators::ProjectValidator.validate(&request("   "));
        assert!(!result.is_valid);
    }

    #[test]
    fn test_project_validator_accepts_valid_request() {
        let mut valid = request("Spring drop");
        valid.description = Some("Teaser reel for the spring collection".to_string());
        let result = validators::ProjectValidator.validate(&valid);
        assert!(result.is_valid);
    }

    #[test]
    fn test_project_validator_bounds_title_length() {
        let result = validators::ProjectValidator.validate(&request(&"x".repeat(201)));
        assert!(!result.is_valid);
    }

    #[test]
    fn test_create_request_accepts_camel_case_urls() {
        let parsed: models::CreateProjectRequest = serde_json::from_str(
            r#"{"title": "T", "coverUrl": "/c.png", "contentUrl": "/v.mp4"}"#,
        )
        .unwrap();
        assert_eq!(parsed.cover_url.as_deref(), Some("/c.png"));
        assert_eq!(parsed.content_url.as_deref(), Some("/v.mp4"));
    }
}
