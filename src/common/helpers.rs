// Helper functions for safe logging and redirect handling

/// Masks email addresses for safe logging
/// Prevents sensitive data exposure while preserving debugging utility
///
/// # Example
/// ```
/// let masked = safe_email_log("user@example.com");
/// // Returns: "u***@example.com"
/// ```
pub fn safe_email_log(email: &str) -> String {
    if email.len() > 3 {
        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() == 2 {
            format!("{}***@{}", &parts[0][..1.min(parts[0].len())], parts[1])
        } else {
            "***@***.***".to_string()
        }
    } else {
        "***@***.***".to_string()
    }
}

/// Masks tokens for safe logging
/// Shows only first and last 4 characters
///
/// # Example
/// ```
/// let masked = safe_token_log("k3H9dQ2mXv8pL5wTzR7nB1cY4fG6jA0s");
/// // Returns: "k3H9...jA0s"
/// ```
pub fn safe_token_log(token: &str) -> String {
    if token.len() > 8 {
        format!("{}...{}", &token[..4], &token[token.len() - 4..])
    } else {
        "***".to_string()
    }
}

/// Validates a `returnTo` value as a same-origin relative path.
///
/// Anything that is not a plain absolute path (`/...`) falls back to `/`:
/// protocol-relative (`//evil.example`), absolute URLs, backslash tricks,
/// and values with embedded control characters are all rejected. Login and
/// callback both route user-supplied redirect targets through here.
pub fn sanitize_return_path(raw: Option<&str>) -> String {
    let candidate = match raw {
        Some(value) if !value.is_empty() => value,
        _ => return "/".to_string(),
    };

    let safe = candidate.starts_with('/')
        && !candidate.starts_with("//")
        && !candidate.starts_with("/\\")
        && !candidate.contains('\\')
        && !candidate.contains("://")
        && !candidate.chars().any(|c| c.is_control());

    if safe {
        candidate.to_string()
    } else {
        "/".to_string()
    }
}
