//! Request validation for the local auth path

use super::models::RegisterPayload;
use crate::common::{ValidationResult, Validator};

pub struct RegisterValidator;

impl Validator<RegisterPayload> for RegisterValidator {
    fn validate(&self, data: &RegisterPayload) -> ValidationResult {
        let mut result = ValidationResult::new();

        let email = data.email.trim();
        if email.is_empty() {
            result.add_error("email", "Email is required");
        } else if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            result.add_error("email", "Email is not valid");
        } else if email.len() > 254 {
            result.add_error("email", "Email must be at most 254 characters");
        }

        if data.password.is_empty() {
            result.add_error("password", "Password is required");
        } else if data.password.len() < 8 {
            result.add_error("password", "Password must be at least 8 characters");
        } else if data.password.len() > 128 {
            result.add_error("password", "Password must be at most 128 characters");
        }

        if let Some(name) = &data.name {
            if name.len() > 120 {
                result.add_error("name", "Name must be at most 120 characters");
            }
        }

        result
    }
}
