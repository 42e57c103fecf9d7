//! Request validation for projects

use super::models::CreateProjectRequest;
use crate::common::{ValidationResult, Validator};

pub struct ProjectValidator;

impl Validator<CreateProjectRequest> for ProjectValidator {
    fn validate(&self, data: &CreateProjectRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.title.trim().is_empty() {
            result.add_error("title", "Title is required");
        } else if data.title.len() > 200 {
            result.add_error("title", "Title must be at most 200 characters");
        }

        if let Some(description) = &data.description {
            if description.len() > 5000 {
                result.add_error("description", "Description must be at most 5000 characters");
            }
        }

        result
    }
}
