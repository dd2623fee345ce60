//! Form-shape validation — simple length checks on request payloads.
//!
//! Failures map to VALIDATION_ERROR. Anything deeper (existence,
//! permissions) belongs to the access guards, not here.

use crate::error::DomainError;

fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<(), DomainError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(DomainError::Validation(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

pub fn validate_user_form(username: &str, password: &str) -> Result<(), DomainError> {
    check_len("username", username, 3, 32)?;
    check_len("password", password, 3, 32)
}

pub fn validate_project_form(title: &str, description: &str) -> Result<(), DomainError> {
    check_len("title", title, 3, 64)?;
    check_len("description", description, 4, 1024)
}

pub fn validate_category_form(title: &str) -> Result<(), DomainError> {
    check_len("title", title, 3, 64)
}

pub fn validate_task_form(title: &str, description: &str) -> Result<(), DomainError> {
    check_len("title", title, 3, 64)?;
    check_len("description", description, 0, 1024)
}
