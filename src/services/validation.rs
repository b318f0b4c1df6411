use regex::Regex;
use std::sync::OnceLock;

use crate::services::onboarding_service::OnboardingError;

/// Trimmed value of a required text field.
pub fn require<'a>(field: &'static str, value: &'a str) -> Result<&'a str, OnboardingError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(OnboardingError::MissingField(field));
    }
    Ok(trimmed)
}

/// Like [`require`] but keeps surrounding whitespace, which is significant in
/// passwords.
pub fn require_secret<'a>(field: &'static str, value: &'a str) -> Result<&'a str, OnboardingError> {
    if value.trim().is_empty() {
        return Err(OnboardingError::MissingField(field));
    }
    Ok(value)
}

/// Trims the address and checks its shape. Case is preserved.
pub fn normalize_email(value: &str) -> Result<String, OnboardingError> {
    let email = require("email", value)?;

    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex"));

    if !re.is_match(email) {
        return Err(OnboardingError::MalformedEmail);
    }
    Ok(email.to_string())
}

pub fn check_password_strength(password: &str, min_length: usize) -> Result<(), OnboardingError> {
    if password.chars().count() < min_length {
        return Err(OnboardingError::WeakPassword(min_length));
    }
    Ok(())
}

/// `None` for absent and whitespace-only input.
#[must_use]
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
