//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() < 3 {
        return Err("Username must be at least 3 characters long".to_string());
    }

    if username.len() > 32 {
        return Err("Username must be at most 32 characters long".to_string());
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err("Username can only contain letters, numbers, and underscores".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password: length plus at least one letter and one digit
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err("Password must contain at least one letter".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit".to_string());
    }

    Ok(())
}

/// Validate a submitted image URL: either an /uploads/ path served by this
/// service or an absolute http(s) URL
pub fn validate_image_url(image_url: &str) -> Result<(), String> {
    if image_url.is_empty() {
        return Err("Image URL is required".to_string());
    }

    if image_url.len() > 2048 {
        return Err("Image URL must be at most 2048 characters long".to_string());
    }

    let accepted = image_url.starts_with("/uploads/")
        || image_url.starts_with("http://")
        || image_url.starts_with("https://");

    if !accepted {
        return Err("Image URL must be an /uploads/ path or an http(s) URL".to_string());
    }

    Ok(())
}

/// Validate report categories: at most five short labels
pub fn validate_report_categories(categories: &[String]) -> Result<(), String> {
    if categories.len() > 5 {
        return Err("At most five report categories are allowed".to_string());
    }

    for category in categories {
        if category.is_empty() || category.len() > 32 {
            return Err("Report categories must be between 1 and 32 characters".to_string());
        }
    }

    Ok(())
}
