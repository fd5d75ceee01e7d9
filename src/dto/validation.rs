//! Validation helpers for DTOs.

use validator::ValidationError;

/// Rejects text that is empty once surrounding whitespace is removed.
///
/// # Examples
///
/// ```ignore
/// validate_not_blank("Friday Night") // Ok
/// validate_not_blank("   ")          // Err
/// ```
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Rejects a user name that is blank or spans several lines.
pub fn validate_user_name(value: &str) -> Result<(), ValidationError> {
    validate_not_blank(value)?;
    if value.chars().any(char::is_control) {
        let mut err = ValidationError::new("user_name_format");
        err.message = Some("User name must not contain control characters".into());
        return Err(err);
    }
    Ok(())
}
