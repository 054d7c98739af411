//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest guest name accepted on join.
pub const MAX_GUEST_NAME_LEN: usize = 32;
/// Longest course reference accepted on room creation.
pub const MAX_COURSE_ID_LEN: usize = 64;

/// Validates a guest display name: 1 to 32 characters, not blank, no surrounding whitespace,
/// no control characters.
///
/// # Examples
///
/// ```ignore
/// validate_guest_name("Ace Chaser") // Ok
/// validate_guest_name("   ")        // Err - blank
/// validate_guest_name(" Sam")       // Err - surrounding whitespace
/// validate_guest_name("tab\there")  // Err - control character
/// ```
pub fn validate_guest_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("guest_name_blank");
        err.message = Some("Guest name must not be blank".into());
        return Err(err);
    }

    if name.trim() != name {
        let mut err = ValidationError::new("guest_name_whitespace");
        err.message = Some("Guest name must not start or end with whitespace".into());
        return Err(err);
    }

    let length = name.chars().count();
    if length > MAX_GUEST_NAME_LEN {
        let mut err = ValidationError::new("guest_name_length");
        err.message = Some(
            format!("Guest name must be at most {MAX_GUEST_NAME_LEN} characters (got {length})")
                .into(),
        );
        return Err(err);
    }

    if name.chars().any(char::is_control) {
        let mut err = ValidationError::new("guest_name_format");
        err.message = Some("Guest name must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates an opaque course reference: 1 to 64 characters without whitespace.
pub fn validate_course_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > MAX_COURSE_ID_LEN {
        let mut err = ValidationError::new("course_id_length");
        err.message = Some(
            format!(
                "Course id must be between 1 and {MAX_COURSE_ID_LEN} characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
        let mut err = ValidationError::new("course_id_format");
        err.message = Some("Course id must not contain whitespace".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_guest_name_valid() {
        assert!(validate_guest_name("Ace Chaser").is_ok());
        assert!(validate_guest_name("é").is_ok());
        assert!(validate_guest_name(&"x".repeat(MAX_GUEST_NAME_LEN)).is_ok());
    }

    #[test]
    fn test_validate_guest_name_invalid() {
        assert!(validate_guest_name("").is_err());
        assert!(validate_guest_name("   ").is_err());
        assert!(validate_guest_name(&"x".repeat(MAX_GUEST_NAME_LEN + 1)).is_err());
        assert!(validate_guest_name("tab\there").is_err());
        assert!(validate_guest_name(" Sam").is_err());
        assert!(validate_guest_name("Sam ").is_err());
    }

    #[test]
    fn test_validate_course_id() {
        assert!(validate_course_id("maple-hill").is_ok());
        assert!(validate_course_id("").is_err());
        assert!(validate_course_id("maple hill").is_err());
        assert!(validate_course_id(&"c".repeat(MAX_COURSE_ID_LEN + 1)).is_err());
    }
}
