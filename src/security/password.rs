//! Password Rules
//!
//! Strength checks applied to new passwords. Every violated rule is reported.

use crate::security::PasswordValidation;

/// Characters that satisfy the special-character rule.
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

/// Passwords rejected regardless of their composition, compared case-insensitively.
pub const COMMON_PASSWORDS: [&str; 5] = ["password", "123456", "password123", "admin", "qwerty"];

/// Validates `password` against the composition rules.
///
/// Length is counted in characters, not bytes.
pub fn validate_password(password: &str, min_length: usize) -> PasswordValidation {
    let mut errors = Vec::new();

    if password.chars().count() < min_length {
        errors.push(format!("Password must be at least {min_length} characters long"));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one number".to_string());
    }
    if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        errors.push("Password must contain at least one special character".to_string());
    }
    if COMMON_PASSWORDS
        .iter()
        .any(|common| common.eq_ignore_ascii_case(password))
    {
        errors.push("Password is too common".to_string());
    }

    PasswordValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weak_password_reports_every_rule() {
        let result = validate_password("weak", 8);

        assert!(!result.is_valid);
        assert_eq!(
            result.errors,
            vec![
                "Password must be at least 8 characters long",
                "Password must contain at least one uppercase letter",
                "Password must contain at least one number",
                "Password must contain at least one special character",
            ]
        );
    }

    #[test]
    fn test_strong_password() {
        let result = validate_password("StrongP@ssw0rd!", 8);

        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_common_password_case_insensitive() {
        let result = validate_password("PassWord123", 8);
        assert!(result.errors.contains(&"Password is too common".to_string()));
    }

    #[test]
    fn test_empty_password() {
        let result = validate_password("", 8);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 5);
    }

    #[test]
    fn test_custom_min_length() {
        assert!(validate_password("Ab1!", 4).is_valid);
        assert!(!validate_password("Ab1!", 12).is_valid);
    }

    #[test]
    fn test_each_special_character_counts() {
        for special in SPECIAL_CHARACTERS.chars() {
            let password = format!("Abcdefg1{special}");
            assert!(validate_password(&password, 8).is_valid, "{special} should count");
        }
    }
}
