//! Input validation.
//!
//! Input shapes derive [`validator::Validate`]. [`CheckedInput::check`] turns
//! the collected errors into the first violated rule, in field order, as
//! `AuthError::ValidationError`.

use std::borrow::Cow;

use validator::{Validate, ValidationError, ValidationErrors};

use super::AuthError;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// At least one of these must appear in a password.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*";

pub const PASSWORD_REQUIRED_MESSAGE: &str = "Password is required";

pub const PASSWORD_LENGTH_MESSAGE: &str = "Password must be at least 8 characters long";

pub const PASSWORD_POLICY_MESSAGE: &str = "Password must contain at least one lowercase letter, \
     one uppercase letter, one number, and one special character";

pub const EMAIL_REQUIRED_MESSAGE: &str = "Email is required";

pub const EMAIL_FORMAT_MESSAGE: &str = "Please enter a valid email address";

/// Code `validator` uses for `length` rules. A missing value is reported
/// before any format rule on the same field.
const LENGTH_CODE: &str = "length";

/// A derived [`Validate`] shape with a fixed reporting order.
pub trait CheckedInput: Validate {
    /// Field names in the order their rules are reported.
    const FIELDS: &'static [&'static str];

    fn check(&self) -> Result<(), AuthError> {
        self.validate()
            .map_err(|errors| AuthError::ValidationError(first_violation(&errors, Self::FIELDS)))
    }
}

/// Message of the first violated rule, walking `fields` in order.
pub fn first_violation(errors: &ValidationErrors, fields: &[&str]) -> String {
    let by_field = errors.field_errors();
    fields
        .iter()
        .filter_map(|field| by_field.get(*field))
        .chain(by_field.values())
        .find_map(|field_errors| field_errors.iter().min_by_key(|e| e.code != LENGTH_CODE))
        .and_then(|e| e.message.as_ref())
        .map(|m| m.to_string())
        .unwrap_or_else(|| "Invalid input".to_string())
}

fn violation(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Password policy: length, then one each of lowercase, uppercase, digit and
/// a symbol from [`PASSWORD_SYMBOLS`].
pub fn password_policy(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(violation("password_required", PASSWORD_REQUIRED_MESSAGE));
    }
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(violation("password_length", PASSWORD_LENGTH_MESSAGE));
    }
    let has_lower = value.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = value.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    let has_symbol = value.chars().any(|c| PASSWORD_SYMBOLS.contains(c));
    if !(has_lower && has_upper && has_digit && has_symbol) {
        return Err(violation("password_policy", PASSWORD_POLICY_MESSAGE));
    }
    Ok(())
}

/// Lower-cased, trimmed e-mail used as the uniqueness and lookup key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Signup {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
        #[validate(
            length(min = 1, message = "Email is required"),
            email(message = "Please enter a valid email address")
        )]
        email: String,
        #[validate(custom(function = "password_policy"))]
        password: String,
    }

    impl CheckedInput for Signup {
        const FIELDS: &'static [&'static str] = &["name", "email", "password"];
    }

    fn signup(name: &str, email: &str, password: &str) -> Signup {
        Signup {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn message(input: &Signup) -> String {
        match input.check() {
            Err(AuthError::ValidationError(m)) => m,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn reports_first_field_in_order() {
        assert_eq!(message(&signup("", "nope", "")), "Name is required");
        assert_eq!(message(&signup("A", "nope", "")), EMAIL_FORMAT_MESSAGE);
        assert_eq!(message(&signup("A", "a@b.com", "")), PASSWORD_REQUIRED_MESSAGE);
    }

    #[test]
    fn missing_email_beats_malformed_email() {
        assert_eq!(message(&signup("A", "", "Str0ng!Pass")), EMAIL_REQUIRED_MESSAGE);
    }

    #[test]
    fn accepts_valid_input() {
        assert!(signup("A", "user.name+tag@example.co.uk", "Str0ng!Pass").check().is_ok());
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  A@B.Com "), "a@b.com");
    }

    #[test]
    fn password_rules_in_order() {
        let msg = |pw: &str| password_policy(pw).unwrap_err().message.unwrap().to_string();
        assert_eq!(msg(""), PASSWORD_REQUIRED_MESSAGE);
        assert_eq!(msg("Aa1!"), PASSWORD_LENGTH_MESSAGE);
        assert_eq!(msg("alllowercase1!"), PASSWORD_POLICY_MESSAGE);
        assert_eq!(msg("NoSymbol123"), PASSWORD_POLICY_MESSAGE);
        assert!(password_policy("Str0ng!Pass").is_ok());
    }
}
