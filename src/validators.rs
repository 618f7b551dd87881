//! Custom field validators used by the request DTOs.

use std::borrow::Cow;

use rust_decimal::Decimal;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::models::user::{max_hourly_rate, normalize_hourly_rate};

/// Special characters a password may (and must, at least once) contain.
pub const PASSWORD_SPECIAL_CHARS: &str = "@$!%*#?&";

/// Password must contain a letter, a digit and one of `@$!%*#?&`, and nothing
/// outside those classes.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let is_special = |c: char| PASSWORD_SPECIAL_CHARS.contains(c);

    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(is_special);
    let only_allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || is_special(c));

    if has_letter && has_digit && has_special && only_allowed {
        Ok(())
    } else {
        Err(ValidationError::new("password_strength").with_message(Cow::Borrowed(
            "Password must contain letters, digits and special characters (@$!%*#?&)",
        )))
    }
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank"));
    }
    Ok(())
}

/// Zero or more, and small enough for NUMERIC(10, 2) once rounded to cents.
pub fn validate_hourly_rate(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("non_negative")
            .with_message(Cow::Borrowed("Hourly rate must be zero or greater")));
    }
    if normalize_hourly_rate(*value) > max_hourly_rate() {
        return Err(ValidationError::new("hourly_rate_range")
            .with_message(Cow::Borrowed("Hourly rate must be at most 99999999.99")));
    }
    Ok(())
}

/// Flattens validator output into `field: message` pairs, sorted by field so
/// the resulting message is stable.
pub fn describe_validation_errors(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .errors()
        .iter()
        .flat_map(|(field, kind)| match kind {
            ValidationErrorsKind::Field(errs) => errs
                .iter()
                .map(|e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    format!("{}: {}", to_camel_case(field), message)
                })
                .collect::<Vec<_>>(),
            _ => vec![format!("{}: invalid", to_camel_case(field))],
        })
        .collect();

    parts.sort();
    parts.join(", ")
}

/// Field names are reported the way clients send them.
fn to_camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
