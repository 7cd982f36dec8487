//! Local form rules, checked before anything is sent to the collaborator.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::api::SignUp;

pub const USER_NAME_MIN: usize = 3;
pub const USER_NAME_MAX: usize = 20;
pub const PASSWORD_MIN: usize = 6;
pub const CONTENT_MIN: usize = 10;
pub const CONTENT_MAX: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("Username must be at least {} characters", USER_NAME_MIN)]
    UserNameTooShort,

    #[error("Username must be no more than {} characters", USER_NAME_MAX)]
    UserNameTooLong,

    #[error("Username must not contain special characters")]
    UserNameCharset,

    #[error("Invalid email address")]
    Email,

    #[error("Password must be at least {} characters", PASSWORD_MIN)]
    PasswordTooShort,

    #[error("Content must be at least {} characters", CONTENT_MIN)]
    ContentTooShort,

    #[error("Content must not be longer than {} characters", CONTENT_MAX)]
    ContentTooLong,
}

/// Errors keyed by the form field they belong to.
pub type FieldErrors = BTreeMap<&'static str, ValidationError>;

pub fn user_name(value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len == 0 {
        return Err(ValidationError::Required("Username"));
    }
    if len < USER_NAME_MIN {
        return Err(ValidationError::UserNameTooShort);
    }
    if len > USER_NAME_MAX {
        return Err(ValidationError::UserNameTooLong);
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::UserNameCharset);
    }
    Ok(())
}

pub fn email(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Required("Email"));
    }
    let Some((local, domain)) = value.split_once('@') else {
        return Err(ValidationError::Email);
    };
    let well_formed = !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace);
    if well_formed { Ok(()) } else { Err(ValidationError::Email) }
}

pub fn password(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Required("Password"));
    }
    if value.chars().count() < PASSWORD_MIN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// Anonymous message body: non-blank, between [`CONTENT_MIN`] and [`CONTENT_MAX`] characters.
pub fn message_content(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required("Content"));
    }
    let len = value.chars().count();
    if len < CONTENT_MIN {
        return Err(ValidationError::ContentTooShort);
    }
    if len > CONTENT_MAX {
        return Err(ValidationError::ContentTooLong);
    }
    Ok(())
}

pub fn sign_up(form: &SignUp) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if let Err(e) = user_name(&form.user_name) {
        errors.insert("userName", e);
    }
    if let Err(e) = email(&form.email) {
        errors.insert("email", e);
    }
    if let Err(e) = password(&form.password) {
        errors.insert("password", e);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
