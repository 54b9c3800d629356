//! Login and signup form state with submit-time validation.
//!
//! Forms are deserialized straight from the submitted fields and only
//! checked when the user submits. A form that passes validation turns into
//! [`Credentials`] or [`Registration`], the only shapes the API client
//! accepts, so an unvalidated form can never reach the network.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

pub const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Email and password are required.")]
    MissingCredentials,
    #[error("All fields are required.")]
    MissingFields,
    #[error("Passwords do not match.")]
    PasswordMismatch,
    #[error("Password must be at least 6 characters.")]
    PasswordTooShort,
}

#[derive(Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl LoginForm {
    pub fn validate(self) -> Result<Credentials, FormError> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(FormError::MissingCredentials);
        }
        Ok(Credentials {
            email: self.email,
            password: SecretString::from(self.password),
        })
    }
}

/// Field names match the original signup form (`firstName`, ...).
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupForm")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish_non_exhaustive()
    }
}

impl SignupForm {
    /// Checks run in a fixed order: presence, match, length.
    pub fn validate(self) -> Result<Registration, FormError> {
        let any_empty = [
            &self.email,
            &self.first_name,
            &self.last_name,
            &self.password,
            &self.confirm_password,
        ]
        .iter()
        .any(|field| field.is_empty());

        if any_empty {
            return Err(FormError::MissingFields);
        }
        if self.password != self.confirm_password {
            return Err(FormError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(FormError::PasswordTooShort);
        }

        Ok(Registration {
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            password: SecretString::from(self.password),
        })
    }
}

/// Validated login input.
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

/// Validated signup input. The confirmation field is dropped here.
pub struct Registration {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: SecretString,
}

impl Registration {
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn signup(password: &str, confirm: &str) -> SignupForm {
        SignupForm {
            email: "a@b.com".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            password: password.into(),
            confirm_password: confirm.into(),
        }
    }

    #[test]
    fn test_login_requires_both_fields() {
        let missing_password = LoginForm { email: "a@b.com".into(), password: String::new() };
        let missing_email = LoginForm { email: String::new(), password: "secret1".into() };
        assert_eq!(missing_password.validate().err(), Some(FormError::MissingCredentials));
        assert_eq!(missing_email.validate().err(), Some(FormError::MissingCredentials));
    }

    #[test]
    fn test_login_passes_through_values() {
        let creds = LoginForm { email: "a@b.com".into(), password: "secret1".into() }
            .validate()
            .unwrap();
        assert_eq!(creds.email, "a@b.com");
        assert_eq!(creds.password(), "secret1");
    }

    #[test]
    fn test_signup_every_field_is_required() {
        for clear in 0..5 {
            let mut form = signup("secret1", "secret1");
            match clear {
                0 => form.email.clear(),
                1 => form.first_name.clear(),
                2 => form.last_name.clear(),
                3 => form.password.clear(),
                _ => form.confirm_password.clear(),
            }
            assert_eq!(form.validate().err(), Some(FormError::MissingFields), "field {clear}");
        }
    }

    #[test]
    fn test_signup_password_length_boundary() {
        assert_eq!(signup("12345", "12345").validate().err(), Some(FormError::PasswordTooShort));
        assert!(signup("123456", "123456").validate().is_ok());
    }

    #[test]
    fn test_signup_mismatch_wins_over_length() {
        assert_eq!(signup("abc", "abd").validate().err(), Some(FormError::PasswordMismatch));
        assert_eq!(
            signup("longenough1", "longenough2").validate().err(),
            Some(FormError::PasswordMismatch)
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(FormError::MissingCredentials.to_string(), "Email and password are required.");
        assert_eq!(FormError::PasswordTooShort.to_string(), "Password must be at least 6 characters.");
    }

    #[test]
    fn test_debug_hides_passwords() {
        let rendered = format!("{:?}", signup("hunter22", "hunter22"));
        assert!(!rendered.contains("hunter22"));
    }
}
