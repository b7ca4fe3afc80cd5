//! Signed-in identity, credential validation and auth failure classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::errors::DomainError;

const MIN_FULL_NAME_LEN: usize = 2;

/// The principal the cart and checkout act on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

/// Classified authentication failures, each with a stable code and a
/// suggested next step for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("Invalid email or password. Please check your credentials and try again.")]
    InvalidCredentials,
    #[error("This email is already registered. Please sign in instead.")]
    EmailTaken,
    #[error("Please choose a stronger password.")]
    WeakPassword,
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    #[error("Full name can only contain letters and spaces.")]
    InvalidName,
    #[error("Passwords do not match.")]
    PasswordMismatch,
}

impl AuthFailure {
    pub fn code(&self) -> &'static str {
        match self {
            AuthFailure::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthFailure::EmailTaken => "EMAIL_EXISTS",
            AuthFailure::WeakPassword => "WEAK_PASSWORD",
            AuthFailure::InvalidEmail => "INVALID_EMAIL",
            AuthFailure::InvalidName => "INVALID_NAME",
            AuthFailure::PasswordMismatch => "PASSWORD_MISMATCH",
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            AuthFailure::InvalidCredentials => "Please verify your email and password are correct.",
            AuthFailure::EmailTaken => {
                "Use the sign in form or reset your password if you forgot it."
            }
            AuthFailure::WeakPassword => {
                "Your password must be at least 8 characters and contain uppercase, lowercase, and numbers."
            }
            AuthFailure::InvalidEmail => "Check that your email address is correctly formatted.",
            AuthFailure::InvalidName => "Enter at least 2 letters.",
            AuthFailure::PasswordMismatch => "Re-enter the same password in both fields.",
        }
    }
}

/// The address must name a host with at least one dot, as in `a@b.co`.
fn dotted_domain(email: &str) -> Result<(), ValidationError> {
    match email.rsplit_once('@') {
        Some((_, domain)) if domain.contains('.') => Ok(()),
        _ => Err(ValidationError::new("email")),
    }
}

fn mixed_case_and_digit(password: &str) -> Result<(), ValidationError> {
    if password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
    {
        Ok(())
    } else {
        Err(ValidationError::new("weak_password"))
    }
}

fn letters_and_spaces(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.chars().count() >= MIN_FULL_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c.is_whitespace())
    {
        Ok(())
    } else {
        Err(ValidationError::new("full_name"))
    }
}

/// Normalised email used as the lookup key for profiles.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Validate)]
pub struct Credentials {
    #[validate(email, custom(function = "dotted_domain"), length(max = 254))]
    email: String,
    #[validate(length(min = 1, max = 128))]
    password: String,
}

impl Credentials {
    pub fn try_new(email: &str, password: &str) -> Result<Self, AuthFailure> {
        let credentials = Self {
            email: normalize_email(email),
            password: password.to_string(),
        };
        match credentials.validate() {
            Ok(()) => Ok(credentials),
            Err(errors) if errors.field_errors().contains_key("email") => {
                Err(AuthFailure::InvalidEmail)
            }
            Err(_) => Err(AuthFailure::InvalidCredentials),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

#[derive(Debug, Clone, Validate)]
pub struct SignUp {
    #[validate(email, custom(function = "dotted_domain"), length(max = 254))]
    pub email: String,
    #[validate(length(min = 8, max = 128), custom(function = "mixed_case_and_digit"))]
    pub password: String,
    #[validate(must_match(other = "password"))]
    pub confirm_password: String,
    #[validate(length(max = 100), custom(function = "letters_and_spaces"))]
    pub full_name: String,
    #[validate(length(max = 30, message = "Phone number is too long"))]
    pub phone: Option<String>,
}

impl SignUp {
    /// Runs the field rules and reports the first failure in form order:
    /// email, password, confirmation, then name.
    pub fn check(&self) -> Result<(), DomainError> {
        let Err(errors) = self.validate() else {
            return Ok(());
        };
        let failed = errors.field_errors();
        let failure = [
            ("email", AuthFailure::InvalidEmail),
            ("password", AuthFailure::WeakPassword),
            ("confirm_password", AuthFailure::PasswordMismatch),
            ("full_name", AuthFailure::InvalidName),
        ]
        .into_iter()
        .find(|(field, _)| failed.contains_key(*field));

        match failure {
            Some((_, failure)) => Err(failure.into()),
            None => Err(DomainError::Validation {
                message: "Phone number is too long".to_string(),
                fields: vec!["phone"],
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.id,
            email: self.email.clone(),
        }
    }
}

/// A profile together with its password hash, as read by the auth service.
#[derive(Debug, Clone)]
pub struct StoredProfile {
    pub profile: Profile,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub password_hash: String,
}
