//! Authenticated caller identity.
//!
//! The authentication step resolves an [`Identity`] and attaches it to the
//! ambient [`crate::domain::RequestContext`]; handlers and log enrichment read
//! it back from there.

use std::fmt;

use thiserror::Error;

/// Validation errors returned when constructing identity primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityValidationError {
    /// User id was blank once trimmed.
    #[error("user id must not be empty")]
    EmptyUserId,
    /// Email was blank or lacked an `@` separator.
    #[error("email must contain a local part and a domain")]
    InvalidEmail,
}

/// Stable identifier of an authenticated user.
///
/// ## Invariants
/// - Trimmed and non-empty.
///
/// # Examples
/// ```
/// use switchboard::domain::UserId;
///
/// let id = UserId::new(" user-42 ").expect("valid id");
/// assert_eq!(id.as_ref(), "user-42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a user id.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityValidationError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdentityValidationError::EmptyUserId);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity attached to a request once authentication succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user_id: UserId,
    email: String,
}

impl Identity {
    /// Construct an identity from a user id and email address.
    ///
    /// # Examples
    /// ```
    /// use switchboard::domain::{Identity, UserId};
    ///
    /// let user_id = UserId::new("user-42").expect("valid id");
    /// let identity = Identity::new(user_id, "ada@example.com").expect("valid identity");
    /// assert_eq!(identity.email(), "ada@example.com");
    /// ```
    pub fn new(user_id: UserId, email: impl Into<String>) -> Result<Self, IdentityValidationError> {
        let email = email.into();
        let trimmed = email.trim();
        match trimmed.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(Self {
                user_id,
                email: trimmed.to_owned(),
            }),
            _ => Err(IdentityValidationError::InvalidEmail),
        }
    }

    /// Identifier of the authenticated user.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Email address of the authenticated user.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }
}
