//! Driving port resolving bearer tokens to caller identities.
//!
//! Inbound adapters call this port before attaching the identity to the
//! ambient request context. HTTP tests substitute a fixture or mock instead
//! of wiring a token store.

use std::fmt;

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::{Error, Identity, UserId};

/// Opaque bearer credential.
///
/// The token is wiped from memory on drop and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(Zeroizing<String>);

impl BearerToken {
    /// Wrap a raw token. Returns `None` when blank.
    ///
    /// # Examples
    /// ```
    /// use switchboard::domain::ports::BearerToken;
    ///
    /// assert!(BearerToken::new("  ").is_none());
    /// let token = BearerToken::new("abc").expect("token");
    /// assert_eq!(format!("{token:?}"), "BearerToken(***)");
    /// ```
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(Zeroizing::new(trimmed.to_owned())))
    }

    /// Token value for comparison by adapters.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// Resolves a bearer token to the identity it was issued to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Return the identity behind `token`, or an `unauthorized` error.
    async fn authenticate(&self, token: &BearerToken) -> Result<Identity, Error>;
}

/// Development token accepted by [`FixtureAuthenticator`].
pub const FIXTURE_TOKEN: &str = "dev-token";
/// User id returned by [`FixtureAuthenticator`].
pub const FIXTURE_USER_ID: &str = "123e4567-e89b-12d3-a456-426614174000";
/// Email returned by [`FixtureAuthenticator`].
pub const FIXTURE_USER_EMAIL: &str = "admin@example.com";

/// In-memory authenticator used until a token store is wired.
///
/// Accepts [`FIXTURE_TOKEN`] and resolves it to a fixed admin identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAuthenticator;

#[async_trait]
impl Authenticator for FixtureAuthenticator {
    async fn authenticate(&self, token: &BearerToken) -> Result<Identity, Error> {
        if token.expose() != FIXTURE_TOKEN {
            return Err(Error::unauthorized("invalid bearer token"));
        }
        let user_id = UserId::new(FIXTURE_USER_ID)
            .map_err(|err| Error::internal(format!("invalid fixture user id: {err}")))?;
        Identity::new(user_id, FIXTURE_USER_EMAIL)
            .map_err(|err| Error::internal(format!("invalid fixture identity: {err}")))
    }
}
