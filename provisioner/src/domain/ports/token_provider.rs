//! Driven port for obtaining CSP API access tokens.

use async_trait::async_trait;
use zeroize::Zeroizing;

use super::define_port_error;

/// A bearer token for the CSP API.
///
/// The secret is zeroised on drop and redacted from `Debug` output.
#[derive(Clone)]
pub struct AccessToken {
    secret: Zeroizing<String>,
    /// Token scheme reported by the identity provider, normally `Bearer`.
    pub token_type: String,
    /// Lifetime in seconds from issuance.
    pub expires_in: u64,
}

impl AccessToken {
    /// Wrap a freshly issued token.
    #[must_use]
    pub fn new(secret: impl Into<String>, token_type: impl Into<String>, expires_in: u64) -> Self {
        Self {
            secret: Zeroizing::new(secret.into()),
            token_type: token_type.into(),
            expires_in,
        }
    }

    /// The raw token value.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

define_port_error! {
    /// Errors surfaced while obtaining an access token.
    pub enum TokenError {
        /// The identity provider could not be reached.
        Unavailable { message: String } =>
            "identity provider unavailable: {message}",
        /// The identity provider refused to issue a token.
        Rejected { message: String } =>
            "token request rejected: {message}",
    }
}

/// Port for obtaining a fresh access token for the CSP API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Obtain an access token. Implementations may cache internally but
    /// must never return an expired token.
    async fn access_token(&self) -> Result<AccessToken, TokenError>;
}

/// Fixture implementation issuing a constant test token.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureTokenProvider;

#[async_trait]
impl TokenProvider for FixtureTokenProvider {
    async fn access_token(&self) -> Result<AccessToken, TokenError> {
        Ok(AccessToken::new("fixture-token", "Bearer", 3600))
    }
}
