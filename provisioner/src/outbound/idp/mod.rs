//! OAuth2 client-credentials adapter for the token provider port.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::domain::ports::{AccessToken, TokenError, TokenProvider};

const TOKEN_PATH: &str = "oauth2/token";

/// Wire shape of a successful token grant.
#[derive(Debug, Deserialize)]
struct TokenGrantDto {
    access_token: String,
    token_type: String,
    expires_in: u64,
}

/// Identity provider adapter issuing tokens via the client-credentials
/// grant.
pub struct HttpTokenProvider {
    client: Client,
    token_url: Url,
    client_id: String,
    client_secret: Zeroizing<String>,
}

impl HttpTokenProvider {
    /// Bind the adapter to an identity provider base URL and client
    /// credentials.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] when the token endpoint URL cannot be
    /// formed or the HTTP client cannot be constructed.
    pub fn new(
        base: &Url,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TokenError> {
        let token_url = base
            .join(TOKEN_PATH)
            .map_err(|error| TokenError::unavailable(format!("invalid token endpoint: {error}")))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| TokenError::unavailable(error.to_string()))?;
        Ok(Self {
            client,
            token_url,
            client_id: client_id.into(),
            client_secret: Zeroizing::new(client_secret.into()),
        })
    }
}

#[async_trait]
impl TokenProvider for HttpTokenProvider {
    async fn access_token(&self) -> Result<AccessToken, TokenError> {
        let response = self
            .client
            .post(self.token_url.clone())
            .basic_auth(&self.client_id, Some(self.client_secret.as_str()))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
            ])
            .send()
            .await
            .map_err(|error| TokenError::unavailable(error.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::rejected(format!(
                "status {}: {body}",
                status.as_u16()
            )));
        }
        let grant: TokenGrantDto = response
            .json()
            .await
            .map_err(|error| TokenError::rejected(format!("grant did not decode: {error}")))?;
        Ok(AccessToken::new(
            grant.access_token,
            grant.token_type,
            grant.expires_in,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rstest::rstest;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::HttpTokenProvider;
    use crate::domain::ports::{TokenError, TokenProvider};

    async fn provider_for(server: &MockServer) -> HttpTokenProvider {
        let base = reqwest::Url::parse(&server.uri()).expect("mock server URL");
        HttpTokenProvider::new(&base, "client-1", "s3cret", Duration::from_secs(5))
            .expect("adapter builds")
    }

    #[rstest]
    #[tokio::test]
    async fn issues_a_token_from_a_successful_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(header_exists("authorization"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "issued-token",
                "token_type": "Bearer",
                "expires_in": 3600,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let token = provider.access_token().await.expect("grant succeeds");
        assert_eq!(token.secret(), "issued-token");
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, 3600);
    }

    #[rstest]
    #[tokio::test]
    async fn refused_grants_surface_as_rejections() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "invalid_client"})),
            )
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let error = provider
            .access_token()
            .await
            .expect_err("refused grant must fail");
        assert!(matches!(error, TokenError::Rejected { .. }));
    }
}
