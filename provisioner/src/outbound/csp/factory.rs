//! Per-invocation CSP client factory.
//!
//! Resolves the target's configuration, acquires a fresh token, and
//! hands back a bound [`AtatHttpClient`]. Every CSP, real or simulated,
//! is reached through its registered configuration; there is no
//! per-vendor dispatch here.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use super::http_client::AtatHttpClient;
use crate::domain::ports::{
    CspClient, CspClientFactory, CspClientFactoryError, CspConfigurationProvider, TokenProvider,
};
use crate::domain::provisioning::TargetCsp;

/// Builds [`AtatHttpClient`] instances from registered configuration.
pub struct HttpCspClientFactory {
    configuration: Arc<dyn CspConfigurationProvider>,
    tokens: Arc<dyn TokenProvider>,
    timeout: Duration,
}

impl HttpCspClientFactory {
    /// Bind the factory to its configuration and token sources.
    #[must_use]
    pub fn new(
        configuration: Arc<dyn CspConfigurationProvider>,
        tokens: Arc<dyn TokenProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            configuration,
            tokens,
            timeout,
        }
    }
}

#[async_trait]
impl CspClientFactory for HttpCspClientFactory {
    async fn client_for(
        &self,
        target: &TargetCsp,
    ) -> Result<Arc<dyn CspClient>, CspClientFactoryError> {
        let configuration = self
            .configuration
            .configuration(&target.name)
            .await
            .map_err(|error| CspClientFactoryError::configuration(error.to_string()))?
            .ok_or_else(|| CspClientFactoryError::unknown_csp(target.name.clone()))?;
        let base = Url::parse(&configuration.uri).map_err(|error| {
            CspClientFactoryError::configuration(format!(
                "CSP {:?} has an invalid base URI: {error}",
                target.name
            ))
        })?;
        if base.scheme() != "https" {
            return Err(CspClientFactoryError::configuration(format!(
                "CSP {:?} base URI must use https",
                target.name
            )));
        }
        let token = self
            .tokens
            .access_token()
            .await
            .map_err(|error| CspClientFactoryError::token(error.to_string()))?;
        let client = AtatHttpClient::new(base, &token, self.timeout)
            .map_err(|error| CspClientFactoryError::client(error.to_string()))?;
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use rstest::rstest;

    use super::HttpCspClientFactory;
    use crate::domain::ports::{
        CspClientFactory, CspClientFactoryError, CspConfiguration, FixtureCspConfigurationProvider,
        FixtureTokenProvider,
    };
    use crate::domain::provisioning::TargetCsp;

    fn target(name: &str) -> TargetCsp {
        TargetCsp {
            name: name.to_owned(),
            uri: None,
            network: None,
        }
    }

    fn factory_with(uri: &str) -> HttpCspClientFactory {
        let provider = FixtureCspConfigurationProvider::default().with(
            "CSP_A",
            CspConfiguration {
                uri: uri.to_owned(),
                network: vec!["NETWORK_1".to_owned()],
            },
        );
        HttpCspClientFactory::new(
            Arc::new(provider),
            Arc::new(FixtureTokenProvider),
            Duration::from_secs(5),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn builds_a_client_for_a_registered_csp() {
        let factory = factory_with("https://csp-a.example/api");
        assert!(factory.client_for(&target("CSP_A")).await.is_ok());
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_csp_is_reported_by_name() {
        let factory = factory_with("https://csp-a.example/api");
        let error = factory
            .client_for(&target("CSP_UNKNOWN"))
            .await
            .err()
            .expect("unregistered CSP must fail");
        assert!(matches!(
            error,
            CspClientFactoryError::UnknownCsp { name } if name == "CSP_UNKNOWN"
        ));
    }

    #[rstest]
    #[case::plain_http("http://csp-a.example/api")]
    #[case::not_a_url("not a url")]
    #[tokio::test]
    async fn unusable_base_uris_are_configuration_errors(#[case] uri: &str) {
        let factory = factory_with(uri);
        let error = factory
            .client_for(&target("CSP_A"))
            .await
            .err()
            .expect("unusable URI must fail");
        assert!(matches!(
            error,
            CspClientFactoryError::Configuration { .. }
        ));
    }
}
