//! Driven port for constructing per-invocation CSP clients.
//!
//! Tokens are short-lived and endpoints vary per CSP, so orchestration
//! code asks for a fresh client for each job's target instead of holding
//! one long-lived client.

use std::sync::Arc;

use async_trait::async_trait;

use super::csp_client::CspClient;
use super::define_port_error;
use crate::domain::provisioning::TargetCsp;

define_port_error! {
    /// Errors surfaced while constructing a CSP client.
    pub enum CspClientFactoryError {
        /// No configuration is registered for the named CSP.
        UnknownCsp { name: String } =>
            "no configuration registered for CSP {name:?}",
        /// The CSP's configuration could not be resolved or is unusable.
        Configuration { message: String } =>
            "CSP configuration error: {message}",
        /// No access token could be obtained.
        Token { message: String } =>
            "token acquisition failed: {message}",
        /// The client itself could not be built.
        Client { message: String } =>
            "client construction failed: {message}",
    }
}

/// Port for building a client bound to one job's target CSP.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CspClientFactory: Send + Sync {
    /// Build a client for `target`, resolving configuration and
    /// acquiring a fresh token.
    async fn client_for(
        &self,
        target: &TargetCsp,
    ) -> Result<Arc<dyn CspClient>, CspClientFactoryError>;
}

/// Fixture implementation handing out [`FixtureCspClient`] regardless of
/// target.
///
/// [`FixtureCspClient`]: super::csp_client::FixtureCspClient
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureCspClientFactory;

#[async_trait]
impl CspClientFactory for FixtureCspClientFactory {
    async fn client_for(
        &self,
        _target: &TargetCsp,
    ) -> Result<Arc<dyn CspClient>, CspClientFactoryError> {
        Ok(Arc::new(super::csp_client::FixtureCspClient))
    }
}
