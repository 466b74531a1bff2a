//! Driven port for resolving CSP connection configuration by name.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::define_port_error;

/// Connection configuration for one named CSP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CspConfiguration {
    /// Base endpoint of the CSP's provisioning API.
    pub uri: String,
    /// Network designators the CSP serves.
    #[serde(default)]
    pub network: Vec<String>,
}

define_port_error! {
    /// Errors surfaced while resolving CSP configuration.
    pub enum CspConfigurationError {
        /// The configuration source could not be read.
        Unavailable { message: String } =>
            "CSP configuration unavailable: {message}",
        /// The configuration document could not be decoded.
        Malformed { message: String } =>
            "CSP configuration malformed: {message}",
    }
}

/// Port for looking up a CSP's configuration by its registry name.
///
/// Returns `Ok(None)` for a name with no registered configuration, so
/// callers distinguish "unknown CSP" from a broken source.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CspConfigurationProvider: Send + Sync {
    /// Resolve the configuration registered under `csp_name`.
    async fn configuration(
        &self,
        csp_name: &str,
    ) -> Result<Option<CspConfiguration>, CspConfigurationError>;
}

/// Fixture implementation resolving a fixed set of CSP names.
#[derive(Debug, Clone, Default)]
pub struct FixtureCspConfigurationProvider {
    entries: std::collections::BTreeMap<String, CspConfiguration>,
}

impl FixtureCspConfigurationProvider {
    /// Register a configuration under `name`, replacing any previous one.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, configuration: CspConfiguration) -> Self {
        self.entries.insert(name.into(), configuration);
        self
    }
}

#[async_trait]
impl CspConfigurationProvider for FixtureCspConfigurationProvider {
    async fn configuration(
        &self,
        csp_name: &str,
    ) -> Result<Option<CspConfiguration>, CspConfigurationError> {
        Ok(self.entries.get(csp_name).cloned())
    }
}
