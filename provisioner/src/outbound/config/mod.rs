//! Static JSON document adapter for the CSP configuration port.
//!
//! The registry is a single JSON object mapping CSP names to their
//! connection configuration, loaded once at startup.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;

use crate::domain::ports::{CspConfiguration, CspConfigurationError, CspConfigurationProvider};

/// Configuration provider backed by an in-memory registry parsed from a
/// JSON document.
#[derive(Debug, Clone, Default)]
pub struct StaticCspConfigurationProvider {
    entries: BTreeMap<String, CspConfiguration>,
}

impl StaticCspConfigurationProvider {
    /// Parse a registry from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`CspConfigurationError`] when the document is not a JSON
    /// object of configurations.
    pub fn from_json(document: &str) -> Result<Self, CspConfigurationError> {
        let entries: BTreeMap<String, CspConfiguration> = serde_json::from_str(document)
            .map_err(|error| CspConfigurationError::malformed(error.to_string()))?;
        Ok(Self { entries })
    }

    /// Read and parse a registry from a file.
    ///
    /// # Errors
    ///
    /// Returns [`CspConfigurationError`] when the file cannot be read or
    /// does not parse.
    pub fn from_path(path: &Path) -> Result<Self, CspConfigurationError> {
        let document = std::fs::read_to_string(path).map_err(|error| {
            CspConfigurationError::unavailable(format!("{}: {error}", path.display()))
        })?;
        Self::from_json(&document)
    }

    /// Names registered in the document, in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }
}

#[async_trait]
impl CspConfigurationProvider for StaticCspConfigurationProvider {
    async fn configuration(
        &self,
        csp_name: &str,
    ) -> Result<Option<CspConfiguration>, CspConfigurationError> {
        Ok(self.entries.get(csp_name).cloned())
    }
}
