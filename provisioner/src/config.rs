//! Runtime settings loaded via OrthoConfig.

use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_CSP_REQUEST_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 5;

/// A required setting was not provided.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required setting PROVISIONER_{name}")]
pub struct MissingSetting {
    /// Environment suffix of the missing setting.
    pub name: &'static str,
}

/// Where the CSP configuration registry comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CspRegistrySource {
    /// Inline JSON document.
    Inline(String),
    /// Path to a JSON document on disk.
    Path(PathBuf),
}

/// Configuration values for the provisioning poller service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PROVISIONER")]
pub struct ProvisionerSettings {
    /// URL of the queue holding jobs awaiting async completion.
    pub pending_queue_url: Option<String>,
    /// URL of the queue receiving completed-job envelopes.
    pub completion_queue_url: Option<String>,
    /// Inline JSON document registering CSP configurations.
    pub csp_configuration_json: Option<String>,
    /// Path to a JSON document registering CSP configurations.
    pub csp_configuration_path: Option<PathBuf>,
    /// Base URL of the identity provider issuing CSP API tokens.
    pub idp_base_url: Option<String>,
    /// OAuth2 client identifier for the client-credentials grant.
    pub idp_client_id: Option<String>,
    /// OAuth2 client secret for the client-credentials grant.
    pub idp_client_secret: Option<String>,
    /// Per-request timeout for CSP and identity provider calls.
    #[ortho_config(default = 30)]
    pub csp_request_timeout_seconds: u64,
    /// Delay between poll cycles when the pending queue is quiet.
    #[ortho_config(default = 5)]
    pub poll_interval_seconds: u64,
}

fn require<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, MissingSetting> {
    value.as_deref().ok_or(MissingSetting { name })
}

impl ProvisionerSettings {
    /// URL of the pending-jobs queue.
    ///
    /// # Errors
    ///
    /// Returns [`MissingSetting`] when unset.
    pub fn pending_queue_url(&self) -> Result<&str, MissingSetting> {
        require(&self.pending_queue_url, "PENDING_QUEUE_URL")
    }

    /// URL of the completion queue.
    ///
    /// # Errors
    ///
    /// Returns [`MissingSetting`] when unset.
    pub fn completion_queue_url(&self) -> Result<&str, MissingSetting> {
        require(&self.completion_queue_url, "COMPLETION_QUEUE_URL")
    }

    /// Identity provider base URL.
    ///
    /// # Errors
    ///
    /// Returns [`MissingSetting`] when unset.
    pub fn idp_base_url(&self) -> Result<&str, MissingSetting> {
        require(&self.idp_base_url, "IDP_BASE_URL")
    }

    /// OAuth2 client identifier.
    ///
    /// # Errors
    ///
    /// Returns [`MissingSetting`] when unset.
    pub fn idp_client_id(&self) -> Result<&str, MissingSetting> {
        require(&self.idp_client_id, "IDP_CLIENT_ID")
    }

    /// OAuth2 client secret.
    ///
    /// # Errors
    ///
    /// Returns [`MissingSetting`] when unset.
    pub fn idp_client_secret(&self) -> Result<&str, MissingSetting> {
        require(&self.idp_client_secret, "IDP_CLIENT_SECRET")
    }

    /// CSP registry source, preferring inline JSON over a file path.
    ///
    /// # Errors
    ///
    /// Returns [`MissingSetting`] when neither source is configured.
    pub fn csp_registry_source(&self) -> Result<CspRegistrySource, MissingSetting> {
        if let Some(document) = &self.csp_configuration_json {
            return Ok(CspRegistrySource::Inline(document.clone()));
        }
        self.csp_configuration_path.clone().map_or(
            Err(MissingSetting {
                name: "CSP_CONFIGURATION_JSON",
            }),
            |path| Ok(CspRegistrySource::Path(path)),
        )
    }

    /// Per-request timeout for outbound HTTP calls.
    #[must_use]
    pub fn csp_request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.csp_request_timeout_seconds
                .clamp(1, DEFAULT_CSP_REQUEST_TIMEOUT_SECONDS * 10),
        )
    }

    /// Delay between poll cycles.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(
            self.poll_interval_seconds
                .clamp(1, DEFAULT_POLL_INTERVAL_SECONDS * 120),
        )
    }
}
