//! Poller entry-point: wires adapters to the completion poller and runs
//! poll cycles until stopped.

use std::sync::Arc;

use ortho_config::OrthoConfig;
use tracing::{error, warn};
use tracing_subscriber::{EnvFilter, fmt};

use provisioner::config::{CspRegistrySource, ProvisionerSettings};
use provisioner::domain::completion_poller::{CompletionPoller, CompletionPollerPorts};
use provisioner::outbound::config::StaticCspConfigurationProvider;
use provisioner::outbound::csp::HttpCspClientFactory;
use provisioner::outbound::idp::HttpTokenProvider;
use provisioner::outbound::queue::SqsJobQueue;

/// Service bootstrap.
#[tokio::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ProvisionerSettings::load().map_err(std::io::Error::other)?;

    let configuration = match settings.csp_registry_source().map_err(std::io::Error::other)? {
        CspRegistrySource::Inline(document) => StaticCspConfigurationProvider::from_json(&document),
        CspRegistrySource::Path(path) => StaticCspConfigurationProvider::from_path(&path),
    }
    .map_err(std::io::Error::other)?;

    let idp_base = reqwest::Url::parse(settings.idp_base_url().map_err(std::io::Error::other)?)
        .map_err(std::io::Error::other)?;
    let tokens = HttpTokenProvider::new(
        &idp_base,
        settings.idp_client_id().map_err(std::io::Error::other)?,
        settings.idp_client_secret().map_err(std::io::Error::other)?,
        settings.csp_request_timeout(),
    )
    .map_err(std::io::Error::other)?;

    let clients = HttpCspClientFactory::new(
        Arc::new(configuration),
        Arc::new(tokens),
        settings.csp_request_timeout(),
    );

    let pending_queue = SqsJobQueue::from_env(
        settings.pending_queue_url().map_err(std::io::Error::other)?,
    )
    .await;
    let completion_queue = SqsJobQueue::from_env(
        settings
            .completion_queue_url()
            .map_err(std::io::Error::other)?,
    )
    .await;

    let poller = CompletionPoller::new(CompletionPollerPorts {
        clients: Arc::new(clients),
        pending_queue: Arc::new(pending_queue),
        completion_queue: Arc::new(completion_queue),
    });

    let interval = settings.poll_interval();
    loop {
        if let Err(e) = poller.run_cycle().await {
            error!(error = %e, "poll cycle failed");
        }
        tokio::time::sleep(interval).await;
    }
}
