//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod csp_client;
mod csp_client_factory;
mod csp_configuration;
mod job_queue;
mod token_provider;

#[cfg(test)]
pub use csp_client::MockCspClient;
pub use csp_client::{
    AddPortfolioRequest, AddPortfolioResponse, AddTaskOrderRequest, AddTaskOrderResponse,
    AsyncProvisionResponse, CostsByClinResponse, CostsByPortfolioResponse, CspClient,
    CspClientError, CspErrorKind, CspResult, FixtureCspClient, GetCostsByClinRequest,
    GetCostsByPortfolioRequest, GetPortfolioRequest, GetPortfolioResponse,
    GetProvisioningStatusRequest, PatchPortfolioRequest, PatchPortfolioResponse,
    ProvisionDirectives, ProvisioningStatusResponse, RawCspResponse, ResponseMetadata,
};
#[cfg(test)]
pub use csp_client_factory::MockCspClientFactory;
pub use csp_client_factory::{CspClientFactory, CspClientFactoryError, FixtureCspClientFactory};
#[cfg(test)]
pub use csp_configuration::MockCspConfigurationProvider;
pub use csp_configuration::{
    CspConfiguration, CspConfigurationError, CspConfigurationProvider,
    FixtureCspConfigurationProvider,
};
#[cfg(test)]
pub use job_queue::MockJobQueue;
pub use job_queue::{FixtureJobQueue, JobQueue, QueueError, QueueMessage};
#[cfg(test)]
pub use token_provider::MockTokenProvider;
pub use token_provider::{AccessToken, FixtureTokenProvider, TokenError, TokenProvider};
