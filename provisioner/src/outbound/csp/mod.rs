//! Outbound adapters for the CSP provisioning API.

mod factory;
mod http_client;

pub use factory::HttpCspClientFactory;
pub use http_client::{ATAT_API_VERSION, AtatClientBuildError, AtatHttpClient};
