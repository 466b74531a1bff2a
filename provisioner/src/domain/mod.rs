//! Domain layer: provisioning model, ports, and orchestration.

pub mod completion_poller;
pub mod csp;
pub mod ports;
pub mod provisioning;
pub mod queue_consumer;
