//! Outbound adapters implementing the domain ports.

pub mod config;
pub mod csp;
pub mod idp;
pub mod queue;
