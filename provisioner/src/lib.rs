//! Provisioning client and async completion plumbing for CSP portfolios.
//!
//! The domain layer owns the provisioning model, the ports, and the
//! orchestration (queue consumption and completion polling); outbound
//! adapters bind those ports to HTTP, SQS, the identity provider, and
//! static configuration.

pub mod config;
pub mod domain;
pub mod outbound;
