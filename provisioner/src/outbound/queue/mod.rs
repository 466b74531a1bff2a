//! Outbound adapters for the job queue port.

mod memory;
mod sqs;

pub use memory::{InMemoryJobQueue, SentMessage};
pub use sqs::SqsJobQueue;
