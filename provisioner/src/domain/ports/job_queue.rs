//! Driven port for the provisioning job queues.
//!
//! Messages are received in batches, processed individually, and deleted
//! one at a time so a mid-batch crash only redelivers unprocessed
//! messages. Sends carry a message group for FIFO ordering.

use async_trait::async_trait;

use super::define_port_error;

/// One message received from a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Broker-assigned message identifier.
    pub message_id: String,
    /// Handle required to delete this delivery.
    pub receipt_handle: String,
    /// Raw message body.
    pub body: String,
}

define_port_error! {
    /// Errors surfaced by queue adapters.
    pub enum QueueError {
        /// The broker could not be reached or answered abnormally.
        Unavailable { message: String } =>
            "queue unavailable: {message}",
        /// The broker refused the operation.
        Rejected { message: String } =>
            "queue rejected operation: {message}",
    }
}

/// Port for receiving from, sending to, and deleting on a job queue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Receive up to `max_messages` messages, returning fewer or none
    /// when the queue is quiet.
    async fn receive(&self, max_messages: usize) -> Result<Vec<QueueMessage>, QueueError>;

    /// Send a message body under a FIFO message group.
    async fn send(&self, body: &str, message_group: &str) -> Result<(), QueueError>;

    /// Delete one delivered message by its receipt handle.
    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError>;
}

/// Fixture implementation backed by no queue at all: receives nothing
/// and accepts every send and delete.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureJobQueue;

#[async_trait]
impl JobQueue for FixtureJobQueue {
    async fn receive(&self, _max_messages: usize) -> Result<Vec<QueueMessage>, QueueError> {
        Ok(Vec::new())
    }

    async fn send(&self, _body: &str, _message_group: &str) -> Result<(), QueueError> {
        Ok(())
    }

    async fn delete(&self, _receipt_handle: &str) -> Result<(), QueueError> {
        Ok(())
    }
}
