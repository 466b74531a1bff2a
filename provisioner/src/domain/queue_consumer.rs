//! Generic receive, process, delete template for queue-driven stages.
//!
//! One drain receives at most [`MAX_MESSAGES_PER_RECEIVE`] messages,
//! applies a processor to each, and deletes each message only after its
//! processing succeeds. A crash mid-batch therefore redelivers only the
//! messages that were not yet deleted. A processor may decline a message
//! by returning `Ok(None)`; the message is then neither collected nor
//! deleted and will be redelivered after its visibility timeout.

use std::sync::Arc;

use tracing::info;

use crate::domain::ports::{JobQueue, QueueError, QueueMessage};
use crate::domain::provisioning::ProvisionRequest;

/// Upper bound on messages taken per receive, matching the broker's
/// batch limit.
pub const MAX_MESSAGES_PER_RECEIVE: usize = 10;

/// Failure of one drain pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueConsumerError {
    /// Receiving the batch failed.
    #[error("queue receive failed: {0}")]
    Receive(#[source] QueueError),
    /// Deleting a processed message failed.
    #[error("queue delete failed for message {message_id}: {source}")]
    Delete {
        /// The message whose delete failed.
        message_id: String,
        /// Broker failure.
        #[source]
        source: QueueError,
    },
    /// A message body could not be processed.
    #[error("message {message_id} could not be processed: {message}")]
    Malformed {
        /// The offending message.
        message_id: String,
        /// Decode failure description.
        message: String,
    },
}

/// Rejection raised by a processor for an undecodable message body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct MessageRejected {
    /// Decode failure description.
    pub message: String,
}

impl MessageRejected {
    /// Wrap a decode failure description.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Per-message transformation applied by [`QueueConsumer::drain`].
pub trait ProcessMessage: Send + Sync {
    /// Value produced for each accepted message.
    type Output: Send;

    /// Decode and transform one message.
    ///
    /// Return `Ok(None)` to leave the message on the queue for
    /// redelivery, or an error to abort the drain.
    ///
    /// # Errors
    ///
    /// Returns [`MessageRejected`] when the body cannot be decoded.
    fn process(&self, message: &QueueMessage) -> Result<Option<Self::Output>, MessageRejected>;
}

/// Drains one queue through a [`ProcessMessage`] implementation.
pub struct QueueConsumer {
    queue: Arc<dyn JobQueue>,
    max_messages: usize,
}

impl QueueConsumer {
    /// Bind the consumer to a queue with the default batch limit.
    #[must_use]
    pub fn new(queue: Arc<dyn JobQueue>) -> Self {
        Self {
            queue,
            max_messages: MAX_MESSAGES_PER_RECEIVE,
        }
    }

    /// Receive one batch, process each message, and delete the accepted
    /// ones. Returns the outputs of accepted messages in receipt order.
    ///
    /// # Errors
    ///
    /// Returns [`QueueConsumerError`] when the receive fails, a message
    /// body is rejected by the processor, or a delete fails. Messages
    /// already deleted before the failure stay deleted.
    pub async fn drain<P: ProcessMessage>(
        &self,
        processor: &P,
    ) -> Result<Vec<P::Output>, QueueConsumerError> {
        let messages = self
            .queue
            .receive(self.max_messages)
            .await
            .map_err(QueueConsumerError::Receive)?;
        if messages.is_empty() {
            return Ok(Vec::new());
        }
        let mut accepted = Vec::with_capacity(messages.len());
        for message in messages {
            match processor.process(&message) {
                Ok(Some(output)) => {
                    self.queue
                        .delete(&message.receipt_handle)
                        .await
                        .map_err(|source| QueueConsumerError::Delete {
                            message_id: message.message_id.clone(),
                            source,
                        })?;
                    accepted.push(output);
                }
                Ok(None) => {
                    info!(
                        message_id = %message.message_id,
                        "message declined; leaving on queue for redelivery"
                    );
                }
                Err(rejected) => {
                    return Err(QueueConsumerError::Malformed {
                        message_id: message.message_id,
                        message: rejected.message,
                    });
                }
            }
        }
        Ok(accepted)
    }
}

/// Processor decoding [`ProvisionRequest`] records from message bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProvisionRequestProcessor;

impl ProcessMessage for ProvisionRequestProcessor {
    type Output = ProvisionRequest;

    fn process(&self, message: &QueueMessage) -> Result<Option<Self::Output>, MessageRejected> {
        serde_json::from_str(&message.body)
            .map(Some)
            .map_err(|error| MessageRejected::new(error.to_string()))
    }
}
