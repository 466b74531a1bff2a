//! Amazon SQS adapter for the job queue port.
//!
//! One adapter instance is bound to one queue URL. Messages missing a
//! body or receipt handle are dropped with a warning rather than
//! surfaced, since they cannot be processed or deleted.

use async_trait::async_trait;
use aws_sdk_sqs::Client;
use tracing::warn;

use crate::domain::ports::{JobQueue, QueueError, QueueMessage};

/// SQS-backed implementation of [`JobQueue`].
pub struct SqsJobQueue {
    client: Client,
    queue_url: String,
}

impl SqsJobQueue {
    /// Bind an adapter to one queue URL using an existing SQS client.
    #[must_use]
    pub fn new(client: Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    /// Bind an adapter using credentials and region from the ambient
    /// AWS environment.
    pub async fn from_env(queue_url: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config), queue_url)
    }
}

#[async_trait]
impl JobQueue for SqsJobQueue {
    async fn receive(&self, max_messages: usize) -> Result<Vec<QueueMessage>, QueueError> {
        let limit = i32::try_from(max_messages.clamp(1, 10)).unwrap_or(10);
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(limit)
            .send()
            .await
            .map_err(|error| QueueError::unavailable(error.to_string()))?;
        let messages = output
            .messages()
            .iter()
            .filter_map(|message| {
                let message_id = message.message_id().unwrap_or_default().to_owned();
                let (Some(receipt_handle), Some(body)) =
                    (message.receipt_handle(), message.body())
                else {
                    warn!(%message_id, "dropping message without body or receipt handle");
                    return None;
                };
                Some(QueueMessage {
                    message_id,
                    receipt_handle: receipt_handle.to_owned(),
                    body: body.to_owned(),
                })
            })
            .collect();
        Ok(messages)
    }

    async fn send(&self, body: &str, message_group: &str) -> Result<(), QueueError> {
        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .message_group_id(message_group)
            .send()
            .await
            .map_err(|error| QueueError::rejected(error.to_string()))?;
        Ok(())
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|error| QueueError::unavailable(error.to_string()))?;
        Ok(())
    }
}
