//! In-memory queue adapter for tests and local runs.
//!
//! Receives do not remove messages; only a delete does, mirroring
//! at-least-once redelivery. Sent messages are recorded for inspection
//! rather than enqueued anywhere.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{JobQueue, QueueError, QueueMessage};

/// A message recorded by [`InMemoryJobQueue::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// FIFO message group the send named.
    pub message_group: String,
    /// Message body.
    pub body: String,
}

#[derive(Default)]
struct State {
    pending: VecDeque<QueueMessage>,
    sent: Vec<SentMessage>,
    next_id: u64,
}

/// Memory-backed implementation of [`JobQueue`].
#[derive(Default)]
pub struct InMemoryJobQueue {
    state: Mutex<State>,
}

impl InMemoryJobQueue {
    /// Enqueue a message body, returning its assigned message id.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when the internal lock is poisoned.
    pub fn push(&self, body: impl Into<String>) -> Result<String, QueueError> {
        let mut state = self.lock_state()?;
        state.next_id += 1;
        let message_id = format!("msg-{}", state.next_id);
        let receipt_handle = format!("rcpt-{}", state.next_id);
        state.pending.push_back(QueueMessage {
            message_id: message_id.clone(),
            receipt_handle,
            body: body.into(),
        });
        Ok(message_id)
    }

    /// Messages recorded by [`JobQueue::send`], in send order.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when the internal lock is poisoned.
    pub fn sent_messages(&self) -> Result<Vec<SentMessage>, QueueError> {
        Ok(self.lock_state()?.sent.clone())
    }

    /// Number of messages still pending delivery.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when the internal lock is poisoned.
    pub fn pending_len(&self) -> Result<usize, QueueError> {
        Ok(self.lock_state()?.pending.len())
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, State>, QueueError> {
        self.state
            .lock()
            .map_err(|_| QueueError::unavailable("queue state lock poisoned"))
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn receive(&self, max_messages: usize) -> Result<Vec<QueueMessage>, QueueError> {
        let state = self.lock_state()?;
        Ok(state
            .pending
            .iter()
            .take(max_messages)
            .cloned()
            .collect())
    }

    async fn send(&self, body: &str, message_group: &str) -> Result<(), QueueError> {
        self.lock_state()?.sent.push(SentMessage {
            message_group: message_group.to_owned(),
            body: body.to_owned(),
        });
        Ok(())
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError> {
        let mut state = self.lock_state()?;
        let before = state.pending.len();
        state
            .pending
            .retain(|message| message.receipt_handle != receipt_handle);
        if state.pending.len() == before {
            return Err(QueueError::rejected(format!(
                "unknown receipt handle {receipt_handle:?}"
            )));
        }
        Ok(())
    }
}
