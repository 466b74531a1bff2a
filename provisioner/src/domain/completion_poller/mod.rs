//! Async completion poller for deferred provisioning jobs.
//!
//! Jobs a CSP accepted with a deferral wait on the pending queue, each
//! record carrying the polling handle from the original acceptance. One
//! poll pass re-polls every record's status: jobs that reached a
//! terminal state are forwarded to the completion queue as uniform
//! envelopes, jobs still in flight are rescheduled by leaving their
//! messages undeleted so the broker redelivers them after the
//! visibility timeout. Infrastructure failures abort the pass and the
//! whole batch is redelivered.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info};

use crate::domain::ports::{
    CspClientError, CspClientFactory, CspClientFactoryError, GetProvisioningStatusRequest,
    JobQueue, ProvisionDirectives, QueueError, QueueMessage,
};
use crate::domain::provisioning::{
    COMPLETION_MESSAGE_GROUP, CspResponse, CspResponseContent, ProvisionRequest,
};
use crate::domain::queue_consumer::MAX_MESSAGES_PER_RECEIVE;

/// Failure of one poll pass.
#[derive(Debug, thiserror::Error)]
pub enum CompletionPollError {
    /// A record body was not a provisioning job record.
    #[error("record {message_id} is not a provisioning job record: {message}")]
    MalformedRecord {
        /// The offending message.
        message_id: String,
        /// Decode failure description.
        message: String,
    },
    /// A record carried no polling handle to re-poll.
    #[error("job {job_id} has no polling handle recorded")]
    MissingPollingHandle {
        /// The affected job.
        job_id: uuid::Uuid,
    },
    /// No client could be built for a record's target CSP.
    #[error(transparent)]
    ClientFactory(#[from] CspClientFactoryError),
    /// A status re-poll failed.
    #[error(transparent)]
    Csp(#[from] CspClientError),
    /// An outgoing completion envelope could not be serialised.
    #[error("completion envelope could not be serialised: {0}")]
    Encode(#[from] serde_json::Error),
    /// The broker failed during receive, send, or delete.
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Outcome of one poll pass over a batch of pending records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PollOutcome {
    /// Envelopes forwarded to the completion queue.
    pub forwarded: usize,
    /// Message identifiers of records still in flight, to be redelivered.
    pub reschedule_message_ids: Vec<String>,
}

/// Collaborators the poller drives.
pub struct CompletionPollerPorts {
    /// Builds a client for each record's target CSP.
    pub clients: Arc<dyn CspClientFactory>,
    /// Queue holding records whose jobs are still pending.
    pub pending_queue: Arc<dyn JobQueue>,
    /// Queue receiving envelopes for completed jobs.
    pub completion_queue: Arc<dyn JobQueue>,
}

/// Re-polls deferred provisioning jobs until they reach a terminal state.
pub struct CompletionPoller {
    ports: CompletionPollerPorts,
}

impl CompletionPoller {
    /// Bind the poller to its collaborators.
    #[must_use]
    pub fn new(ports: CompletionPollerPorts) -> Self {
        Self { ports }
    }

    /// Poll every record in `records` once.
    ///
    /// Terminal jobs are forwarded to the completion queue under the
    /// completion message group; still-pending jobs are reported in
    /// [`PollOutcome::reschedule_message_ids`]. Forwarding only happens
    /// after every record polled cleanly, so a failing record never
    /// leaves a half-forwarded batch behind.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionPollError`] when a record cannot be decoded,
    /// carries no polling handle, or a client, re-poll, or queue send
    /// fails. On error nothing has been deleted and the batch will be
    /// redelivered whole.
    pub async fn poll_batch(
        &self,
        records: &[QueueMessage],
    ) -> Result<PollOutcome, CompletionPollError> {
        let mut ready: Vec<CspResponse> = Vec::new();
        let mut reschedule = Vec::new();
        for record in records {
            let pending: ProvisionRequest =
                serde_json::from_str(&record.body).map_err(|error| {
                    CompletionPollError::MalformedRecord {
                        message_id: record.message_id.clone(),
                        message: error.to_string(),
                    }
                })?;
            let location = polling_handle(&pending).ok_or(
                CompletionPollError::MissingPollingHandle {
                    job_id: pending.job_id,
                },
            )?;
            let client = self.ports.clients.client_for(&pending.target_csp).await?;
            let request = GetProvisioningStatusRequest {
                location,
                directives: ProvisionDirectives::default(),
            };
            let response = client.get_provisioning_status(&request).await?;
            if response.status.status.is_terminal() {
                debug!(
                    job_id = %pending.job_id,
                    status = ?response.status.status,
                    "job reached terminal state"
                );
                ready.push(CspResponse {
                    code: response.metadata.status,
                    content: CspResponseContent {
                        request: json!({"location": request.location}),
                        response: serde_json::to_value(&response).unwrap_or(Value::Null),
                    },
                });
            } else {
                debug!(
                    job_id = %pending.job_id,
                    status = ?response.status.status,
                    "job still in flight; rescheduling"
                );
                reschedule.push(record.message_id.clone());
            }
        }
        for envelope in &ready {
            let body = serde_json::to_string(envelope)?;
            self.ports
                .completion_queue
                .send(&body, COMPLETION_MESSAGE_GROUP)
                .await?;
        }
        Ok(PollOutcome {
            forwarded: ready.len(),
            reschedule_message_ids: reschedule,
        })
    }

    /// Receive one batch from the pending queue, poll it, and delete the
    /// records that are done with polling.
    ///
    /// Rescheduled records are left undeleted so the broker redelivers
    /// them after the visibility timeout.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionPollError`] when the receive, the poll pass,
    /// or a delete fails.
    pub async fn run_cycle(&self) -> Result<PollOutcome, CompletionPollError> {
        let records = self
            .ports
            .pending_queue
            .receive(MAX_MESSAGES_PER_RECEIVE)
            .await?;
        if records.is_empty() {
            return Ok(PollOutcome::default());
        }
        let outcome = self.poll_batch(&records).await?;
        for record in &records {
            if outcome.reschedule_message_ids.contains(&record.message_id) {
                continue;
            }
            self.ports
                .pending_queue
                .delete(&record.receipt_handle)
                .await?;
        }
        info!(
            forwarded = outcome.forwarded,
            rescheduled = outcome.reschedule_message_ids.len(),
            "poll cycle complete"
        );
        Ok(outcome)
    }
}

/// Extract the polling handle recorded when the CSP deferred the job.
fn polling_handle(pending: &ProvisionRequest) -> Option<String> {
    pending
        .csp_response
        .as_ref()?
        .content
        .response
        .get("location")
        .and_then(Value::as_str)
        .filter(|handle| !handle.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests;
