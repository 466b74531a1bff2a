//! Unit tests for completion poller orchestration.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rstest::rstest;
use serde_json::json;
use uuid::Uuid;

use super::{CompletionPollError, CompletionPoller, CompletionPollerPorts};
use crate::domain::ports::{
    AddPortfolioRequest, AddPortfolioResponse, AddTaskOrderRequest, AddTaskOrderResponse,
    CostsByClinResponse, CostsByPortfolioResponse, CspClient, CspClientError, CspClientFactory,
    CspClientFactoryError, CspResult, GetCostsByClinRequest, GetCostsByPortfolioRequest,
    GetPortfolioRequest, GetPortfolioResponse, GetProvisioningStatusRequest, JobQueue,
    PatchPortfolioRequest, PatchPortfolioResponse, ProvisioningStatusResponse, QueueError,
    QueueMessage, ResponseMetadata,
};
use crate::domain::provisioning::{
    COMPLETION_MESSAGE_GROUP, CspResponse, ProvisioningState, ProvisioningStatus, TargetCsp,
};

struct ScriptedStatusClient {
    scripted: Mutex<VecDeque<Result<ProvisioningStatusResponse, CspClientError>>>,
}

impl ScriptedStatusClient {
    fn new(scripted: Vec<Result<ProvisioningStatusResponse, CspClientError>>) -> Self {
        Self {
            scripted: Mutex::new(scripted.into()),
        }
    }
}

fn unscripted<T>() -> Result<T, CspClientError> {
    Err(CspClientError::transport("operation not scripted", json!({})))
}

#[async_trait]
impl CspClient for ScriptedStatusClient {
    async fn add_portfolio(
        &self,
        _request: &AddPortfolioRequest,
    ) -> Result<CspResult<AddPortfolioResponse>, CspClientError> {
        unscripted()
    }

    async fn get_portfolio_by_id(
        &self,
        _request: &GetPortfolioRequest,
    ) -> Result<GetPortfolioResponse, CspClientError> {
        unscripted()
    }

    async fn patch_portfolio(
        &self,
        _request: &PatchPortfolioRequest,
    ) -> Result<CspResult<PatchPortfolioResponse>, CspClientError> {
        unscripted()
    }

    async fn get_costs_by_portfolio(
        &self,
        _request: &GetCostsByPortfolioRequest,
    ) -> Result<CostsByPortfolioResponse, CspClientError> {
        unscripted()
    }

    async fn add_task_order(
        &self,
        _request: &AddTaskOrderRequest,
    ) -> Result<CspResult<AddTaskOrderResponse>, CspClientError> {
        unscripted()
    }

    async fn get_costs_by_clin(
        &self,
        _request: &GetCostsByClinRequest,
    ) -> Result<CostsByClinResponse, CspClientError> {
        unscripted()
    }

    async fn get_provisioning_status(
        &self,
        _request: &GetProvisioningStatusRequest,
    ) -> Result<ProvisioningStatusResponse, CspClientError> {
        self.scripted
            .lock()
            .expect("client mutex")
            .pop_front()
            .expect("scripted status response")
    }
}

struct StubFactory {
    client: Arc<ScriptedStatusClient>,
    requested: Mutex<Vec<String>>,
}

impl StubFactory {
    fn new(client: Arc<ScriptedStatusClient>) -> Self {
        Self {
            client,
            requested: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CspClientFactory for StubFactory {
    async fn client_for(
        &self,
        target: &TargetCsp,
    ) -> Result<Arc<dyn CspClient>, CspClientFactoryError> {
        self.requested
            .lock()
            .expect("factory mutex")
            .push(target.name.clone());
        Ok(Arc::clone(&self.client) as Arc<dyn CspClient>)
    }
}

#[derive(Default)]
struct RecordingQueue {
    scripted_batches: Mutex<VecDeque<Vec<QueueMessage>>>,
    sent: Mutex<Vec<(String, String)>>,
    deleted: Mutex<Vec<String>>,
}

impl RecordingQueue {
    fn with_batch(batch: Vec<QueueMessage>) -> Self {
        Self {
            scripted_batches: Mutex::new(VecDeque::from([batch])),
            ..Self::default()
        }
    }

    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("queue mutex").clone()
    }

    fn deleted(&self) -> Vec<String> {
        self.deleted.lock().expect("queue mutex").clone()
    }
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn receive(&self, _max_messages: usize) -> Result<Vec<QueueMessage>, QueueError> {
        Ok(self
            .scripted_batches
            .lock()
            .expect("queue mutex")
            .pop_front()
            .unwrap_or_default())
    }

    async fn send(&self, body: &str, message_group: &str) -> Result<(), QueueError> {
        self.sent
            .lock()
            .expect("queue mutex")
            .push((message_group.to_owned(), body.to_owned()));
        Ok(())
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError> {
        self.deleted
            .lock()
            .expect("queue mutex")
            .push(receipt_handle.to_owned());
        Ok(())
    }
}

fn pending_record(id: &str, location: &str) -> QueueMessage {
    QueueMessage {
        message_id: id.to_owned(),
        receipt_handle: format!("rcpt-{id}"),
        body: json!({
            "jobId": Uuid::new_v4(),
            "userId": "user-1",
            "portfolioId": "pf-1",
            "operationType": "ADD_PORTFOLIO",
            "targetCsp": {"name": "CSP_A"},
            "payload": {},
            "cspResponse": {
                "code": 202,
                "content": {
                    "request": {},
                    "response": {
                        "location": location,
                        "status": {
                            "provisioningJobId": Uuid::nil(),
                            "portfolioId": "pf-1",
                            "status": "IN_PROGRESS",
                        },
                    },
                },
            },
        })
        .to_string(),
    }
}

fn status_response(state: ProvisioningState, code: u16) -> ProvisioningStatusResponse {
    ProvisioningStatusResponse {
        status: ProvisioningStatus {
            provisioning_job_id: Uuid::nil(),
            portfolio_id: "pf-1".to_owned(),
            status: state,
        },
        location: "https://csp.example/provisioning/1".to_owned(),
        metadata: ResponseMetadata {
            status: code,
            request: json!({}),
        },
    }
}

fn poller_with(
    scripted: Vec<Result<ProvisioningStatusResponse, CspClientError>>,
) -> (CompletionPoller, Arc<RecordingQueue>, Arc<RecordingQueue>) {
    let client = Arc::new(ScriptedStatusClient::new(scripted));
    let pending_queue = Arc::new(RecordingQueue::default());
    let completion_queue = Arc::new(RecordingQueue::default());
    let poller = CompletionPoller::new(CompletionPollerPorts {
        clients: Arc::new(StubFactory::new(client)),
        pending_queue: Arc::clone(&pending_queue) as Arc<dyn JobQueue>,
        completion_queue: Arc::clone(&completion_queue) as Arc<dyn JobQueue>,
    });
    (poller, pending_queue, completion_queue)
}

#[rstest]
#[tokio::test]
async fn forwards_terminal_jobs_and_reschedules_pending_ones() {
    let (poller, _, completion_queue) = poller_with(vec![
        Ok(status_response(ProvisioningState::Complete, 200)),
        Ok(status_response(ProvisioningState::InProgress, 200)),
        Ok(status_response(ProvisioningState::Failed, 200)),
        Ok(status_response(ProvisioningState::NotStarted, 200)),
    ]);
    let records = vec![
        pending_record("m1", "https://csp.example/provisioning/1"),
        pending_record("m2", "https://csp.example/provisioning/2"),
        pending_record("m3", "https://csp.example/provisioning/3"),
        pending_record("m4", "https://csp.example/provisioning/4"),
    ];

    let outcome = poller.poll_batch(&records).await.expect("poll succeeds");

    assert_eq!(outcome.forwarded, 2);
    assert_eq!(
        outcome.reschedule_message_ids,
        vec!["m2".to_owned(), "m4".to_owned()]
    );
    let sent = completion_queue.sent();
    assert_eq!(sent.len(), 2);
    assert!(
        sent.iter()
            .all(|(group, _)| group == COMPLETION_MESSAGE_GROUP)
    );
}

#[rstest]
#[tokio::test]
async fn forwarded_envelope_records_handle_and_terminal_status() {
    let (poller, _, completion_queue) = poller_with(vec![Ok(status_response(
        ProvisioningState::Complete,
        200,
    ))]);
    let records = vec![pending_record("m1", "https://csp.example/provisioning/42")];

    poller.poll_batch(&records).await.expect("poll succeeds");

    let sent = completion_queue.sent();
    let (_, body) = sent.first().expect("one envelope forwarded");
    let envelope: CspResponse = serde_json::from_str(body).expect("envelope decodes");
    assert_eq!(envelope.code, 200);
    assert_eq!(
        envelope.content.request,
        json!({"location": "https://csp.example/provisioning/42"})
    );
    assert_eq!(
        envelope
            .content
            .response
            .get("status")
            .and_then(|s| s.get("status")),
        Some(&json!("COMPLETE"))
    );
}

#[rstest]
#[tokio::test]
async fn empty_batch_is_a_no_op() {
    let (poller, _, completion_queue) = poller_with(vec![]);
    let outcome = poller.poll_batch(&[]).await.expect("poll succeeds");
    assert_eq!(outcome.forwarded, 0);
    assert!(outcome.reschedule_message_ids.is_empty());
    assert!(completion_queue.sent().is_empty());
}

#[rstest]
#[tokio::test]
async fn malformed_record_aborts_the_batch() {
    let (poller, _, completion_queue) = poller_with(vec![]);
    let records = vec![QueueMessage {
        message_id: "m1".to_owned(),
        receipt_handle: "rcpt-m1".to_owned(),
        body: "not a job record".to_owned(),
    }];

    let error = poller
        .poll_batch(&records)
        .await
        .expect_err("malformed record must abort");

    assert!(matches!(
        error,
        CompletionPollError::MalformedRecord { message_id, .. } if message_id == "m1"
    ));
    assert!(completion_queue.sent().is_empty());
}

#[rstest]
#[tokio::test]
async fn record_without_polling_handle_aborts_the_batch() {
    let (poller, _, _) = poller_with(vec![]);
    let records = vec![QueueMessage {
        message_id: "m1".to_owned(),
        receipt_handle: "rcpt-m1".to_owned(),
        body: json!({
            "jobId": Uuid::nil(),
            "userId": "user-1",
            "operationType": "ADD_PORTFOLIO",
            "targetCsp": {"name": "CSP_A"},
            "payload": {},
        })
        .to_string(),
    }];

    let error = poller
        .poll_batch(&records)
        .await
        .expect_err("missing handle must abort");

    assert!(matches!(
        error,
        CompletionPollError::MissingPollingHandle { .. }
    ));
}

#[rstest]
#[tokio::test]
async fn client_failure_aborts_before_any_forwarding() {
    let (poller, _, completion_queue) = poller_with(vec![
        Ok(status_response(ProvisioningState::Complete, 200)),
        Err(CspClientError::transport("connection reset", json!({}))),
    ]);
    let records = vec![
        pending_record("m1", "https://csp.example/provisioning/1"),
        pending_record("m2", "https://csp.example/provisioning/2"),
    ];

    let error = poller
        .poll_batch(&records)
        .await
        .expect_err("client failure must abort");

    assert!(matches!(error, CompletionPollError::Csp(_)));
    assert!(
        completion_queue.sent().is_empty(),
        "nothing may be forwarded from an aborted batch"
    );
}

#[rstest]
#[tokio::test]
async fn run_cycle_deletes_done_records_and_keeps_rescheduled_ones() {
    let client = Arc::new(ScriptedStatusClient::new(vec![
        Ok(status_response(ProvisioningState::Complete, 200)),
        Ok(status_response(ProvisioningState::InProgress, 200)),
        Ok(status_response(ProvisioningState::Failed, 200)),
    ]));
    let pending_queue = Arc::new(RecordingQueue::with_batch(vec![
        pending_record("m1", "https://csp.example/provisioning/1"),
        pending_record("m2", "https://csp.example/provisioning/2"),
        pending_record("m3", "https://csp.example/provisioning/3"),
    ]));
    let completion_queue = Arc::new(RecordingQueue::default());
    let poller = CompletionPoller::new(CompletionPollerPorts {
        clients: Arc::new(StubFactory::new(client)),
        pending_queue: Arc::clone(&pending_queue) as Arc<dyn JobQueue>,
        completion_queue: Arc::clone(&completion_queue) as Arc<dyn JobQueue>,
    });

    let outcome = poller.run_cycle().await.expect("cycle succeeds");

    assert_eq!(outcome.forwarded, 2);
    assert_eq!(outcome.reschedule_message_ids, vec!["m2".to_owned()]);
    assert_eq!(
        pending_queue.deleted(),
        vec!["rcpt-m1".to_owned(), "rcpt-m3".to_owned()]
    );
}

#[rstest]
fn envelope_encoding_failure_is_not_reported_as_a_broker_error() {
    let failure = serde_json::from_str::<serde_json::Value>("{").expect_err("invalid JSON");
    let error = CompletionPollError::from(failure);
    assert!(matches!(error, CompletionPollError::Encode(_)));
    assert!(
        error
            .to_string()
            .starts_with("completion envelope could not be serialised"),
        "unexpected message: {error}"
    );
}

#[rstest]
#[tokio::test]
async fn run_cycle_on_a_quiet_queue_does_nothing() {
    let (poller, pending_queue, completion_queue) = poller_with(vec![]);
    let outcome = poller.run_cycle().await.expect("cycle succeeds");
    assert_eq!(outcome, super::PollOutcome::default());
    assert!(pending_queue.deleted().is_empty());
    assert!(completion_queue.sent().is_empty());
}
