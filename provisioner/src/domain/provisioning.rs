//! Core provisioning job model shared by the client, consumers, and poller.
//!
//! These types mirror the queue payloads exchanged with the surrounding
//! provisioning pipeline, so their serde names follow the pipeline's
//! camelCase convention.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// FIFO message group for envelopes forwarded to the completion queue.
pub const COMPLETION_MESSAGE_GROUP: &str = "processed-async-events";

/// Lifecycle states reported by a cloud service provider for a
/// provisioning job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProvisioningState {
    /// The CSP has accepted the job but not begun work.
    NotStarted,
    /// The CSP is actively provisioning.
    InProgress,
    /// Terminal: provisioning finished successfully.
    Complete,
    /// Terminal: provisioning finished unsuccessfully.
    Failed,
}

impl ProvisioningState {
    /// Whether the state is terminal. Terminal states never transition
    /// back to a non-terminal one; observing `Complete` or `Failed` means
    /// the job can be retired from polling.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

/// Status record for one provisioning job, as reported by a CSP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningStatus {
    /// Identifier of the tracked provisioning job.
    pub provisioning_job_id: Uuid,
    /// Portfolio the job operates on.
    pub portfolio_id: String,
    /// Current lifecycle state.
    pub status: ProvisioningState,
}

/// Identity of the CSP a job targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetCsp {
    /// Configuration key naming the CSP.
    pub name: String,
    /// Base endpoint, when the pipeline has already resolved it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Network designator, when the pipeline carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

/// Kinds of provisioning work the pipeline dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProvisionRequestType {
    /// Create a portfolio at the CSP.
    AddPortfolio,
    /// Apply a patch (operator roster) to an existing portfolio.
    PatchPortfolio,
    /// Attach a task order to an existing portfolio.
    AddTaskOrder,
    /// Retrieve actual and forecast cost data for a portfolio.
    GetCostsByPortfolio,
    /// Retrieve actual and forecast cost data for one CLIN.
    GetCostsByClin,
}

/// One provisioning job record as carried on the pipeline queues.
///
/// `payload` stays opaque JSON: the record is routed and re-queued by
/// stages that must not depend on operation-specific shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionRequest {
    /// Stable job identifier for trace correlation.
    pub job_id: Uuid,
    /// Identity of the user who initiated the job.
    pub user_id: String,
    /// Portfolio the job operates on, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_id: Option<String>,
    /// Which provisioning operation the job performs.
    pub operation_type: ProvisionRequestType,
    /// CSP the job targets.
    pub target_csp: TargetCsp,
    /// Operation-specific request payload.
    pub payload: Value,
    /// CSP invocation details recorded by an earlier stage, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csp_invocation: Option<Value>,
    /// Latest CSP exchange recorded for the job, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csp_response: Option<CspResponse>,
}

/// Uniform envelope recording one CSP exchange for queue forwarding.
///
/// `code` carries the HTTP-shaped outcome, `content.request` the request
/// that produced it, and `content.response` the body the CSP returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CspResponse<Req = Value, Resp = Value> {
    /// HTTP-shaped status code for the exchange.
    pub code: u16,
    /// Request and response pair for the exchange.
    pub content: CspResponseContent<Req, Resp>,
}

/// Request/response pair inside a [`CspResponse`] envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CspResponseContent<Req = Value, Resp = Value> {
    /// The request that produced this exchange.
    pub request: Req,
    /// The body the CSP returned.
    pub response: Resp,
}
