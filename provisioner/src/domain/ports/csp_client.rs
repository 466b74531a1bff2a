//! Driven port for the cloud service provider provisioning API.
//!
//! The domain owns the request and response shapes plus the sync/async
//! outcome split so orchestration code never inspects HTTP artefacts.
//! Adapters classify each exchange by status code; callers only ever see
//! [`CspResult`] or [`CspClientError`].

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::csp::{
    ClinNumber, ImpactLevel, Portfolio, PortfolioCosts, PortfolioPatch, TaskOrder,
};
use crate::domain::provisioning::{CspResponse, CspResponseContent, ProvisioningStatus};

/// Cross-cutting provisioning directives attached to every request.
///
/// Both fields are forwarded to the CSP as headers when present and are
/// omitted from serialised request records when absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionDirectives {
    /// Impact level the operation applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_impact_level: Option<ImpactLevel>,
    /// ISO-8601 deadline after which the CSP may abandon the job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provision_deadline: Option<String>,
}

/// Request to create a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPortfolioRequest {
    /// Portfolio to create.
    pub portfolio: Portfolio,
    /// Cross-cutting directives.
    #[serde(flatten)]
    pub directives: ProvisionDirectives,
}

/// Request to fetch one portfolio by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPortfolioRequest {
    /// Identifier of the portfolio to fetch.
    pub portfolio_id: String,
    /// Cross-cutting directives.
    #[serde(flatten)]
    pub directives: ProvisionDirectives,
}

/// Request to patch an existing portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchPortfolioRequest {
    /// Identifier of the portfolio to patch.
    pub portfolio_id: String,
    /// Partial update to apply.
    pub patch: PortfolioPatch,
    /// Cross-cutting directives.
    #[serde(flatten)]
    pub directives: ProvisionDirectives,
}

/// Request for portfolio-wide cost data over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCostsByPortfolioRequest {
    /// Identifier of the portfolio to query.
    pub portfolio_id: String,
    /// Range start, inclusive.
    pub start_date: NaiveDate,
    /// Range end, inclusive.
    pub end_date: NaiveDate,
    /// Cross-cutting directives.
    #[serde(flatten)]
    pub directives: ProvisionDirectives,
}

/// Request to attach a task order to a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTaskOrderRequest {
    /// Identifier of the portfolio to attach to.
    pub portfolio_id: String,
    /// Task order to attach.
    pub task_order: TaskOrder,
    /// Cross-cutting directives.
    #[serde(flatten)]
    pub directives: ProvisionDirectives,
}

/// Request for cost data scoped to one CLIN of one task order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCostsByClinRequest {
    /// Identifier of the portfolio to query.
    pub portfolio_id: String,
    /// Task order owning the CLIN.
    pub task_order_number: String,
    /// CLIN to query.
    pub clin_number: ClinNumber,
    /// Range start, inclusive.
    pub start_date: NaiveDate,
    /// Range end, inclusive.
    pub end_date: NaiveDate,
    /// Cross-cutting directives.
    #[serde(flatten)]
    pub directives: ProvisionDirectives,
}

/// Request to re-poll a deferred operation via its polling handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetProvisioningStatusRequest {
    /// Absolute polling URL issued by the CSP when it deferred the work.
    pub location: String,
    /// Cross-cutting directives.
    #[serde(flatten)]
    pub directives: ProvisionDirectives,
}

/// Trace metadata attached to every synchronous response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    /// HTTP status the CSP answered with.
    pub status: u16,
    /// The originating request, serialised for audit.
    pub request: Value,
}

/// Successful portfolio creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPortfolioResponse {
    /// Created portfolio as echoed by the CSP.
    pub portfolio: Portfolio,
    /// Trace metadata.
    #[serde(rename = "$metadata")]
    pub metadata: ResponseMetadata,
}

/// Successful portfolio fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPortfolioResponse {
    /// Portfolio returned by the CSP.
    pub portfolio: Portfolio,
    /// Trace metadata.
    #[serde(rename = "$metadata")]
    pub metadata: ResponseMetadata,
}

/// Successful portfolio patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchPortfolioResponse {
    /// Applied patch as echoed by the CSP.
    pub patch: PortfolioPatch,
    /// Trace metadata.
    #[serde(rename = "$metadata")]
    pub metadata: ResponseMetadata,
}

/// Successful portfolio-wide cost query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostsByPortfolioResponse {
    /// Cost figures grouped by task order.
    pub costs: PortfolioCosts,
    /// Trace metadata.
    #[serde(rename = "$metadata")]
    pub metadata: ResponseMetadata,
}

/// Successful task order attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTaskOrderResponse {
    /// Attached task order as echoed by the CSP.
    pub task_order: TaskOrder,
    /// Trace metadata.
    #[serde(rename = "$metadata")]
    pub metadata: ResponseMetadata,
}

/// Successful CLIN-scoped cost query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostsByClinResponse {
    /// Cost figures for the requested CLIN.
    pub costs: crate::domain::csp::ClinCosts,
    /// Trace metadata.
    #[serde(rename = "$metadata")]
    pub metadata: ResponseMetadata,
}

/// Status re-poll answer for a deferred operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningStatusResponse {
    /// Current job status.
    pub status: ProvisioningStatus,
    /// Polling handle the status was read from.
    pub location: String,
    /// Trace metadata.
    #[serde(rename = "$metadata")]
    pub metadata: ResponseMetadata,
}

/// Deferred-acceptance answer for a provisioning operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsyncProvisionResponse {
    /// Initial job status reported alongside the deferral.
    pub status: ProvisioningStatus,
    /// Absolute polling URL to re-poll the operation at.
    pub location: String,
    /// Trace metadata.
    #[serde(rename = "$metadata")]
    pub metadata: ResponseMetadata,
}

/// Outcome of a provisioning operation the CSP may defer.
///
/// The variant is selected by the adapter from the HTTP status code
/// alone (200 synchronous, 202 deferred). The enum serialises untagged
/// for envelope forwarding but deliberately does not deserialise, so no
/// caller can reconstruct the variant by probing fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CspResult<T> {
    /// The CSP completed the operation synchronously.
    Sync(T),
    /// The CSP accepted the operation for deferred completion.
    Async(AsyncProvisionResponse),
}

impl<T> CspResult<T> {
    /// Whether the operation was deferred.
    #[must_use]
    pub const fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }

    /// The synchronous payload, if the operation completed synchronously.
    pub fn into_sync(self) -> Option<T> {
        match self {
            Self::Sync(payload) => Some(payload),
            Self::Async(_) => None,
        }
    }
}

/// Discriminator for [`CspClientError`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CspErrorKind {
    /// The CSP rejected the submitted portfolio.
    InvalidPortfolio,
    /// The CSP rejected the portfolio identifier.
    InvalidPortfolioId,
    /// The CSP rejected the cost query parameters.
    InvalidCostQuery,
    /// No portfolio exists for the identifier.
    PortfolioNotFound,
    /// No provisioning job exists at the polling handle.
    ProvisioningJobNotFound,
    /// A deferral arrived without a usable polling handle.
    MissingLocation,
    /// Any other CSP failure, including transport errors.
    CspApiError,
}

impl std::fmt::Display for CspErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::InvalidPortfolio => "InvalidPortfolio",
            Self::InvalidPortfolioId => "InvalidPortfolioId",
            Self::InvalidCostQuery => "InvalidCostQuery",
            Self::PortfolioNotFound => "PortfolioNotFound",
            Self::ProvisioningJobNotFound => "ProvisioningJobNotFound",
            Self::MissingLocation => "MissingLocation",
            Self::CspApiError => "CspApiError",
        };
        f.write_str(name)
    }
}

/// Raw HTTP evidence captured with a failed exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCspResponse {
    /// HTTP status the CSP answered with.
    pub status: u16,
    /// Response body, already transcoded to camelCase.
    pub body: Value,
}

/// Failure of one CSP exchange, tagged by [`CspErrorKind`].
///
/// A single error value carries the classification, the originating
/// request, and any HTTP evidence. There is no error hierarchy: callers
/// branch on `kind` and nothing else.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct CspClientError {
    /// Classification of the failure.
    pub kind: CspErrorKind,
    /// Human-readable description.
    pub message: String,
    /// The request that failed, serialised for audit.
    pub request: Value,
    /// HTTP evidence, absent for transport failures.
    pub response: Option<RawCspResponse>,
}

impl CspClientError {
    /// Build an error from a classified HTTP exchange.
    #[must_use]
    pub fn new(
        kind: CspErrorKind,
        message: impl Into<String>,
        request: Value,
        response: Option<RawCspResponse>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            request,
            response,
        }
    }

    /// Build the error for a deferral that arrived without a usable
    /// `Location` polling handle.
    #[must_use]
    pub fn missing_location(request: Value) -> Self {
        Self::new(
            CspErrorKind::MissingLocation,
            "Location header was invalid or not provided",
            request,
            None,
        )
    }

    /// Build the error for a transport failure with no HTTP response.
    #[must_use]
    pub fn transport(message: impl Into<String>, request: Value) -> Self {
        Self::new(CspErrorKind::CspApiError, message, request, None)
    }

    /// Convert the error into the uniform queue envelope.
    ///
    /// A missing polling handle becomes a synthetic 500 whose body names
    /// the problem; any other failure carries its HTTP status and body,
    /// or code 400 with an empty body when no response was received.
    #[must_use]
    pub fn into_csp_response(self) -> CspResponse {
        if self.kind == CspErrorKind::MissingLocation {
            return CspResponse {
                code: 500,
                content: CspResponseContent {
                    request: self.request,
                    response: json!({"details": "Location header was invalid or not provided"}),
                },
            };
        }
        let (code, body) = self
            .response
            .map_or((400, json!({})), |raw| (raw.status, raw.body));
        CspResponse {
            code,
            content: CspResponseContent {
                request: self.request,
                response: body,
            },
        }
    }
}

/// Port for the seven provisioning operations a CSP exposes.
///
/// # Examples
///
/// ```rust,ignore
/// use provisioner::domain::ports::{CspClient, FixtureCspClient, GetPortfolioRequest};
///
/// let client = FixtureCspClient;
/// let response = client
///     .get_portfolio_by_id(&GetPortfolioRequest {
///         portfolio_id: "csp-pf-1".to_owned(),
///         directives: Default::default(),
///     })
///     .await?;
/// assert_eq!(response.metadata.status, 200);
/// # Ok::<(), provisioner::domain::ports::CspClientError>(())
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CspClient: Send + Sync {
    /// Create a portfolio. May be deferred by the CSP.
    async fn add_portfolio(
        &self,
        request: &AddPortfolioRequest,
    ) -> Result<CspResult<AddPortfolioResponse>, CspClientError>;

    /// Fetch a portfolio by identifier. Always synchronous.
    async fn get_portfolio_by_id(
        &self,
        request: &GetPortfolioRequest,
    ) -> Result<GetPortfolioResponse, CspClientError>;

    /// Patch an existing portfolio. May be deferred by the CSP.
    async fn patch_portfolio(
        &self,
        request: &PatchPortfolioRequest,
    ) -> Result<CspResult<PatchPortfolioResponse>, CspClientError>;

    /// Query portfolio-wide cost data. Always synchronous.
    async fn get_costs_by_portfolio(
        &self,
        request: &GetCostsByPortfolioRequest,
    ) -> Result<CostsByPortfolioResponse, CspClientError>;

    /// Attach a task order to a portfolio. May be deferred by the CSP.
    async fn add_task_order(
        &self,
        request: &AddTaskOrderRequest,
    ) -> Result<CspResult<AddTaskOrderResponse>, CspClientError>;

    /// Query cost data for one CLIN. Always synchronous.
    async fn get_costs_by_clin(
        &self,
        request: &GetCostsByClinRequest,
    ) -> Result<CostsByClinResponse, CspClientError>;

    /// Re-poll a deferred operation at its polling handle.
    async fn get_provisioning_status(
        &self,
        request: &GetProvisioningStatusRequest,
    ) -> Result<ProvisioningStatusResponse, CspClientError>;
}

fn fixture_metadata<R: Serialize>(request: &R) -> ResponseMetadata {
    ResponseMetadata {
        status: 200,
        request: serde_json::to_value(request).unwrap_or(Value::Null),
    }
}

/// Fixture implementation answering every operation synchronously by
/// echoing the request's own data.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureCspClient;

#[async_trait]
impl CspClient for FixtureCspClient {
    async fn add_portfolio(
        &self,
        request: &AddPortfolioRequest,
    ) -> Result<CspResult<AddPortfolioResponse>, CspClientError> {
        let mut portfolio = request.portfolio.clone();
        portfolio.id.get_or_insert_with(|| "fixture-pf".to_owned());
        Ok(CspResult::Sync(AddPortfolioResponse {
            portfolio,
            metadata: fixture_metadata(request),
        }))
    }

    async fn get_portfolio_by_id(
        &self,
        request: &GetPortfolioRequest,
    ) -> Result<GetPortfolioResponse, CspClientError> {
        Ok(GetPortfolioResponse {
            portfolio: Portfolio {
                id: Some(request.portfolio_id.clone()),
                name: "Fixture Portfolio".to_owned(),
                task_orders: Vec::new(),
            },
            metadata: fixture_metadata(request),
        })
    }

    async fn patch_portfolio(
        &self,
        request: &PatchPortfolioRequest,
    ) -> Result<CspResult<PatchPortfolioResponse>, CspClientError> {
        Ok(CspResult::Sync(PatchPortfolioResponse {
            patch: request.patch.clone(),
            metadata: fixture_metadata(request),
        }))
    }

    async fn get_costs_by_portfolio(
        &self,
        request: &GetCostsByPortfolioRequest,
    ) -> Result<CostsByPortfolioResponse, CspClientError> {
        Ok(CostsByPortfolioResponse {
            costs: PortfolioCosts::default(),
            metadata: fixture_metadata(request),
        })
    }

    async fn add_task_order(
        &self,
        request: &AddTaskOrderRequest,
    ) -> Result<CspResult<AddTaskOrderResponse>, CspClientError> {
        Ok(CspResult::Sync(AddTaskOrderResponse {
            task_order: request.task_order.clone(),
            metadata: fixture_metadata(request),
        }))
    }

    async fn get_costs_by_clin(
        &self,
        request: &GetCostsByClinRequest,
    ) -> Result<CostsByClinResponse, CspClientError> {
        Ok(CostsByClinResponse {
            costs: crate::domain::csp::ClinCosts {
                clin_number: Some(request.clin_number.clone()),
                ..Default::default()
            },
            metadata: fixture_metadata(request),
        })
    }

    async fn get_provisioning_status(
        &self,
        request: &GetProvisioningStatusRequest,
    ) -> Result<ProvisioningStatusResponse, CspClientError> {
        Ok(ProvisioningStatusResponse {
            status: ProvisioningStatus {
                provisioning_job_id: uuid::Uuid::nil(),
                portfolio_id: "fixture-pf".to_owned(),
                status: crate::domain::provisioning::ProvisioningState::Complete,
            },
            location: request.location.clone(),
            metadata: fixture_metadata(request),
        })
    }
}
