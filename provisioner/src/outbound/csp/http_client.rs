//! Reqwest-backed CSP provisioning client adapter.
//!
//! This adapter owns transport details only: header assembly, key-case
//! transcoding at the wire boundary, and classification of each HTTP
//! status into the domain's sync/async/error outcomes. Status code is
//! the sole discriminator; bodies are never probed to pick an outcome.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Url, header};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::domain::ports::{
    AccessToken, AddPortfolioRequest, AddPortfolioResponse, AddTaskOrderRequest,
    AddTaskOrderResponse, AsyncProvisionResponse, CostsByClinResponse, CostsByPortfolioResponse,
    CspClient, CspClientError, CspErrorKind, CspResult, GetCostsByClinRequest,
    GetCostsByPortfolioRequest, GetPortfolioRequest, GetPortfolioResponse,
    GetProvisioningStatusRequest, PatchPortfolioRequest, PatchPortfolioResponse,
    ProvisionDirectives, ProvisioningStatusResponse, RawCspResponse, ResponseMetadata,
};
use crate::domain::provisioning::ProvisioningStatus;

/// Provisioning API version this client speaks.
pub const ATAT_API_VERSION: &str = "v0.3.0";

const DEFAULT_USER_AGENT: &str = "provisioner-csp-client/0.1";
const HEADER_API_VERSION: &str = "X-Atat-Api-Version";
const HEADER_IMPACT_LEVEL: &str = "X-Target-Impact-Level";
const HEADER_PROVISION_DEADLINE: &str = "X-Provision-Deadline";

/// Construction failures for [`AtatHttpClient`].
#[derive(Debug, thiserror::Error)]
pub enum AtatClientBuildError {
    /// The base URI cannot hold path segments.
    #[error("CSP base URI cannot hold path segments")]
    InvalidBase,
    /// The bearer token is not a valid header value.
    #[error("access token is not a valid authorization header value")]
    InvalidAuthorization,
    /// The underlying HTTP client could not be constructed.
    #[error("http client construction failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// CSP client adapter bound to one base endpoint and one access token.
///
/// Tokens are short-lived, so instances are built per invocation by the
/// client factory rather than held long-term.
pub struct AtatHttpClient {
    client: Client,
    base: Url,
}

impl AtatHttpClient {
    /// Build an adapter for `base` authenticating with `token`.
    ///
    /// # Errors
    ///
    /// Returns [`AtatClientBuildError`] when the base URI cannot carry
    /// path segments, the token cannot be placed in a header, or the
    /// reqwest client cannot be constructed.
    pub fn new(
        base: Url,
        token: &AccessToken,
        timeout: Duration,
    ) -> Result<Self, AtatClientBuildError> {
        if base.cannot_be_a_base() {
            return Err(AtatClientBuildError::InvalidBase);
        }
        let mut authorization =
            header::HeaderValue::from_str(&format!("Bearer {}", token.secret()))
                .map_err(|_| AtatClientBuildError::InvalidAuthorization)?;
        authorization.set_sensitive(true);
        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, authorization);
        headers.insert(
            HEADER_API_VERSION,
            header::HeaderValue::from_static(ATAT_API_VERSION),
        );
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .default_headers(headers)
            .build()?;
        Ok(Self { client, base })
    }

    /// Resolve an endpoint under the base URI, percent-encoding each
    /// path segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut parts) = url.path_segments_mut() {
            parts.pop_if_empty();
            parts.extend(segments);
        }
        url
    }

    async fn execute(
        &self,
        method: Method,
        url: Url,
        query: Option<&[(&str, String)]>,
        body: Option<Value>,
        directives: &ProvisionDirectives,
        request_value: &Value,
    ) -> Result<WireResponse, CspClientError> {
        let mut builder = self.client.request(method, url);
        if let Some(query) = query {
            builder = builder.query(query);
        }
        if let Some(level) = directives.target_impact_level {
            builder = builder.header(HEADER_IMPACT_LEVEL, level.as_str());
        }
        if let Some(deadline) = &directives.provision_deadline {
            builder = builder.header(HEADER_PROVISION_DEADLINE, deadline.as_str());
        }
        if let Some(body) = body {
            builder = builder.json(&wirecase::snake_case_keys(body));
        }
        let response = builder
            .send()
            .await
            .map_err(|error| CspClientError::transport(error.to_string(), request_value.clone()))?;

        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let declared_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(is_json_media_type);
        let bytes = response
            .bytes()
            .await
            .map_err(|error| CspClientError::transport(error.to_string(), request_value.clone()))?;
        let body = decode_wire_body(bytes.as_ref(), declared_json).map_err(|message| {
            CspClientError::new(
                CspErrorKind::CspApiError,
                message,
                request_value.clone(),
                Some(RawCspResponse {
                    status,
                    body: Value::String(String::from_utf8_lossy(bytes.as_ref()).into_owned()),
                }),
            )
        })?;
        Ok(WireResponse {
            status,
            location,
            body,
        })
    }
}

/// One HTTP exchange, body already transcoded to camelCase.
struct WireResponse {
    status: u16,
    location: Option<String>,
    body: Value,
}

fn is_json_media_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|media| media.trim().eq_ignore_ascii_case("application/json"))
}

/// Decode a response body according to its declared media type.
///
/// Empty bodies decode to `null`. Bodies declared JSON are parsed and
/// key-transcoded; anything else is carried as an opaque string so error
/// envelopes preserve the evidence.
fn decode_wire_body(bytes: &[u8], declared_json: bool) -> Result<Value, String> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    if declared_json {
        let parsed: Value = serde_json::from_slice(bytes)
            .map_err(|error| format!("response declared JSON but did not parse: {error}"))?;
        return Ok(wirecase::camel_case_keys(parsed));
    }
    Ok(Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn metadata(wire: &WireResponse, request_value: &Value) -> ResponseMetadata {
    ResponseMetadata {
        status: wire.status,
        request: request_value.clone(),
    }
}

fn evidence(wire: &WireResponse) -> RawCspResponse {
    RawCspResponse {
        status: wire.status,
        body: wire.body.clone(),
    }
}

fn classified(
    kind: CspErrorKind,
    message: &str,
    wire: &WireResponse,
    request_value: &Value,
) -> CspClientError {
    CspClientError::new(kind, message, request_value.clone(), Some(evidence(wire)))
}

fn unexpected(operation: &str, wire: &WireResponse, request_value: &Value) -> CspClientError {
    classified(
        CspErrorKind::CspApiError,
        &format!("unexpected status {} from {operation}", wire.status),
        wire,
        request_value,
    )
}

fn decode_payload<T: DeserializeOwned>(
    wire: &WireResponse,
    request_value: &Value,
) -> Result<T, CspClientError> {
    serde_json::from_value(wire.body.clone()).map_err(|error| {
        CspClientError::new(
            CspErrorKind::CspApiError,
            format!("response body did not match the expected shape: {error}"),
            request_value.clone(),
            Some(evidence(wire)),
        )
    })
}

/// Classify a 202 deferral, requiring a well-formed `Location` handle.
fn async_acceptance(
    wire: &WireResponse,
    request_value: &Value,
) -> Result<AsyncProvisionResponse, CspClientError> {
    let location = wire
        .location
        .as_deref()
        .filter(|handle| !handle.is_empty() && Url::parse(handle).is_ok())
        .ok_or_else(|| CspClientError::missing_location(request_value.clone()))?;
    let status: ProvisioningStatus = decode_payload(wire, request_value)?;
    Ok(AsyncProvisionResponse {
        status,
        location: location.to_owned(),
        metadata: metadata(wire, request_value),
    })
}

fn date_range_query(
    start: chrono::NaiveDate,
    end: chrono::NaiveDate,
) -> [(&'static str, String); 2] {
    [
        ("start_date", start.to_string()),
        ("end_date", end.to_string()),
    ]
}

#[async_trait]
impl CspClient for AtatHttpClient {
    async fn add_portfolio(
        &self,
        request: &AddPortfolioRequest,
    ) -> Result<CspResult<AddPortfolioResponse>, CspClientError> {
        let request_value = to_json(request);
        let wire = self
            .execute(
                Method::POST,
                self.endpoint(&["portfolios"]),
                None,
                Some(to_json(&request.portfolio)),
                &request.directives,
                &request_value,
            )
            .await?;
        match wire.status {
            200 => Ok(CspResult::Sync(AddPortfolioResponse {
                portfolio: decode_payload(&wire, &request_value)?,
                metadata: metadata(&wire, &request_value),
            })),
            202 => Ok(CspResult::Async(async_acceptance(&wire, &request_value)?)),
            400 => Err(classified(
                CspErrorKind::InvalidPortfolio,
                "invalid portfolio provided",
                &wire,
                &request_value,
            )),
            _ => Err(unexpected("addPortfolio", &wire, &request_value)),
        }
    }

    async fn get_portfolio_by_id(
        &self,
        request: &GetPortfolioRequest,
    ) -> Result<GetPortfolioResponse, CspClientError> {
        let request_value = to_json(request);
        let wire = self
            .execute(
                Method::GET,
                self.endpoint(&["portfolios", &request.portfolio_id]),
                None,
                None,
                &request.directives,
                &request_value,
            )
            .await?;
        match wire.status {
            200 => Ok(GetPortfolioResponse {
                portfolio: decode_payload(&wire, &request_value)?,
                metadata: metadata(&wire, &request_value),
            }),
            400 => Err(classified(
                CspErrorKind::InvalidPortfolioId,
                "invalid portfolio id provided",
                &wire,
                &request_value,
            )),
            404 => Err(classified(
                CspErrorKind::PortfolioNotFound,
                "portfolio not found",
                &wire,
                &request_value,
            )),
            _ => Err(unexpected("getPortfolioById", &wire, &request_value)),
        }
    }

    async fn patch_portfolio(
        &self,
        request: &PatchPortfolioRequest,
    ) -> Result<CspResult<PatchPortfolioResponse>, CspClientError> {
        let request_value = to_json(request);
        let wire = self
            .execute(
                Method::PATCH,
                self.endpoint(&["portfolios", &request.portfolio_id]),
                None,
                Some(to_json(&request.patch)),
                &request.directives,
                &request_value,
            )
            .await?;
        match wire.status {
            200 => Ok(CspResult::Sync(PatchPortfolioResponse {
                patch: decode_payload(&wire, &request_value)?,
                metadata: metadata(&wire, &request_value),
            })),
            202 => Ok(CspResult::Async(async_acceptance(&wire, &request_value)?)),
            400 => Err(classified(
                CspErrorKind::InvalidPortfolio,
                "invalid portfolio patch provided",
                &wire,
                &request_value,
            )),
            404 => Err(classified(
                CspErrorKind::PortfolioNotFound,
                "portfolio not found",
                &wire,
                &request_value,
            )),
            _ => Err(unexpected("patchPortfolio", &wire, &request_value)),
        }
    }

    async fn get_costs_by_portfolio(
        &self,
        request: &GetCostsByPortfolioRequest,
    ) -> Result<CostsByPortfolioResponse, CspClientError> {
        let request_value = to_json(request);
        let wire = self
            .execute(
                Method::GET,
                self.endpoint(&["portfolios", &request.portfolio_id, "cost"]),
                Some(&date_range_query(request.start_date, request.end_date)),
                None,
                &request.directives,
                &request_value,
            )
            .await?;
        match wire.status {
            200 => Ok(CostsByPortfolioResponse {
                costs: decode_payload(&wire, &request_value)?,
                metadata: metadata(&wire, &request_value),
            }),
            400 => Err(classified(
                CspErrorKind::InvalidCostQuery,
                "invalid cost query parameters",
                &wire,
                &request_value,
            )),
            404 => Err(classified(
                CspErrorKind::PortfolioNotFound,
                "portfolio not found",
                &wire,
                &request_value,
            )),
            _ => Err(unexpected("getCostsByPortfolio", &wire, &request_value)),
        }
    }

    async fn add_task_order(
        &self,
        request: &AddTaskOrderRequest,
    ) -> Result<CspResult<AddTaskOrderResponse>, CspClientError> {
        let request_value = to_json(request);
        let wire = self
            .execute(
                Method::POST,
                self.endpoint(&["portfolios", &request.portfolio_id, "task-orders"]),
                None,
                Some(to_json(&request.task_order)),
                &request.directives,
                &request_value,
            )
            .await?;
        match wire.status {
            200 => Ok(CspResult::Sync(AddTaskOrderResponse {
                task_order: decode_payload(&wire, &request_value)?,
                metadata: metadata(&wire, &request_value),
            })),
            202 => Ok(CspResult::Async(async_acceptance(&wire, &request_value)?)),
            400 => Err(classified(
                CspErrorKind::InvalidPortfolioId,
                "invalid portfolio id provided",
                &wire,
                &request_value,
            )),
            404 => Err(classified(
                CspErrorKind::PortfolioNotFound,
                "portfolio not found",
                &wire,
                &request_value,
            )),
            _ => Err(unexpected("addTaskOrder", &wire, &request_value)),
        }
    }

    async fn get_costs_by_clin(
        &self,
        request: &GetCostsByClinRequest,
    ) -> Result<CostsByClinResponse, CspClientError> {
        let request_value = to_json(request);
        let wire = self
            .execute(
                Method::GET,
                self.endpoint(&[
                    "portfolios",
                    &request.portfolio_id,
                    "task-orders",
                    &request.task_order_number,
                    "clins",
                    request.clin_number.as_str(),
                    "cost",
                ]),
                Some(&date_range_query(request.start_date, request.end_date)),
                None,
                &request.directives,
                &request_value,
            )
            .await?;
        match wire.status {
            200 => Ok(CostsByClinResponse {
                costs: decode_payload(&wire, &request_value)?,
                metadata: metadata(&wire, &request_value),
            }),
            400 => Err(classified(
                CspErrorKind::InvalidCostQuery,
                "invalid cost query parameters",
                &wire,
                &request_value,
            )),
            404 => Err(classified(
                CspErrorKind::PortfolioNotFound,
                "portfolio not found",
                &wire,
                &request_value,
            )),
            _ => Err(unexpected("getCostsByClin", &wire, &request_value)),
        }
    }

    async fn get_provisioning_status(
        &self,
        request: &GetProvisioningStatusRequest,
    ) -> Result<ProvisioningStatusResponse, CspClientError> {
        let request_value = to_json(request);
        let url = Url::parse(&request.location).map_err(|error| {
            CspClientError::new(
                CspErrorKind::CspApiError,
                format!("polling location is not a valid URL: {error}"),
                request_value.clone(),
                None,
            )
        })?;
        let wire = self
            .execute(
                Method::GET,
                url,
                None,
                None,
                &request.directives,
                &request_value,
            )
            .await?;
        match wire.status {
            200 => Ok(ProvisioningStatusResponse {
                status: decode_payload(&wire, &request_value)?,
                location: request.location.clone(),
                metadata: metadata(&wire, &request_value),
            }),
            404 => Err(classified(
                CspErrorKind::ProvisioningJobNotFound,
                "provisioning job not found",
                &wire,
                &request_value,
            )),
            _ => Err(unexpected("getProvisioningStatus", &wire, &request_value)),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network classification helpers.

    use std::time::Duration;

    use rstest::rstest;
    use serde_json::{Value, json};

    use super::{
        AtatHttpClient, WireResponse, async_acceptance, decode_wire_body, is_json_media_type,
    };
    use crate::domain::ports::{AccessToken, CspErrorKind};

    fn client_for(base: &str) -> AtatHttpClient {
        let base = reqwest::Url::parse(base).expect("valid base URL");
        AtatHttpClient::new(
            base,
            &AccessToken::new("test-token", "Bearer", 3600),
            Duration::from_secs(5),
        )
        .expect("client builds")
    }

    #[rstest]
    #[case::bare_json("application/json", true)]
    #[case::with_charset("application/json; charset=utf-8", true)]
    #[case::mixed_case("Application/JSON", true)]
    #[case::text("text/plain", false)]
    #[case::problem_json("application/problem+json", false)]
    fn json_media_type_gate(#[case] content_type: &str, #[case] expected: bool) {
        assert_eq!(is_json_media_type(content_type), expected);
    }

    #[rstest]
    fn declared_json_bodies_are_transcoded() {
        let body = br#"{"task_orders": [{"task_order_number": "123"}]}"#;
        let decoded = decode_wire_body(body, true).expect("body decodes");
        assert_eq!(
            decoded,
            json!({"taskOrders": [{"taskOrderNumber": "123"}]})
        );
    }

    #[rstest]
    fn undeclared_bodies_stay_opaque() {
        let decoded = decode_wire_body(b"{\"snake_key\": 1}", false).expect("body decodes");
        assert_eq!(decoded, Value::String("{\"snake_key\": 1}".to_owned()));
    }

    #[rstest]
    fn empty_bodies_decode_to_null() {
        assert_eq!(decode_wire_body(b"", true), Ok(Value::Null));
        assert_eq!(decode_wire_body(b"", false), Ok(Value::Null));
    }

    #[rstest]
    fn declared_json_that_does_not_parse_is_an_error() {
        assert!(decode_wire_body(b"not json", true).is_err());
    }

    #[rstest]
    fn endpoint_preserves_base_path_and_encodes_segments() {
        let client = client_for("https://csp.example/api/atat");
        let url = client.endpoint(&["portfolios", "pf 1/x"]);
        assert_eq!(
            url.as_str(),
            "https://csp.example/api/atat/portfolios/pf%201%2Fx"
        );
    }

    #[rstest]
    #[case::absent(None)]
    #[case::empty(Some(String::new()))]
    #[case::relative(Some("not-a-url".to_owned()))]
    fn deferral_without_usable_location_is_rejected(#[case] location: Option<String>) {
        let wire = WireResponse {
            status: 202,
            location,
            body: json!({
                "provisioningJobId": "00000000-0000-0000-0000-000000000000",
                "portfolioId": "pf-1",
                "status": "IN_PROGRESS",
            }),
        };
        let error = async_acceptance(&wire, &json!({})).expect_err("deferral must be rejected");
        assert_eq!(error.kind, CspErrorKind::MissingLocation);
    }

    #[rstest]
    fn deferral_with_absolute_location_is_accepted() {
        let wire = WireResponse {
            status: 202,
            location: Some("https://csp.example/provisioning/42".to_owned()),
            body: json!({
                "provisioningJobId": "00000000-0000-0000-0000-000000000000",
                "portfolioId": "pf-1",
                "status": "NOT_STARTED",
            }),
        };
        let accepted = async_acceptance(&wire, &json!({"op": 1})).expect("deferral accepted");
        assert_eq!(accepted.location, "https://csp.example/provisioning/42");
        assert_eq!(accepted.metadata.status, 202);
        assert_eq!(accepted.metadata.request, json!({"op": 1}));
    }
}
