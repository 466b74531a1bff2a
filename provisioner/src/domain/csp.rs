//! Portfolio resource model exchanged with cloud service providers.
//!
//! The domain speaks camelCase; adapters transcode to the snake_case wire
//! convention at the HTTP boundary. Dates are ISO-8601 calendar dates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Classification impact level for a portfolio environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImpactLevel {
    /// Unclassified workloads.
    Unclassified,
    /// Secret workloads.
    Secret,
    /// Top secret workloads.
    TopSecret,
}

impl ImpactLevel {
    /// Wire spelling of the impact level, as used in headers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unclassified => "UNCLASSIFIED",
            Self::Secret => "SECRET",
            Self::TopSecret => "TOP_SECRET",
        }
    }
}

/// Funding category of a CLIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClinType {
    /// Cloud consumption funding.
    Cloud,
    /// Non-cloud (support) funding.
    NonCloud,
}

/// Validated contract line item number: four digits, `0001` to `9999`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClinNumber(String);

/// Rejection reasons for a candidate CLIN number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClinNumberError {
    /// The candidate was not exactly four ASCII digits.
    #[error("CLIN number must be exactly four digits: {candidate:?}")]
    Malformed {
        /// The rejected candidate.
        candidate: String,
    },
    /// The candidate was `0000`, below the valid range.
    #[error("CLIN number must be between 0001 and 9999")]
    OutOfRange,
}

impl ClinNumber {
    /// Validate and wrap a CLIN number.
    ///
    /// # Errors
    ///
    /// Returns [`ClinNumberError`] when the candidate is not four ASCII
    /// digits or is `0000`.
    pub fn new(candidate: impl Into<String>) -> Result<Self, ClinNumberError> {
        let candidate = candidate.into();
        if candidate.len() != 4 || !candidate.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(ClinNumberError::Malformed { candidate });
        }
        if candidate == "0000" {
            return Err(ClinNumberError::OutOfRange);
        }
        Ok(Self(candidate))
    }

    /// The validated four-digit string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ClinNumber {
    type Error = ClinNumberError;

    fn try_from(candidate: String) -> Result<Self, Self::Error> {
        Self::new(candidate)
    }
}

impl From<ClinNumber> for String {
    fn from(number: ClinNumber) -> Self {
        number.0
    }
}

impl std::fmt::Display for ClinNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One contract line item on a task order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clin {
    /// Validated CLIN number.
    pub clin_number: ClinNumber,
    /// Funding category.
    #[serde(rename = "type")]
    pub clin_type: ClinType,
    /// Period of performance start.
    pub pop_start_date: NaiveDate,
    /// Period of performance end.
    pub pop_end_date: NaiveDate,
    /// Classification level funded by this CLIN, when specified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification_level: Option<ImpactLevel>,
}

/// A funded task order attached to a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOrder {
    /// CSP-assigned identifier, absent until created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Thirteen-digit task order number.
    pub task_order_number: String,
    /// Line items funding the order.
    pub clins: Vec<Clin>,
    /// Period of performance start.
    pub pop_start_date: NaiveDate,
    /// Period of performance end.
    pub pop_end_date: NaiveDate,
}

/// A portfolio as known to a CSP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    /// CSP-assigned identifier, absent until created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Task orders funding the portfolio.
    #[serde(default)]
    pub task_orders: Vec<TaskOrder>,
}

/// An operator granted access to a portfolio environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    /// Operator's email address.
    pub email: String,
    /// Operator's DoD identifier.
    pub dod_id: String,
    /// Whether the operator's access needs to be re-issued.
    #[serde(default)]
    pub needs_reset: bool,
}

/// Partial update applied to an existing portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioPatch {
    /// Replacement operator roster.
    #[serde(default)]
    pub operators: Vec<Operator>,
}

/// One month of cost figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCost {
    /// Month in `YYYY-MM` form.
    pub month: String,
    /// Decimal cost amount, kept as a string to avoid rounding.
    pub value: String,
}

/// Cost figures for one CLIN within a date range.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostGroup {
    /// Aggregate total across the range, when the CSP reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<String>,
    /// Month-by-month breakdown, when the CSP reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<MonthlyCost>>,
}

/// Actual and forecast cost figures for one CLIN.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinCosts {
    /// Validated CLIN number the figures belong to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clin_number: Option<ClinNumber>,
    /// Incurred costs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Vec<CostGroup>>,
    /// Projected costs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Vec<CostGroup>>,
}

/// Cost figures for one task order, grouped by CLIN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOrderCosts {
    /// Task order the figures belong to.
    pub task_order_number: String,
    /// Per-CLIN figures.
    #[serde(default)]
    pub clins: Vec<ClinCosts>,
}

/// Portfolio-wide cost summary, grouped by task order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioCosts {
    /// Per-task-order figures.
    #[serde(default)]
    pub task_orders: Vec<TaskOrderCosts>,
}
