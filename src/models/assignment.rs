use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HostResponse {
    Pending,
    Accepted,
    Declined,
}

impl HostResponse {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostResponse::Pending => "pending",
            HostResponse::Accepted => "accepted",
            HostResponse::Declined => "declined",
        }
    }
}

impl fmt::Display for HostResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostResponse {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(HostResponse::Pending),
            "accepted" => Ok(HostResponse::Accepted),
            "declined" => Ok(HostResponse::Declined),
            other => Err(AppError::validation(format!("unknown host response: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRecord {
    pub id: String,
    pub host_id: String,
    pub booking_id: String,
    pub response: HostResponse,
    #[serde(default)]
    pub responded_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Whether a batch keeps going past failed items or stops and rolls back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AcceptanceMode {
    #[default]
    BestEffort,
    /// All-or-nothing inside one transaction. Differs from the default in
    /// that one failure discards every other item of the batch.
    Atomic,
}

impl AcceptanceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AcceptanceMode::BestEffort => "best_effort",
            AcceptanceMode::Atomic => "atomic",
        }
    }
}

impl fmt::Display for AcceptanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AcceptanceMode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "best_effort" => Ok(AcceptanceMode::BestEffort),
            "atomic" => Ok(AcceptanceMode::Atomic),
            other => Err(AppError::validation(format!(
                "unknown acceptance mode: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AcceptOutcome {
    pub booking_id: String,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    /// True when this call inserted the assignment rather than updating one.
    #[serde(default)]
    pub created: bool,
}

impl AcceptOutcome {
    pub fn accepted(booking_id: impl Into<String>, created: bool) -> Self {
        Self {
            booking_id: booking_id.into(),
            success: true,
            error: None,
            created,
        }
    }

    pub fn failed(booking_id: impl Into<String>, error: impl ToString) -> Self {
        Self {
            booking_id: booking_id.into(),
            success: false,
            error: Some(error.to_string()),
            created: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BatchAcceptReport {
    pub outcomes: Vec<AcceptOutcome>,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchAcceptReport {
    pub fn from_outcomes(outcomes: Vec<AcceptOutcome>) -> Self {
        let succeeded = outcomes.iter().filter(|outcome| outcome.success).count();
        let failed = outcomes.len() - succeeded;
        Self {
            outcomes,
            succeeded,
            failed,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }

    pub fn failed_booking_ids(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|outcome| !outcome.success)
            .map(|outcome| outcome.booking_id.clone())
            .collect()
    }
}
