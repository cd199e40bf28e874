use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationBonus {
    pub location_name: String,
    pub bonus_per_night: f64,
}

impl LocationBonus {
    pub fn new(location_name: impl Into<String>, bonus_per_night: f64) -> Self {
        Self {
            location_name: location_name.into(),
            bonus_per_night,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HostEarningsProfile {
    pub host_id: String,
    pub rate_per_student_per_night: f64,
    pub capacity: u32,
    #[serde(default)]
    pub location_bonuses: Vec<LocationBonus>,
}

impl HostEarningsProfile {
    /// A zero rate or zero capacity leaves nothing to optimize.
    pub fn is_configured(&self) -> bool {
        self.rate_per_student_per_night > 0.0 && self.capacity > 0
    }

    pub fn validate(&self) -> AppResult<()> {
        if !self.rate_per_student_per_night.is_finite() || self.rate_per_student_per_night < 0.0 {
            return Err(AppError::validation_with_details(
                "rate per student per night must be a non-negative amount",
                json!({"hostId": self.host_id, "rate": self.rate_per_student_per_night}),
            ));
        }

        let mut seen = HashSet::new();
        for bonus in &self.location_bonuses {
            if bonus.location_name.trim().is_empty() {
                return Err(AppError::validation_with_details(
                    "bonus location name cannot be empty",
                    json!({"hostId": self.host_id}),
                ));
            }
            if !bonus.bonus_per_night.is_finite() || bonus.bonus_per_night < 0.0 {
                return Err(AppError::validation_with_details(
                    "bonus per night must be a non-negative amount",
                    json!({
                        "hostId": self.host_id,
                        "location": bonus.location_name,
                        "bonus": bonus.bonus_per_night,
                    }),
                ));
            }
            if !seen.insert(bonus.location_name.trim().to_lowercase()) {
                return Err(AppError::validation_with_details(
                    "bonus locations must be unique",
                    json!({"hostId": self.host_id, "location": bonus.location_name}),
                ));
            }
        }

        Ok(())
    }
}

/// How a booking location is matched against the configured bonus list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BonusMatchMode {
    /// Case-insensitive substring match in either direction, first entry in
    /// list order wins.
    #[default]
    FirstMatch,
    /// Exact match first, then the longest matching bonus name, then list order.
    Ranked,
    /// Case-insensitive equality only.
    Exact,
}

impl BonusMatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BonusMatchMode::FirstMatch => "first_match",
            BonusMatchMode::Ranked => "ranked",
            BonusMatchMode::Exact => "exact",
        }
    }
}

impl fmt::Display for BonusMatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BonusMatchMode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "first_match" => Ok(BonusMatchMode::FirstMatch),
            "ranked" => Ok(BonusMatchMode::Ranked),
            "exact" => Ok(BonusMatchMode::Exact),
            other => Err(AppError::validation(format!(
                "unknown bonus match mode: {other}"
            ))),
        }
    }
}
