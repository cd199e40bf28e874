use serde::{Deserialize, Serialize};

use crate::models::booking::Booking;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEarnings {
    pub nights: i64,
    pub base_earnings: f64,
    pub bonus_per_night: f64,
    pub bonus_total: f64,
    pub total_earnings: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoredBooking {
    pub booking: Booking,
    pub earnings: ResolvedEarnings,
}

impl ScoredBooking {
    pub fn id(&self) -> &str {
        &self.booking.id
    }

    pub fn total(&self) -> f64 {
        self.earnings.total_earnings
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    /// Recommended bookings to accept, in arrival order. Never contains a
    /// committed booking.
    pub selected: Vec<ScoredBooking>,
    pub already_committed: Vec<ScoredBooking>,
    #[serde(default)]
    pub excluded_by_commitment: Vec<String>,
    pub candidate_earnings: f64,
    pub committed_earnings: f64,
    pub total_earnings: f64,
    #[serde(default)]
    pub configuration_incomplete: bool,
}

impl OptimizationResult {
    pub fn selected_bookings(&self) -> Vec<Booking> {
        self.selected
            .iter()
            .map(|scored| scored.booking.clone())
            .collect()
    }

    pub fn selected_ids(&self) -> Vec<&str> {
        self.selected.iter().map(ScoredBooking::id).collect()
    }
}
