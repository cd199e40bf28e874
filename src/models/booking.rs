use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Arrival/departure pair of a stay, read as a half-open range of nights.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub arrival: NaiveDate,
    pub departure: NaiveDate,
}

impl Span {
    pub fn new(arrival: NaiveDate, departure: NaiveDate) -> Self {
        Self { arrival, departure }
    }

    pub fn is_valid(&self) -> bool {
        self.arrival < self.departure
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Candidate,
    Committed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Candidate => "candidate",
            BookingStatus::Committed => "committed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub reference: String,
    pub arrival: NaiveDate,
    pub departure: NaiveDate,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub student_count: u32,
    #[serde(default)]
    pub status: BookingStatus,
}

impl Booking {
    pub fn span(&self) -> Span {
        Span::new(self.arrival, self.departure)
    }

    pub fn is_committed(&self) -> bool {
        self.status == BookingStatus::Committed
    }

    /// Whole calendar nights between arrival and departure. Zero or negative
    /// for spans that `validate_span` would reject.
    pub fn nights(&self) -> i64 {
        (self.departure - self.arrival).num_days()
    }

    /// Rejects same-day and reversed stays.
    pub fn validate_span(&self) -> AppResult<()> {
        if self.span().is_valid() {
            Ok(())
        } else {
            Err(AppError::invalid_span(
                self.id.clone(),
                self.arrival,
                self.departure,
            ))
        }
    }

    pub fn committed(mut self) -> Self {
        self.status = BookingStatus::Committed;
        self
    }
}

pub fn validate_spans(bookings: &[Booking]) -> AppResult<()> {
    bookings.iter().try_for_each(Booking::validate_span)
}
