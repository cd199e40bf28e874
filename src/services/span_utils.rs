use chrono::{DateTime, NaiveDate};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::models::booking::Span;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Accepts a plain `YYYY-MM-DD` date or an RFC 3339 timestamp, keeping only
/// the calendar date in the timestamp's own offset.
pub fn parse_date(value: &str) -> AppResult<NaiveDate> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.date_naive())
        .map_err(|err| {
            AppError::validation_with_details(
                "invalid date format",
                json!({"value": value, "error": err.to_string()}),
            )
        })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Two stays conflict when they share at least one night. A departure on the
/// same day as another arrival is a turnover, not a conflict.
pub fn overlaps(a: Span, b: Span) -> bool {
    a.arrival < b.departure && b.arrival < a.departure
}

/// Calendar-day difference, so daylight-saving shifts never produce a
/// fractional night.
pub fn nights_between(arrival: NaiveDate, departure: NaiveDate) -> i64 {
    (departure - arrival).num_days()
}

pub fn ensure_span(span: Span) -> AppResult<()> {
    if span.departure <= span.arrival {
        Err(AppError::validation_with_details(
            "departure must be after arrival",
            json!({
                "arrival": format_date(span.arrival),
                "departure": format_date(span.departure),
            }),
        ))
    } else {
        Ok(())
    }
}
