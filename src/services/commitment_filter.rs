use crate::models::booking::Booking;
use crate::services::span_utils;

/// Drops every candidate that shares a night with a committed booking.
/// Survivors keep their input order.
pub fn filter_conflicting(candidates: &[Booking], committed: &[Booking]) -> Vec<Booking> {
    partition_conflicting(candidates, committed).0
}

/// Same as `filter_conflicting`, also returning the ids that were dropped.
pub fn partition_conflicting(
    candidates: &[Booking],
    committed: &[Booking],
) -> (Vec<Booking>, Vec<String>) {
    let mut kept = Vec::with_capacity(candidates.len());
    let mut excluded = Vec::new();

    for candidate in candidates {
        let span = candidate.span();
        if committed
            .iter()
            .any(|pinned| span_utils::overlaps(span, pinned.span()))
        {
            excluded.push(candidate.id.clone());
        } else {
            kept.push(candidate.clone());
        }
    }

    (kept, excluded)
}
