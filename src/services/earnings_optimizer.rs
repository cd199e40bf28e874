use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AppResult;
use crate::models::booking::{validate_spans, Booking};
use crate::models::earnings::{OptimizationResult, ScoredBooking};
use crate::models::host::{BonusMatchMode, HostEarningsProfile};
use crate::services::{commitment_filter, earnings_calculator};

/// Best non-conflicting subset of a candidate list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub selected: Vec<ScoredBooking>,
    pub total_earnings: f64,
}

#[derive(Debug, Clone, Default)]
pub struct EarningsOptimizer {
    mode: BonusMatchMode,
}

impl EarningsOptimizer {
    pub fn new(mode: BonusMatchMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> BonusMatchMode {
        self.mode
    }

    /// Validates the inputs, prices every booking, drops candidates that clash
    /// with committed stays and picks the highest-earning remaining subset.
    ///
    /// Committed bookings are never re-evaluated: they only contribute their
    /// earnings to the total and constrain which candidates survive.
    pub fn plan(
        &self,
        candidates: &[Booking],
        committed: &[Booking],
        profile: &HostEarningsProfile,
    ) -> AppResult<OptimizationResult> {
        profile.validate()?;
        validate_spans(candidates)?;
        validate_spans(committed)?;

        let already_committed =
            earnings_calculator::score_bookings(committed, profile, self.mode);
        let committed_earnings = earnings_calculator::sum_earnings(&already_committed);

        if !profile.is_configured() {
            info!(
                target: "app::optimizer",
                host_id = %profile.host_id,
                rate = profile.rate_per_student_per_night,
                capacity = profile.capacity,
                "host earnings configuration incomplete, skipping optimization"
            );
            return Ok(OptimizationResult {
                selected: Vec::new(),
                already_committed,
                excluded_by_commitment: Vec::new(),
                candidate_earnings: 0.0,
                committed_earnings,
                total_earnings: committed_earnings,
                configuration_incomplete: true,
            });
        }

        let committed_ids = committed
            .iter()
            .map(|booking| booking.id.as_str())
            .collect::<HashSet<_>>();
        let open_candidates = candidates
            .iter()
            .filter(|booking| !committed_ids.contains(booking.id.as_str()))
            .cloned()
            .collect::<Vec<_>>();

        let (available, excluded_by_commitment) =
            commitment_filter::partition_conflicting(&open_candidates, committed);

        debug!(
            target: "app::optimizer",
            host_id = %profile.host_id,
            candidates = candidates.len(),
            committed = committed.len(),
            excluded = excluded_by_commitment.len(),
            available = available.len(),
            mode = %self.mode,
            "running earnings optimization"
        );

        let scored = earnings_calculator::score_bookings(&available, profile, self.mode);
        let selection = optimize(&scored);
        let selected_ids = selection
            .selected
            .iter()
            .map(ScoredBooking::id)
            .collect::<Vec<_>>();

        debug!(
            target: "app::optimizer",
            host_id = %profile.host_id,
            selected = ?selected_ids,
            candidate_earnings = selection.total_earnings,
            "earnings optimization finished"
        );

        Ok(OptimizationResult {
            selected: selection.selected,
            already_committed,
            excluded_by_commitment,
            candidate_earnings: selection.total_earnings,
            committed_earnings,
            total_earnings: selection.total_earnings + committed_earnings,
            configuration_incomplete: false,
        })
    }
}

pub fn plan_earnings(
    candidates: &[Booking],
    committed: &[Booking],
    profile: &HostEarningsProfile,
    mode: BonusMatchMode,
) -> AppResult<OptimizationResult> {
    EarningsOptimizer::new(mode).plan(candidates, committed, profile)
}

/// Weighted interval scheduling over already-priced candidates.
///
/// Candidates are ordered by departure date, then booking id. Spans must be
/// valid; overlapping candidates are allowed and resolved here. When including
/// a booking ties with skipping it, the booking is included.
pub fn optimize(candidates: &[ScoredBooking]) -> Selection {
    if candidates.is_empty() {
        return Selection::default();
    }

    let mut sorted = candidates.iter().collect::<Vec<_>>();
    sorted.sort_by(|a, b| {
        a.booking
            .departure
            .cmp(&b.booking.departure)
            .then_with(|| a.booking.id.cmp(&b.booking.id))
    });

    let predecessors = compatible_predecessors(&sorted);

    let mut dp = Vec::with_capacity(sorted.len());
    for (i, candidate) in sorted.iter().enumerate() {
        let take = candidate.total() + value_at(&dp, predecessors[i]);
        let skip = value_at(&dp, i.checked_sub(1));
        dp.push(take.max(skip));
    }

    let mut picked = Vec::new();
    let mut cursor = Some(sorted.len() - 1);
    while let Some(i) = cursor {
        let take = sorted[i].total() + value_at(&dp, predecessors[i]);
        let skip = value_at(&dp, i.checked_sub(1));
        if take >= skip {
            picked.push(i);
            cursor = predecessors[i];
        } else {
            cursor = i.checked_sub(1);
        }
    }
    picked.reverse();

    let selected = picked
        .into_iter()
        .map(|i| sorted[i].clone())
        .collect::<Vec<_>>();

    Selection {
        selected,
        total_earnings: value_at(&dp, Some(sorted.len() - 1)),
    }
}

fn value_at(dp: &[f64], index: Option<usize>) -> f64 {
    index.map_or(0.0, |j| dp[j])
}

/// For each position, the last earlier position whose stay does not overlap it.
///
/// With departures sorted ascending and valid spans, an earlier booking is
/// compatible exactly when it departs on or before this arrival, so the
/// compatible prefix can be found by binary search.
fn compatible_predecessors(sorted: &[&ScoredBooking]) -> Vec<Option<usize>> {
    sorted
        .iter()
        .enumerate()
        .map(|(i, current)| {
            let arrival = current.booking.arrival;
            let count = sorted[..i].partition_point(|earlier| earlier.booking.departure <= arrival);
            count.checked_sub(1)
        })
        .collect()
}
