use crate::models::booking::Booking;
use crate::models::earnings::{ResolvedEarnings, ScoredBooking};
use crate::models::host::{BonusMatchMode, HostEarningsProfile};
use crate::services::{bonus_resolver, span_utils};

/// Earnings for one booking under a host profile. Inputs are expected to have
/// passed boundary validation; a non-positive night count yields zero
/// earnings instead of a negative amount.
pub fn compute_earnings(
    booking: &Booking,
    profile: &HostEarningsProfile,
    mode: BonusMatchMode,
) -> ResolvedEarnings {
    let nights = span_utils::nights_between(booking.arrival, booking.departure).max(0);
    let billable = nights as f64;

    let base_earnings =
        profile.rate_per_student_per_night * f64::from(profile.capacity) * billable;
    let bonus_per_night = bonus_resolver::resolve_bonus(
        &booking.location,
        &profile.location_bonuses,
        mode,
    );
    let bonus_total = bonus_per_night * billable;

    ResolvedEarnings {
        nights,
        base_earnings,
        bonus_per_night,
        bonus_total,
        total_earnings: base_earnings + bonus_total,
    }
}

pub fn score_bookings(
    bookings: &[Booking],
    profile: &HostEarningsProfile,
    mode: BonusMatchMode,
) -> Vec<ScoredBooking> {
    bookings
        .iter()
        .map(|booking| ScoredBooking {
            booking: booking.clone(),
            earnings: compute_earnings(booking, profile, mode),
        })
        .collect()
}

pub fn sum_earnings(scored: &[ScoredBooking]) -> f64 {
    scored.iter().map(ScoredBooking::total).sum()
}
