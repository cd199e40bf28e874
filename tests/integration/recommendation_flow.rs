use std::sync::Arc;

use chrono::NaiveDate;
use homestay_earnings::db::DbPool;
use homestay_earnings::models::booking::{Booking, BookingStatus};
use homestay_earnings::models::host::{BonusMatchMode, HostEarningsProfile, LocationBonus};
use homestay_earnings::services::acceptance_service::AcceptanceService;
use homestay_earnings::services::earnings_service::EarningsService;
use homestay_earnings::services::settings_service::{SettingsService, SettingsUpdateInput};
use homestay_earnings::AppError;
use tempfile::{tempdir, TempDir};

struct Fixture {
    _dir: TempDir,
    settings: Arc<SettingsService>,
    acceptance: Arc<AcceptanceService>,
    earnings: EarningsService,
}

fn setup() -> Fixture {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("earnings.sqlite")).expect("db pool");
    let settings = Arc::new(SettingsService::new(pool.clone()));
    let acceptance = Arc::new(AcceptanceService::new(pool.clone(), Arc::clone(&settings)));
    let earnings = EarningsService::new(pool, Arc::clone(&settings), Arc::clone(&acceptance));
    Fixture {
        _dir: dir,
        settings,
        acceptance,
        earnings,
    }
}

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).expect("valid date")
}

fn booking(id: &str, location: &str, arrival: (u32, u32), departure: (u32, u32)) -> Booking {
    Booking {
        id: id.to_string(),
        reference: format!("HS-{id}"),
        arrival: date(arrival.0, arrival.1),
        departure: date(departure.0, departure.1),
        location: location.to_string(),
        country: Some("FR".to_string()),
        student_count: 2,
        status: BookingStatus::Candidate,
    }
}

fn watford_host(rate: f64, capacity: u32) -> HostEarningsProfile {
    HostEarningsProfile {
        host_id: "host-1".to_string(),
        rate_per_student_per_night: rate,
        capacity,
        location_bonuses: vec![LocationBonus::new("Watford", 5.0)],
    }
}

fn scenario_bookings() -> Vec<Booking> {
    vec![
        booking("B1", "Watford", (7, 1), (7, 5)),
        booking("B2", "Watford", (7, 4), (7, 8)),
        booking("B3", "Cheshunt", (7, 6), (7, 10)),
    ]
}

#[test]
fn recommend_accept_and_recompute_flow() {
    let fixture = setup();
    fixture
        .earnings
        .register_host("Jane's house", &watford_host(20.0, 2))
        .expect("register host");
    fixture
        .earnings
        .import_bookings(&scenario_bookings())
        .expect("import bookings");

    let recommendation = fixture
        .earnings
        .recommend("host-1", None)
        .expect("recommendation");
    assert_eq!(recommendation.selected_ids(), vec!["B1", "B3"]);
    assert_eq!(recommendation.total_earnings, 340.0);
    assert!(recommendation.already_committed.is_empty());

    let accepted = fixture
        .earnings
        .accept_recommended("host-1", None)
        .expect("accept recommended");
    assert!(accepted.report.is_complete());
    assert_eq!(accepted.report.succeeded, 2);

    // The accepted stays are now pinned; B2 clashes with B1 and drops out.
    let rerun = fixture
        .earnings
        .recommend("host-1", None)
        .expect("second recommendation");
    assert!(rerun.selected.is_empty());
    assert_eq!(rerun.already_committed.len(), 2);
    assert_eq!(rerun.excluded_by_commitment, vec!["B2".to_string()]);
    assert_eq!(rerun.committed_earnings, 340.0);
    assert_eq!(rerun.total_earnings, 340.0);
}

#[test]
fn bookings_accepted_by_another_host_are_not_offered() {
    let fixture = setup();
    fixture
        .earnings
        .register_host("Jane's house", &watford_host(20.0, 2))
        .expect("register host 1");
    let mut other = watford_host(25.0, 1);
    other.host_id = "host-2".to_string();
    fixture
        .earnings
        .register_host("Sam's flat", &other)
        .expect("register host 2");
    fixture
        .earnings
        .import_bookings(&scenario_bookings())
        .expect("import bookings");

    let report = fixture
        .acceptance
        .accept_all(&[booking("B3", "Cheshunt", (7, 6), (7, 10))], "host-2")
        .expect("host-2 accepts B3");
    assert!(report.is_complete());

    let recommendation = fixture
        .earnings
        .recommend("host-1", None)
        .expect("recommendation");
    assert!(!recommendation.selected_ids().contains(&"B3"));
    assert!(recommendation.already_committed.is_empty());
}

#[test]
fn declined_bookings_and_location_filter_narrow_candidates() {
    let fixture = setup();
    fixture
        .earnings
        .register_host("Jane's house", &watford_host(20.0, 2))
        .expect("register host");
    fixture
        .earnings
        .import_bookings(&scenario_bookings())
        .expect("import bookings");

    let cheshunt_only = fixture
        .earnings
        .recommend("host-1", Some("cheshunt"))
        .expect("filtered recommendation");
    assert_eq!(cheshunt_only.selected_ids(), vec!["B3"]);

    fixture
        .acceptance
        .decline("B1", "host-1")
        .expect("decline B1");
    let without_b1 = fixture
        .earnings
        .recommend("host-1", None)
        .expect("recommendation after decline");
    // B2 and B3 overlap on 07-06 and 07-07, B2 earns more through the bonus.
    assert_eq!(without_b1.selected_ids(), vec!["B2"]);
    assert_eq!(without_b1.total_earnings, 180.0);
}

#[test]
fn zero_rate_host_gets_empty_recommendation() {
    let fixture = setup();
    fixture
        .earnings
        .register_host("Unpriced", &watford_host(0.0, 2))
        .expect("register host");
    fixture
        .earnings
        .import_bookings(&scenario_bookings())
        .expect("import bookings");

    let recommendation = fixture
        .earnings
        .recommend("host-1", None)
        .expect("recommendation");
    assert!(recommendation.selected.is_empty());
    assert!(recommendation.configuration_incomplete);
    assert_eq!(recommendation.total_earnings, 0.0);
}

#[test]
fn bonus_match_mode_setting_changes_resolved_bonus() {
    let fixture = setup();
    let mut host = watford_host(10.0, 1);
    host.location_bonuses = vec![
        LocationBonus::new("Watford", 5.0),
        LocationBonus::new("Watford Junction", 9.0),
    ];
    fixture
        .earnings
        .register_host("Jane's house", &host)
        .expect("register host");
    fixture
        .earnings
        .import_bookings(&[booking("J1", "Watford Junction", (9, 1), (9, 3))])
        .expect("import bookings");

    let legacy = fixture
        .earnings
        .recommend("host-1", None)
        .expect("legacy recommendation");
    assert_eq!(legacy.selected[0].earnings.bonus_per_night, 5.0);

    fixture
        .settings
        .update(SettingsUpdateInput {
            bonus_match_mode: Some(BonusMatchMode::Ranked),
            acceptance_mode: None,
        })
        .expect("switch to ranked matching");

    let ranked = fixture
        .earnings
        .recommend("host-1", None)
        .expect("ranked recommendation");
    assert_eq!(ranked.selected[0].earnings.bonus_per_night, 9.0);
    assert_eq!(ranked.total_earnings, 2.0 * (10.0 + 9.0));
}

#[test]
fn invalid_input_is_rejected_at_the_boundary() {
    let fixture = setup();

    let mut negative = watford_host(-5.0, 2);
    negative.host_id = "host-bad".to_string();
    let err = fixture
        .earnings
        .register_host("Broken", &negative)
        .expect_err("negative rate rejected");
    assert!(err.is_validation());

    let mut padded = watford_host(20.0, 2);
    padded.location_bonuses.push(LocationBonus::new("  Watford ", 7.0));
    let err = fixture
        .earnings
        .register_host("Padded names", &padded)
        .expect_err("names equal after trimming rejected");
    assert!(err.is_validation());

    let err = fixture
        .earnings
        .import_bookings(&[
            booking("ok", "Watford", (7, 1), (7, 3)),
            booking("same-day", "Watford", (7, 3), (7, 3)),
        ])
        .expect_err("same-day stay rejected");
    assert!(matches!(err, AppError::InvalidSpan { ref booking_id, .. } if booking_id == "same-day"));

    let missing = fixture.earnings.recommend("nobody", None);
    assert!(matches!(missing, Err(AppError::NotFound)));
}
