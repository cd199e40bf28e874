use std::sync::Arc;

use chrono::NaiveDate;
use homestay_earnings::db::repositories::assignment_repository::AssignmentRepository;
use homestay_earnings::db::DbPool;
use homestay_earnings::models::assignment::{AcceptanceMode, HostResponse};
use homestay_earnings::models::booking::{Booking, BookingStatus};
use homestay_earnings::models::host::{HostEarningsProfile, LocationBonus};
use homestay_earnings::services::acceptance_service::AcceptanceService;
use homestay_earnings::services::earnings_service::EarningsService;
use homestay_earnings::services::settings_service::{SettingsService, SettingsUpdateInput};
use tempfile::{tempdir, TempDir};

const HOST: &str = "host-7";

fn booking(id: &str, arrival: u32, departure: u32) -> Booking {
    Booking {
        id: id.to_string(),
        reference: format!("HS-{id}"),
        arrival: NaiveDate::from_ymd_opt(2024, 8, arrival).expect("arrival"),
        departure: NaiveDate::from_ymd_opt(2024, 8, departure).expect("departure"),
        location: "St Albans".to_string(),
        country: Some("DE".to_string()),
        student_count: 1,
        status: BookingStatus::Candidate,
    }
}

fn setup() -> (TempDir, DbPool, Arc<SettingsService>, AcceptanceService) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("acceptance.sqlite")).expect("db pool");
    let settings = Arc::new(SettingsService::new(pool.clone()));
    let acceptance = AcceptanceService::new(pool.clone(), Arc::clone(&settings));

    let earnings = EarningsService::new(
        pool.clone(),
        Arc::clone(&settings),
        Arc::new(acceptance.clone()),
    );
    earnings
        .register_host(
            "Garden flat",
            &HostEarningsProfile {
                host_id: HOST.to_string(),
                rate_per_student_per_night: 18.5,
                capacity: 3,
                location_bonuses: vec![LocationBonus::new("St Albans", 4.0)],
            },
        )
        .expect("register host");
    earnings
        .import_bookings(&[booking("A", 1, 4), booking("B", 4, 9), booking("C", 12, 15)])
        .expect("import bookings");

    (dir, pool, settings, acceptance)
}

fn accepted_count(pool: &DbPool) -> usize {
    pool.with_connection(|conn| {
        Ok(AssignmentRepository::list_for_host(conn, HOST)?
            .into_iter()
            .filter(|row| row.response == HostResponse::Accepted.as_str())
            .count())
    })
    .expect("count assignments")
}

#[test]
fn accepting_twice_is_idempotent() {
    let (_dir, pool, _settings, acceptance) = setup();
    let selection = vec![booking("A", 1, 4), booking("B", 4, 9)];

    let first = acceptance.accept_all(&selection, HOST).expect("first batch");
    assert!(first.is_complete());
    assert!(first.outcomes.iter().all(|outcome| outcome.created));

    let before = acceptance.list_assignments(HOST).expect("assignments");

    let second = acceptance.accept_all(&selection, HOST).expect("second batch");
    assert!(second.is_complete());
    assert!(second.outcomes.iter().all(|outcome| !outcome.created));

    let after = acceptance.list_assignments(HOST).expect("assignments");
    assert_eq!(before, after);
    assert_eq!(accepted_count(&pool), 2);
}

#[test]
fn failed_items_do_not_roll_back_earlier_successes() {
    let (_dir, pool, _settings, acceptance) = setup();
    let selection = vec![booking("A", 1, 4), booking("ghost", 5, 6), booking("C", 12, 15)];

    let report = acceptance.accept_all(&selection, HOST).expect("batch");

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failed_booking_ids(), vec!["ghost".to_string()]);
    let ids: Vec<&str> = report
        .outcomes
        .iter()
        .map(|outcome| outcome.booking_id.as_str())
        .collect();
    assert_eq!(ids, vec!["A", "ghost", "C"]);
    assert!(report.outcomes[1].error.is_some());
    assert_eq!(accepted_count(&pool), 2);

    // Retrying only the failed subset after the record shows up completes the set.
    let earnings = EarningsService::new(
        pool.clone(),
        Arc::new(SettingsService::new(pool.clone())),
        Arc::new(acceptance.clone()),
    );
    earnings
        .import_bookings(&[booking("ghost", 5, 6)])
        .expect("late import");
    let retry: Vec<Booking> = selection
        .into_iter()
        .filter(|b| report.failed_booking_ids().contains(&b.id))
        .collect();
    let retried = acceptance.accept_all(&retry, HOST).expect("retry");
    assert!(retried.is_complete());
    assert_eq!(accepted_count(&pool), 3);
}

#[test]
fn accepting_after_decline_flips_the_response() {
    let (_dir, pool, _settings, acceptance) = setup();

    let declined = acceptance.decline("A", HOST).expect("decline");
    assert_eq!(declined.response, HostResponse::Declined);

    let report = acceptance
        .accept_all(&[booking("A", 1, 4)], HOST)
        .expect("accept");
    assert!(report.is_complete());
    assert!(!report.outcomes[0].created);

    let row = pool
        .with_connection(|conn| AssignmentRepository::find_for_booking(conn, HOST, "A"))
        .expect("lookup")
        .expect("assignment row");
    assert_eq!(row.response, "accepted");
    assert!(acceptance.decline("A", HOST).is_err());
}

#[test]
fn atomic_mode_rolls_back_the_whole_batch() {
    let (_dir, pool, settings, acceptance) = setup();
    settings
        .update(SettingsUpdateInput {
            bonus_match_mode: None,
            acceptance_mode: Some(AcceptanceMode::Atomic),
        })
        .expect("switch to atomic");

    let selection = vec![booking("A", 1, 4), booking("ghost", 5, 6), booking("C", 12, 15)];
    let report = acceptance.accept_all(&selection, HOST).expect("batch");

    assert_eq!(report.succeeded, 0);
    assert_eq!(report.failed, 3);
    assert!(report.outcomes[0]
        .error
        .as_deref()
        .is_some_and(|message| message.contains("rolled back")));
    assert!(report.outcomes[2]
        .error
        .as_deref()
        .is_some_and(|message| message.contains("not attempted")));
    assert_eq!(accepted_count(&pool), 0);

    let clean = acceptance
        .accept_all_with_mode(&[booking("A", 1, 4), booking("C", 12, 15)], HOST, AcceptanceMode::Atomic)
        .expect("clean atomic batch");
    assert!(clean.is_complete());
    assert_eq!(accepted_count(&pool), 2);
}

#[test]
fn invalid_span_is_reported_per_item() {
    let (_dir, _pool, _settings, acceptance) = setup();
    let selection = vec![booking("A", 1, 4), booking("B", 9, 4)];

    let report = acceptance
        .accept_all_with_mode(&selection, HOST, AcceptanceMode::BestEffort)
        .expect("batch");

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed_booking_ids(), vec!["B".to_string()]);
}

#[test]
fn booking_held_by_another_host_is_a_per_item_conflict() {
    let (_dir, pool, settings, acceptance) = setup();
    let earnings = EarningsService::new(pool.clone(), settings, Arc::new(acceptance.clone()));
    earnings
        .register_host(
            "Loft room",
            &HostEarningsProfile {
                host_id: "host-8".to_string(),
                rate_per_student_per_night: 21.0,
                capacity: 1,
                location_bonuses: Vec::new(),
            },
        )
        .expect("register second host");

    let first = acceptance
        .accept_all(&[booking("A", 1, 4)], HOST)
        .expect("host-7 batch");
    assert!(first.is_complete());

    let second = acceptance
        .accept_all(&[booking("A", 1, 4), booking("C", 12, 15)], "host-8")
        .expect("host-8 batch");
    assert_eq!(second.succeeded, 1);
    assert_eq!(second.failed_booking_ids(), vec!["A".to_string()]);
    assert!(second.outcomes[0]
        .error
        .as_deref()
        .is_some_and(|message| message.contains("already accepted by host host-7")));

    let host_eight = acceptance.list_assignments("host-8").expect("assignments");
    assert_eq!(host_eight.len(), 1);
    assert_eq!(host_eight[0].booking_id, "C");
    assert_eq!(accepted_count(&pool), 1);
}
