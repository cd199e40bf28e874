use std::sync::Arc;

use chrono::Utc;
use rusqlite::Connection;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::repositories::assignment_repository::{AssignmentRepository, AssignmentRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::assignment::{
    AcceptOutcome, AcceptanceMode, AssignmentRecord, BatchAcceptReport, HostResponse,
};
use crate::models::booking::Booking;
use crate::services::settings_service::SettingsService;

/// Commits a host's chosen bookings as accepted assignments.
#[derive(Clone)]
pub struct AcceptanceService {
    db: DbPool,
    settings: Arc<SettingsService>,
}

impl AcceptanceService {
    pub fn new(db: DbPool, settings: Arc<SettingsService>) -> Self {
        Self { db, settings }
    }

    pub fn accept_all(&self, selected: &[Booking], host_id: &str) -> AppResult<BatchAcceptReport> {
        let mode = self.settings.get()?.acceptance_mode;
        self.accept_all_with_mode(selected, host_id, mode)
    }

    pub fn accept_all_with_mode(
        &self,
        selected: &[Booking],
        host_id: &str,
        mode: AcceptanceMode,
    ) -> AppResult<BatchAcceptReport> {
        let report = match mode {
            AcceptanceMode::BestEffort => self.accept_best_effort(selected, host_id)?,
            AcceptanceMode::Atomic => self.accept_atomic(selected, host_id)?,
        };

        info!(
            target: "app::acceptance",
            %host_id,
            %mode,
            requested = selected.len(),
            succeeded = report.succeeded,
            failed = report.failed,
            "batch acceptance finished"
        );
        Ok(report)
    }

    /// Records an explicit refusal so the booking stops being offered to this host.
    pub fn decline(&self, booking_id: &str, host_id: &str) -> AppResult<AssignmentRecord> {
        self.db.with_connection(|conn| {
            let now = Utc::now().to_rfc3339();
            match AssignmentRepository::find_for_booking(conn, host_id, booking_id)? {
                Some(row) => {
                    if row.response == HostResponse::Accepted.as_str() {
                        return Err(AppError::conflict(format!(
                            "booking {booking_id} is already accepted by host {host_id}"
                        )));
                    }
                    AssignmentRepository::update_response(
                        conn,
                        &row.id,
                        HostResponse::Declined,
                        &now,
                    )?;
                }
                None => {
                    let record = new_assignment(host_id, booking_id, HostResponse::Declined, &now);
                    AssignmentRepository::insert(conn, &AssignmentRow::from_record(&record))?;
                }
            }

            AssignmentRepository::find_for_booking(conn, host_id, booking_id)?
                .ok_or_else(AppError::not_found)?
                .into_record()
        })
    }

    pub fn list_assignments(&self, host_id: &str) -> AppResult<Vec<AssignmentRecord>> {
        self.db.with_connection(|conn| {
            AssignmentRepository::list_for_host(conn, host_id)?
                .into_iter()
                .map(AssignmentRow::into_record)
                .collect()
        })
    }

    // Each item commits on its own; a failure never undoes earlier items.
    fn accept_best_effort(&self, selected: &[Booking], host_id: &str) -> AppResult<BatchAcceptReport> {
        let conn = self.db.get_connection()?;
        let mut outcomes = Vec::with_capacity(selected.len());

        for booking in selected {
            match accept_one(&conn, booking, host_id) {
                Ok(created) => outcomes.push(AcceptOutcome::accepted(&booking.id, created)),
                Err(err) => {
                    warn!(
                        target: "app::acceptance",
                        %host_id,
                        booking_id = %booking.id,
                        error = %err,
                        "failed to accept booking, continuing with the rest of the batch"
                    );
                    outcomes.push(AcceptOutcome::failed(&booking.id, err));
                }
            }
        }

        Ok(BatchAcceptReport::from_outcomes(outcomes))
    }

    fn accept_atomic(&self, selected: &[Booking], host_id: &str) -> AppResult<BatchAcceptReport> {
        let mut conn = self.db.get_connection()?;
        let tx = conn.transaction()?;

        let mut outcomes = Vec::with_capacity(selected.len());
        let mut failure: Option<(usize, AppError)> = None;
        for (index, booking) in selected.iter().enumerate() {
            match accept_one(&tx, booking, host_id) {
                Ok(created) => outcomes.push(AcceptOutcome::accepted(&booking.id, created)),
                Err(err) => {
                    failure = Some((index, err));
                    break;
                }
            }
        }

        let Some((failed_index, err)) = failure else {
            tx.commit()?;
            return Ok(BatchAcceptReport::from_outcomes(outcomes));
        };

        tx.rollback()?;
        let failed_id = selected[failed_index].id.clone();
        warn!(
            target: "app::acceptance",
            %host_id,
            booking_id = %failed_id,
            error = %err,
            "atomic batch aborted and rolled back"
        );

        let outcomes = selected
            .iter()
            .enumerate()
            .map(|(index, booking)| {
                if index < failed_index {
                    AcceptOutcome::failed(
                        &booking.id,
                        format!("rolled back after booking {failed_id} failed"),
                    )
                } else if index == failed_index {
                    AcceptOutcome::failed(&booking.id, &err)
                } else {
                    AcceptOutcome::failed(
                        &booking.id,
                        format!("not attempted after booking {failed_id} failed"),
                    )
                }
            })
            .collect();

        Ok(BatchAcceptReport::from_outcomes(outcomes))
    }
}

/// Upserts an accepted assignment. Returns `true` when a new row was inserted.
/// Re-accepting an already accepted booking leaves the row untouched; a
/// booking already accepted by another host is a `Conflict`.
fn accept_one(conn: &Connection, booking: &Booking, host_id: &str) -> AppResult<bool> {
    booking.validate_span()?;
    let now = Utc::now().to_rfc3339();

    let own = AssignmentRepository::find_for_booking(conn, host_id, &booking.id)?;
    if own
        .as_ref()
        .is_some_and(|row| row.response == HostResponse::Accepted.as_str())
    {
        return Ok(false);
    }

    if let Some(taken) =
        AssignmentRepository::find_accepted_by_other_host(conn, host_id, &booking.id)?
    {
        return Err(AppError::conflict(format!(
            "booking {} is already accepted by host {}",
            booking.id, taken.host_id
        )));
    }

    match own {
        Some(row) => {
            AssignmentRepository::update_response(conn, &row.id, HostResponse::Accepted, &now)?;
            Ok(false)
        }
        None => {
            let record = new_assignment(host_id, &booking.id, HostResponse::Accepted, &now);
            AssignmentRepository::insert(conn, &AssignmentRow::from_record(&record))?;
            Ok(true)
        }
    }
}

fn new_assignment(
    host_id: &str,
    booking_id: &str,
    response: HostResponse,
    now: &str,
) -> AssignmentRecord {
    AssignmentRecord {
        id: Uuid::new_v4().to_string(),
        host_id: host_id.to_string(),
        booking_id: booking_id.to_string(),
        response,
        responded_at: Some(now.to_string()),
        created_at: now.to_string(),
        updated_at: now.to_string(),
    }
}
