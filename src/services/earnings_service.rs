use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::db::repositories::booking_repository::{BookingRepository, BookingRow};
use crate::db::repositories::host_repository::{HostRepository, HostRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::assignment::BatchAcceptReport;
use crate::models::booking::{validate_spans, Booking, BookingStatus};
use crate::models::earnings::OptimizationResult;
use crate::models::host::HostEarningsProfile;
use crate::services::acceptance_service::AcceptanceService;
use crate::services::earnings_optimizer::EarningsOptimizer;
use crate::services::settings_service::SettingsService;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedRecommendation {
    pub recommendation: OptimizationResult,
    pub report: BatchAcceptReport,
}

/// Loads a host's data snapshot and drives the optimizer and the acceptance
/// batch. Recomputation is always an explicit call.
#[derive(Clone)]
pub struct EarningsService {
    db: DbPool,
    settings: Arc<SettingsService>,
    acceptance: Arc<AcceptanceService>,
}

impl EarningsService {
    pub fn new(
        db: DbPool,
        settings: Arc<SettingsService>,
        acceptance: Arc<AcceptanceService>,
    ) -> Self {
        Self {
            db,
            settings,
            acceptance,
        }
    }

    pub fn register_host(&self, name: &str, profile: &HostEarningsProfile) -> AppResult<()> {
        profile.validate()?;
        let row = HostRow {
            id: profile.host_id.clone(),
            name: name.to_string(),
            rate_per_student_per_night: profile.rate_per_student_per_night,
            capacity: i64::from(profile.capacity),
        };

        self.db.with_transaction(|tx| {
            HostRepository::upsert(tx, &row)?;
            HostRepository::replace_bonuses(tx, &profile.host_id, &profile.location_bonuses)?;
            Ok(())
        })?;

        info!(
            target: "app::earnings",
            host_id = %profile.host_id,
            bonuses = profile.location_bonuses.len(),
            "host earnings profile saved"
        );
        Ok(())
    }

    pub fn load_profile(&self, host_id: &str) -> AppResult<HostEarningsProfile> {
        self.db
            .with_connection(|conn| HostRepository::load_profile(conn, host_id))?
            .ok_or_else(AppError::not_found)
    }

    /// Stores booking records supplied by the surrounding data layer. The
    /// whole batch is rejected when any stay is invalid.
    pub fn import_bookings(&self, bookings: &[Booking]) -> AppResult<usize> {
        validate_spans(bookings)?;
        let rows = bookings
            .iter()
            .map(BookingRow::from_record)
            .collect::<AppResult<Vec<_>>>()?;

        self.db.with_transaction(|tx| {
            for row in &rows {
                BookingRepository::upsert(tx, row)?;
            }
            Ok(())
        })?;

        debug!(target: "app::earnings", count = rows.len(), "bookings imported");
        Ok(rows.len())
    }

    pub fn recommend(
        &self,
        host_id: &str,
        location_filter: Option<&str>,
    ) -> AppResult<OptimizationResult> {
        let profile = self.load_profile(host_id)?;
        let mode = self.settings.get()?.bonus_match_mode;

        let (candidates, committed) = self.db.with_connection(|conn| {
            let candidates = BookingRepository::list_candidates_for_host(conn, host_id)?
                .into_iter()
                .map(|row| row.into_record(BookingStatus::Candidate))
                .collect::<AppResult<Vec<_>>>()?;
            let committed = BookingRepository::list_committed_for_host(conn, host_id)?
                .into_iter()
                .map(|row| row.into_record(BookingStatus::Committed))
                .collect::<AppResult<Vec<_>>>()?;
            Ok((candidates, committed))
        })?;

        let candidates = match location_filter.map(str::trim).filter(|value| !value.is_empty()) {
            Some(filter) => {
                let needle = filter.to_lowercase();
                candidates
                    .into_iter()
                    .filter(|booking| booking.location.to_lowercase().contains(&needle))
                    .collect()
            }
            None => candidates,
        };

        EarningsOptimizer::new(mode).plan(&candidates, &committed, &profile)
    }

    pub fn accept_recommended(
        &self,
        host_id: &str,
        location_filter: Option<&str>,
    ) -> AppResult<AcceptedRecommendation> {
        let recommendation = self.recommend(host_id, location_filter)?;
        let report = self
            .acceptance
            .accept_all(&recommendation.selected_bookings(), host_id)?;

        Ok(AcceptedRecommendation {
            recommendation,
            report,
        })
    }
}
