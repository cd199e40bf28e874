//! Earnings optimization for homestay hosts: prices candidate bookings,
//! keeps already accepted stays fixed, picks the highest-earning set of
//! non-overlapping bookings and commits a host's selection.

pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{AppError, AppResult};
pub use models::booking::{Booking, BookingStatus, Span};
pub use models::earnings::{OptimizationResult, ResolvedEarnings, ScoredBooking};
pub use models::host::{BonusMatchMode, HostEarningsProfile, LocationBonus};
pub use services::earnings_optimizer::{optimize, plan_earnings, EarningsOptimizer};
