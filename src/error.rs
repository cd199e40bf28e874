use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{error, warn};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {message}")]
    Database { message: String },

    #[error("record not found")]
    NotFound,

    #[error("record conflict: {message}")]
    Conflict { message: String },

    #[error("validation failed: {message}")]
    Validation {
        message: String,
        details: Option<JsonValue>,
    },

    #[error("booking {booking_id} has an invalid stay: departure {departure} must be after arrival {arrival}")]
    InvalidSpan {
        booking_id: String,
        arrival: String,
        departure: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, "validation error");
        AppError::Validation {
            message,
            details: None,
        }
    }

    pub fn validation_with_details(message: impl Into<String>, details: JsonValue) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, details = %details, "validation error with details");
        AppError::Validation {
            message,
            details: Some(details),
        }
    }

    pub fn invalid_span(
        booking_id: impl Into<String>,
        arrival: impl ToString,
        departure: impl ToString,
    ) -> Self {
        let booking_id = booking_id.into();
        let arrival = arrival.to_string();
        let departure = departure.to_string();
        warn!(
            target: "app::validation",
            %booking_id,
            %arrival,
            %departure,
            "rejected booking with invalid span"
        );
        AppError::InvalidSpan {
            booking_id,
            arrival,
            departure,
        }
    }

    pub fn not_found() -> Self {
        AppError::NotFound
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::database", %message, "record conflict");
        AppError::Conflict { message }
    }

    pub fn database(message: impl Into<String>) -> Self {
        AppError::Database {
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app", %message, "unexpected error");
        AppError::Other(message)
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::Validation { .. } | AppError::InvalidSpan { .. }
        )
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(error: rusqlite::Error) -> Self {
        use rusqlite::Error::{QueryReturnedNoRows, SqliteFailure};
        use rusqlite::ErrorCode;

        match &error {
            QueryReturnedNoRows => AppError::not_found(),
            SqliteFailure(err, detail) if err.code == ErrorCode::ConstraintViolation => {
                AppError::conflict(
                    detail
                        .clone()
                        .unwrap_or_else(|| "unique or foreign key constraint violated".to_string()),
                )
            }
            _ => {
                error!(target: "app::database", error = ?error, "sqlite error");
                AppError::database(error.to_string())
            }
        }
    }
}
