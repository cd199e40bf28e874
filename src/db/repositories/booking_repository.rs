use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::booking::{Booking, BookingStatus};
use crate::services::span_utils;

const BOOKING_COLUMNS: &str = "b.id AS id, b.reference AS reference, \
     b.arrival_date AS arrival_date, b.departure_date AS departure_date, \
     b.location AS location, b.country AS country, b.student_count AS student_count";

#[derive(Debug, Clone)]
pub struct BookingRow {
    pub id: String,
    pub reference: String,
    pub arrival_date: String,
    pub departure_date: String,
    pub location: String,
    pub country: Option<String>,
    pub student_count: i64,
}

impl BookingRow {
    pub fn from_record(record: &Booking) -> AppResult<Self> {
        record.validate_span()?;
        Ok(Self {
            id: record.id.clone(),
            reference: record.reference.clone(),
            arrival_date: span_utils::format_date(record.arrival),
            departure_date: span_utils::format_date(record.departure),
            location: record.location.clone(),
            country: record.country.clone(),
            student_count: i64::from(record.student_count),
        })
    }

    pub fn into_record(self, status: BookingStatus) -> AppResult<Booking> {
        let student_count = u32::try_from(self.student_count).map_err(|_| {
            AppError::validation(format!(
                "booking {} has an invalid student count {}",
                self.id, self.student_count
            ))
        })?;

        Ok(Booking {
            arrival: span_utils::parse_date(&self.arrival_date)?,
            departure: span_utils::parse_date(&self.departure_date)?,
            id: self.id,
            reference: self.reference,
            location: self.location,
            country: self.country,
            student_count,
            status,
        })
    }
}

impl TryFrom<&Row<'_>> for BookingRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            reference: row.get("reference")?,
            arrival_date: row.get("arrival_date")?,
            departure_date: row.get("departure_date")?,
            location: row.get("location")?,
            country: row.get("country")?,
            student_count: row.get("student_count")?,
        })
    }
}

pub struct BookingRepository;

impl BookingRepository {
    pub fn upsert(conn: &Connection, row: &BookingRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO bookings (
                    id,
                    reference,
                    arrival_date,
                    departure_date,
                    location,
                    country,
                    student_count
                ) VALUES (
                    :id,
                    :reference,
                    :arrival_date,
                    :departure_date,
                    :location,
                    :country,
                    :student_count
                )
                ON CONFLICT(id) DO UPDATE SET
                    reference = excluded.reference,
                    arrival_date = excluded.arrival_date,
                    departure_date = excluded.departure_date,
                    location = excluded.location,
                    country = excluded.country,
                    student_count = excluded.student_count
            "#,
            named_params! {
                ":id": &row.id,
                ":reference": &row.reference,
                ":arrival_date": &row.arrival_date,
                ":departure_date": &row.departure_date,
                ":location": &row.location,
                ":country": &row.country,
                ":student_count": row.student_count,
            },
        )?;

        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<BookingRow>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = ?1");
        let mut stmt = conn.prepare(&sql)?;
        let row = stmt
            .query_row([id], |row| BookingRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    /// Bookings nobody has accepted yet and this host has not declined.
    pub fn list_candidates_for_host(conn: &Connection, host_id: &str) -> AppResult<Vec<BookingRow>> {
        let sql = format!(
            r#"
                SELECT {BOOKING_COLUMNS}
                FROM bookings b
                WHERE NOT EXISTS (
                    SELECT 1 FROM host_assignments a
                    WHERE a.booking_id = b.id
                      AND (a.response = 'accepted'
                           OR (a.host_id = :host_id AND a.response = 'declined'))
                )
                ORDER BY b.arrival_date ASC, b.id ASC
            "#
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(named_params! {":host_id": host_id}, |row| {
                BookingRow::try_from(row)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_committed_for_host(conn: &Connection, host_id: &str) -> AppResult<Vec<BookingRow>> {
        let sql = format!(
            r#"
                SELECT {BOOKING_COLUMNS}
                FROM bookings b
                INNER JOIN host_assignments a ON a.booking_id = b.id
                WHERE a.host_id = :host_id AND a.response = 'accepted'
                ORDER BY b.arrival_date ASC, b.id ASC
            "#
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(named_params! {":host_id": host_id}, |row| {
                BookingRow::try_from(row)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn delete(conn: &Connection, id: &str) -> AppResult<()> {
        let affected = conn.execute("DELETE FROM bookings WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(AppError::not_found());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbPool;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn record(id: &str, arrival: u32, departure: u32) -> Booking {
        Booking {
            id: id.to_string(),
            reference: format!("HS-{id}"),
            arrival: NaiveDate::from_ymd_opt(2024, 9, arrival).expect("arrival"),
            departure: NaiveDate::from_ymd_opt(2024, 9, departure).expect("departure"),
            location: "Harpenden".to_string(),
            country: None,
            student_count: 3,
            status: BookingStatus::Candidate,
        }
    }

    #[test]
    fn upsert_find_and_delete() -> AppResult<()> {
        let dir = tempdir()?;
        let pool = DbPool::new(dir.path().join("bookings.sqlite"))?;

        pool.with_connection(|conn| {
            BookingRepository::upsert(conn, &BookingRow::from_record(&record("b1", 2, 6))?)?;
            // Same id again replaces the stored dates.
            BookingRepository::upsert(conn, &BookingRow::from_record(&record("b1", 3, 7))?)?;

            let stored = BookingRepository::find_by_id(conn, "b1")?
                .ok_or_else(AppError::not_found)?
                .into_record(BookingStatus::Candidate)?;
            assert_eq!(stored, record("b1", 3, 7));

            let candidates = BookingRepository::list_candidates_for_host(conn, "anyone")?;
            assert_eq!(candidates.len(), 1);

            BookingRepository::delete(conn, "b1")?;
            assert!(BookingRepository::find_by_id(conn, "b1")?.is_none());
            assert!(matches!(
                BookingRepository::delete(conn, "b1"),
                Err(AppError::NotFound)
            ));
            Ok(())
        })
    }

    #[test]
    fn from_record_rejects_reversed_stays() {
        let result = BookingRow::from_record(&record("bad", 8, 4));
        assert!(matches!(result, Err(AppError::InvalidSpan { .. })));
    }
}
