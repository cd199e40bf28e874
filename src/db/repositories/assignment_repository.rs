use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::assignment::{AssignmentRecord, HostResponse};

const ASSIGNMENT_COLUMNS: &str =
    "id, host_id, booking_id, response, responded_at, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct AssignmentRow {
    pub id: String,
    pub host_id: String,
    pub booking_id: String,
    pub response: String,
    pub responded_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl AssignmentRow {
    pub fn from_record(record: &AssignmentRecord) -> Self {
        Self {
            id: record.id.clone(),
            host_id: record.host_id.clone(),
            booking_id: record.booking_id.clone(),
            response: record.response.as_str().to_string(),
            responded_at: record.responded_at.clone(),
            created_at: record.created_at.clone(),
            updated_at: record.updated_at.clone(),
        }
    }

    pub fn into_record(self) -> AppResult<AssignmentRecord> {
        Ok(AssignmentRecord {
            response: self.response.parse()?,
            id: self.id,
            host_id: self.host_id,
            booking_id: self.booking_id,
            responded_at: self.responded_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TryFrom<&Row<'_>> for AssignmentRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            host_id: row.get("host_id")?,
            booking_id: row.get("booking_id")?,
            response: row.get("response")?,
            responded_at: row.get("responded_at")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub struct AssignmentRepository;

impl AssignmentRepository {
    pub fn find_for_booking(
        conn: &Connection,
        host_id: &str,
        booking_id: &str,
    ) -> AppResult<Option<AssignmentRow>> {
        let sql = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM host_assignments WHERE host_id = ?1 AND booking_id = ?2"
        );
        let mut stmt = conn.prepare(&sql)?;
        let row = stmt
            .query_row([host_id, booking_id], |row| AssignmentRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    /// Accepted assignment for `booking_id` held by a host other than `host_id`.
    pub fn find_accepted_by_other_host(
        conn: &Connection,
        host_id: &str,
        booking_id: &str,
    ) -> AppResult<Option<AssignmentRow>> {
        let sql = format!(
            r#"
                SELECT {ASSIGNMENT_COLUMNS}
                FROM host_assignments
                WHERE booking_id = :booking_id
                  AND host_id <> :host_id
                  AND response = 'accepted'
                ORDER BY updated_at ASC
                LIMIT 1
            "#
        );
        let mut stmt = conn.prepare(&sql)?;
        let row = stmt
            .query_row(
                named_params! {":booking_id": booking_id, ":host_id": host_id},
                |row| AssignmentRow::try_from(row),
            )
            .optional()?;
        Ok(row)
    }

    pub fn insert(conn: &Connection, row: &AssignmentRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO host_assignments (
                    id,
                    host_id,
                    booking_id,
                    response,
                    responded_at,
                    created_at,
                    updated_at
                ) VALUES (
                    :id,
                    :host_id,
                    :booking_id,
                    :response,
                    :responded_at,
                    :created_at,
                    :updated_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":host_id": &row.host_id,
                ":booking_id": &row.booking_id,
                ":response": &row.response,
                ":responded_at": &row.responded_at,
                ":created_at": &row.created_at,
                ":updated_at": &row.updated_at,
            },
        )?;

        Ok(())
    }

    pub fn update_response(
        conn: &Connection,
        id: &str,
        response: HostResponse,
        responded_at: &str,
    ) -> AppResult<()> {
        let affected = conn.execute(
            r#"
                UPDATE host_assignments SET
                    response = :response,
                    responded_at = :responded_at,
                    updated_at = :responded_at
                WHERE id = :id
            "#,
            named_params! {
                ":id": id,
                ":response": response.as_str(),
                ":responded_at": responded_at,
            },
        )?;

        if affected == 0 {
            return Err(AppError::not_found());
        }

        Ok(())
    }

    pub fn list_for_host(conn: &Connection, host_id: &str) -> AppResult<Vec<AssignmentRow>> {
        let sql = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM host_assignments WHERE host_id = ?1 ORDER BY created_at ASC, id ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([host_id], |row| AssignmentRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
