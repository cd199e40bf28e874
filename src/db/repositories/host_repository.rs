use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::host::{HostEarningsProfile, LocationBonus};

#[derive(Debug, Clone)]
pub struct HostRow {
    pub id: String,
    pub name: String,
    pub rate_per_student_per_night: f64,
    pub capacity: i64,
}

impl TryFrom<&Row<'_>> for HostRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            rate_per_student_per_night: row.get("rate_per_student_per_night")?,
            capacity: row.get("capacity")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct LocationBonusRow {
    pub location_name: String,
    pub bonus_per_night: f64,
}

impl TryFrom<&Row<'_>> for LocationBonusRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            location_name: row.get("location_name")?,
            bonus_per_night: row.get("bonus_per_night")?,
        })
    }
}

pub struct HostRepository;

impl HostRepository {
    pub fn upsert(conn: &Connection, row: &HostRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO hosts (id, name, rate_per_student_per_night, capacity)
                VALUES (:id, :name, :rate, :capacity)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    rate_per_student_per_night = excluded.rate_per_student_per_night,
                    capacity = excluded.capacity,
                    updated_at = CURRENT_TIMESTAMP
            "#,
            named_params! {
                ":id": &row.id,
                ":name": &row.name,
                ":rate": row.rate_per_student_per_night,
                ":capacity": row.capacity,
            },
        )?;

        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<HostRow>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, rate_per_student_per_night, capacity FROM hosts WHERE id = ?1",
        )?;
        let row = stmt
            .query_row([id], |row| HostRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    /// Replaces the host's bonus list, keeping the given order.
    pub fn replace_bonuses(
        conn: &Connection,
        host_id: &str,
        bonuses: &[LocationBonus],
    ) -> AppResult<()> {
        conn.execute("DELETE FROM location_bonuses WHERE host_id = ?1", [host_id])?;

        let mut stmt = conn.prepare(
            r#"
                INSERT INTO location_bonuses (host_id, location_name, bonus_per_night, position)
                VALUES (:host_id, :location_name, :bonus_per_night, :position)
            "#,
        )?;
        for (position, bonus) in bonuses.iter().enumerate() {
            stmt.execute(named_params! {
                ":host_id": host_id,
                ":location_name": bonus.location_name.trim(),
                ":bonus_per_night": bonus.bonus_per_night,
                ":position": position as i64,
            })?;
        }

        Ok(())
    }

    pub fn list_bonuses(conn: &Connection, host_id: &str) -> AppResult<Vec<LocationBonusRow>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT location_name, bonus_per_night
                FROM location_bonuses
                WHERE host_id = ?1
                ORDER BY position ASC, id ASC
            "#,
        )?;
        let rows = stmt
            .query_map([host_id], |row| LocationBonusRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn load_profile(conn: &Connection, host_id: &str) -> AppResult<Option<HostEarningsProfile>> {
        let Some(host) = Self::find_by_id(conn, host_id)? else {
            return Ok(None);
        };

        let capacity = u32::try_from(host.capacity).map_err(|_| {
            AppError::validation(format!(
                "host {} has an invalid capacity {}",
                host.id, host.capacity
            ))
        })?;

        let location_bonuses = Self::list_bonuses(conn, host_id)?
            .into_iter()
            .map(|row| LocationBonus::new(row.location_name, row.bonus_per_night))
            .collect();

        Ok(Some(HostEarningsProfile {
            host_id: host.id,
            rate_per_student_per_night: host.rate_per_student_per_night,
            capacity,
            location_bonuses,
        }))
    }
}
