use std::convert::TryFrom;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};

use crate::error::AppResult;

/// Engine-wide switches kept in `app_settings`. Rows with any other key are
/// left alone and never read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    BonusMatchMode,
    AcceptanceMode,
}

impl SettingKey {
    pub const ALL: [SettingKey; 2] = [SettingKey::BonusMatchMode, SettingKey::AcceptanceMode];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::BonusMatchMode => "bonus_match_mode",
            SettingKey::AcceptanceMode => "acceptance_mode",
        }
    }

    fn from_stored(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == value)
    }
}

impl ToSql for SettingKey {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for SettingKey {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        SettingKey::from_stored(value.as_str()?).ok_or(FromSqlError::InvalidType)
    }
}

#[derive(Debug, Clone)]
pub struct EngineSettingRow {
    pub key: SettingKey,
    pub value: String,
    pub updated_at: String,
}

impl TryFrom<&Row<'_>> for EngineSettingRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            key: row.get("key")?,
            value: row.get("value")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

// "?1, ?2" for the known keys, bound with `params_from_iter(SettingKey::ALL)`.
fn known_key_placeholders() -> String {
    (1..=SettingKey::ALL.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct SettingsRepository;

impl SettingsRepository {
    pub fn get(conn: &Connection, key: SettingKey) -> AppResult<Option<EngineSettingRow>> {
        let row = conn
            .query_row(
                "SELECT key, value, updated_at FROM app_settings WHERE key = ?1",
                [key],
                |row| EngineSettingRow::try_from(row),
            )
            .optional()?;

        Ok(row)
    }

    /// Stored engine settings only, in key order.
    pub fn list_known(conn: &Connection) -> AppResult<Vec<EngineSettingRow>> {
        let sql = format!(
            "SELECT key, value, updated_at FROM app_settings WHERE key IN ({}) ORDER BY key ASC",
            known_key_placeholders()
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt
            .query_map(params_from_iter(SettingKey::ALL), |row| {
                EngineSettingRow::try_from(row)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Most recent change across the engine settings, if any was ever stored.
    pub fn latest_update(conn: &Connection) -> AppResult<Option<String>> {
        let sql = format!(
            "SELECT MAX(updated_at) FROM app_settings WHERE key IN ({})",
            known_key_placeholders()
        );
        let latest = conn.query_row(&sql, params_from_iter(SettingKey::ALL), |row| {
            row.get::<_, Option<String>>(0)
        })?;

        Ok(latest)
    }

    /// Writes every pair with the same timestamp. Returns the number of rows written.
    pub fn put_many(
        conn: &Connection,
        values: &[(SettingKey, &str)],
        updated_at: &str,
    ) -> AppResult<usize> {
        let mut stmt = conn.prepare(
            r#"
                INSERT INTO app_settings (key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
            "#,
        )?;

        let mut written = 0;
        for (key, value) in values {
            written += stmt.execute((key, value, updated_at))?;
        }

        Ok(written)
    }

    pub fn clear(conn: &Connection, keys: &[SettingKey]) -> AppResult<usize> {
        let mut stmt = conn.prepare("DELETE FROM app_settings WHERE key = ?1")?;
        let mut removed = 0;
        for key in keys {
            removed += stmt.execute([key])?;
        }
        Ok(removed)
    }
}
