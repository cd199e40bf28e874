use std::sync::RwLock;

use chrono::Utc;
use tracing::{info, warn};

use crate::db::repositories::settings_repository::{SettingKey, SettingsRepository};
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::assignment::AcceptanceMode;
use crate::models::host::BonusMatchMode;
use crate::models::settings::EngineSettings;

#[derive(Debug, Default, Clone)]
pub struct SettingsUpdateInput {
    pub bonus_match_mode: Option<BonusMatchMode>,
    pub acceptance_mode: Option<AcceptanceMode>,
}

pub struct SettingsService {
    db: DbPool,
    cache: RwLock<Option<EngineSettings>>,
}

impl SettingsService {
    pub fn new(db: DbPool) -> Self {
        Self {
            db,
            cache: RwLock::new(None),
        }
    }

    pub fn get(&self) -> AppResult<EngineSettings> {
        if let Ok(guard) = self.cache.read() {
            if let Some(settings) = guard.as_ref() {
                return Ok(settings.clone());
            }
        }

        let settings = self.load_settings_from_db()?;
        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(settings.clone());
        }
        Ok(settings)
    }

    pub fn update(&self, input: SettingsUpdateInput) -> AppResult<EngineSettings> {
        let mut current = self.get()?;
        let now = Utc::now().to_rfc3339();

        let mut changes = Vec::with_capacity(SettingKey::ALL.len());
        if let Some(mode) = input.bonus_match_mode {
            changes.push((SettingKey::BonusMatchMode, mode.as_str()));
        }
        if let Some(mode) = input.acceptance_mode {
            changes.push((SettingKey::AcceptanceMode, mode.as_str()));
        }
        self.db
            .with_connection(|conn| SettingsRepository::put_many(conn, &changes, &now))?;

        if let Some(mode) = input.bonus_match_mode {
            if mode != current.bonus_match_mode {
                info!(target: "app::settings", from = %current.bonus_match_mode, to = %mode, "bonus match mode changed");
            }
            current.bonus_match_mode = mode;
        }
        if let Some(mode) = input.acceptance_mode {
            if mode != current.acceptance_mode {
                info!(target: "app::settings", from = %current.acceptance_mode, to = %mode, "acceptance mode changed");
            }
            current.acceptance_mode = mode;
        }
        current.updated_at = now;

        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(current.clone());
        }

        Ok(current)
    }

    /// Drops stored overrides and returns to the built-in defaults.
    pub fn reset(&self) -> AppResult<EngineSettings> {
        let removed = self
            .db
            .with_connection(|conn| SettingsRepository::clear(conn, &SettingKey::ALL))?;
        info!(target: "app::settings", removed, "engine settings reset to defaults");

        if let Ok(mut guard) = self.cache.write() {
            *guard = None;
        }
        self.get()
    }

    fn load_settings_from_db(&self) -> AppResult<EngineSettings> {
        let (rows, latest_update) = self.db.with_connection(|conn| {
            Ok((
                SettingsRepository::list_known(conn)?,
                SettingsRepository::latest_update(conn)?,
            ))
        })?;

        let mut settings = EngineSettings {
            bonus_match_mode: BonusMatchMode::default(),
            acceptance_mode: AcceptanceMode::default(),
            updated_at: latest_update.unwrap_or_else(|| Utc::now().to_rfc3339()),
        };

        for row in rows {
            match row.key {
                SettingKey::BonusMatchMode => match row.value.parse() {
                    Ok(mode) => settings.bonus_match_mode = mode,
                    Err(err) => warn!(
                        target: "app::settings",
                        key = row.key.as_str(),
                        error = %err,
                        "stored bonus match mode invalid, using default"
                    ),
                },
                SettingKey::AcceptanceMode => match row.value.parse() {
                    Ok(mode) => settings.acceptance_mode = mode,
                    Err(err) => warn!(
                        target: "app::settings",
                        key = row.key.as_str(),
                        error = %err,
                        "stored acceptance mode invalid, using default"
                    ),
                },
            }
        }

        Ok(settings)
    }
}
