use serde::{Deserialize, Serialize};

use crate::models::assignment::AcceptanceMode;
use crate::models::host::BonusMatchMode;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    pub bonus_match_mode: BonusMatchMode,
    pub acceptance_mode: AcceptanceMode,
    pub updated_at: String,
}
