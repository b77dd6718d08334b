use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier of the client a deal is attached to (Agendor person or organization id)
pub type EntityId = i64;

/// Kind of client behind `DealRow::entity_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Person,
    Organization,
}

/// Deal status as reported by the CRM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    InProgress,
    Won,
    Lost,
}

impl StageStatus {
    /// Agendor numeric status id: 1 ongoing, 2 won, 3 lost
    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(StageStatus::InProgress),
            2 => Some(StageStatus::Won),
            3 => Some(StageStatus::Lost),
            _ => None,
        }
    }

    /// Parse a status label, Portuguese (as Agendor sends it) or English
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "em andamento" | "ongoing" | "in progress" | "in_progress" => {
                Some(StageStatus::InProgress)
            }
            "ganho" | "won" => Some(StageStatus::Won),
            "perdido" | "lost" => Some(StageStatus::Lost),
            _ => None,
        }
    }
}

/// One normalized deal (row of the master table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealRow {
    /// Person id when the deal has a person, otherwise the organization id
    pub entity_id: Option<EntityId>,
    /// Which identifier produced `entity_id`
    pub entity_type: EntityType,
    /// Fine-grained stage label, as received (e.g. "2.3 PROPOSTA" or "CONTATO")
    pub stage_detail: String,
    /// Funnel label with the leading numeric prefix removed
    pub stage_name: String,
    /// Ordinal of the stage inside its funnel
    pub stage_sequence: i64,
    pub stage_status: StageStatus,
    /// Status text exactly as the CRM sent it (e.g. "Em andamento")
    pub status_label: String,
    pub date_created: Option<NaiveDate>,
    pub date_won: Option<NaiveDate>,
    pub date_lost: Option<NaiveDate>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Only set for lost deals with a recorded reason
    pub loss_reason: Option<String>,
}

impl DealRow {
    pub fn is_in_progress(&self) -> bool {
        self.stage_status == StageStatus::InProgress
    }

    pub fn description_contains(&self, marker: &str) -> bool {
        self.description
            .as_deref()
            .map_or(false, |text| text.contains(marker))
    }
}
