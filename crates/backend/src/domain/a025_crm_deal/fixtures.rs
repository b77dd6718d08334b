//! Hand-built deal rows for deriver and handler tests

use chrono::NaiveDate;
use contracts::domain::a025_crm_deal::{DealRow, EntityId, EntityType, StageStatus};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub struct DealBuilder {
    row: DealRow,
}

impl DealBuilder {
    pub fn new(entity_id: EntityId, stage_name: &str, stage_detail: &str) -> Self {
        Self {
            row: DealRow {
                entity_id: Some(entity_id),
                entity_type: EntityType::Person,
                stage_detail: stage_detail.to_string(),
                stage_name: stage_name.to_string(),
                stage_sequence: 1,
                stage_status: StageStatus::InProgress,
                status_label: "Em andamento".to_string(),
                date_created: None,
                date_won: None,
                date_lost: None,
                title: None,
                description: None,
                loss_reason: None,
            },
        }
    }

    pub fn no_entity(mut self) -> Self {
        self.row.entity_id = None;
        self.row.entity_type = EntityType::Organization;
        self
    }

    pub fn created(mut self, date: NaiveDate) -> Self {
        self.row.date_created = Some(date);
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.row.description = Some(text.to_string());
        self
    }

    pub fn won(mut self, date: NaiveDate) -> Self {
        self.row.stage_status = StageStatus::Won;
        self.row.status_label = "Ganho".to_string();
        self.row.date_won = Some(date);
        self
    }

    pub fn lost(mut self, date: NaiveDate, reason: Option<&str>) -> Self {
        self.row.stage_status = StageStatus::Lost;
        self.row.status_label = "Perdido".to_string();
        self.row.date_lost = Some(date);
        self.row.loss_reason = reason.map(str::to_string);
        self
    }

    pub fn build(self) -> DealRow {
        self.row
    }
}
