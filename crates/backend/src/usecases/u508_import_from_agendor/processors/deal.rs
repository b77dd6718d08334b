use chrono::{DateTime, NaiveDate, NaiveDateTime};
use contracts::domain::a025_crm_deal::{DealRow, EntityId, EntityType, StageStatus};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::a025_crm_deal::MasterTable;

/// A deal record whose shape the normalizer does not understand.
///
/// Fatal: it means the upstream contract changed, so the whole load fails
/// instead of silently dropping rows.
#[derive(Debug, Error)]
#[error("deal #{index}: {reason}")]
pub struct SchemaError {
    /// Position of the record in the fetched sequence
    pub index: usize,
    pub reason: String,
}

impl SchemaError {
    fn new(index: usize, reason: impl Into<String>) -> Self {
        Self {
            index,
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Typed shape of an Agendor v3 deal (only the fields the dashboard reads)
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDeal {
    pub deal_stage: RawDealStage,
    pub deal_status: RawDealStatus,
    #[serde(default)]
    pub person: Option<RawReference>,
    #[serde(default)]
    pub organization: Option<RawReference>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub won_at: Option<String>,
    #[serde(default)]
    pub lost_at: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub loss_reason: Option<RawLossReason>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDealStage {
    pub name: String,
    pub sequence: RawNumber,
    pub funnel: RawFunnel,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFunnel {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDealStatus {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
}

/// Linked person or organization; only the id matters here
#[derive(Debug, Clone, Deserialize)]
pub struct RawReference {
    #[serde(default)]
    pub id: Option<EntityId>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Int(i64),
    Text(String),
}

/// Agendor sends either a bare string or a `{ "id", "name" }` object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawLossReason {
    Text(String),
    Named {
        #[serde(default)]
        name: Option<String>,
    },
}

impl RawLossReason {
    fn label(&self) -> Option<&str> {
        let label = match self {
            RawLossReason::Text(text) => text.as_str(),
            RawLossReason::Named { name } => name.as_deref()?,
        };
        let label = label.trim();
        (!label.is_empty()).then_some(label)
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Build the master table from the raw records, in fetch order.
pub fn normalize(raw_deals: Vec<serde_json::Value>) -> Result<MasterTable, SchemaError> {
    let rows = raw_deals
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let raw: RawDeal = serde_json::from_value(value)
                .map_err(|e| SchemaError::new(index, e.to_string()))?;
            normalize_deal(index, raw)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MasterTable::new(rows))
}

/// Map one typed record to a `DealRow`
pub fn normalize_deal(index: usize, raw: RawDeal) -> Result<DealRow, SchemaError> {
    let person_id = raw.person.as_ref().and_then(|p| p.id);
    let organization_id = raw.organization.as_ref().and_then(|o| o.id);
    let (entity_id, entity_type) = resolve_entity(person_id, organization_id);

    let stage_sequence = match &raw.deal_stage.sequence {
        RawNumber::Int(n) => *n,
        RawNumber::Text(text) => text.trim().parse().map_err(|_| {
            SchemaError::new(index, format!("dealStage.sequence is not a number: '{}'", text))
        })?,
    };

    let stage_status = raw
        .deal_status
        .id
        .and_then(StageStatus::from_id)
        .or_else(|| StageStatus::from_label(&raw.deal_status.name))
        .ok_or_else(|| {
            SchemaError::new(
                index,
                format!("unknown dealStatus '{}'", raw.deal_status.name),
            )
        })?;

    let loss_reason = match stage_status {
        StageStatus::Lost => raw
            .loss_reason
            .as_ref()
            .and_then(RawLossReason::label)
            .map(str::to_string),
        _ => None,
    };

    Ok(DealRow {
        entity_id,
        entity_type,
        stage_detail: raw.deal_stage.name.trim().to_string(),
        stage_name: strip_funnel_prefix(&raw.deal_stage.funnel.name).to_string(),
        stage_sequence,
        stage_status,
        status_label: raw.deal_status.name.clone(),
        date_created: parse_date(index, "createdAt", raw.created_at.as_deref())?,
        date_won: parse_date(index, "wonAt", raw.won_at.as_deref())?,
        date_lost: parse_date(index, "lostAt", raw.lost_at.as_deref())?,
        title: raw.title,
        description: raw.description,
        loss_reason,
    })
}

/// Person id wins; the organization id is the fallback
pub fn resolve_entity(
    person_id: Option<EntityId>,
    organization_id: Option<EntityId>,
) -> (Option<EntityId>, EntityType) {
    match person_id {
        Some(id) => (Some(id), EntityType::Person),
        None => (organization_id, EntityType::Organization),
    }
}

/// "02 AMBULANTE ESSENCIAL" -> "AMBULANTE ESSENCIAL"
pub fn strip_funnel_prefix(name: &str) -> &str {
    let rest = name.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == name.len() {
        name
    } else {
        rest.trim_start()
    }
}

/// Calendar date of an API timestamp; the time of day is dropped
fn parse_date(
    index: usize,
    field: &str,
    value: Option<&str>,
) -> Result<Option<NaiveDate>, SchemaError> {
    let Some(text) = value.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(Some(dt.date_naive()));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Some(dt.date()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(Some(date));
    }

    Err(SchemaError::new(
        index,
        format!("{} is not a timestamp: '{}'", field, text),
    ))
}
