use anyhow::{Context, Result};
use std::time::Instant;

use super::agendor_api_client::DealSource;
use super::processors::deal;
use crate::domain::a025_crm_deal::MasterTable;

/// Загрузка мастер-таблицы: полный обход Agendor + нормализация.
///
/// Runs exactly once at startup; any error here is fatal for the process.
pub async fn load_master_table(source: &dyn DealSource) -> Result<MasterTable> {
    let started = Instant::now();

    let raw_deals = source
        .fetch_all()
        .await
        .context("Failed to fetch deals from Agendor")?;
    let fetched = raw_deals.len();

    let master = deal::normalize(raw_deals).context("Failed to normalize Agendor deals")?;

    let in_progress = master.in_progress().count();
    let without_entity = master.rows().iter().filter(|r| r.entity_id.is_none()).count();
    tracing::info!(
        "Master table ready: {} deals ({} in progress, {} without person/organization) in {:?}",
        fetched,
        in_progress,
        without_entity,
        started.elapsed()
    );

    Ok(master)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::u508_import_from_agendor::TransportError;
    use async_trait::async_trait;
    use serde_json::json;

    struct StaticSource(Result<Vec<serde_json::Value>, u16>);

    #[async_trait]
    impl DealSource for StaticSource {
        async fn fetch_all(&self) -> Result<Vec<serde_json::Value>, TransportError> {
            match &self.0 {
                Ok(deals) => Ok(deals.clone()),
                Err(status) => Err(TransportError::Status {
                    url: "http://agendor.test/v3/deals".to_string(),
                    status: *status,
                    body: String::new(),
                }),
            }
        }
    }

    fn raw_deal(person_id: i64, status: &str) -> serde_json::Value {
        json!({
            "dealStage": {
                "name": "CONTATO",
                "sequence": 1,
                "funnel": { "name": "01 PARCEIROS" }
            },
            "dealStatus": { "name": status },
            "person": { "id": person_id },
            "createdAt": "2024-05-01T12:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_loads_and_normalizes() {
        let source = StaticSource(Ok(vec![raw_deal(1, "Em andamento"), raw_deal(2, "Ganho")]));
        let master = load_master_table(&source).await.unwrap();

        assert_eq!(master.len(), 2);
        assert_eq!(master.in_progress().count(), 1);
        assert_eq!(master.rows()[0].stage_name, "PARCEIROS");
    }

    #[tokio::test]
    async fn test_empty_source_gives_empty_table() {
        let master = load_master_table(&StaticSource(Ok(Vec::new()))).await.unwrap();
        assert!(master.is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_is_fatal() {
        let err = load_master_table(&StaticSource(Err(401))).await.unwrap_err();
        assert!(err.downcast_ref::<TransportError>().is_some());
    }

    #[tokio::test]
    async fn test_schema_error_is_fatal() {
        let mut broken = raw_deal(3, "Em andamento");
        broken["dealStatus"] = json!({ "name": "Arquivado" });
        let err = load_master_table(&StaticSource(Ok(vec![raw_deal(1, "Ganho"), broken])))
            .await
            .unwrap_err();

        let schema = err.downcast_ref::<deal::SchemaError>().unwrap();
        assert_eq!(schema.index, 1);
    }
}
