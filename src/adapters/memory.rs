use crate::core::{
    Collection, EntityPage, EntityRecord, OrganizationService, QueryExpression, RecordId,
};
use crate::domain::model::{resolve_binding, ODATA_BIND_SUFFIX};
use crate::utils::error::{CrmError, Result};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct StoredRecord {
    id: RecordId,
    attributes: Map<String, Value>,
}

/// In-process organization service: records per collection, in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryService {
    collections: Mutex<HashMap<&'static str, Vec<StoredRecord>>>,
}

impl InMemoryService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self, collection: Collection) -> usize {
        self.collections
            .lock()
            .await
            .get(collection.logical_name)
            .map_or(0, Vec::len)
    }

    /// 把 `x@odata.bind` 轉成讀取端的 `_x_value`，並蓋上 modifiedon
    fn normalize(attributes: &Map<String, Value>) -> Result<Map<String, Value>> {
        let mut normalized = Map::with_capacity(attributes.len() + 1);
        for (key, value) in attributes {
            if key.ends_with(ODATA_BIND_SUFFIX) {
                let (attribute, id) = resolve_binding(key, value).ok_or_else(|| {
                    CrmError::ServiceError {
                        status: 400,
                        code: None,
                        message: format!("Invalid lookup binding {} = {}", key, value),
                    }
                })?;
                normalized.insert(attribute, Value::String(id.to_string()));
            } else {
                normalized.insert(key.clone(), value.clone());
            }
        }
        normalized.insert(
            "modifiedon".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        Ok(normalized)
    }

    fn project(record: &StoredRecord, query: &QueryExpression) -> EntityRecord {
        let attributes = if query.columns.is_empty() {
            record.attributes.clone()
        } else {
            query
                .columns
                .iter()
                .filter_map(|column| {
                    record
                        .attributes
                        .get(column)
                        .map(|value| (column.clone(), value.clone()))
                })
                .collect()
        };
        EntityRecord {
            collection: query.collection,
            id: Some(record.id),
            attributes,
        }
    }

    fn not_found(collection: Collection, id: RecordId) -> CrmError {
        CrmError::NotFound {
            collection: collection.logical_name.to_string(),
            id: id.to_string(),
        }
    }
}

#[async_trait]
impl OrganizationService for InMemoryService {
    async fn create(&self, record: &EntityRecord) -> Result<RecordId> {
        let id = match record.id {
            Some(id) if !id.is_empty() => id,
            _ => RecordId::new_v4(),
        };
        let attributes = Self::normalize(&record.attributes)?;

        let mut collections = self.collections.lock().await;
        let records = collections.entry(record.collection.logical_name).or_default();
        if records.iter().any(|r| r.id == id) {
            return Err(CrmError::ServiceError {
                status: 412,
                code: None,
                message: format!("A record with id {} already exists", id),
            });
        }
        records.push(StoredRecord { id, attributes });
        tracing::debug!("🧠 memory: stored {}({})", record.collection, id);
        Ok(id)
    }

    async fn retrieve_multiple(&self, query: &QueryExpression) -> Result<EntityPage> {
        let collections = self.collections.lock().await;
        let records = collections
            .get(query.collection.logical_name)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let page_size = query.page_info.count.max(1) as usize;
        let start = (query.page_info.page_number.max(1) as usize - 1) * page_size;
        let end = (start + page_size).min(records.len());

        let entities = records
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|record| Self::project(record, query))
            .collect();

        Ok(EntityPage {
            entities,
            more_records: end < records.len(),
            paging_cookie: None,
        })
    }

    async fn update(&self, record: &EntityRecord) -> Result<()> {
        let id = record.id.ok_or_else(|| CrmError::ServiceError {
            status: 400,
            code: None,
            message: format!("{} update without an id", record.collection),
        })?;
        let changes = Self::normalize(&record.attributes)?;

        let mut collections = self.collections.lock().await;
        let stored = collections
            .get_mut(record.collection.logical_name)
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| Self::not_found(record.collection, id))?;

        // 部分更新：只覆蓋送來的欄位
        stored.attributes.extend(changes);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: RecordId) -> Result<()> {
        let mut collections = self.collections.lock().await;
        let records = collections
            .get_mut(collection.logical_name)
            .ok_or_else(|| Self::not_found(collection, id))?;
        let position = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| Self::not_found(collection, id))?;
        records.remove(position);
        Ok(())
    }
}
