use crate::core::{Entity, OrganizationService, QueryExpression, RecordId};
use crate::utils::error::{CrmError, Result};
use crate::utils::validation::require_id;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// Generic CRUD access to the collection of `T`, delegating to an organization service.
///
/// The gateway keeps no state between calls besides the service handle and page size.
pub struct RecordGateway<T, S> {
    service: Arc<S>,
    page_size: u32,
    _entity: PhantomData<fn() -> T>,
}

impl<T, S> Clone for RecordGateway<T, S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            page_size: self.page_size,
            _entity: PhantomData,
        }
    }
}

impl<T: Entity, S: OrganizationService> RecordGateway<T, S> {
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            page_size: DEFAULT_PAGE_SIZE,
            _entity: PhantomData,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub async fn create(&self, record: &T) -> Result<RecordId> {
        let entity = record.to_entity_record()?;
        let id = self.service.create(&entity).await?;
        tracing::debug!("➕ Created {}({})", T::COLLECTION, id);
        Ok(id)
    }

    /// 逐頁讀取整個集合；任何一頁失敗就整體失敗，已讀到的部分結果直接丟棄
    pub async fn read_all(&self) -> Result<Vec<T>> {
        let mut query =
            QueryExpression::new(T::COLLECTION, self.page_size).with_columns(T::COLUMNS);
        let mut records = Vec::new();
        let mut seen_cookies = HashSet::new();

        loop {
            let page = self.service.retrieve_multiple(&query).await?;
            tracing::debug!(
                "📄 {} page {}: {} records (more: {})",
                T::COLLECTION,
                query.page_info.page_number,
                page.entities.len(),
                page.more_records
            );

            if page.more_records && page.entities.is_empty() && page.paging_cookie.is_none() {
                return Err(CrmError::malformed(format!(
                    "{} page {} reported more records but returned none",
                    T::COLLECTION,
                    query.page_info.page_number
                )));
            }

            // 重複的 cookie 代表服務端在原地打轉
            if let (true, Some(cookie)) = (page.more_records, &page.paging_cookie) {
                if !seen_cookies.insert(cookie.clone()) {
                    return Err(CrmError::malformed(format!(
                        "{} page {} repeated an earlier paging cookie",
                        T::COLLECTION,
                        query.page_info.page_number
                    )));
                }
            }

            for entity in page.entities {
                records.push(T::from_entity_record(entity)?);
            }

            if !page.more_records {
                break;
            }
            query.page_info.advance(page.paging_cookie);
        }

        tracing::debug!("📚 Retrieved {} {} records", records.len(), T::COLLECTION);
        Ok(records)
    }

    pub async fn update(&self, record: &T) -> Result<()> {
        let id = require_id(T::COLLECTION.primary_id, record.id())?;
        let mut entity = record.to_entity_record()?;
        entity.id = Some(id);
        self.service.update(&entity).await?;
        tracing::debug!("✏️ Updated {}({})", T::COLLECTION, id);
        Ok(())
    }

    pub async fn delete(&self, id: RecordId) -> Result<()> {
        let id = require_id(T::COLLECTION.primary_id, Some(id))?;
        self.service.delete(T::COLLECTION, id).await?;
        tracing::debug!("🗑️ Deleted {}({})", T::COLLECTION, id);
        Ok(())
    }
}
