use crate::domain::model::{Collection, EntityRecord, RecordId};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 分頁游標：頁碼、每頁筆數，以及服務回傳的 paging cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagingInfo {
    pub page_number: u32,
    pub count: u32,
    pub paging_cookie: Option<String>,
}

impl PagingInfo {
    pub fn first_page(count: u32) -> Self {
        Self {
            page_number: 1,
            count: count.max(1),
            paging_cookie: None,
        }
    }

    pub fn advance(&mut self, paging_cookie: Option<String>) {
        self.page_number += 1;
        self.paging_cookie = paging_cookie;
    }
}

/// Bulk retrieval request against one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryExpression {
    pub collection: Collection,
    /// Empty means all columns
    pub columns: Vec<String>,
    pub page_info: PagingInfo,
}

impl QueryExpression {
    pub fn new(collection: Collection, page_size: u32) -> Self {
        Self {
            collection,
            columns: Vec::new(),
            page_info: PagingInfo::first_page(page_size),
        }
    }

    pub fn with_columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct EntityPage {
    pub entities: Vec<EntityRecord>,
    pub more_records: bool,
    pub paging_cookie: Option<String>,
}

/// The external organization service every gateway call delegates to.
#[async_trait]
pub trait OrganizationService: Send + Sync {
    async fn create(&self, record: &EntityRecord) -> Result<RecordId>;
    async fn retrieve_multiple(&self, query: &QueryExpression) -> Result<EntityPage>;
    async fn update(&self, record: &EntityRecord) -> Result<()>;
    async fn delete(&self, collection: Collection, id: RecordId) -> Result<()>;
}
