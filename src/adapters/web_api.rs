use crate::config::ConnectionConfig;
use crate::core::{
    Collection, EntityPage, EntityRecord, OrganizationService, QueryExpression, RecordId,
};
use crate::domain::model::parse_entity_reference;
use crate::utils::error::{CrmError, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, IF_MATCH};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use url::Url;

const ENTITY_ID_HEADER: &str = "OData-EntityId";

#[derive(Debug, Deserialize)]
struct ODataPage {
    #[serde(default)]
    value: Vec<Map<String, Value>>,
    #[serde(rename = "@odata.nextLink", default)]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ODataErrorBody {
    error: ODataError,
}

#[derive(Debug, Deserialize)]
struct ODataError {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

/// Organization service over the OData Web API.
#[derive(Debug, Clone)]
pub struct WebApiService {
    client: Client,
    base_url: Url,
    access_token: String,
}

impl WebApiService {
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("crm-console/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.web_api_base()?,
            access_token: config.access_token.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| CrmError::ConfigError {
            message: format!("Cannot build URL for '{}': {}", path, e),
        })
    }

    fn collection_url(&self, collection: Collection) -> Result<Url> {
        self.join(collection.entity_set)
    }

    fn record_url(&self, collection: Collection, id: RecordId) -> Result<Url> {
        self.join(&format!("{}({})", collection.entity_set, id))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::debug!("📡 {} {}", method, url);
        self.client
            .request(method, url)
            .bearer_auth(&self.access_token)
            .header(ACCEPT, "application/json")
            .header("OData-MaxVersion", "4.0")
            .header("OData-Version", "4.0")
    }

    /// 非 2xx 回應轉成 ServiceError，盡量帶上服務端的 code/message
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ODataErrorBody>(&body) {
            Ok(parsed) => (parsed.error.code, parsed.error.message),
            Err(_) if !body.trim().is_empty() => (None, body),
            Err(_) => (
                None,
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string(),
            ),
        };

        tracing::debug!("📡 service answered {}: {}", status, message);
        Err(CrmError::ServiceError {
            status: status.as_u16(),
            code,
            message,
        })
    }

    fn page_url(&self, query: &QueryExpression) -> Result<Url> {
        if let Some(next_link) = &query.page_info.paging_cookie {
            let url = Url::parse(next_link).map_err(|e| {
                CrmError::malformed(format!("Invalid next link '{}': {}", next_link, e))
            })?;
            // 只跟隨同源的 nextLink，token 不送往其他主機
            if url.origin() != self.base_url.origin() {
                return Err(CrmError::malformed(format!(
                    "Next link '{}' leaves the organization at {}",
                    next_link,
                    self.base_url.origin().ascii_serialization()
                )));
            }
            return Ok(url);
        }

        let mut url = self.collection_url(query.collection)?;
        if !query.columns.is_empty() {
            url.set_query(Some(&format!("$select={}", query.columns.join(","))));
        }
        Ok(url)
    }
}

#[async_trait]
impl OrganizationService for WebApiService {
    async fn create(&self, record: &EntityRecord) -> Result<RecordId> {
        let url = self.collection_url(record.collection)?;
        let response = self
            .request(Method::POST, url)
            .json(&record.attributes)
            .send()
            .await?;
        let response = Self::check(response).await?;

        if let Some(id) = response
            .headers()
            .get(ENTITY_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_entity_reference)
        {
            return Ok(id);
        }

        // return=representation 時 id 在 body 裡
        let body = response.text().await?;
        if !body.trim().is_empty() {
            if let Value::Object(attributes) = serde_json::from_str::<Value>(&body)? {
                if let Some(id) = EntityRecord::from_attributes(record.collection, attributes)?.id {
                    return Ok(id);
                }
            }
        }

        Err(CrmError::malformed(format!(
            "create on {} returned no {} header or id",
            record.collection, ENTITY_ID_HEADER
        )))
    }

    async fn retrieve_multiple(&self, query: &QueryExpression) -> Result<EntityPage> {
        let url = self.page_url(query)?;
        let response = self
            .request(Method::GET, url)
            .header(
                "Prefer",
                format!("odata.maxpagesize={}", query.page_info.count),
            )
            .send()
            .await?;
        let page: ODataPage = Self::check(response).await?.json().await?;

        let entities = page
            .value
            .into_iter()
            .map(|attributes| EntityRecord::from_attributes(query.collection, attributes))
            .collect::<Result<Vec<_>>>()?;

        Ok(EntityPage {
            entities,
            more_records: page.next_link.is_some(),
            paging_cookie: page.next_link,
        })
    }

    async fn update(&self, record: &EntityRecord) -> Result<()> {
        let id = record
            .id
            .ok_or_else(|| CrmError::validation(record.collection.primary_id, "missing id"))?;
        let url = self.record_url(record.collection, id)?;

        // If-Match: * 避免 PATCH 變成 upsert
        let response = self
            .request(Method::PATCH, url)
            .header(IF_MATCH, "*")
            .json(&record.attributes)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: RecordId) -> Result<()> {
        let url = self.record_url(collection, id)?;
        let response = self.request(Method::DELETE, url).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
