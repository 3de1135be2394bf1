use crate::utils::error::{CrmError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 128-bit record identifier. The nil GUID is the "empty" id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_nil()
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for RecordId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// A named record collection in the organization service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Collection {
    /// Logical name, e.g. `account`
    pub logical_name: &'static str,
    /// Entity set name used in URLs, e.g. `accounts`
    pub entity_set: &'static str,
    /// Primary id attribute, e.g. `accountid`
    pub primary_id: &'static str,
}

impl Collection {
    pub const fn new(
        logical_name: &'static str,
        entity_set: &'static str,
        primary_id: &'static str,
    ) -> Self {
        Self {
            logical_name,
            entity_set,
            primary_id,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.logical_name)
    }
}

pub const ACCOUNT: Collection = Collection::new("account", "accounts", "accountid");
pub const CONTACT: Collection = Collection::new("contact", "contacts", "contactid");
pub const INCIDENT: Collection = Collection::new("incident", "incidents", "incidentid");

pub const ODATA_BIND_SUFFIX: &str = "@odata.bind";

/// Untyped record as exchanged with the organization service.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub collection: Collection,
    pub id: Option<RecordId>,
    pub attributes: Map<String, Value>,
}

impl EntityRecord {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            id: None,
            attributes: Map::new(),
        }
    }

    /// Builds a record from a service payload, lifting the primary id attribute out of the map.
    pub fn from_attributes(collection: Collection, mut attributes: Map<String, Value>) -> Result<Self> {
        let id = match attributes.remove(collection.primary_id) {
            Some(Value::String(raw)) => Some(raw.parse::<RecordId>().map_err(|e| {
                CrmError::malformed(format!(
                    "{} has invalid {} '{}': {}",
                    collection, collection.primary_id, raw, e
                ))
            })?),
            Some(Value::Null) | None => None,
            Some(other) => {
                return Err(CrmError::malformed(format!(
                    "{} has non-string {}: {}",
                    collection, collection.primary_id, other
                )))
            }
        };

        Ok(Self {
            collection,
            id,
            attributes,
        })
    }

    pub fn get_str(&self, attribute: &str) -> Option<&str> {
        self.attributes.get(attribute).and_then(Value::as_str)
    }
}

/// Lookup attribute written as `<nav>_<target>@odata.bind = "/<set>(<id>)"`.
pub fn lookup_binding(navigation: &str, target: Collection, id: RecordId) -> (String, Value) {
    (
        format!("{}_{}{}", navigation, target.logical_name, ODATA_BIND_SUFFIX),
        Value::String(format!("/{}({})", target.entity_set, id)),
    )
}

/// Reverses [`lookup_binding`]: returns the read-side attribute (`_<nav>_value`) and the id.
pub fn resolve_binding(key: &str, value: &Value) -> Option<(String, RecordId)> {
    let property = key.strip_suffix(ODATA_BIND_SUFFIX)?;
    let navigation = property.split('_').next().filter(|s| !s.is_empty())?;
    let reference = value.as_str()?;
    let id = parse_entity_reference(reference)?;
    Some((format!("_{}_value", navigation), id))
}

/// Extracts the GUID from `.../<set>(<guid>)`.
pub fn parse_entity_reference(reference: &str) -> Option<RecordId> {
    let open = reference.rfind('(')?;
    let close = reference.rfind(')')?;
    if close <= open {
        return None;
    }
    reference[open + 1..close].parse().ok()
}

/// The "identifiable record" capability the gateway is generic over.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;
    /// Column set requested on bulk retrieval
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> Option<RecordId>;

    fn to_attributes(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(CrmError::malformed(format!(
                "{} did not serialize to an object: {}",
                Self::COLLECTION,
                other
            ))),
        }
    }

    fn to_entity_record(&self) -> Result<EntityRecord> {
        Ok(EntityRecord {
            collection: Self::COLLECTION,
            id: self.id(),
            attributes: self.to_attributes()?,
        })
    }

    fn from_entity_record(record: EntityRecord) -> Result<Self>
    where
        Self: Sized,
    {
        if record.collection != Self::COLLECTION {
            return Err(CrmError::malformed(format!(
                "expected {} record, got {}",
                Self::COLLECTION,
                record.collection
            )));
        }
        let mut attributes = record.attributes;
        if let Some(id) = record.id {
            attributes.insert(
                Self::COLLECTION.primary_id.to_string(),
                Value::String(id.to_string()),
            );
        }
        Ok(serde_json::from_value(Value::Object(attributes))?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "accountid", default, skip_serializing)]
    pub id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "telephone1", default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    #[serde(rename = "emailaddress1", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "address1_city", default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(rename = "modifiedon", default, skip_serializing)]
    pub modified_on: Option<DateTime<Utc>>,
}

impl Entity for Account {
    const COLLECTION: Collection = ACCOUNT;
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "telephone1",
        "emailaddress1",
        "address1_city",
        "modifiedon",
    ];

    fn id(&self) -> Option<RecordId> {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename = "contactid", default, skip_serializing)]
    pub id: Option<RecordId>,
    #[serde(rename = "firstname", default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "lastname", default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(rename = "emailaddress1", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "telephone1", default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    #[serde(rename = "modifiedon", default, skip_serializing)]
    pub modified_on: Option<DateTime<Utc>>,
}

impl Entity for Contact {
    const COLLECTION: Collection = CONTACT;
    const COLUMNS: &'static [&'static str] = &[
        "firstname",
        "lastname",
        "emailaddress1",
        "telephone1",
        "modifiedon",
    ];

    fn id(&self) -> Option<RecordId> {
        self.id
    }
}

/// Case priority option set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum CasePriority {
    High,
    Normal,
    Low,
}

impl From<CasePriority> for i64 {
    fn from(value: CasePriority) -> Self {
        match value {
            CasePriority::High => 1,
            CasePriority::Normal => 2,
            CasePriority::Low => 3,
        }
    }
}

impl TryFrom<i64> for CasePriority {
    type Error = String;

    fn try_from(value: i64) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(CasePriority::High),
            2 => Ok(CasePriority::Normal),
            3 => Ok(CasePriority::Low),
            other => Err(format!("unknown prioritycode {}", other)),
        }
    }
}

impl fmt::Display for CasePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CasePriority::High => "High",
            CasePriority::Normal => "Normal",
            CasePriority::Low => "Low",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    #[serde(rename = "incidentid", default, skip_serializing)]
    pub id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "prioritycode", default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<CasePriority>,
    /// Assigned by the service
    #[serde(rename = "ticketnumber", default, skip_serializing)]
    pub ticket_number: Option<String>,
    /// Customer account; written through an `@odata.bind` lookup
    #[serde(rename = "_customerid_value", default, skip_serializing)]
    pub customer_id: Option<RecordId>,
    #[serde(rename = "modifiedon", default, skip_serializing)]
    pub modified_on: Option<DateTime<Utc>>,
}

impl Entity for Incident {
    const COLLECTION: Collection = INCIDENT;
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "description",
        "prioritycode",
        "ticketnumber",
        "_customerid_value",
        "modifiedon",
    ];

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn to_attributes(&self) -> Result<Map<String, Value>> {
        let mut map = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            other => {
                return Err(CrmError::malformed(format!(
                    "incident did not serialize to an object: {}",
                    other
                )))
            }
        };
        if let Some(customer) = self.customer_id {
            let (key, value) = lookup_binding("customerid", ACCOUNT, customer);
            map.insert(key, value);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_account_serializes_only_set_fields() {
        let account = Account {
            id: Some(RecordId::new_v4()),
            telephone: Some("555-0199".to_string()),
            ..Default::default()
        };

        let attributes = account.to_attributes().unwrap();
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes["telephone1"], json!("555-0199"));
    }

    #[test]
    fn test_from_entity_record_restores_id() {
        let payload = json!({
            "@odata.etag": "W/\"1234\"",
            "contactid": "6a1f6c49-3f1e-4c7b-9e49-2d1b0f0a9c11",
            "firstname": "Yvonne",
            "lastname": "McKay",
            "emailaddress1": null
        });
        let Value::Object(map) = payload else {
            unreachable!()
        };

        let record = EntityRecord::from_attributes(CONTACT, map).unwrap();
        assert_eq!(
            record.id.unwrap().to_string(),
            "6a1f6c49-3f1e-4c7b-9e49-2d1b0f0a9c11"
        );

        let contact = Contact::from_entity_record(record).unwrap();
        assert_eq!(
            contact.id,
            "6a1f6c49-3f1e-4c7b-9e49-2d1b0f0a9c11".parse::<RecordId>().ok()
        );
        assert_eq!(contact.first_name.as_deref(), Some("Yvonne"));
        assert_eq!(contact.email, None);
    }

    #[test]
    fn test_from_entity_record_rejects_other_collection() {
        let record = EntityRecord::new(ACCOUNT);
        assert!(Contact::from_entity_record(record).is_err());
    }

    #[test]
    fn test_incident_writes_customer_binding() {
        let customer = RecordId::new_v4();
        let incident = Incident {
            title: Some("Printer jam".to_string()),
            priority: Some(CasePriority::High),
            customer_id: Some(customer),
            ..Default::default()
        };

        let attributes = incident.to_attributes().unwrap();
        assert_eq!(attributes["prioritycode"], json!(1));
        assert_eq!(
            attributes["customerid_account@odata.bind"],
            json!(format!("/accounts({})", customer))
        );
        assert!(!attributes.contains_key("_customerid_value"));
    }

    #[test]
    fn test_resolve_binding_round_trips_lookup() {
        let id = RecordId::new_v4();
        let (key, value) = lookup_binding("customerid", ACCOUNT, id);

        let (attribute, resolved) = resolve_binding(&key, &value).unwrap();
        assert_eq!(attribute, "_customerid_value");
        assert_eq!(resolved, id);
        assert!(resolve_binding("name", &value).is_none());
    }

    #[test]
    fn test_parse_entity_reference() {
        let id = parse_entity_reference(
            "https://org.example.com/api/data/v9.2/accounts(00000000-0000-0000-0000-000000000001)",
        );
        assert_eq!(
            id.map(|id| id.to_string()),
            Some("00000000-0000-0000-0000-000000000001".to_string())
        );
        assert!(parse_entity_reference("accounts").is_none());
    }

    #[test]
    fn test_unknown_priority_is_rejected() {
        let result: std::result::Result<Incident, _> =
            serde_json::from_value(json!({ "prioritycode": 9 }));
        assert!(result.is_err());
    }
}
