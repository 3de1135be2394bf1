pub mod gateway;

pub use crate::domain::model::{
    Account, CasePriority, Collection, Contact, Entity, EntityRecord, Incident, RecordId, ACCOUNT,
    CONTACT, INCIDENT,
};
pub use crate::domain::ports::{EntityPage, OrganizationService, PagingInfo, QueryExpression};
pub use crate::utils::error::Result;
