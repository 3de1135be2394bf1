use crate::core::gateway::RecordGateway;
use crate::core::{CasePriority, Incident, OrganizationService, RecordId};
use crate::utils::error::{CrmError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_record_id};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<CasePriority>,
}

impl IncidentChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.priority.is_none()
    }
}

/// Cases (the `incident` collection), always attached to a customer account.
pub struct IncidentController<S> {
    gateway: RecordGateway<Incident, S>,
}

impl<S: OrganizationService> IncidentController<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self::with_gateway(RecordGateway::new(service))
    }

    pub fn with_gateway(gateway: RecordGateway<Incident, S>) -> Self {
        Self { gateway }
    }

    pub async fn create_case(
        &self,
        customer_account_id: &str,
        title: &str,
        description: Option<&str>,
        priority: CasePriority,
    ) -> Result<RecordId> {
        let customer = validate_record_id("customerid", customer_account_id)?;
        validate_non_empty_string("title", title)?;
        if let Some(description) = description {
            validate_non_empty_string("description", description)?;
        }

        let incident = Incident {
            title: Some(title.trim().to_string()),
            description: description.map(|d| d.trim().to_string()),
            priority: Some(priority),
            customer_id: Some(customer),
            ..Default::default()
        };
        let id = self.gateway.create(&incident).await?;
        tracing::info!("📋 Case '{}' created for account {} ({})", title.trim(), customer, id);
        Ok(id)
    }

    pub async fn list_cases(&self) -> Result<Vec<Incident>> {
        self.gateway.read_all().await
    }

    pub async fn update_case(&self, id: &str, changes: IncidentChanges) -> Result<()> {
        let id = validate_record_id("incidentid", id)?;
        if changes.is_empty() {
            return Err(CrmError::validation("changes", "No case fields to update"));
        }
        if let Some(title) = &changes.title {
            validate_non_empty_string("title", title)?;
        }
        if let Some(description) = &changes.description {
            validate_non_empty_string("description", description)?;
        }

        let incident = Incident {
            id: Some(id),
            title: changes.title.map(|t| t.trim().to_string()),
            description: changes.description.map(|d| d.trim().to_string()),
            priority: changes.priority,
            ..Default::default()
        };
        self.gateway.update(&incident).await?;
        tracing::info!("📋 Case {} updated", id);
        Ok(())
    }

    pub async fn delete_case(&self, id: &str) -> Result<()> {
        let id = validate_record_id("incidentid", id)?;
        self.gateway.delete(id).await?;
        tracing::info!("📋 Case {} deleted", id);
        Ok(())
    }
}
