use crate::core::gateway::RecordGateway;
use crate::core::{Contact, OrganizationService, RecordId};
use crate::utils::error::{CrmError, Result};
use crate::utils::validation::{validate_email, validate_non_empty_string, validate_record_id};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
}

impl ContactChanges {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.telephone.is_none()
    }
}

pub struct ContactController<S> {
    gateway: RecordGateway<Contact, S>,
}

impl<S: OrganizationService> ContactController<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self::with_gateway(RecordGateway::new(service))
    }

    pub fn with_gateway(gateway: RecordGateway<Contact, S>) -> Self {
        Self { gateway }
    }

    pub async fn create_contact(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        telephone: Option<&str>,
    ) -> Result<RecordId> {
        validate_non_empty_string("firstname", first_name)?;
        validate_non_empty_string("lastname", last_name)?;
        validate_email("emailaddress1", email)?;
        if let Some(telephone) = telephone {
            validate_non_empty_string("telephone1", telephone)?;
        }

        let contact = Contact {
            first_name: Some(first_name.trim().to_string()),
            last_name: Some(last_name.trim().to_string()),
            email: Some(email.trim().to_string()),
            telephone: telephone.map(|t| t.trim().to_string()),
            ..Default::default()
        };
        let id = self.gateway.create(&contact).await?;
        tracing::info!(
            "👤 Contact '{} {}' created ({})",
            first_name.trim(),
            last_name.trim(),
            id
        );
        Ok(id)
    }

    pub async fn list_contacts(&self) -> Result<Vec<Contact>> {
        self.gateway.read_all().await
    }

    pub async fn update_contact(&self, id: &str, changes: ContactChanges) -> Result<()> {
        let id = validate_record_id("contactid", id)?;
        if changes.is_empty() {
            return Err(CrmError::validation("changes", "No contact fields to update"));
        }
        if let Some(first_name) = &changes.first_name {
            validate_non_empty_string("firstname", first_name)?;
        }
        if let Some(last_name) = &changes.last_name {
            validate_non_empty_string("lastname", last_name)?;
        }
        if let Some(email) = &changes.email {
            validate_email("emailaddress1", email)?;
        }
        if let Some(telephone) = &changes.telephone {
            validate_non_empty_string("telephone1", telephone)?;
        }

        let contact = Contact {
            id: Some(id),
            first_name: changes.first_name.map(|f| f.trim().to_string()),
            last_name: changes.last_name.map(|l| l.trim().to_string()),
            email: changes.email.map(|e| e.trim().to_string()),
            telephone: changes.telephone.map(|t| t.trim().to_string()),
            ..Default::default()
        };
        self.gateway.update(&contact).await?;
        tracing::info!("👤 Contact {} updated", id);
        Ok(())
    }

    pub async fn delete_contact(&self, id: &str) -> Result<()> {
        let id = validate_record_id("contactid", id)?;
        self.gateway.delete(id).await?;
        tracing::info!("👤 Contact {} deleted", id);
        Ok(())
    }
}
