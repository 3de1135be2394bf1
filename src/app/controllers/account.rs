use crate::core::gateway::RecordGateway;
use crate::core::{Account, OrganizationService, RecordId};
use crate::utils::error::{CrmError, Result};
use crate::utils::validation::{validate_email, validate_non_empty_string, validate_record_id};
use std::sync::Arc;

/// Fields to change on an existing account; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountChanges {
    pub name: Option<String>,
    pub telephone: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
}

impl AccountChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.telephone.is_none() && self.email.is_none() && self.city.is_none()
    }
}

pub struct AccountController<S> {
    gateway: RecordGateway<Account, S>,
}

impl<S: OrganizationService> AccountController<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self::with_gateway(RecordGateway::new(service))
    }

    pub fn with_gateway(gateway: RecordGateway<Account, S>) -> Self {
        Self { gateway }
    }

    pub async fn create_account(
        &self,
        name: &str,
        telephone: &str,
        email: Option<&str>,
        city: Option<&str>,
    ) -> Result<RecordId> {
        validate_non_empty_string("name", name)?;
        validate_non_empty_string("telephone1", telephone)?;
        if let Some(email) = email {
            validate_email("emailaddress1", email)?;
        }
        if let Some(city) = city {
            validate_non_empty_string("address1_city", city)?;
        }

        let account = Account {
            name: Some(name.trim().to_string()),
            telephone: Some(telephone.trim().to_string()),
            email: email.map(|e| e.trim().to_string()),
            city: city.map(|c| c.trim().to_string()),
            ..Default::default()
        };
        let id = self.gateway.create(&account).await?;
        tracing::info!("🏢 Account '{}' created ({})", name.trim(), id);
        Ok(id)
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.gateway.read_all().await
    }

    pub async fn update_account(&self, id: &str, changes: AccountChanges) -> Result<()> {
        let id = validate_record_id("accountid", id)?;
        if changes.is_empty() {
            return Err(CrmError::validation("changes", "No account fields to update"));
        }
        if let Some(name) = &changes.name {
            validate_non_empty_string("name", name)?;
        }
        if let Some(telephone) = &changes.telephone {
            validate_non_empty_string("telephone1", telephone)?;
        }
        if let Some(email) = &changes.email {
            validate_email("emailaddress1", email)?;
        }
        if let Some(city) = &changes.city {
            validate_non_empty_string("address1_city", city)?;
        }

        let account = Account {
            id: Some(id),
            name: changes.name.map(|n| n.trim().to_string()),
            telephone: changes.telephone.map(|t| t.trim().to_string()),
            email: changes.email.map(|e| e.trim().to_string()),
            city: changes.city.map(|c| c.trim().to_string()),
            ..Default::default()
        };
        self.gateway.update(&account).await?;
        tracing::info!("🏢 Account {} updated", id);
        Ok(())
    }

    pub async fn delete_account(&self, id: &str) -> Result<()> {
        let id = validate_record_id("accountid", id)?;
        self.gateway.delete(id).await?;
        tracing::info!("🏢 Account {} deleted", id);
        Ok(())
    }
}
