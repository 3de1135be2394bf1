use crate::app::controllers::{
    AccountChanges, AccountController, ContactChanges, ContactController, IncidentChanges,
    IncidentController,
};
use crate::core::gateway::{RecordGateway, DEFAULT_PAGE_SIZE};
use crate::core::{Account, CasePriority, Contact, Incident, OrganizationService};
use crate::utils::error::Result;
use crate::utils::table::{OutputFormat, Table};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::ops::AddAssign;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Scenario {
    All,
    Accounts,
    Contacts,
    Cases,
}

/// Counts of the writes a scenario issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScenarioReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl AddAssign for ScenarioReport {
    fn add_assign(&mut self, other: Self) {
        self.created += other.created;
        self.updated += other.updated;
        self.deleted += other.deleted;
    }
}

/// 情境中已建立但尚未刪除的紀錄，步驟失敗時據此收尾
#[derive(Debug, Default)]
struct Leftovers {
    cases: Vec<String>,
    contacts: Vec<String>,
    accounts: Vec<String>,
}

impl Leftovers {
    fn is_empty(&self) -> bool {
        self.cases.is_empty() && self.contacts.is_empty() && self.accounts.is_empty()
    }

    fn forget(list: &mut Vec<String>, id: &str) {
        list.retain(|kept| kept != id);
    }
}

fn cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn timestamp(value: &Option<DateTime<Utc>>) -> String {
    value
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

pub fn account_table(accounts: &[Account]) -> Result<Table> {
    let mut table = Table::new(["Id", "Name", "Phone", "Email", "City", "Modified"]);
    for account in accounts {
        table.push_row([
            account.id.map(|id| id.to_string()).unwrap_or_default(),
            cell(&account.name),
            cell(&account.telephone),
            cell(&account.email),
            cell(&account.city),
            timestamp(&account.modified_on),
        ])?;
    }
    Ok(table)
}

pub fn contact_table(contacts: &[Contact]) -> Result<Table> {
    let mut table = Table::new(["Id", "First name", "Last name", "Email", "Phone", "Modified"]);
    for contact in contacts {
        table.push_row([
            contact.id.map(|id| id.to_string()).unwrap_or_default(),
            cell(&contact.first_name),
            cell(&contact.last_name),
            cell(&contact.email),
            cell(&contact.telephone),
            timestamp(&contact.modified_on),
        ])?;
    }
    Ok(table)
}

pub fn case_table(cases: &[Incident]) -> Result<Table> {
    let mut table = Table::new(["Id", "Ticket", "Title", "Priority", "Customer", "Modified"]);
    for case in cases {
        table.push_row([
            case.id.map(|id| id.to_string()).unwrap_or_default(),
            cell(&case.ticket_number),
            cell(&case.title),
            case.priority.map(|p| p.to_string()).unwrap_or_default(),
            case.customer_id.map(|id| id.to_string()).unwrap_or_default(),
            timestamp(&case.modified_on),
        ])?;
    }
    Ok(table)
}

/// 依序執行示範情境，並把每一步的清單以表格輸出
pub struct DemoRunner<S, W> {
    accounts: AccountController<S>,
    contacts: ContactController<S>,
    cases: IncidentController<S>,
    out: W,
    format: OutputFormat,
}

impl<S: OrganizationService, W: Write> DemoRunner<S, W> {
    pub fn new(service: Arc<S>, out: W) -> Self {
        Self::with_page_size(service, DEFAULT_PAGE_SIZE, out)
    }

    pub fn with_page_size(service: Arc<S>, page_size: u32, out: W) -> Self {
        Self {
            accounts: AccountController::with_gateway(
                RecordGateway::new(Arc::clone(&service)).with_page_size(page_size),
            ),
            contacts: ContactController::with_gateway(
                RecordGateway::new(Arc::clone(&service)).with_page_size(page_size),
            ),
            cases: IncidentController::with_gateway(
                RecordGateway::new(service).with_page_size(page_size),
            ),
            out,
            format: OutputFormat::Table,
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub async fn run(&mut self, scenario: Scenario) -> Result<ScenarioReport> {
        let mut report = ScenarioReport::default();
        if matches!(scenario, Scenario::All | Scenario::Accounts) {
            report += self.run_accounts().await?;
        }
        if matches!(scenario, Scenario::All | Scenario::Contacts) {
            report += self.run_contacts().await?;
        }
        if matches!(scenario, Scenario::All | Scenario::Cases) {
            report += self.run_cases().await?;
        }
        Ok(report)
    }

    fn section(&mut self, title: &str, table: Table) -> Result<()> {
        if self.format == OutputFormat::Table {
            writeln!(self.out, "\n== {} ==", title)?;
        }
        table.write_to(&mut self.out, self.format)
    }

    async fn show_accounts(&mut self, title: &str) -> Result<()> {
        let accounts = self.accounts.list_accounts().await?;
        self.section(title, account_table(&accounts)?)
    }

    async fn show_contacts(&mut self, title: &str) -> Result<()> {
        let contacts = self.contacts.list_contacts().await?;
        self.section(title, contact_table(&contacts)?)
    }

    async fn show_cases(&mut self, title: &str) -> Result<()> {
        let cases = self.cases.list_cases().await?;
        self.section(title, case_table(&cases)?)
    }

    pub async fn run_accounts(&mut self) -> Result<ScenarioReport> {
        tracing::info!("🏢 Running account scenario");
        let mut leftovers = Leftovers::default();
        let outcome = self.account_steps(&mut leftovers).await;
        self.finish(outcome, leftovers).await
    }

    async fn account_steps(&mut self, leftovers: &mut Leftovers) -> Result<ScenarioReport> {
        let contoso = self
            .accounts
            .create_account("Contoso Ltd", "555-0100", Some("info@contoso.com"), Some("Redmond"))
            .await?
            .to_string();
        leftovers.accounts.push(contoso.clone());
        let fabrikam = self
            .accounts
            .create_account("Fabrikam Inc", "555-0150", None, Some("Seattle"))
            .await?
            .to_string();
        leftovers.accounts.push(fabrikam.clone());
        self.show_accounts("Accounts after create").await?;

        self.accounts
            .update_account(
                &contoso,
                AccountChanges {
                    telephone: Some("555-0199".to_string()),
                    ..Default::default()
                },
            )
            .await?;
        self.show_accounts("Accounts after update").await?;

        for id in [&contoso, &fabrikam] {
            self.accounts.delete_account(id).await?;
            Leftovers::forget(&mut leftovers.accounts, id);
        }
        self.show_accounts("Accounts after delete").await?;

        Ok(ScenarioReport {
            created: 2,
            updated: 1,
            deleted: 2,
        })
    }

    pub async fn run_contacts(&mut self) -> Result<ScenarioReport> {
        tracing::info!("👤 Running contact scenario");
        let mut leftovers = Leftovers::default();
        let outcome = self.contact_steps(&mut leftovers).await;
        self.finish(outcome, leftovers).await
    }

    async fn contact_steps(&mut self, leftovers: &mut Leftovers) -> Result<ScenarioReport> {
        let yvonne = self
            .contacts
            .create_contact("Yvonne", "McKay", "yvonne.mckay@contoso.com", Some("555-0110"))
            .await?
            .to_string();
        leftovers.contacts.push(yvonne.clone());
        let susanna = self
            .contacts
            .create_contact("Susanna", "Stubberod", "susanna@fabrikam.com", None)
            .await?
            .to_string();
        leftovers.contacts.push(susanna.clone());
        self.show_contacts("Contacts after create").await?;

        self.contacts
            .update_contact(
                &yvonne,
                ContactChanges {
                    email: Some("y.mckay@contoso.com".to_string()),
                    ..Default::default()
                },
            )
            .await?;
        self.show_contacts("Contacts after update").await?;

        for id in [&yvonne, &susanna] {
            self.contacts.delete_contact(id).await?;
            Leftovers::forget(&mut leftovers.contacts, id);
        }
        self.show_contacts("Contacts after delete").await?;

        Ok(ScenarioReport {
            created: 2,
            updated: 1,
            deleted: 2,
        })
    }

    pub async fn run_cases(&mut self) -> Result<ScenarioReport> {
        tracing::info!("📋 Running case scenario");
        let mut leftovers = Leftovers::default();
        let outcome = self.case_steps(&mut leftovers).await;
        self.finish(outcome, leftovers).await
    }

    async fn case_steps(&mut self, leftovers: &mut Leftovers) -> Result<ScenarioReport> {
        let customer = self
            .accounts
            .create_account("Adventure Works", "555-0177", None, None)
            .await?
            .to_string();
        leftovers.accounts.push(customer.clone());

        let printer = self
            .cases
            .create_case(
                &customer,
                "Printer not working",
                Some("Front desk printer shows a paper jam error"),
                CasePriority::High,
            )
            .await?
            .to_string();
        leftovers.cases.push(printer.clone());
        let invoice = self
            .cases
            .create_case(&customer, "Invoice question", None, CasePriority::Low)
            .await?
            .to_string();
        leftovers.cases.push(invoice.clone());
        self.show_cases("Cases after create").await?;

        self.cases
            .update_case(
                &printer,
                IncidentChanges {
                    priority: Some(CasePriority::Normal),
                    ..Default::default()
                },
            )
            .await?;
        self.show_cases("Cases after update").await?;

        for id in [&printer, &invoice] {
            self.cases.delete_case(id).await?;
            Leftovers::forget(&mut leftovers.cases, id);
        }
        self.accounts.delete_account(&customer).await?;
        Leftovers::forget(&mut leftovers.accounts, &customer);
        self.show_cases("Cases after delete").await?;

        Ok(ScenarioReport {
            created: 3,
            updated: 1,
            deleted: 3,
        })
    }

    /// 步驟失敗時盡力刪掉本情境留下的紀錄，再把原本的錯誤往上傳
    async fn finish(
        &self,
        outcome: Result<ScenarioReport>,
        leftovers: Leftovers,
    ) -> Result<ScenarioReport> {
        if outcome.is_err() && !leftovers.is_empty() {
            tracing::warn!("🧹 Scenario failed, removing records it created: {:?}", leftovers);
            // 先刪案件，再刪其客戶帳戶
            for id in &leftovers.cases {
                if let Err(e) = self.cases.delete_case(id).await {
                    tracing::warn!("⚠️ Case {} left behind: {}", id, e);
                }
            }
            for id in &leftovers.contacts {
                if let Err(e) = self.contacts.delete_contact(id).await {
                    tracing::warn!("⚠️ Contact {} left behind: {}", id, e);
                }
            }
            for id in &leftovers.accounts {
                if let Err(e) = self.accounts.delete_account(id).await {
                    tracing::warn!("⚠️ Account {} left behind: {}", id, e);
                }
            }
        }
        outcome
    }
}
