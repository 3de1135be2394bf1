use crm_console::app::controllers::{AccountChanges, ContactChanges, IncidentChanges};
use crm_console::core::{Account, CasePriority, ACCOUNT, CONTACT, INCIDENT};
use crm_console::{
    AccountController, ContactController, CrmError, InMemoryService, IncidentController,
    RecordGateway,
};
use std::sync::Arc;

/// 完整 CRUD 流程：建立 → 讀取 → 更新單一欄位 → 讀取 → 刪除 → 讀取
#[tokio::test]
async fn test_account_lifecycle_end_to_end() {
    let service = Arc::new(InMemoryService::new());
    let accounts = AccountController::new(Arc::clone(&service));

    let id = accounts
        .create_account("Contoso Ltd", "555-0100", Some("info@contoso.com"), Some("Redmond"))
        .await
        .unwrap();
    assert!(!id.is_empty());

    let listed = accounts.list_accounts().await.unwrap();
    let created = listed.iter().find(|a| a.id == Some(id)).unwrap();
    assert_eq!(created.name.as_deref(), Some("Contoso Ltd"));
    assert_eq!(created.telephone.as_deref(), Some("555-0100"));
    assert_eq!(created.city.as_deref(), Some("Redmond"));
    assert!(created.modified_on.is_some());

    accounts
        .update_account(
            &id.to_string(),
            AccountChanges {
                telephone: Some("555-0199".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let listed = accounts.list_accounts().await.unwrap();
    let updated = listed.iter().find(|a| a.id == Some(id)).unwrap();
    assert_eq!(updated.telephone.as_deref(), Some("555-0199"));
    assert_eq!(updated.name.as_deref(), Some("Contoso Ltd"));
    assert_eq!(updated.email.as_deref(), Some("info@contoso.com"));
    assert_eq!(updated.city.as_deref(), Some("Redmond"));

    accounts.delete_account(&id.to_string()).await.unwrap();
    let listed = accounts.list_accounts().await.unwrap();
    assert!(listed.iter().all(|a| a.id != Some(id)));
    assert_eq!(service.count(ACCOUNT).await, 0);
}

#[tokio::test]
async fn test_read_all_spans_many_pages() {
    let service = Arc::new(InMemoryService::new());
    let gateway: RecordGateway<Account, _> =
        RecordGateway::new(Arc::clone(&service)).with_page_size(4);
    let accounts = AccountController::with_gateway(gateway);

    let mut ids = Vec::new();
    for i in 0..10 {
        ids.push(
            accounts
                .create_account(&format!("Account {:02}", i), "555-0100", None, None)
                .await
                .unwrap(),
        );
    }

    let listed = accounts.list_accounts().await.unwrap();
    let listed_ids: Vec<_> = listed.iter().filter_map(|a| a.id).collect();
    assert_eq!(listed_ids, ids);
}

#[tokio::test]
async fn test_contact_email_validation() {
    let service = Arc::new(InMemoryService::new());
    let contacts = ContactController::new(Arc::clone(&service));

    for bad in ["yvonne.contoso.com", "yvonne@contoso", "", "yvonne@"] {
        let err = contacts
            .create_contact("Yvonne", "McKay", bad, None)
            .await
            .unwrap_err();
        assert!(err.is_validation(), "{} should be rejected", bad);
    }
    assert_eq!(service.count(CONTACT).await, 0);

    let id = contacts
        .create_contact("Yvonne", "McKay", "yvonne@contoso.com", None)
        .await
        .unwrap();

    let err = contacts
        .update_contact(
            &id.to_string(),
            ContactChanges {
                email: Some("not-an-email".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let stored = contacts.list_contacts().await.unwrap();
    assert_eq!(stored[0].email.as_deref(), Some("yvonne@contoso.com"));
}

#[tokio::test]
async fn test_controllers_reject_bad_identifiers() {
    let service = Arc::new(InMemoryService::new());
    let accounts = AccountController::new(Arc::clone(&service));

    let changes = AccountChanges {
        name: Some("Renamed".to_string()),
        ..Default::default()
    };
    for id in ["", "   ", "abc", "00000000-0000-0000-0000-000000000000"] {
        assert!(accounts
            .update_account(id, changes.clone())
            .await
            .unwrap_err()
            .is_validation());
        assert!(accounts.delete_account(id).await.unwrap_err().is_validation());
    }

    let id = accounts
        .create_account("Contoso", "555-0100", None, None)
        .await
        .unwrap();
    let err = accounts
        .update_account(&id.to_string(), AccountChanges::default())
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_missing_record_surfaces_service_error() {
    let service = Arc::new(InMemoryService::new());
    let accounts = AccountController::new(service);

    let err = accounts
        .delete_account("6a1f6c49-3f1e-4c7b-9e49-2d1b0f0a9c11")
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::NotFound { .. }));
}

#[tokio::test]
async fn test_case_lifecycle_keeps_customer() {
    let service = Arc::new(InMemoryService::new());
    let accounts = AccountController::new(Arc::clone(&service));
    let cases = IncidentController::new(Arc::clone(&service));

    let customer = accounts
        .create_account("Adventure Works", "555-0177", None, None)
        .await
        .unwrap();
    let case_id = cases
        .create_case(
            &customer.to_string(),
            "Printer not working",
            Some("Paper jam"),
            CasePriority::High,
        )
        .await
        .unwrap();

    cases
        .update_case(
            &case_id.to_string(),
            IncidentChanges {
                priority: Some(CasePriority::Low),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let listed = cases.list_cases().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].priority, Some(CasePriority::Low));
    assert_eq!(listed[0].title.as_deref(), Some("Printer not working"));
    assert_eq!(listed[0].customer_id, Some(customer));

    assert!(cases
        .create_case("", "No customer", None, CasePriority::Normal)
        .await
        .unwrap_err()
        .is_validation());

    cases.delete_case(&case_id.to_string()).await.unwrap();
    assert_eq!(service.count(INCIDENT).await, 0);
}

/// 更新時和建立一樣先去掉前後空白再寫入
#[tokio::test]
async fn test_updates_store_trimmed_values() {
    let service = Arc::new(InMemoryService::new());
    let accounts = AccountController::new(Arc::clone(&service));
    let contacts = ContactController::new(Arc::clone(&service));
    let cases = IncidentController::new(Arc::clone(&service));

    let account_id = accounts
        .create_account("  Contoso  ", "555-0100", Some(" a@b.com "), None)
        .await
        .unwrap();
    accounts
        .update_account(
            &account_id.to_string(),
            AccountChanges {
                name: Some("  Fabrikam  ".to_string()),
                email: Some(" x@y.com ".to_string()),
                city: Some(" Seattle ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let listed = accounts.list_accounts().await.unwrap();
    assert_eq!(listed[0].name.as_deref(), Some("Fabrikam"));
    assert_eq!(listed[0].email.as_deref(), Some("x@y.com"));
    assert_eq!(listed[0].city.as_deref(), Some("Seattle"));

    let contact_id = contacts
        .create_contact("Yvonne", "McKay", "yvonne@contoso.com", None)
        .await
        .unwrap();
    contacts
        .update_contact(
            &contact_id.to_string(),
            ContactChanges {
                last_name: Some(" Smith ".to_string()),
                email: Some("  y.smith@contoso.com ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let listed = contacts.list_contacts().await.unwrap();
    assert_eq!(listed[0].last_name.as_deref(), Some("Smith"));
    assert_eq!(listed[0].email.as_deref(), Some("y.smith@contoso.com"));

    let case_id = cases
        .create_case(&account_id.to_string(), "Printer", None, CasePriority::Normal)
        .await
        .unwrap();
    cases
        .update_case(
            &case_id.to_string(),
            IncidentChanges {
                title: Some("  Printer on fire ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let listed = cases.list_cases().await.unwrap();
    assert_eq!(listed[0].title.as_deref(), Some("Printer on fire"));
}
