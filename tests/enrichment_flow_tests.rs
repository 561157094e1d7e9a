//! End-to-end tests for the enrichment service: mocked Apollo API on one side,
//! in-memory contact store and search index on the other.

use apollo_enrichment::models::PeopleSearchParams;
use apollo_enrichment::{
    ApolloClient, Contact, ContactStore, EnrichmentService, MemoryContactStore, MemorySearchIndex,
    SearchIndexStore, APOLLO_SOURCE,
};
use mockito::{Matcher, Server, ServerGuard};
use std::sync::Arc;

struct Fixture {
    server: ServerGuard,
    service: EnrichmentService,
    contacts: Arc<MemoryContactStore>,
    index: Arc<MemorySearchIndex>,
}

async fn fixture() -> Fixture {
    let server = Server::new_async().await;
    let client = Arc::new(ApolloClient::with_base_url(
        server.url(),
        "test-api-key".to_string(),
    ));
    let contacts = Arc::new(MemoryContactStore::new());
    let index = Arc::new(MemorySearchIndex::new());
    let service = EnrichmentService::new(client, contacts.clone(), index.clone());
    Fixture {
        server,
        service,
        contacts,
        index,
    }
}

fn person_json(id: &str, email: &str) -> String {
    format!(
        r#"{{
            "id": "{id}",
            "first_name": "Jane",
            "last_name": "Doe",
            "email": "{email}",
            "email_status": "verified",
            "title": "VP Engineering",
            "seniority": "vp",
            "departments": ["engineering"],
            "organization": {{
                "id": "org-1",
                "name": "Acme",
                "industry": "Software",
                "website_url": "https://acme.io",
                "estimated_num_employees": 250,
                "founded_year": 2014
            }}
        }}"#
    )
}

#[tokio::test]
async fn test_enrich_miss_is_soft_failure() {
    let mut fx = fixture().await;

    let mock = fx
        .server
        .mock("POST", "/mixed_people/search")
        .with_status(200)
        .with_body(r#"{"people": [], "pagination": {}}"#)
        .create_async()
        .await;

    let outcome = fx
        .service
        .enrich_contact_data("nobody@acme.io", None, None)
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(!outcome.success);
    assert!(!outcome.enriched);
    assert!(outcome.person.is_none());
}

#[tokio::test]
async fn test_enrich_preview_mode_leaves_store_untouched() {
    let mut fx = fixture().await;

    let mock = fx
        .server
        .mock("POST", "/mixed_people/search")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "q_keywords": "jane@acme.io",
            "per_page": 1
        })))
        .with_status(200)
        .with_body(format!(
            r#"{{"people": [{}], "pagination": {{}}}}"#,
            person_json("p1", "jane@acme.io")
        ))
        .create_async()
        .await;

    let outcome = fx
        .service
        .enrich_contact_data("jane@acme.io", None, None)
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(outcome.success);
    assert!(!outcome.enriched);
    assert_eq!(outcome.person.unwrap().id, "p1");
    assert!(outcome.contact.is_none());
    assert!(fx.contacts.is_empty().await);
    assert!(fx.index.is_empty().await);
}

#[tokio::test]
async fn test_enrich_merges_without_erasing_local_data() {
    let mut fx = fixture().await;

    let mut contact = Contact::new("user-1");
    contact.email = Some("jane@acme.io".to_string());
    contact.phone = Some("+1 555 0100".to_string());
    contact.first_name = Some("Janet".to_string());
    fx.contacts.create(&contact).await.unwrap();

    // Provider record has no phone; it must not erase the local one.
    let mock = fx
        .server
        .mock("POST", "/mixed_people/search")
        .with_status(200)
        .with_body(format!(
            r#"{{"people": [{}], "pagination": {{}}}}"#,
            person_json("p1", "jane@acme.io")
        ))
        .create_async()
        .await;

    let outcome = fx
        .service
        .enrich_contact_data("jane@acme.io", Some(&contact.id), Some("user-1"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(outcome.success);
    assert!(outcome.enriched);

    let stored = fx.contacts.get(&contact.id).await.unwrap().unwrap();
    assert_eq!(stored.phone.as_deref(), Some("+1 555 0100"));
    assert_eq!(stored.first_name.as_deref(), Some("Jane"));
    assert_eq!(stored.company.as_deref(), Some("Acme"));
    assert_eq!(stored.title.as_deref(), Some("VP Engineering"));
    assert_eq!(stored.source.as_deref(), Some(APOLLO_SOURCE));
    assert_eq!(stored.source_id.as_deref(), Some("p1"));
    assert!(stored.last_enriched_at.is_some());
    assert_eq!(stored.attributes.company_size, Some(250));
    assert_eq!(stored.attributes.department.as_deref(), Some("engineering"));

    // Index refreshed as part of the same logical operation.
    let entry = fx.index.get_document(&contact.id).await.unwrap().unwrap();
    assert!(entry.content.contains("Acme"));
    assert!(entry.enriched);
}

#[tokio::test]
async fn test_import_is_idempotent() {
    let mut fx = fixture().await;

    let mock = fx
        .server
        .mock("GET", "/people/p1")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(format!(r#"{{"person": {}}}"#, person_json("p1", "jane@acme.io")))
        .expect(2)
        .create_async()
        .await;

    let first = fx
        .service
        .import_contact_from_apollo("p1", "user-1", true)
        .await
        .unwrap();
    assert!(first.success);
    assert!(first.imported);
    assert!(!first.updated);

    let second = fx
        .service
        .import_contact_from_apollo("p1", "user-1", true)
        .await
        .unwrap();
    assert!(second.success);
    assert!(!second.imported);
    assert!(second.updated);

    mock.assert_async().await;
    // Exactly one local contact after two imports of the same person.
    assert_eq!(fx.contacts.len().await, 1);
    assert_eq!(
        first.contact.unwrap().id,
        second.contact.unwrap().id
    );
}

#[tokio::test]
async fn test_import_without_update_returns_existing_unchanged() {
    let mut fx = fixture().await;

    let mut contact = Contact::new("user-1");
    contact.email = Some("jane@acme.io".to_string());
    contact.title = Some("Original Title".to_string());
    fx.contacts.create(&contact).await.unwrap();

    let mock = fx
        .server
        .mock("GET", "/people/p1")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(format!(r#"{{"person": {}}}"#, person_json("p1", "jane@acme.io")))
        .create_async()
        .await;

    let outcome = fx
        .service
        .import_contact_from_apollo("p1", "user-1", false)
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(outcome.success);
    assert!(!outcome.imported);
    assert!(!outcome.updated);

    let stored = fx.contacts.get(&contact.id).await.unwrap().unwrap();
    assert_eq!(stored.title.as_deref(), Some("Original Title"));
    assert!(stored.last_enriched_at.is_none());
}

#[tokio::test]
async fn test_import_person_without_email_fails_in_result() {
    let mut fx = fixture().await;

    let mock = fx
        .server
        .mock("GET", "/people/p1")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"person": {"id": "p1", "first_name": "Jane"}}"#)
        .expect(1)
        .create_async()
        .await;

    let outcome = fx
        .service
        .import_contact_from_apollo("p1", "user-1", true)
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("Invalid person data"));
    assert!(fx.contacts.is_empty().await);
}

#[tokio::test]
async fn test_import_from_search_scenario() {
    let mut fx = fixture().await;

    // Search must force the verified-email constraint.
    let search_mock = fx
        .server
        .mock("POST", "/mixed_people/search")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "q_keywords": "growth lead",
            "contact_email_status": ["verified"]
        })))
        .with_status(200)
        .with_body(format!(
            r#"{{"people": [{}, {}], "pagination": {{"total_entries": 2}}}}"#,
            person_json("p1", "jane@acme.io"),
            person_json("p2", "june@acme.io")
        ))
        .create_async()
        .await;

    let p1_mock = fx
        .server
        .mock("GET", "/people/p1")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(format!(r#"{{"person": {}}}"#, person_json("p1", "jane@acme.io")))
        .create_async()
        .await;
    let p2_mock = fx
        .server
        .mock("GET", "/people/p2")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(format!(r#"{{"person": {}}}"#, person_json("p2", "june@acme.io")))
        .create_async()
        .await;

    let params = PeopleSearchParams {
        q_keywords: Some("growth lead".to_string()),
        ..Default::default()
    };
    let summary = fx
        .service
        .import_contacts_from_search(&params, "user-1", 3, true)
        .await
        .unwrap();

    search_mock.assert_async().await;
    p1_mock.assert_async().await;
    p2_mock.assert_async().await;

    assert!(summary.success);
    assert_eq!(summary.imported, 2);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.contacts.len(), 2);

    for contact in &summary.contacts {
        assert_eq!(contact.source.as_deref(), Some(APOLLO_SOURCE));
    }
    assert_eq!(fx.contacts.len().await, 2);
    assert_eq!(fx.index.len().await, 2);
}

#[tokio::test]
async fn test_import_from_search_skips_unverified_people() {
    let mut fx = fixture().await;

    // One verified person, one whose email status is only guessed.
    let search_mock = fx
        .server
        .mock("POST", "/mixed_people/search")
        .with_status(200)
        .with_body(format!(
            r#"{{"people": [{}, {{"id": "p9", "email": "guess@acme.io", "email_status": "guessed"}}], "pagination": {{}}}}"#,
            person_json("p1", "jane@acme.io")
        ))
        .create_async()
        .await;

    let p1_mock = fx
        .server
        .mock("GET", "/people/p1")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(format!(r#"{{"person": {}}}"#, person_json("p1", "jane@acme.io")))
        .create_async()
        .await;

    let summary = fx
        .service
        .import_contacts_from_search(&PeopleSearchParams::default(), "user-1", 25, true)
        .await
        .unwrap();

    search_mock.assert_async().await;
    p1_mock.assert_async().await;
    assert_eq!(summary.total, 1);
    assert_eq!(summary.imported, 1);
    assert_eq!(fx.contacts.len().await, 1);
}

#[tokio::test]
async fn test_import_from_search_zero_results_is_success() {
    let mut fx = fixture().await;

    let mock = fx
        .server
        .mock("POST", "/mixed_people/search")
        .with_status(200)
        .with_body(r#"{"people": [], "pagination": {}}"#)
        .create_async()
        .await;

    let summary = fx
        .service
        .import_contacts_from_search(&PeopleSearchParams::default(), "user-1", 25, true)
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(summary.success);
    assert_eq!(summary.imported, 0);
    assert_eq!(summary.total, 0);
    assert!(summary.errors.is_empty());
}

#[tokio::test]
async fn test_import_from_search_folds_item_failures() {
    let mut fx = fixture().await;

    let search_mock = fx
        .server
        .mock("POST", "/mixed_people/search")
        .with_status(200)
        .with_body(format!(
            r#"{{"people": [{}, {}], "pagination": {{}}}}"#,
            person_json("p1", "jane@acme.io"),
            person_json("p2", "june@acme.io")
        ))
        .create_async()
        .await;

    let p1_mock = fx
        .server
        .mock("GET", "/people/p1")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(format!(r#"{{"person": {}}}"#, person_json("p1", "jane@acme.io")))
        .create_async()
        .await;
    // The second fetch fails server-side; the batch must still complete.
    let p2_mock = fx
        .server
        .mock("GET", "/people/p2")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("Internal server error")
        .create_async()
        .await;

    let summary = fx
        .service
        .import_contacts_from_search(&PeopleSearchParams::default(), "user-1", 25, true)
        .await
        .unwrap();

    search_mock.assert_async().await;
    p1_mock.assert_async().await;
    p2_mock.assert_async().await;

    assert!(summary.success);
    assert_eq!(summary.imported, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(fx.contacts.len().await, 1);
}

#[tokio::test]
async fn test_bulk_enrich_with_no_candidates() {
    let fx = fixture().await;

    // Already-enriched and emailless contacts are not candidates.
    let mut enriched = Contact::new("user-1");
    enriched.email = Some("done@acme.io".to_string());
    enriched.last_enriched_at = Some(chrono::Utc::now());
    fx.contacts.create(&enriched).await.unwrap();

    let emailless = Contact::new("user-1");
    fx.contacts.create(&emailless).await.unwrap();

    let summary = fx.service.bulk_enrich_contacts("user-1", 50).await.unwrap();

    assert!(summary.success);
    assert_eq!(summary.enriched, 0);
    assert_eq!(summary.total, 0);
}

#[tokio::test]
async fn test_bulk_enrich_stamps_candidates() {
    let mut fx = fixture().await;

    let mut contact = Contact::new("user-1");
    contact.email = Some("jane@acme.io".to_string());
    fx.contacts.create(&contact).await.unwrap();

    let mock = fx
        .server
        .mock("POST", "/mixed_people/search")
        .with_status(200)
        .with_body(format!(
            r#"{{"people": [{}], "pagination": {{}}}}"#,
            person_json("p1", "jane@acme.io")
        ))
        .create_async()
        .await;

    let summary = fx.service.bulk_enrich_contacts("user-1", 50).await.unwrap();

    mock.assert_async().await;
    assert!(summary.success);
    assert_eq!(summary.total, 1);
    assert_eq!(summary.enriched, 1);
    assert_eq!(summary.failed, 0);

    let stored = fx.contacts.get(&contact.id).await.unwrap().unwrap();
    assert!(stored.last_enriched_at.is_some());

    // Second pass finds nothing left to enrich.
    let again = fx.service.bulk_enrich_contacts("user-1", 50).await.unwrap();
    assert_eq!(again.total, 0);
}

#[tokio::test]
async fn test_get_api_usage_never_throws() {
    let mut fx = fixture().await;

    let mock = fx
        .server
        .mock("GET", "/usage")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("Internal server error")
        .create_async()
        .await;

    let snapshot = fx.service.get_api_usage().await;

    mock.assert_async().await;
    assert!(!snapshot.success);
    assert!(snapshot.usage.is_none());
    assert!(snapshot.error.is_some());
}
