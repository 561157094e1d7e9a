//! In-memory store implementations, used by tests and demos.

use crate::error::{StoreError, StoreResult};
use crate::models::{Contact, IndexEntry};
use crate::repositories::{ContactStore, SearchIndexStore};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory contact store keyed by contact id.
#[derive(Default)]
pub struct MemoryContactStore {
    contacts: RwLock<HashMap<String, Contact>>,
}

impl MemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored contacts (test helper).
    pub async fn len(&self) -> usize {
        self.contacts.read().await.len()
    }

    /// Whether the store is empty (test helper).
    pub async fn is_empty(&self) -> bool {
        self.contacts.read().await.is_empty()
    }
}

#[async_trait]
impl ContactStore for MemoryContactStore {
    async fn create(&self, contact: &Contact) -> StoreResult<Contact> {
        let mut contacts = self.contacts.write().await;
        if contacts.contains_key(&contact.id) {
            return Err(StoreError::Database(format!(
                "duplicate contact id: {}",
                contact.id
            )));
        }
        contacts.insert(contact.id.clone(), contact.clone());
        Ok(contact.clone())
    }

    async fn update(&self, contact: &Contact) -> StoreResult<Contact> {
        let mut contacts = self.contacts.write().await;
        if !contacts.contains_key(&contact.id) {
            return Err(StoreError::NotFound(contact.id.clone()));
        }
        contacts.insert(contact.id.clone(), contact.clone());
        Ok(contact.clone())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Contact>> {
        Ok(self.contacts.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str, user_id: &str) -> StoreResult<Option<Contact>> {
        let contacts = self.contacts.read().await;
        Ok(contacts
            .values()
            .find(|c| {
                c.user_id == user_id
                    && c.email
                        .as_deref()
                        .is_some_and(|e| e.eq_ignore_ascii_case(email))
            })
            .cloned())
    }

    async fn find_unenriched(&self, user_id: &str, limit: usize) -> StoreResult<Vec<Contact>> {
        let contacts = self.contacts.read().await;
        let mut candidates: Vec<Contact> = contacts
            .values()
            .filter(|c| {
                c.user_id == user_id
                    && c.last_enriched_at.is_none()
                    && c.email.as_deref().is_some_and(|e| !e.is_empty())
            })
            .cloned()
            .collect();
        candidates.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        candidates.truncate(limit);
        Ok(candidates)
    }
}

/// In-memory search index keyed by contact id.
#[derive(Default)]
pub struct MemorySearchIndex {
    entries: RwLock<HashMap<String, IndexEntry>>,
}

impl MemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed documents (test helper).
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the index is empty (test helper).
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SearchIndexStore for MemorySearchIndex {
    async fn add_document(&self, entry: &IndexEntry) -> StoreResult<()> {
        self.entries
            .write()
            .await
            .insert(entry.contact_id.clone(), entry.clone());
        Ok(())
    }

    async fn update_document(&self, entry: &IndexEntry) -> StoreResult<()> {
        // Upsert: the index is a derived view, a missed add is repaired here.
        self.entries
            .write()
            .await
            .insert(entry.contact_id.clone(), entry.clone());
        Ok(())
    }

    async fn get_document(&self, contact_id: &str) -> StoreResult<Option<IndexEntry>> {
        Ok(self.entries.read().await.get(contact_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryContactStore::new();
        let mut contact = Contact::new("user-1");
        contact.email = Some("a@b.c".to_string());

        store.create(&contact).await.unwrap();
        let fetched = store.get(&contact.id).await.unwrap().unwrap();
        assert_eq!(fetched.email.as_deref(), Some("a@b.c"));
    }

    #[tokio::test]
    async fn test_create_duplicate_id_rejected() {
        let store = MemoryContactStore::new();
        let contact = Contact::new("user-1");

        store.create(&contact).await.unwrap();
        assert!(store.create(&contact).await.is_err());
    }

    #[tokio::test]
    async fn test_update_missing_contact() {
        let store = MemoryContactStore::new();
        let contact = Contact::new("user-1");

        let result = store.update(&contact).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_by_email_scoped_to_user() {
        let store = MemoryContactStore::new();
        let mut contact = Contact::new("user-1");
        contact.email = Some("Jane@Acme.io".to_string());
        store.create(&contact).await.unwrap();

        let found = store.find_by_email("jane@acme.io", "user-1").await.unwrap();
        assert!(found.is_some());

        let other_user = store.find_by_email("jane@acme.io", "user-2").await.unwrap();
        assert!(other_user.is_none());
    }

    #[tokio::test]
    async fn test_find_unenriched_filters_and_limits() {
        let store = MemoryContactStore::new();

        let mut eligible = Contact::new("user-1");
        eligible.email = Some("new@acme.io".to_string());
        store.create(&eligible).await.unwrap();

        let mut enriched = Contact::new("user-1");
        enriched.email = Some("done@acme.io".to_string());
        enriched.last_enriched_at = Some(chrono::Utc::now());
        store.create(&enriched).await.unwrap();

        let emailless = Contact::new("user-1");
        store.create(&emailless).await.unwrap();

        let candidates = store.find_unenriched("user-1", 10).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, eligible.id);

        let limited = store.find_unenriched("user-1", 0).await.unwrap();
        assert!(limited.is_empty());
    }

    #[tokio::test]
    async fn test_index_add_and_update() {
        let index = MemorySearchIndex::new();
        let mut contact = Contact::new("user-1");
        contact.first_name = Some("Jane".to_string());

        index.add_document(&contact.index_entry()).await.unwrap();
        assert_eq!(index.len().await, 1);

        contact.company = Some("Acme".to_string());
        index.update_document(&contact.index_entry()).await.unwrap();

        let entry = index.get_document(&contact.id).await.unwrap().unwrap();
        assert!(entry.content.contains("Acme"));
        assert_eq!(index.len().await, 1);
    }
}
