use crate::error::StoreResult;
use crate::models::{Contact, IndexEntry};
use async_trait::async_trait;

/// Storage for local contacts.
///
/// Provides abstraction over the relational store, enabling different
/// implementations (sqlite, in-memory for tests).
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Persist a new contact.
    async fn create(&self, contact: &Contact) -> StoreResult<Contact>;

    /// Update an existing contact by id.
    async fn update(&self, contact: &Contact) -> StoreResult<Contact>;

    /// Retrieve a contact by id.
    async fn get(&self, id: &str) -> StoreResult<Option<Contact>>;

    /// Find the contact with the given email owned by `user_id`, if any.
    /// Email is unique per owning user.
    async fn find_by_email(&self, email: &str, user_id: &str) -> StoreResult<Option<Contact>>;

    /// Find up to `limit` contacts owned by `user_id` that have never been
    /// enriched and have a non-empty email.
    async fn find_unenriched(&self, user_id: &str, limit: usize) -> StoreResult<Vec<Contact>>;
}

/// Storage for the denormalized text-search index, one entry per contact.
///
/// The index is a derived, eventually-consistent view; it is never consulted
/// as a source of truth.
#[async_trait]
pub trait SearchIndexStore: Send + Sync {
    /// Add the index entry for a newly created contact.
    async fn add_document(&self, entry: &IndexEntry) -> StoreResult<()>;

    /// Refresh the index entry after the contact's searchable fields changed.
    async fn update_document(&self, entry: &IndexEntry) -> StoreResult<()>;

    /// Fetch the index entry for a contact, if present.
    async fn get_document(&self, contact_id: &str) -> StoreResult<Option<IndexEntry>>;
}
