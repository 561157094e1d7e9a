//! Sqlite-backed store for contacts and the search index.
//!
//! One connection serves both collaborators; the attribute bag is stored as a
//! JSON column since its keys have no fixed schema.

use crate::error::{StoreError, StoreResult};
use crate::models::{Contact, ContactAttributes, IndexEntry};
use crate::repositories::{ContactStore, SearchIndexStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS contacts (
    id               TEXT PRIMARY KEY,
    user_id          TEXT NOT NULL,
    first_name       TEXT,
    last_name        TEXT,
    email            TEXT,
    phone            TEXT,
    company          TEXT,
    title            TEXT,
    industry         TEXT,
    city             TEXT,
    state            TEXT,
    country          TEXT,
    website          TEXT,
    linkedin_url     TEXT,
    twitter_url      TEXT,
    facebook_url     TEXT,
    source           TEXT,
    source_id        TEXT,
    last_enriched_at TEXT,
    attributes       TEXT NOT NULL DEFAULT '{}',
    created_at       TEXT,
    updated_at       TEXT
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_contacts_user_email
    ON contacts(user_id, email) WHERE email IS NOT NULL;

CREATE TABLE IF NOT EXISTS contact_index (
    contact_id TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL,
    content    TEXT NOT NULL,
    enriched   INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);
";

const CONTACT_COLUMNS: &str = "id, user_id, first_name, last_name, email, phone, company, title, \
     industry, city, state, country, website, linkedin_url, twitter_url, facebook_url, \
     source, source_id, last_enriched_at, attributes, created_at, updated_at";

/// Sqlite store implementing both persistence collaborators.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory store (tests, demos).
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection mutex poisoned".to_string()))
    }
}

/// Map a row into a Contact, with the attribute bag still as raw JSON.
fn map_contact(row: &Row<'_>) -> rusqlite::Result<(Contact, String)> {
    let contact = Contact {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        company: row.get("company")?,
        title: row.get("title")?,
        industry: row.get("industry")?,
        city: row.get("city")?,
        state: row.get("state")?,
        country: row.get("country")?,
        website: row.get("website")?,
        linkedin_url: row.get("linkedin_url")?,
        twitter_url: row.get("twitter_url")?,
        facebook_url: row.get("facebook_url")?,
        source: row.get("source")?,
        source_id: row.get("source_id")?,
        last_enriched_at: row.get("last_enriched_at")?,
        attributes: ContactAttributes::default(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    let attributes: String = row.get("attributes")?;
    Ok((contact, attributes))
}

fn finish_contact((mut contact, attributes): (Contact, String)) -> StoreResult<Contact> {
    contact.attributes = serde_json::from_str(&attributes)?;
    Ok(contact)
}

#[async_trait]
impl ContactStore for SqliteStore {
    async fn create(&self, contact: &Contact) -> StoreResult<Contact> {
        let attributes = serde_json::to_string(&contact.attributes)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO contacts (id, user_id, first_name, last_name, email, phone, company, \
             title, industry, city, state, country, website, linkedin_url, twitter_url, \
             facebook_url, source, source_id, last_enriched_at, attributes, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, \
             ?18, ?19, ?20, ?21, ?22)",
            params![
                contact.id,
                contact.user_id,
                contact.first_name,
                contact.last_name,
                contact.email,
                contact.phone,
                contact.company,
                contact.title,
                contact.industry,
                contact.city,
                contact.state,
                contact.country,
                contact.website,
                contact.linkedin_url,
                contact.twitter_url,
                contact.facebook_url,
                contact.source,
                contact.source_id,
                contact.last_enriched_at,
                attributes,
                contact.created_at,
                contact.updated_at,
            ],
        )?;
        Ok(contact.clone())
    }

    async fn update(&self, contact: &Contact) -> StoreResult<Contact> {
        let attributes = serde_json::to_string(&contact.attributes)?;
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE contacts SET user_id = ?2, first_name = ?3, last_name = ?4, email = ?5, \
             phone = ?6, company = ?7, title = ?8, industry = ?9, city = ?10, state = ?11, \
             country = ?12, website = ?13, linkedin_url = ?14, twitter_url = ?15, \
             facebook_url = ?16, source = ?17, source_id = ?18, last_enriched_at = ?19, \
             attributes = ?20, created_at = ?21, updated_at = ?22 WHERE id = ?1",
            params![
                contact.id,
                contact.user_id,
                contact.first_name,
                contact.last_name,
                contact.email,
                contact.phone,
                contact.company,
                contact.title,
                contact.industry,
                contact.city,
                contact.state,
                contact.country,
                contact.website,
                contact.linkedin_url,
                contact.twitter_url,
                contact.facebook_url,
                contact.source,
                contact.source_id,
                contact.last_enriched_at,
                attributes,
                contact.created_at,
                contact.updated_at,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(contact.id.clone()));
        }
        Ok(contact.clone())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Contact>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM contacts WHERE id = ?1", CONTACT_COLUMNS),
                params![id],
                map_contact,
            )
            .optional()?;
        row.map(finish_contact).transpose()
    }

    async fn find_by_email(&self, email: &str, user_id: &str) -> StoreResult<Option<Contact>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM contacts WHERE user_id = ?1 AND email = ?2 COLLATE NOCASE",
                    CONTACT_COLUMNS
                ),
                params![user_id, email],
                map_contact,
            )
            .optional()?;
        row.map(finish_contact).transpose()
    }

    async fn find_unenriched(&self, user_id: &str, limit: usize) -> StoreResult<Vec<Contact>> {
        let conn = self.lock()?;
        let mut statement = conn.prepare(&format!(
            "SELECT {} FROM contacts WHERE user_id = ?1 AND last_enriched_at IS NULL \
             AND email IS NOT NULL AND email != '' ORDER BY created_at LIMIT ?2",
            CONTACT_COLUMNS
        ))?;
        let rows = statement.query_map(params![user_id, limit as i64], map_contact)?;

        let mut contacts = Vec::new();
        for row in rows {
            contacts.push(finish_contact(row?)?);
        }
        Ok(contacts)
    }
}

#[async_trait]
impl SearchIndexStore for SqliteStore {
    async fn add_document(&self, entry: &IndexEntry) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO contact_index (contact_id, user_id, content, enriched, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(contact_id) DO UPDATE SET \
             content = excluded.content, enriched = excluded.enriched, \
             updated_at = excluded.updated_at",
            params![
                entry.contact_id,
                entry.user_id,
                entry.content,
                entry.enriched,
                entry.updated_at,
            ],
        )?;
        Ok(())
    }

    async fn update_document(&self, entry: &IndexEntry) -> StoreResult<()> {
        // Same upsert as add: the index is a derived view.
        self.add_document(entry).await
    }

    async fn get_document(&self, contact_id: &str) -> StoreResult<Option<IndexEntry>> {
        let conn = self.lock()?;
        let entry = conn
            .query_row(
                "SELECT contact_id, user_id, content, enriched, updated_at \
                 FROM contact_index WHERE contact_id = ?1",
                params![contact_id],
                |row| {
                    Ok(IndexEntry {
                        contact_id: row.get(0)?,
                        user_id: row.get(1)?,
                        content: row.get(2)?,
                        enriched: row.get(3)?,
                        updated_at: row.get::<_, DateTime<Utc>>(4)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }
}
