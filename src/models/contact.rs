//! Local contact entity and its derived search-index entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance tag for contacts derived from Apollo records.
pub const APOLLO_SOURCE: &str = "APOLLO";

/// Extensible attribute bag for contact fields without a fixed column.
///
/// Well-known keys get typed fields; everything else lives in the flattened
/// `additional` map. Merging never replaces a populated value with an empty one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ContactAttributes {
    /// Employer headcount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_size: Option<i64>,

    /// Seniority level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seniority: Option<String>,

    /// Primary department
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    /// Employer founding year
    #[serde(skip_serializing_if = "Option::is_none")]
    pub founded_year: Option<i32>,

    /// Attributes without a typed field
    #[serde(flatten)]
    pub additional: serde_json::Map<String, serde_json::Value>,
}

impl ContactAttributes {
    /// Merge `other` into `self`, taking incoming values only when present.
    ///
    /// Existing entries are never erased; `additional` keys from `other`
    /// overwrite same-named keys but leave the rest intact.
    pub fn merge(&mut self, other: &ContactAttributes) {
        if other.company_size.is_some() {
            self.company_size = other.company_size;
        }
        if let Some(ref seniority) = other.seniority {
            if !seniority.is_empty() {
                self.seniority = Some(seniority.clone());
            }
        }
        if let Some(ref department) = other.department {
            if !department.is_empty() {
                self.department = Some(department.clone());
            }
        }
        if other.founded_year.is_some() {
            self.founded_year = other.founded_year;
        }
        for (key, value) in &other.additional {
            self.additional.insert(key.clone(), value.clone());
        }
    }

    /// Whether the bag carries no data at all.
    pub fn is_empty(&self) -> bool {
        self.company_size.is_none()
            && self.seniority.is_none()
            && self.department.is_none()
            && self.founded_year.is_none()
            && self.additional.is_empty()
    }
}

/// A contact in the local CRM store.
///
/// The durable local unit: created by explicit user action or import, updated
/// by enrichment, never auto-deleted by this subsystem. Owned by exactly one
/// user; email is unique per owning user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Contact {
    /// Unique identifier (UUID)
    pub id: String,

    /// Owning user account
    pub user_id: String,

    /// First name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    /// Last name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    /// Email address (unique per owning user)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Company name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    /// Job title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Industry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,

    /// City
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    /// State/region
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Country
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// Website URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// LinkedIn profile URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,

    /// Twitter profile URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_url: Option<String>,

    /// Facebook profile URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook_url: Option<String>,

    /// Provenance tag (e.g. "APOLLO")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Identifier of the external record this contact was derived from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,

    /// When the contact was last enriched; unset for never-enriched contacts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_enriched_at: Option<DateTime<Utc>>,

    /// Extensible attribute bag
    pub attributes: ContactAttributes,

    /// When the contact was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// When the contact was last updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Contact {
    /// Create a new contact owned by `user_id` with a fresh UUID.
    pub fn new(user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            created_at: Some(now),
            updated_at: Some(now),
            ..Default::default()
        }
    }

    /// Full display name assembled from first and last name.
    pub fn full_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => String::new(),
        }
    }

    /// Build the denormalized search-index entry for this contact.
    ///
    /// Every contact created or enriched through this subsystem must have a
    /// matching entry; the index is a derived view, never a source of truth.
    pub fn index_entry(&self) -> IndexEntry {
        let mut parts = vec![self.full_name()];
        if let Some(ref email) = self.email {
            parts.push(email.clone());
        }
        if let Some(ref company) = self.company {
            parts.push(company.clone());
        }
        if let Some(ref title) = self.title {
            parts.push(title.clone());
        }
        parts.retain(|p| !p.is_empty());

        IndexEntry {
            contact_id: self.id.clone(),
            user_id: self.user_id.clone(),
            content: parts.join(" "),
            enriched: self.last_enriched_at.is_some(),
            updated_at: Utc::now(),
        }
    }
}

/// A denormalized text-search index entry, one per contact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    /// The contact this entry belongs to
    pub contact_id: String,

    /// Owning user account
    pub user_id: String,

    /// Searchable text blob (name + email + company + title)
    pub content: String,

    /// Whether the contact has been enriched
    pub enriched: bool,

    /// When the entry was last refreshed
    pub updated_at: DateTime<Utc>,
}
