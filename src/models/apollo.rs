//! Read-only payloads returned by the Apollo API.
//!
//! These records are sourced externally and never mutated locally; the
//! enrichment service copies selected fields into the local [`Contact`]
//! entity instead.
//!
//! [`Contact`]: crate::models::contact::Contact

use serde::{Deserialize, Serialize};

/// Maximum page size accepted by the Apollo search endpoints.
pub const MAX_PER_PAGE: u32 = 100;

/// Email verification status Apollo reports for deliverable addresses.
pub const EMAIL_STATUS_VERIFIED: &str = "verified";

/// A company record from the Apollo API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Organization {
    /// Apollo identifier for the organization
    pub id: String,

    /// Company name
    pub name: Option<String>,

    /// Primary website
    pub website_url: Option<String>,

    /// LinkedIn company page
    pub linkedin_url: Option<String>,

    /// Twitter profile
    pub twitter_url: Option<String>,

    /// Facebook page
    pub facebook_url: Option<String>,

    /// Main phone number
    pub phone: Option<String>,

    /// Industry classification
    pub industry: Option<String>,

    /// Estimated headcount
    pub estimated_num_employees: Option<i64>,

    /// City of the headquarters
    pub city: Option<String>,

    /// State/region of the headquarters
    pub state: Option<String>,

    /// Country of the headquarters
    pub country: Option<String>,

    /// Year the company was founded
    pub founded_year: Option<i32>,

    /// Total funding raised, in USD
    pub total_funding: Option<i64>,

    /// Date of the most recent funding round (ISO 8601)
    pub latest_funding_round_date: Option<String>,
}

/// A person record from the Apollo API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Person {
    /// Apollo identifier for the person
    pub id: String,

    /// First name
    pub first_name: Option<String>,

    /// Last name
    pub last_name: Option<String>,

    /// Full display name as reported by Apollo
    pub name: Option<String>,

    /// Email address
    pub email: Option<String>,

    /// Email verification status (e.g. "verified", "guessed", "unavailable")
    pub email_status: Option<String>,

    /// Phone number
    pub phone_number: Option<String>,

    /// Job title
    pub title: Option<String>,

    /// Seniority level (e.g. "director", "vp")
    pub seniority: Option<String>,

    /// Departments the person belongs to
    pub departments: Vec<String>,

    /// Apollo identifier of the employer
    pub organization_id: Option<String>,

    /// Embedded employer record, when Apollo includes one
    pub organization: Option<Organization>,

    /// City
    pub city: Option<String>,

    /// State/region
    pub state: Option<String>,

    /// Country
    pub country: Option<String>,

    /// LinkedIn profile URL
    pub linkedin_url: Option<String>,

    /// Twitter profile URL
    pub twitter_url: Option<String>,

    /// Facebook profile URL
    pub facebook_url: Option<String>,

    /// Profile photo URL
    pub photo_url: Option<String>,
}

impl Person {
    /// Full name, preferring Apollo's display name over first/last composition.
    pub fn full_name(&self) -> String {
        if let Some(ref name) = self.name {
            if !name.trim().is_empty() {
                return name.clone();
            }
        }
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => String::new(),
        }
    }

    /// Whether Apollo verified this person's email address.
    pub fn has_verified_email(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.is_empty())
            && self.email_status.as_deref() == Some(EMAIL_STATUS_VERIFIED)
    }

    /// Employer name from the embedded organization, if any.
    pub fn company_name(&self) -> Option<&str> {
        self.organization.as_ref().and_then(|o| o.name.as_deref())
    }
}

/// Pagination metadata shared by the Apollo search endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Pagination {
    /// Current page number (1-based)
    pub page: u32,

    /// Number of items per page
    pub per_page: u32,

    /// Total number of matching items
    pub total_entries: u64,

    /// Total number of pages
    pub total_pages: u32,
}

/// Response payload from the people search endpoint.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PeopleSearchResponse {
    /// Matching people
    pub people: Vec<Person>,

    /// Pagination metadata
    pub pagination: Pagination,
}

/// Response payload from the organization search endpoint.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct OrganizationSearchResponse {
    /// Matching organizations
    pub organizations: Vec<Organization>,

    /// Pagination metadata
    pub pagination: Pagination,
}

/// Revenue range predicate for organization filters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RevenueRange {
    /// Minimum annual revenue, in USD
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<u64>,

    /// Maximum annual revenue, in USD
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u64>,
}

/// Search predicates accepted by the Apollo people search endpoint.
///
/// Well-known keys get typed fields; anything else passes through verbatim
/// via the flattened `additional` map, so new provider predicates can be used
/// without a code change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SearchFilters {
    /// Job title predicates
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub person_titles: Vec<String>,

    /// Seniority predicates
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub person_seniorities: Vec<String>,

    /// Person location predicates
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub person_locations: Vec<String>,

    /// Employer location predicates
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub organization_locations: Vec<String>,

    /// Employer headcount ranges (e.g. "11,50")
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub organization_num_employees_ranges: Vec<String>,

    /// Employer annual revenue range
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_range: Option<RevenueRange>,

    /// Email verification status predicates (e.g. "verified")
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contact_email_status: Vec<String>,

    /// Provider predicates without a typed field; serialized verbatim
    #[serde(flatten)]
    pub additional: serde_json::Map<String, serde_json::Value>,
}

/// Parameters for a people search call.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PeopleSearchParams {
    /// Free-text keyword query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q_keywords: Option<String>,

    /// Page number (1-based)
    pub page: u32,

    /// Page size, clamped to the provider maximum by the client
    pub per_page: u32,

    /// Structured search predicates, flattened into the request body
    #[serde(flatten)]
    pub filters: SearchFilters,
}

impl Default for PeopleSearchParams {
    fn default() -> Self {
        Self {
            q_keywords: None,
            page: 1,
            per_page: 25,
            filters: SearchFilters::default(),
        }
    }
}

/// Point-in-time snapshot of the provider quota. Read on demand, never persisted.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ApiUsage {
    /// Total requests allowed in the current period
    pub quota: Option<i64>,

    /// Requests consumed so far
    pub used: Option<i64>,

    /// Requests remaining
    pub remaining: Option<i64>,

    /// When the quota resets (ISO 8601)
    pub resets_at: Option<String>,
}
