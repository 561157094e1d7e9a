//! Contact enrichment and import against the Apollo API.
//!
//! Business rules live here: merge-if-present field mapping (partial provider
//! data never overwrites populated local fields with emptiness), idempotent
//! upsert keyed by (email, user), and the synchronous index refresh that
//! follows every contact write. Batch operations fold per-item failures into
//! the aggregate instead of throwing.

use crate::client::ApolloClient;
use crate::error::{EnrichmentResult, StoreError};
use crate::models::apollo::{PeopleSearchParams, Person, EMAIL_STATUS_VERIFIED};
use crate::models::{ApiUsage, Contact, ContactAttributes, APOLLO_SOURCE};
use crate::repositories::{ContactStore, SearchIndexStore};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;

/// Concurrent imports/enrichments per batch, nested inside the global limiter.
pub const IMPORT_CONCURRENCY: usize = 5;

/// Default cap on contacts imported from one search.
pub const DEFAULT_IMPORT_LIMIT: usize = 25;

/// Default cap on contacts enriched in one bulk pass.
pub const DEFAULT_BULK_ENRICH_LIMIT: usize = 50;

/// Result of a single enrichment attempt.
///
/// An enrichment miss (no person found for the email) is an expected outcome,
/// reported as `success: false` rather than an error.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentOutcome {
    /// Whether a matching person was found
    pub success: bool,

    /// Whether a local contact was updated
    pub enriched: bool,

    /// The provider record, when one was found
    pub person: Option<Person>,

    /// The updated contact, when one was written
    pub contact: Option<Contact>,
}

/// Result of a single import attempt.
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    /// Whether the import produced (or confirmed) a local contact
    pub success: bool,

    /// Whether a new contact was created
    pub imported: bool,

    /// Whether an existing contact was updated
    pub updated: bool,

    /// The resulting contact
    pub contact: Option<Contact>,

    /// Failure description when `success` is false
    pub error: Option<String>,
}

/// Aggregate result of importing contacts from a search.
///
/// Ordering of `contacts` and `errors` does not match the input ordering.
#[derive(Debug, Default)]
pub struct BulkImportSummary {
    /// Whether the batch itself ran (per-item failures don't clear this)
    pub success: bool,

    /// Newly created contacts
    pub imported: usize,

    /// Updated existing contacts
    pub updated: usize,

    /// Items that failed
    pub failed: usize,

    /// People considered
    pub total: usize,

    /// Resulting contacts
    pub contacts: Vec<Contact>,

    /// One entry per failed item
    pub errors: Vec<String>,
}

/// Aggregate result of a bulk enrichment pass.
#[derive(Debug, Default)]
pub struct BulkEnrichSummary {
    /// Whether the batch itself ran
    pub success: bool,

    /// Contacts enriched
    pub enriched: usize,

    /// Contacts that failed or had no provider match
    pub failed: usize,

    /// Candidates considered
    pub total: usize,

    /// One entry per failed item
    pub errors: Vec<String>,
}

/// Non-throwing quota snapshot. Diagnostic only.
#[derive(Debug, Clone, Default)]
pub struct UsageSnapshot {
    /// Whether the snapshot was retrieved
    pub success: bool,

    /// The quota figures, when retrieved
    pub usage: Option<ApiUsage>,

    /// Failure description when `success` is false
    pub error: Option<String>,
}

/// Reconciles Apollo person records into the local contact store and
/// search index.
pub struct EnrichmentService {
    client: Arc<ApolloClient>,
    contacts: Arc<dyn ContactStore>,
    index: Arc<dyn SearchIndexStore>,
}

impl EnrichmentService {
    /// Create a new enrichment service.
    pub fn new(
        client: Arc<ApolloClient>,
        contacts: Arc<dyn ContactStore>,
        index: Arc<dyn SearchIndexStore>,
    ) -> Self {
        Self {
            client,
            contacts,
            index,
        }
    }

    /// Look up a person by email and optionally enrich a local contact.
    ///
    /// Without `contact_id`/`user_id` this is preview mode: the provider
    /// record is returned untouched and local storage is never consulted.
    /// With both, every mapped field is set only when the provider supplied a
    /// non-empty value, `last_enriched_at` is stamped, provenance is set, the
    /// attribute bag is merged, and the index entry is refreshed as part of
    /// the same logical operation.
    pub async fn enrich_contact_data(
        &self,
        email: &str,
        contact_id: Option<&str>,
        user_id: Option<&str>,
    ) -> EnrichmentResult<EnrichmentOutcome> {
        let params = PeopleSearchParams {
            q_keywords: Some(email.to_string()),
            page: 1,
            per_page: 1,
            ..Default::default()
        };

        let response = self.client.search_people(&params).await?;
        let person = match response.people.into_iter().next() {
            Some(person) => person,
            None => {
                tracing::debug!(email, "no Apollo match for email");
                return Ok(EnrichmentOutcome::default());
            }
        };

        let (contact_id, user_id) = match (contact_id, user_id) {
            (Some(contact_id), Some(user_id)) => (contact_id, user_id),
            _ => {
                // Preview mode: surface the provider record without writing.
                return Ok(EnrichmentOutcome {
                    success: true,
                    enriched: false,
                    person: Some(person),
                    contact: None,
                });
            }
        };

        let mut contact = self
            .contacts
            .get(contact_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(contact_id.to_string()))?;

        if contact.user_id != user_id {
            return Err(StoreError::NotFound(contact_id.to_string()).into());
        }

        apply_person(&mut contact, &person);
        let contact = self.contacts.update(&contact).await?;
        // The index refresh belongs to the same logical operation as the
        // contact write; it must not be silently skipped.
        self.index.update_document(&contact.index_entry()).await?;

        tracing::debug!(contact_id, person_id = %person.id, "contact enriched");
        Ok(EnrichmentOutcome {
            success: true,
            enriched: true,
            person: Some(person),
            contact: Some(contact),
        })
    }

    /// Import one Apollo person as a local contact, idempotently.
    ///
    /// The upsert key is (email, user). A person without an email is invalid
    /// data: the outcome carries `success: false` instead of an error, and no
    /// retry is attempted. Provider fetch failures still propagate as errors.
    pub async fn import_contact_from_apollo(
        &self,
        person_id: &str,
        user_id: &str,
        update_if_exists: bool,
    ) -> EnrichmentResult<ImportOutcome> {
        let person = self.client.get_person(person_id).await?;

        let email = match person.email.as_deref().filter(|e| !e.is_empty()) {
            Some(email) => email.to_string(),
            None => {
                tracing::warn!(person_id, "Apollo person has no email, skipping import");
                return Ok(ImportOutcome {
                    success: false,
                    error: Some("Invalid person data".to_string()),
                    ..Default::default()
                });
            }
        };

        match self.contacts.find_by_email(&email, user_id).await? {
            Some(existing) if !update_if_exists => {
                tracing::debug!(person_id, contact_id = %existing.id, "contact exists, left unchanged");
                Ok(ImportOutcome {
                    success: true,
                    imported: false,
                    updated: false,
                    contact: Some(existing),
                    error: None,
                })
            }
            Some(mut existing) => {
                apply_person(&mut existing, &person);
                let contact = self.contacts.update(&existing).await?;
                self.index.update_document(&contact.index_entry()).await?;

                tracing::debug!(person_id, contact_id = %contact.id, "existing contact updated");
                Ok(ImportOutcome {
                    success: true,
                    imported: false,
                    updated: true,
                    contact: Some(contact),
                    error: None,
                })
            }
            None => {
                let mut contact = Contact::new(user_id);
                apply_person(&mut contact, &person);
                let contact = self.contacts.create(&contact).await?;
                self.index.add_document(&contact.index_entry()).await?;

                tracing::debug!(person_id, contact_id = %contact.id, "contact imported");
                Ok(ImportOutcome {
                    success: true,
                    imported: true,
                    updated: false,
                    contact: Some(contact),
                    error: None,
                })
            }
        }
    }

    /// Search Apollo and import every verified-email match, up to `limit`.
    ///
    /// Runs the single-import primitive for each person under a bounded
    /// concurrency window. Only a failure of the initial search propagates;
    /// per-item failures are folded into the summary. A zero-result search is
    /// a success with `imported == 0`.
    pub async fn import_contacts_from_search(
        &self,
        params: &PeopleSearchParams,
        user_id: &str,
        limit: usize,
        update_if_exists: bool,
    ) -> EnrichmentResult<BulkImportSummary> {
        let mut params = params.clone();
        params.per_page = limit.clamp(1, 100) as u32;
        // Never import unverified contact channels.
        params.filters.contact_email_status = vec![EMAIL_STATUS_VERIFIED.to_string()];

        let response = self.client.search_people(&params).await?;
        let people: Vec<Person> = response
            .people
            .into_iter()
            .filter(Person::has_verified_email)
            .take(limit)
            .collect();

        let mut summary = BulkImportSummary {
            success: true,
            total: people.len(),
            ..Default::default()
        };
        if people.is_empty() {
            tracing::debug!(user_id, "search returned no importable people");
            return Ok(summary);
        }

        let results: Vec<_> = stream::iter(people)
            .map(|person| async move {
                self.import_contact_from_apollo(&person.id, user_id, update_if_exists)
                    .await
            })
            .buffer_unordered(IMPORT_CONCURRENCY)
            .collect()
            .await;

        for result in results {
            match result {
                Ok(outcome) if outcome.success => {
                    if outcome.imported {
                        summary.imported += 1;
                    } else if outcome.updated {
                        summary.updated += 1;
                    }
                    if let Some(contact) = outcome.contact {
                        summary.contacts.push(contact);
                    }
                }
                Ok(outcome) => {
                    summary.failed += 1;
                    summary
                        .errors
                        .push(outcome.error.unwrap_or_else(|| "Import failed".to_string()));
                }
                Err(err) => {
                    summary.failed += 1;
                    summary.errors.push(err.to_string());
                }
            }
        }

        tracing::info!(
            user_id,
            imported = summary.imported,
            updated = summary.updated,
            failed = summary.failed,
            "bulk import finished"
        );
        Ok(summary)
    }

    /// Enrich up to `limit` never-enriched contacts owned by `user_id`.
    ///
    /// Candidates are contacts with no `last_enriched_at` and a non-empty
    /// email. No candidates is a success with `enriched == 0`.
    pub async fn bulk_enrich_contacts(
        &self,
        user_id: &str,
        limit: usize,
    ) -> EnrichmentResult<BulkEnrichSummary> {
        let candidates = self.contacts.find_unenriched(user_id, limit).await?;

        let mut summary = BulkEnrichSummary {
            success: true,
            total: candidates.len(),
            ..Default::default()
        };
        if candidates.is_empty() {
            tracing::debug!(user_id, "no enrichment candidates");
            return Ok(summary);
        }

        let results: Vec<_> = stream::iter(candidates)
            .map(|contact| async move {
                let email = contact.email.clone().unwrap_or_default();
                let outcome = self
                    .enrich_contact_data(&email, Some(&contact.id), Some(user_id))
                    .await;
                (email, outcome)
            })
            .buffer_unordered(IMPORT_CONCURRENCY)
            .collect()
            .await;

        for (email, result) in results {
            match result {
                Ok(outcome) if outcome.enriched => summary.enriched += 1,
                Ok(_) => {
                    // Enrichment miss: expected, but still reported per item.
                    summary.failed += 1;
                    summary.errors.push(format!("No Apollo match for {}", email));
                }
                Err(err) => {
                    summary.failed += 1;
                    summary.errors.push(err.to_string());
                }
            }
        }

        tracing::info!(
            user_id,
            enriched = summary.enriched,
            failed = summary.failed,
            "bulk enrichment finished"
        );
        Ok(summary)
    }

    /// Current provider quota, as a non-throwing diagnostic result.
    pub async fn get_api_usage(&self) -> UsageSnapshot {
        match self.client.get_api_usage().await {
            Ok(usage) => UsageSnapshot {
                success: true,
                usage: Some(usage),
                error: None,
            },
            Err(err) => {
                tracing::warn!("failed to read Apollo usage: {}", err);
                UsageSnapshot {
                    success: false,
                    usage: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }
}

/// Copy provider fields onto a contact, merge-if-present, and stamp provenance.
///
/// A populated local field is never overwritten with an empty provider value.
fn apply_person(contact: &mut Contact, person: &Person) {
    merge_text(&mut contact.first_name, person.first_name.as_deref());
    merge_text(&mut contact.last_name, person.last_name.as_deref());
    merge_text(&mut contact.email, person.email.as_deref());
    merge_text(&mut contact.phone, person.phone_number.as_deref());
    merge_text(&mut contact.title, person.title.as_deref());
    merge_text(&mut contact.city, person.city.as_deref());
    merge_text(&mut contact.state, person.state.as_deref());
    merge_text(&mut contact.country, person.country.as_deref());
    merge_text(&mut contact.linkedin_url, person.linkedin_url.as_deref());
    merge_text(&mut contact.twitter_url, person.twitter_url.as_deref());
    merge_text(&mut contact.facebook_url, person.facebook_url.as_deref());

    let organization = person.organization.as_ref();
    merge_text(&mut contact.company, person.company_name());
    if let Some(org) = organization {
        merge_text(&mut contact.industry, org.industry.as_deref());
        merge_text(&mut contact.website, org.website_url.as_deref());
        if contact.phone.is_none() {
            merge_text(&mut contact.phone, org.phone.as_deref());
        }
    }

    contact.attributes.merge(&person_attributes(person));

    let now = Utc::now();
    contact.source = Some(APOLLO_SOURCE.to_string());
    contact.source_id = Some(person.id.clone());
    contact.last_enriched_at = Some(now);
    contact.updated_at = Some(now);
}

/// Secondary fields that land in the extensible attribute bag.
fn person_attributes(person: &Person) -> ContactAttributes {
    let organization = person.organization.as_ref();
    ContactAttributes {
        company_size: organization.and_then(|o| o.estimated_num_employees),
        seniority: person.seniority.clone().filter(|s| !s.is_empty()),
        department: person.departments.first().cloned().filter(|d| !d.is_empty()),
        founded_year: organization.and_then(|o| o.founded_year),
        additional: Default::default(),
    }
}

/// Set `field` only when the provider supplied a non-empty value.
fn merge_text(field: &mut Option<String>, value: Option<&str>) {
    if let Some(value) = value {
        if !value.trim().is_empty() {
            *field = Some(value.to_string());
        }
    }
}
