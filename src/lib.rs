//! Apollo enrichment service - rate-limited access to the Apollo.io
//! people/company-data API with local contact reconciliation.
//!
//! # Architecture
//!
//! - **models**: provider payloads (people, organizations) and the local Contact entity
//! - **error**: custom error types for precise error handling
//! - **config**: configuration management from environment variables
//! - **client**: rate-limited, retrying HTTP client for the Apollo API
//! - **repositories**: contact store and search index collaborators (sqlite, in-memory)
//! - **services**: enrichment/import business logic on top of the client and stores

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;

pub use client::{ApolloClient, RateLimiter};
pub use config::Config;
pub use error::{ApolloApiError, ConfigError, EnrichmentError, StoreError};
pub use models::{
    ApiUsage, Contact, ContactAttributes, IndexEntry, Organization, PeopleSearchParams, Person,
    SearchFilters, APOLLO_SOURCE,
};
pub use repositories::{
    ContactStore, MemoryContactStore, MemorySearchIndex, SearchIndexStore, SqliteStore,
};
pub use services::{
    BulkEnrichSummary, BulkImportSummary, EnrichmentOutcome, EnrichmentService, ImportOutcome,
    UsageSnapshot,
};
