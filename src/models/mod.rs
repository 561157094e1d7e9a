//! Data models for the Apollo enrichment service.

pub mod apollo;
pub mod contact;

pub use apollo::{
    ApiUsage, Organization, OrganizationSearchResponse, Pagination, PeopleSearchParams,
    PeopleSearchResponse, Person, RevenueRange, SearchFilters,
};
pub use contact::{Contact, ContactAttributes, IndexEntry, APOLLO_SOURCE};
