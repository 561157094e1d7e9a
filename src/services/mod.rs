//! Service layer: reconciliation of Apollo records into the local store.

mod enrichment;

pub use enrichment::{
    BulkEnrichSummary, BulkImportSummary, EnrichmentOutcome, EnrichmentService, ImportOutcome,
    UsageSnapshot, DEFAULT_BULK_ENRICH_LIMIT, DEFAULT_IMPORT_LIMIT, IMPORT_CONCURRENCY,
};
