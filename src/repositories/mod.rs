//! Local persistence collaborators: the contact store and the search index.

mod memory;
mod sqlite;
mod traits;

pub use memory::{MemoryContactStore, MemorySearchIndex};
pub use sqlite::SqliteStore;
pub use traits::{ContactStore, SearchIndexStore};
