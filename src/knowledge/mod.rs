//! Knowledge base access.
//!
//! - `KnowledgeStore`: read interface over the persisted document collection
//! - `SqliteKnowledgeStore`: the on-disk implementation

mod sqlite;
mod store;

pub use sqlite::{SqliteKnowledgeStore, DATABASE_FILE};
pub use store::{DocumentSearchResult, KnowledgeDocument, KnowledgeStore};
