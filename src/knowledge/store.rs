//! KnowledgeStore trait: read interface over the persisted document
//! collection the answering agent retrieves from.
//!
//! The primary implementation is `SqliteKnowledgeStore` in the `sqlite`
//! module. The collection is populated by an external ingestion step; the
//! assistant itself only reads it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::ApiError;

/// A stored document chunk with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    /// Unique identifier within the collection.
    pub doc_id: String,
    /// The text content of the chunk.
    pub content: String,
    /// Optional metadata (JSON), e.g. `document_name`, `page_label`, `url`.
    pub metadata: Option<Value>,
}

impl KnowledgeDocument {
    pub fn document_name(&self) -> Option<String> {
        self.metadata_string(&["document_name", "file_name", "source"])
    }

    pub fn page_label(&self) -> Option<String> {
        self.metadata_string(&["page_label", "page"])
    }

    pub fn url(&self) -> Option<String> {
        self.metadata_string(&["url"])
    }

    fn metadata_string(&self, keys: &[&str]) -> Option<String> {
        let metadata = self.metadata.as_ref()?;
        keys.iter().find_map(|key| match metadata.get(*key) {
            Some(Value::String(text)) if !text.trim().is_empty() => Some(text.clone()),
            Some(Value::Number(number)) => Some(number.to_string()),
            _ => None,
        })
    }
}

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSearchResult {
    pub document: KnowledgeDocument,
    /// Similarity score (higher = better).
    pub score: f32,
}

#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Name of the collection this handle is bound to.
    fn collection(&self) -> &str;

    /// Names of every collection in the store.
    async fn list_collections(&self) -> Result<Vec<String>, ApiError>;

    /// Number of documents in the bound collection.
    async fn count(&self) -> Result<usize, ApiError>;

    /// Search for documents similar to the query embedding.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<DocumentSearchResult>, ApiError>;

    /// Keyword search used when no query embedding is available.
    async fn text_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<DocumentSearchResult>, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_accessors_fall_back_across_keys() {
        let doc = KnowledgeDocument {
            doc_id: "d1".to_string(),
            content: "Section 2".to_string(),
            metadata: Some(json!({ "file_name": "Act.pdf", "page": 12 })),
        };
        assert_eq!(doc.document_name().as_deref(), Some("Act.pdf"));
        assert_eq!(doc.page_label().as_deref(), Some("12"));
        assert!(doc.url().is_none());

        let bare = KnowledgeDocument {
            doc_id: "d2".to_string(),
            content: String::new(),
            metadata: None,
        };
        assert!(bare.document_name().is_none());
    }
}
