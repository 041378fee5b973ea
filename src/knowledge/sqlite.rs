//! SQLite-backed knowledge store.
//!
//! Documents live in named collections inside one database file. Vectors are
//! stored as little-endian `f32` blobs and searched by brute-force cosine
//! similarity.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{DocumentSearchResult, KnowledgeDocument, KnowledgeStore};
use crate::core::errors::ApiError;

pub const DATABASE_FILE: &str = "knowledge.db";

pub struct SqliteKnowledgeStore {
    pool: SqlitePool,
    collection: String,
    db_path: PathBuf,
}

impl SqliteKnowledgeStore {
    /// Opens `<persist_dir>/knowledge.db` and binds to `collection`,
    /// creating either if missing.
    pub async fn open(persist_dir: &Path, collection: &str) -> Result<Self, ApiError> {
        std::fs::create_dir_all(persist_dir).map_err(|e| {
            ApiError::internal(format!(
                "Failed to create knowledge directory {}: {}",
                persist_dir.display(),
                e
            ))
        })?;
        Self::with_path(persist_dir.join(DATABASE_FILE), collection).await
    }

    pub async fn with_path(db_path: PathBuf, collection: &str) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self {
            pool,
            collection: collection.to_string(),
            db_path,
        };
        store.init_schema().await?;
        store.get_or_create_collection().await?;
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                doc_id TEXT NOT NULL,
                content TEXT NOT NULL,
                metadata TEXT DEFAULT '{}',
                embedding BLOB,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (collection, doc_id),
                FOREIGN KEY (collection) REFERENCES collections(name) ON DELETE CASCADE
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection)")
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(())
    }

    async fn get_or_create_collection(&self) -> Result<(), ApiError> {
        sqlx::query("INSERT OR IGNORE INTO collections (name) VALUES (?1)")
            .bind(&self.collection)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(())
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }

    /// Lowercased query terms worth matching on (stopword-ish short tokens
    /// are dropped).
    fn query_terms(query: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        query
            .split(|c: char| !c.is_alphanumeric())
            .map(|term| term.to_lowercase())
            .filter(|term| term.chars().count() >= 4)
            .filter(|term| seen.insert(term.clone()))
            .collect()
    }

    fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> KnowledgeDocument {
        let metadata_str: Option<String> = row.get("metadata");
        let metadata = metadata_str.and_then(|raw| serde_json::from_str::<Value>(&raw).ok());

        KnowledgeDocument {
            doc_id: row.get("doc_id"),
            content: row.get("content"),
            metadata,
        }
    }

    fn sort_and_truncate(mut scored: Vec<DocumentSearchResult>, limit: usize) -> Vec<DocumentSearchResult> {
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit.max(1));
        scored
    }
}

// Ingestion is external; tests seed collections through this.
#[cfg(test)]
impl SqliteKnowledgeStore {
    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    pub(crate) async fn insert_batch(
        &self,
        items: Vec<(KnowledgeDocument, Option<Vec<f32>>)>,
    ) -> Result<(), ApiError> {
        if items.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        for (document, embedding) in &items {
            let blob = embedding.as_deref().map(Self::serialize_embedding);
            let metadata_str = document
                .metadata
                .as_ref()
                .map(|m| serde_json::to_string(m).unwrap_or_default())
                .unwrap_or_else(|| "{}".to_string());

            sqlx::query(
                "INSERT OR REPLACE INTO documents (collection, doc_id, content, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&self.collection)
            .bind(&document.doc_id)
            .bind(&document.content)
            .bind(&metadata_str)
            .bind(blob)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(())
    }
}

#[async_trait]
impl KnowledgeStore for SqliteKnowledgeStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn list_collections(&self) -> Result<Vec<String>, ApiError> {
        sqlx::query_scalar("SELECT name FROM collections ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?1")
            .bind(&self.collection)
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(count as usize)
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<DocumentSearchResult>, ApiError> {
        let rows = sqlx::query(
            "SELECT doc_id, content, metadata, embedding
             FROM documents
             WHERE collection = ?1 AND embedding IS NOT NULL",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let scored: Vec<DocumentSearchResult> = rows
            .iter()
            .filter_map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                if embedding_bytes.is_empty() {
                    return None;
                }
                let stored_emb = Self::deserialize_embedding(&embedding_bytes);
                let score = Self::cosine_similarity(query_embedding, &stored_emb);

                Some(DocumentSearchResult {
                    document: Self::row_to_document(row),
                    score,
                })
            })
            .collect();

        Ok(Self::sort_and_truncate(scored, limit))
    }

    async fn text_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<DocumentSearchResult>, ApiError> {
        let terms = Self::query_terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT doc_id, content, metadata
             FROM documents
             WHERE collection = ?1",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let scored: Vec<DocumentSearchResult> = rows
            .iter()
            .filter_map(|row| {
                let document = Self::row_to_document(row);
                let haystack = document.content.to_lowercase();
                let hits = terms.iter().filter(|term| haystack.contains(term.as_str())).count();
                if hits == 0 {
                    return None;
                }
                Some(DocumentSearchResult {
                    document,
                    score: hits as f32 / terms.len() as f32,
                })
            })
            .collect();

        Ok(Self::sort_and_truncate(scored, limit))
    }
}
