use std::path::Path;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use rusqlite::{params, Connection};
use tracing::{debug, info};

use wayfind_core::error::{Result, WayfindError};
use wayfind_core::traits::SearchClient;
use wayfind_core::types::RetrievedItem;

use crate::embeddings::{cosine_similarity, EmbeddingProvider};
use crate::loader::CorpusDocument;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content TEXT NOT NULL,
    source_id TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS embeddings (
    id INTEGER PRIMARY KEY,
    document_id INTEGER REFERENCES documents(id),
    embedding BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_embeddings_doc ON embeddings(document_id);";

/// SQLite-backed vector index.
///
/// Documents are stored with their embedding as a little-endian f32 BLOB;
/// search embeds the query and ranks by cosine similarity (higher is better).
pub struct SqliteIndex {
    conn: Mutex<Connection>,
    embeddings: Arc<dyn EmbeddingProvider>,
}

impl SqliteIndex {
    /// Open or create an index database at the given path.
    pub fn open(path: &Path, embeddings: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                WayfindError::Database(format!("Failed to create db directory: {}", e))
            })?;
        }

        let conn = Connection::open(path).map_err(|e| WayfindError::Database(e.to_string()))?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| WayfindError::Database(e.to_string()))?;

        conn.execute_batch(SCHEMA)
            .map_err(|e| WayfindError::Database(e.to_string()))?;

        debug!(path = %path.display(), "SQLite index opened");
        Ok(Self {
            conn: Mutex::new(conn),
            embeddings,
        })
    }

    /// Open an in-memory index (for testing).
    pub fn in_memory(embeddings: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| WayfindError::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| WayfindError::Database(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
            embeddings,
        })
    }

    /// Embed and insert a batch of documents. Returns the number stored.
    pub async fn add_documents(&self, docs: &[CorpusDocument]) -> Result<usize> {
        if docs.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = docs.iter().map(|d| d.text.clone()).collect();
        let vectors = self.embeddings.embed(&texts).await?;

        if vectors.len() != docs.len() {
            return Err(WayfindError::UpstreamRetrieval(format!(
                "embedding count mismatch: {} documents, {} vectors",
                docs.len(),
                vectors.len()
            )));
        }

        let conn = self
            .conn
            .lock()
            .map_err(|e| WayfindError::Database(e.to_string()))?;

        for (doc, vector) in docs.iter().zip(vectors.iter()) {
            conn.execute(
                "INSERT INTO documents (content, source_id) VALUES (?1, ?2)",
                params![doc.text, doc.source],
            )
            .map_err(|e| WayfindError::Database(e.to_string()))?;

            let document_id = conn.last_insert_rowid();
            let blob: Vec<u8> = vector.iter().flat_map(|f| f.to_le_bytes()).collect();
            conn.execute(
                "INSERT INTO embeddings (document_id, embedding) VALUES (?1, ?2)",
                params![document_id, blob],
            )
            .map_err(|e| WayfindError::Database(e.to_string()))?;
        }

        info!(count = docs.len(), "Documents indexed");
        Ok(docs.len())
    }

    /// Number of documents in the index.
    pub fn document_count(&self) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| WayfindError::Database(e.to_string()))?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(|e| WayfindError::Database(e.to_string()))?;
        Ok(count as usize)
    }

    /// Rank all stored documents against a query vector, best first.
    fn search_similar(&self, query_vec: &[f32], k: usize) -> Result<Vec<RetrievedItem>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| WayfindError::Database(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT e.embedding, d.content, d.source_id
                 FROM embeddings e
                 JOIN documents d ON d.id = e.document_id",
            )
            .map_err(|e| WayfindError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let blob: Vec<u8> = row.get(0)?;
                let content: String = row.get(1)?;
                let source_id: String = row.get(2)?;
                Ok((blob, content, source_id))
            })
            .map_err(|e| WayfindError::Database(e.to_string()))?;

        let mut scored: Vec<RetrievedItem> = Vec::new();

        for row in rows {
            let (blob, content, source_id) =
                row.map_err(|e| WayfindError::Database(e.to_string()))?;

            let embedding: Vec<f32> = blob
                .chunks_exact(4)
                .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                .collect();

            let sim = cosine_similarity(query_vec, &embedding);
            scored.push(RetrievedItem {
                content,
                source_id,
                score: sim as f64,
            });
        }

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored)
    }
}

impl SearchClient for SqliteIndex {
    fn search(&self, query: &str, k: usize) -> BoxFuture<'_, Result<Vec<RetrievedItem>>> {
        let query = query.to_string();
        Box::pin(async move {
            let vectors = self.embeddings.embed(&[query]).await?;
            let query_vec = vectors.into_iter().next().ok_or_else(|| {
                WayfindError::UpstreamRetrieval("embedding provider returned no vector".into())
            })?;
            self.search_similar(&query_vec, k)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic embedding provider keyed on a few known words.
    struct StubEmbeddings;

    impl EmbeddingProvider for StubEmbeddings {
        fn embed(&self, texts: &[String]) -> BoxFuture<'_, Result<Vec<Vec<f32>>>> {
            let vectors = texts
                .iter()
                .map(|t| {
                    let t = t.to_lowercase();
                    vec![
                        t.contains("paris") as u8 as f32,
                        t.contains("rust") as u8 as f32,
                        t.contains("weather") as u8 as f32,
                    ]
                })
                .collect();
            Box::pin(async move { Ok(vectors) })
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    fn docs() -> Vec<CorpusDocument> {
        vec![
            CorpusDocument {
                text: "Paris is the capital of France.".into(),
                source: "news_0".into(),
            },
            CorpusDocument {
                text: "Rust has a strong type system.".into(),
                source: "news_1".into(),
            },
            CorpusDocument {
                text: "The weather was mild this week.".into(),
                source: "news_2".into(),
            },
        ]
    }

    #[tokio::test]
    async fn test_add_and_count() {
        let index = SqliteIndex::in_memory(Arc::new(StubEmbeddings)).unwrap();
        let stored = index.add_documents(&docs()).await.unwrap();
        assert_eq!(stored, 3);
        assert_eq!(index.document_count().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_search_ranks_best_match_first() {
        let index = SqliteIndex::in_memory(Arc::new(StubEmbeddings)).unwrap();
        index.add_documents(&docs()).await.unwrap();

        let results = index.search("what is the capital, Paris?", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source_id, "news_0");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_search_empty_index_returns_no_items() {
        let index = SqliteIndex::in_memory(Arc::new(StubEmbeddings)).unwrap();
        let results = index.search("anything", 4).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_returns_fewer_than_k() {
        let index = SqliteIndex::in_memory(Arc::new(StubEmbeddings)).unwrap();
        index.add_documents(&docs()[..1]).await.unwrap();

        let results = index.search("paris", 4).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");
        {
            let index = SqliteIndex::open(&path, Arc::new(StubEmbeddings)).unwrap();
            index.add_documents(&docs()).await.unwrap();
        }
        let reopened = SqliteIndex::open(&path, Arc::new(StubEmbeddings)).unwrap();
        assert_eq!(reopened.document_count().unwrap(), 3);
    }
}
