pub mod embeddings;
pub mod index;
pub mod loader;

pub use embeddings::{cosine_similarity, EmbeddingProvider, HttpEmbeddingProvider};
pub use index::SqliteIndex;
pub use loader::{load_jsonl, CorpusDocument};
