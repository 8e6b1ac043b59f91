use futures::future::BoxFuture;

use crate::config::ModelConfig;
use crate::error::Result;
use crate::types::RetrievedItem;

/// Completion collaborator — prompt in, text out.
///
/// One system instruction plus one user message per call; no streaming.
/// Implementations clone their inputs before the returned future runs.
pub trait CompletionClient: Send + Sync + 'static {
    fn complete(
        &self,
        config: &ModelConfig,
        system: &str,
        user: &str,
    ) -> BoxFuture<'_, Result<String>>;
}

/// Search collaborator — query in, scored document list out.
///
/// May return fewer than `k` items, including zero. Index construction and
/// persistence belong to the implementation's setup phase, not the caller.
pub trait SearchClient: Send + Sync + 'static {
    fn search(&self, query: &str, k: usize) -> BoxFuture<'_, Result<Vec<RetrievedItem>>>;
}
