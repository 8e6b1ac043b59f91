//! Scripted collaborator doubles for pipeline tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;

use wayfind_core::config::ModelConfig;
use wayfind_core::error::{Result, WayfindError};
use wayfind_core::traits::{CompletionClient, SearchClient};
use wayfind_core::types::RetrievedItem;

/// Build a retrieved item inline.
pub fn item(content: &str, source_id: &str, score: f64) -> RetrievedItem {
    RetrievedItem {
        content: content.into(),
        source_id: source_id.into(),
        score,
    }
}

/// A completion client that replays a fixed script of replies and records
/// every (system, user) pair it was called with.
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedCompletion {
    pub fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|s| s.to_string()).collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// The (system, user) pair of the n-th call.
    pub fn call(&self, n: usize) -> (String, String) {
        self.calls.lock().unwrap()[n].clone()
    }
}

impl CompletionClient for ScriptedCompletion {
    fn complete(
        &self,
        _config: &ModelConfig,
        system: &str,
        user: &str,
    ) -> BoxFuture<'_, Result<String>> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        let reply = self.replies.lock().unwrap().pop_front();
        Box::pin(async move {
            reply.ok_or_else(|| {
                WayfindError::UpstreamCompletion("scripted replies exhausted".into())
            })
        })
    }
}

/// A search client that returns a fixed item list (truncated to `k`) and
/// counts its calls.
pub struct StaticSearch {
    items: Vec<RetrievedItem>,
    calls: Mutex<usize>,
}

impl StaticSearch {
    pub fn new(items: Vec<RetrievedItem>) -> Arc<Self> {
        Arc::new(Self {
            items,
            calls: Mutex::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl SearchClient for StaticSearch {
    fn search(&self, _query: &str, k: usize) -> BoxFuture<'_, Result<Vec<RetrievedItem>>> {
        *self.calls.lock().unwrap() += 1;
        let mut items = self.items.clone();
        items.truncate(k);
        Box::pin(async move { Ok(items) })
    }
}

/// A completion client that always fails, as an unreachable backend would.
pub struct FailingCompletion;

impl CompletionClient for FailingCompletion {
    fn complete(
        &self,
        _config: &ModelConfig,
        _system: &str,
        _user: &str,
    ) -> BoxFuture<'_, Result<String>> {
        Box::pin(async {
            Err(WayfindError::UpstreamCompletion(
                "completion backend unreachable".into(),
            ))
        })
    }
}

/// A search client that always fails.
pub struct FailingSearch;

impl SearchClient for FailingSearch {
    fn search(&self, _query: &str, _k: usize) -> BoxFuture<'_, Result<Vec<RetrievedItem>>> {
        Box::pin(async {
            Err(WayfindError::UpstreamRetrieval(
                "search backend unreachable".into(),
            ))
        })
    }
}
