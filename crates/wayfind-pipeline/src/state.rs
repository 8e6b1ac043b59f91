use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use wayfind_core::types::{RetrievalStatus, RetrievedItem, RunInput};

/// The evolving record threaded through one pipeline run.
///
/// Created once per request, walked through exactly one path from classifier
/// to finalizer, and discarded after the caller reads `final_output`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// The raw input. Immutable once set.
    pub input_text: String,
    /// Optional steering text (e.g. the desired task).
    pub auxiliary_instruction: Option<String>,
    /// Set exactly once by the classifier node.
    pub intent: Option<String>,
    /// Populated by the retrieval node; empty on every other path.
    pub retrieved_items: Vec<RetrievedItem>,
    /// Set exactly once by the quality gate, retrieval path only.
    pub retrieval_status: Option<RetrievalStatus>,
    /// The branch's raw output.
    pub result: Option<String>,
    /// Set only by the finalizer; the one field surfaced to the caller.
    pub final_output: Option<String>,
    /// Append-only diagnostics. Routing never reads this.
    pub trace: HashMap<String, serde_json::Value>,
}

impl RunState {
    pub fn new(input: RunInput) -> Self {
        Self {
            input_text: input.input_text,
            auxiliary_instruction: input.auxiliary_instruction,
            intent: None,
            retrieved_items: Vec::new(),
            retrieval_status: None,
            result: None,
            final_output: None,
            trace: HashMap::new(),
        }
    }

    /// Merge a node's patch into this state.
    ///
    /// Only fields the patch carries are written; everything else is left
    /// untouched. Trace entries are appended.
    pub fn apply(&mut self, patch: StatePatch) {
        if let Some(intent) = patch.intent {
            self.intent = Some(intent);
        }
        if let Some(items) = patch.retrieved_items {
            self.retrieved_items = items;
        }
        if let Some(status) = patch.retrieval_status {
            self.retrieval_status = Some(status);
        }
        if let Some(result) = patch.result {
            self.result = Some(result);
        }
        if let Some(output) = patch.final_output {
            self.final_output = Some(output);
        }
        for (key, value) in patch.trace {
            self.trace.insert(key, value);
        }
    }
}

/// A node's partial update: only the fields the node owns.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub intent: Option<String>,
    pub retrieved_items: Option<Vec<RetrievedItem>>,
    pub retrieval_status: Option<RetrievalStatus>,
    pub result: Option<String>,
    pub final_output: Option<String>,
    pub trace: Vec<(String, serde_json::Value)>,
}

impl StatePatch {
    pub fn with_trace(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.trace.push((key.into(), value));
        self
    }
}
