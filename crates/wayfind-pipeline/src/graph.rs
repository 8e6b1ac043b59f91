use std::sync::Arc;

use tracing::{debug, info};

use wayfind_core::config::{GateConfig, ModelConfig};
use wayfind_core::error::{Result, WayfindError};
use wayfind_core::traits::{CompletionClient, SearchClient};
use wayfind_core::types::{RunId, RunInput};

use crate::def::PipelineDef;
use crate::nodes;
use crate::router;
use crate::state::RunState;

const DEFAULT_TOP_K: usize = 4;

/// A node in the execution graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeId {
    Classify,
    Retrieve,
    Gate,
    Branch(String),
    Finalize,
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classify => f.write_str("classify"),
            Self::Retrieve => f.write_str("retrieve"),
            Self::Gate => f.write_str("gate"),
            Self::Branch(name) => write!(f, "branch:{}", name),
            Self::Finalize => f.write_str("finalize"),
        }
    }
}

/// An executable pipeline: a definition plus injected collaborators.
///
/// The driver walks the graph strictly sequentially — one node completes,
/// its patch is merged, the router picks the next node — and terminates
/// after the finalizer. A run either returns a fully-finalized state or an
/// error; callers never observe anything in between.
pub struct Pipeline {
    def: PipelineDef,
    model: ModelConfig,
    gate: GateConfig,
    top_k: usize,
    completion: Arc<dyn CompletionClient>,
    search: Option<Arc<dyn SearchClient>>,
}

impl Pipeline {
    pub fn new(
        def: PipelineDef,
        model: ModelConfig,
        completion: Arc<dyn CompletionClient>,
    ) -> Result<Self> {
        def.validate()?;
        Ok(Self {
            def,
            model,
            gate: GateConfig::default(),
            top_k: DEFAULT_TOP_K,
            completion,
            search: None,
        })
    }

    /// Attach the search collaborator used by retrieval routes.
    pub fn with_search(mut self, search: Arc<dyn SearchClient>, top_k: usize) -> Self {
        self.search = Some(search);
        self.top_k = top_k;
        self
    }

    /// Override the quality-gate policy.
    pub fn with_gate(mut self, gate: GateConfig) -> Self {
        self.gate = gate;
        self
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Run one request to completion and return `final_output`.
    pub async fn run(&self, input: RunInput) -> Result<String> {
        let state = self.run_to_state(input).await?;
        state.final_output.ok_or_else(|| {
            WayfindError::Pipeline("run terminated without final output".into())
        })
    }

    /// Run one request and return the full finalized state, trace included.
    pub async fn run_to_state(&self, input: RunInput) -> Result<RunState> {
        let run_id = RunId::new();
        let mut state = RunState::new(input);
        let mut current = NodeId::Classify;
        let mut visited: Vec<NodeId> = Vec::new();

        info!(run_id = %run_id, pipeline = %self.def.name, "Pipeline run started");

        loop {
            // One path from entry to terminal: a revisit means the
            // definition routed back into the graph, which is a bug.
            if visited.contains(&current) {
                return Err(WayfindError::Pipeline(format!(
                    "node '{}' revisited within one run",
                    current
                )));
            }
            visited.push(current.clone());

            debug!(run_id = %run_id, node = %current, "Executing node");

            current = match &current {
                NodeId::Classify => {
                    let patch =
                        nodes::classify(&self.def, &state, &self.completion, &self.model).await?;
                    state.apply(patch);
                    router::route_after_classify(&self.def, &state)
                }
                NodeId::Retrieve => {
                    let search = self.search.as_ref().ok_or_else(|| {
                        WayfindError::Pipeline(format!(
                            "pipeline '{}' routed to retrieval but no search collaborator is attached",
                            self.def.name
                        ))
                    })?;
                    let patch = nodes::retrieve(&state, search, self.top_k).await?;
                    state.apply(patch);
                    NodeId::Gate
                }
                NodeId::Gate => {
                    let patch = nodes::inspect_retrieval(&state, &self.gate);
                    state.apply(patch);
                    router::route_after_gate(&self.def, &state)
                }
                NodeId::Branch(name) => {
                    let kind = self.def.branches.get(name).ok_or_else(|| {
                        WayfindError::Pipeline(format!("unknown branch '{}'", name))
                    })?;
                    let patch =
                        nodes::run_branch(kind, &state, &self.completion, &self.model).await?;
                    state.apply(patch);
                    NodeId::Finalize
                }
                NodeId::Finalize => {
                    let patch = nodes::finalize(&state);
                    state.apply(patch);
                    break;
                }
            };
        }

        info!(
            run_id = %run_id,
            intent = state.intent.as_deref().unwrap_or("unknown"),
            "Pipeline run complete"
        );
        Ok(state)
    }
}
