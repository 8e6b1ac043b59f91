use std::sync::Arc;

use tracing::debug;

use wayfind_core::config::{GateConfig, ModelConfig, ScoreOrder};
use wayfind_core::error::Result;
use wayfind_core::traits::{CompletionClient, SearchClient};
use wayfind_core::types::{RetrievalStatus, RetrievedItem};

use crate::def::{BranchKind, PipelineDef};
use crate::state::{RunState, StatePatch};

/// Classifier node: one completion call constrained to a label word, then
/// normalization through the pipeline's label policy. The raw reply is kept
/// in the trace for debugging.
pub async fn classify(
    def: &PipelineDef,
    state: &RunState,
    completion: &Arc<dyn CompletionClient>,
    model: &ModelConfig,
) -> Result<StatePatch> {
    let user = match &state.auxiliary_instruction {
        Some(instruction) => format!(
            "Instruction: {}\n\nText:\n{}",
            instruction, state.input_text
        ),
        None => state.input_text.clone(),
    };

    let raw = completion
        .complete(model, &def.classifier_system, &user)
        .await?;
    let label = def.labels.normalize(&raw).to_string();

    debug!(raw = %raw.trim(), label = %label, "Classified input");

    Ok(StatePatch {
        intent: Some(label),
        ..Default::default()
    }
    .with_trace("classifier_raw", raw.into()))
}

/// Retrieval node: top-k similarity search over the input text. Scores ride
/// along on the items for the gate; the raw list also lands in the trace.
pub async fn retrieve(
    state: &RunState,
    search: &Arc<dyn SearchClient>,
    top_k: usize,
) -> Result<StatePatch> {
    let items = search.search(&state.input_text, top_k).await?;
    let scores: Vec<f64> = items.iter().map(|item| item.score).collect();

    debug!(count = items.len(), "Retrieved context documents");

    Ok(StatePatch {
        retrieved_items: Some(items),
        ..Default::default()
    }
    .with_trace("retrieval_scores", serde_json::json!(scores)))
}

fn passes_threshold(score: f64, config: &GateConfig) -> bool {
    match config.min_score {
        None => true,
        Some(threshold) => match config.score_order {
            ScoreOrder::HigherIsBetter => score >= threshold,
            ScoreOrder::LowerIsBetter => score <= threshold,
        },
    }
}

/// Quality gate: decide whether retrieval is good enough to answer from.
///
/// Empty retrieval is always `weak`. Otherwise the verdict is `ok` when at
/// least `min_items` items pass the configured score threshold (every item
/// passes when no threshold is set — the permissive default).
pub fn inspect_retrieval(state: &RunState, config: &GateConfig) -> StatePatch {
    let qualifying = state
        .retrieved_items
        .iter()
        .filter(|item| passes_threshold(item.score, config))
        .count();

    let status = if state.retrieved_items.is_empty() || qualifying < config.min_items {
        RetrievalStatus::Weak
    } else {
        RetrievalStatus::Ok
    };

    debug!(
        retrieved = state.retrieved_items.len(),
        qualifying,
        status = %status,
        "Inspected retrieval quality"
    );

    StatePatch {
        retrieval_status: Some(status),
        ..Default::default()
    }
    .with_trace("gate_qualifying_count", serde_json::json!(qualifying))
}

/// Render retrieved items as numbered, source-tagged context blocks.
pub fn format_context(items: &[RetrievedItem]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| format!("[{}] (source={})\n{}", idx + 1, item.source_id, item.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Branch node: produce the run's result.
///
/// Completion branches make exactly one external call; the decline branch
/// is pure. The context branch hands the model the numbered source blocks
/// and relies on its system instruction to cite by index or refuse.
pub async fn run_branch(
    kind: &BranchKind,
    state: &RunState,
    completion: &Arc<dyn CompletionClient>,
    model: &ModelConfig,
) -> Result<StatePatch> {
    let result = match kind {
        BranchKind::Completion { system } => {
            completion.complete(model, system, &state.input_text).await?
        }
        BranchKind::ContextCompletion { system } => {
            let user = format!(
                "Question:\n{}\n\nContext (numbered sources):\n{}",
                state.input_text,
                format_context(&state.retrieved_items)
            );
            completion.complete(model, system, &user).await?
        }
        BranchKind::Decline { message } => message.clone(),
    };

    Ok(StatePatch {
        result: Some(result),
        ..Default::default()
    })
}

/// Finalizer: prepend the machine-readable routing header to the result.
/// Pure and idempotent — the same state always renders the same output.
pub fn finalize(state: &RunState) -> StatePatch {
    let mode = state.intent.as_deref().unwrap_or("unknown");
    let status = state
        .retrieval_status
        .map(|s| s.as_str())
        .unwrap_or("n/a");

    let header = format!("[mode: {}, retrieval: {}]\n", mode, status);
    let body = state.result.as_deref().unwrap_or("");

    StatePatch {
        final_output: Some(format!("{}{}", header, body)),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfind_core::types::RunInput;

    fn item(content: &str, source: &str, score: f64) -> RetrievedItem {
        RetrievedItem {
            content: content.into(),
            source_id: source.into(),
            score,
        }
    }

    fn state_with_items(items: Vec<RetrievedItem>) -> RunState {
        let mut state = RunState::new(RunInput::new("q"));
        state.retrieved_items = items;
        state
    }

    #[test]
    fn test_gate_empty_is_weak() {
        let patch = inspect_retrieval(&state_with_items(vec![]), &GateConfig::default());
        assert_eq!(patch.retrieval_status, Some(RetrievalStatus::Weak));
    }

    #[test]
    fn test_gate_single_item_is_ok_by_default() {
        let patch = inspect_retrieval(
            &state_with_items(vec![item("a", "s1", 0.01)]),
            &GateConfig::default(),
        );
        assert_eq!(patch.retrieval_status, Some(RetrievalStatus::Ok));
    }

    #[test]
    fn test_gate_empty_is_weak_even_with_zero_min_items() {
        let config = GateConfig {
            min_items: 0,
            ..Default::default()
        };
        let patch = inspect_retrieval(&state_with_items(vec![]), &config);
        assert_eq!(patch.retrieval_status, Some(RetrievalStatus::Weak));
    }

    #[test]
    fn test_gate_score_threshold_higher_is_better() {
        let config = GateConfig {
            min_items: 2,
            min_score: Some(0.5),
            score_order: ScoreOrder::HigherIsBetter,
        };
        let items = vec![item("a", "s1", 0.9), item("b", "s2", 0.6), item("c", "s3", 0.1)];
        let patch = inspect_retrieval(&state_with_items(items.clone()), &config);
        assert_eq!(patch.retrieval_status, Some(RetrievalStatus::Ok));

        let strict = GateConfig {
            min_items: 3,
            ..config
        };
        let patch = inspect_retrieval(&state_with_items(items), &strict);
        assert_eq!(patch.retrieval_status, Some(RetrievalStatus::Weak));
    }

    #[test]
    fn test_gate_score_threshold_lower_is_better() {
        // Distance-style scores: smaller means closer.
        let config = GateConfig {
            min_items: 1,
            min_score: Some(0.4),
            score_order: ScoreOrder::LowerIsBetter,
        };
        let patch = inspect_retrieval(&state_with_items(vec![item("a", "s1", 0.2)]), &config);
        assert_eq!(patch.retrieval_status, Some(RetrievalStatus::Ok));

        let patch = inspect_retrieval(&state_with_items(vec![item("a", "s1", 0.8)]), &config);
        assert_eq!(patch.retrieval_status, Some(RetrievalStatus::Weak));
    }

    #[test]
    fn test_format_context_numbers_and_tags_sources() {
        let rendered = format_context(&[
            item("Paris is the capital of France.", "news_17", 0.92),
            item("Berlin is in Germany.", "news_4", 0.71),
        ]);
        assert_eq!(
            rendered,
            "[1] (source=news_17)\nParis is the capital of France.\n\n\
             [2] (source=news_4)\nBerlin is in Germany."
        );
    }

    #[test]
    fn test_format_context_empty() {
        assert_eq!(format_context(&[]), "");
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut state = RunState::new(RunInput::new("q"));
        state.intent = Some("rag".into());
        state.retrieval_status = Some(RetrievalStatus::Ok);
        state.result = Some("The capital is Paris [1].".into());

        let first = finalize(&state).final_output.unwrap();
        let second = finalize(&state).final_output.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "[mode: rag, retrieval: ok]\nThe capital is Paris [1].");
    }

    #[test]
    fn test_finalize_without_retrieval_renders_na() {
        let mut state = RunState::new(RunInput::new("q"));
        state.intent = Some("chitchat".into());
        state.result = Some("Doing great!".into());

        let output = finalize(&state).final_output.unwrap();
        assert!(output.starts_with("[mode: chitchat, retrieval: n/a]\n"));
    }
}
