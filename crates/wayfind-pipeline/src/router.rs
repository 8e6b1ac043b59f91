use wayfind_core::types::RetrievalStatus;

use crate::def::{PipelineDef, Route};
use crate::graph::NodeId;
use crate::state::RunState;

/// Pick the node after classification.
///
/// Pure lookup: the classified label's route, or the label policy's default
/// route when the label is unmapped — the same default the classifier uses
/// for ambiguous replies, so classification and routing cannot disagree.
pub fn route_after_classify(def: &PipelineDef, state: &RunState) -> NodeId {
    let label = state
        .intent
        .as_deref()
        .unwrap_or_else(|| def.labels.default_label());

    let route = def
        .routes
        .get(label)
        .or_else(|| def.routes.get(def.labels.default_label()));

    match route {
        Some(Route::Retrieve) => NodeId::Retrieve,
        Some(Route::Branch(name)) => NodeId::Branch(name.clone()),
        None => NodeId::Branch(def.fallback_branch.clone()),
    }
}

/// Pick the node after the quality gate.
///
/// Fails closed: only an explicit `ok` status reaches the context branch;
/// `weak`, an absent status, or a missing context branch all divert to the
/// fallback.
pub fn route_after_gate(def: &PipelineDef, state: &RunState) -> NodeId {
    match (state.retrieval_status, &def.context_branch) {
        (Some(RetrievalStatus::Ok), Some(name)) => NodeId::Branch(name.clone()),
        _ => NodeId::Branch(def.fallback_branch.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;
    use wayfind_core::types::RunInput;

    fn qa_state(intent: Option<&str>) -> RunState {
        let mut state = RunState::new(RunInput::new("question"));
        state.intent = intent.map(String::from);
        state
    }

    #[test]
    fn test_classified_labels_route_per_table() {
        let def = builtin::qa();
        assert_eq!(
            route_after_classify(&def, &qa_state(Some("chitchat"))),
            NodeId::Branch("chitchat".into())
        );
        assert_eq!(
            route_after_classify(&def, &qa_state(Some("rag"))),
            NodeId::Retrieve
        );
        assert_eq!(
            route_after_classify(&def, &qa_state(Some("off_topic"))),
            NodeId::Branch("decline".into())
        );
    }

    #[test]
    fn test_unmapped_label_takes_default_route() {
        let def = builtin::qa();
        // An intent the route table has never heard of.
        let next = route_after_classify(&def, &qa_state(Some("poetry")));
        assert_eq!(next, NodeId::Branch("decline".into()));
    }

    #[test]
    fn test_missing_intent_takes_default_route() {
        let def = builtin::qa();
        let next = route_after_classify(&def, &qa_state(None));
        assert_eq!(next, NodeId::Branch("decline".into()));
    }

    #[test]
    fn test_routing_is_deterministic() {
        let def = builtin::qa();
        let state = qa_state(Some("rag"));
        assert_eq!(
            route_after_classify(&def, &state),
            route_after_classify(&def, &state)
        );
    }

    #[test]
    fn test_gate_ok_reaches_context_branch() {
        let def = builtin::qa();
        let mut state = qa_state(Some("rag"));
        state.retrieval_status = Some(RetrievalStatus::Ok);
        assert_eq!(
            route_after_gate(&def, &state),
            NodeId::Branch("answer".into())
        );
    }

    #[test]
    fn test_gate_weak_fails_closed() {
        let def = builtin::qa();
        let mut state = qa_state(Some("rag"));
        state.retrieval_status = Some(RetrievalStatus::Weak);
        assert_eq!(
            route_after_gate(&def, &state),
            NodeId::Branch("decline".into())
        );
    }

    #[test]
    fn test_gate_absent_status_fails_closed() {
        let def = builtin::qa();
        let state = qa_state(Some("rag"));
        assert_eq!(
            route_after_gate(&def, &state),
            NodeId::Branch("decline".into())
        );
    }
}
