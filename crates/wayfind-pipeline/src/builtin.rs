//! The two shipped pipeline definitions.

use std::collections::HashMap;

use crate::def::{BranchKind, PipelineDef, Route};
use crate::label::{LabelPolicy, LabelRule};

/// Fixed reply for requests the QA pipeline cannot support.
pub const DECLINE_MESSAGE: &str = "I'm not able to answer this question with the \
knowledge base I have. It might be outside the scope of the indexed corpus.";

/// Retrieval-augmented question answering: casual questions get a direct
/// reply, factual questions go through retrieval and the quality gate,
/// everything else is declined.
pub fn qa() -> PipelineDef {
    let labels = LabelPolicy::new(
        vec![
            LabelRule::new("chitchat", "chitchat"),
            LabelRule::new("rag", "rag"),
        ],
        "off_topic",
    );

    let mut routes = HashMap::new();
    routes.insert("chitchat".to_string(), Route::Branch("chitchat".into()));
    routes.insert("rag".to_string(), Route::Retrieve);
    routes.insert("off_topic".to_string(), Route::Branch("decline".into()));

    let mut branches = HashMap::new();
    branches.insert(
        "chitchat".to_string(),
        BranchKind::Completion {
            system: "You are a friendly general-purpose assistant for casual chat.".into(),
        },
    );
    branches.insert(
        "answer".to_string(),
        BranchKind::ContextCompletion {
            system: "You are an assistant that answers questions using the provided context. \
                     If the context is relevant, answer concisely and refer to sources using \
                     inline citations like [1], [2]. If the context does not contain enough \
                     information, say you don't know rather than inventing details."
                .into(),
        },
    );
    branches.insert(
        "decline".to_string(),
        BranchKind::Decline {
            message: DECLINE_MESSAGE.into(),
        },
    );

    PipelineDef {
        name: "qa".into(),
        classifier_system: "You are a router for an assistant that can answer questions \
                            using a small news/article corpus.\n\n\
                            Possible intents:\n\
                            - chitchat: casual conversation, opinions, generic small talk.\n\
                            - rag: factual questions that could be grounded in articles.\n\
                            - off_topic: anything clearly unrelated or unsafe.\n\n\
                            Return ONLY one word: chitchat, rag, or off_topic."
            .into(),
        labels,
        routes,
        branches,
        context_branch: Some("answer".into()),
        fallback_branch: "decline".into(),
    }
}

/// Text-task routing: summarize, extract bullet points, or analyze
/// sentiment, picked from the user's instruction.
pub fn tasks() -> PipelineDef {
    let labels = LabelPolicy::new(
        vec![
            LabelRule::new("bullet_points", "bullet"),
            LabelRule::new("sentiment", "sentiment"),
        ],
        "summarize",
    );

    let mut routes = HashMap::new();
    routes.insert("summarize".to_string(), Route::Branch("summarize".into()));
    routes.insert(
        "bullet_points".to_string(),
        Route::Branch("bullet_points".into()),
    );
    routes.insert("sentiment".to_string(), Route::Branch("sentiment".into()));

    let mut branches = HashMap::new();
    branches.insert(
        "summarize".to_string(),
        BranchKind::Completion {
            system: "You write clear, concise summaries in 3-5 sentences. \
                     Summarize the text the user provides."
                .into(),
        },
    );
    branches.insert(
        "bullet_points".to_string(),
        BranchKind::Completion {
            system: "You extract the key points of the user's text as a concise bullet list."
                .into(),
        },
    );
    branches.insert(
        "sentiment".to_string(),
        BranchKind::Completion {
            system: "You are a sentiment analyst. Describe the sentiment of the user's text \
                     (positive/negative/neutral) and briefly justify it."
                .into(),
        },
    );

    PipelineDef {
        name: "tasks".into(),
        classifier_system: "You are a router. Based on the user instruction and the text, \
                            choose exactly one of: summarize, bullet_points, sentiment. \
                            Return ONLY that single word."
            .into(),
        labels,
        routes,
        branches,
        context_branch: None,
        fallback_branch: "summarize".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_defs_validate() {
        assert!(qa().validate().is_ok());
        assert!(tasks().validate().is_ok());
    }

    #[test]
    fn test_qa_default_is_the_decline_path() {
        let def = qa();
        assert_eq!(def.labels.default_label(), "off_topic");
        assert!(matches!(
            def.routes.get("off_topic"),
            Some(Route::Branch(name)) if name == &def.fallback_branch
        ));
    }

    #[test]
    fn test_tasks_default_is_summarize() {
        let def = tasks();
        assert_eq!(def.labels.default_label(), "summarize");
        assert!(def.routes.contains_key("summarize"));
    }
}
