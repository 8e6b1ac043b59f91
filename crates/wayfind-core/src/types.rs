use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a single pipeline run.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The caller-supplied input for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInput {
    /// The text to classify and process.
    pub input_text: String,
    /// Optional steering text (e.g. the desired task for the task router).
    #[serde(default)]
    pub auxiliary_instruction: Option<String>,
}

impl RunInput {
    pub fn new(input_text: impl Into<String>) -> Self {
        Self {
            input_text: input_text.into(),
            auxiliary_instruction: None,
        }
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.auxiliary_instruction = Some(instruction.into());
        self
    }
}

/// One scored document returned by the search collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedItem {
    pub content: String,
    pub source_id: String,
    pub score: f64,
}

/// Verdict of the retrieval quality gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalStatus {
    Ok,
    Weak,
}

impl RetrievalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Weak => "weak",
        }
    }
}

impl std::fmt::Display for RetrievalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
