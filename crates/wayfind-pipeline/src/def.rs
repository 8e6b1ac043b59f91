use std::collections::HashMap;

use wayfind_core::error::{Result, WayfindError};

use crate::label::LabelPolicy;

/// A processing branch. Exactly one branch runs per pipeline run.
///
/// Every variant has the same contract — consume state fields, write
/// `result` — which is what lets one driver execute any pipeline.
#[derive(Debug, Clone)]
pub enum BranchKind {
    /// One completion call over the input text.
    Completion { system: String },
    /// One completion call over the input text plus the retrieved context,
    /// rendered as numbered source-tagged blocks.
    ContextCompletion { system: String },
    /// A fixed reply, no external call.
    Decline { message: String },
}

/// Where a classified label sends the run.
#[derive(Debug, Clone)]
pub enum Route {
    /// Straight to a branch.
    Branch(String),
    /// Through retrieval and the quality gate first.
    Retrieve,
}

/// A declarative pipeline: classifier prompt, label policy, routing table,
/// and branch registry. The driver in [`crate::graph`] executes it.
#[derive(Debug, Clone)]
pub struct PipelineDef {
    pub name: String,
    /// System instruction for the classifier's single completion call.
    pub classifier_system: String,
    pub labels: LabelPolicy,
    /// label → route. Labels missing here fall back to the policy default.
    pub routes: HashMap<String, Route>,
    pub branches: HashMap<String, BranchKind>,
    /// Branch taken when the gate reports `ok`. Only meaningful for
    /// pipelines with a `Route::Retrieve` entry.
    pub context_branch: Option<String>,
    /// Branch taken when the gate reports anything but `ok`, and the last
    /// resort for labels with no route.
    pub fallback_branch: String,
}

impl PipelineDef {
    /// Check internal consistency: every route and special-role branch name
    /// must exist in the branch registry.
    pub fn validate(&self) -> Result<()> {
        for (label, route) in &self.routes {
            if let Route::Branch(name) = route {
                if !self.branches.contains_key(name) {
                    return Err(WayfindError::Pipeline(format!(
                        "route for label '{}' targets unknown branch '{}'",
                        label, name
                    )));
                }
            }
        }

        if !self.branches.contains_key(&self.fallback_branch) {
            return Err(WayfindError::Pipeline(format!(
                "fallback branch '{}' not registered",
                self.fallback_branch
            )));
        }

        let has_retrieval = self
            .routes
            .values()
            .any(|r| matches!(r, Route::Retrieve));

        match &self.context_branch {
            Some(name) if !self.branches.contains_key(name) => {
                return Err(WayfindError::Pipeline(format!(
                    "context branch '{}' not registered",
                    name
                )));
            }
            None if has_retrieval => {
                return Err(WayfindError::Pipeline(
                    "retrieval route configured without a context branch".into(),
                ));
            }
            _ => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::LabelRule;

    fn minimal_def() -> PipelineDef {
        let mut branches = HashMap::new();
        branches.insert(
            "echo".to_string(),
            BranchKind::Completion {
                system: "Echo the input.".into(),
            },
        );
        let mut routes = HashMap::new();
        routes.insert("echo".to_string(), Route::Branch("echo".into()));

        PipelineDef {
            name: "test".into(),
            classifier_system: "Pick a label.".into(),
            labels: LabelPolicy::new(vec![LabelRule::new("echo", "echo")], "echo"),
            routes,
            branches,
            context_branch: None,
            fallback_branch: "echo".into(),
        }
    }

    #[test]
    fn test_valid_def() {
        assert!(minimal_def().validate().is_ok());
    }

    #[test]
    fn test_route_to_unknown_branch() {
        let mut def = minimal_def();
        def.routes
            .insert("bad".into(), Route::Branch("missing".into()));
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_unknown_fallback_branch() {
        let mut def = minimal_def();
        def.fallback_branch = "missing".into();
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_retrieval_requires_context_branch() {
        let mut def = minimal_def();
        def.routes.insert("lookup".into(), Route::Retrieve);
        assert!(def.validate().is_err());

        def.context_branch = Some("echo".into());
        assert!(def.validate().is_ok());
    }
}
