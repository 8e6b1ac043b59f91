/// One normalization rule: a raw classifier reply containing `pattern`
/// resolves to `label`.
#[derive(Debug, Clone)]
pub struct LabelRule {
    pub label: String,
    pub pattern: String,
}

impl LabelRule {
    pub fn new(label: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            pattern: pattern.into(),
        }
    }
}

/// The classification-normalization policy.
///
/// Completion services are not guaranteed to return a bare label word, so
/// normalization is substring containment against the rules in priority
/// order, first match wins, after lowercasing and stripping whitespace and
/// quotes. A reply matching no rule resolves to the fixed default label —
/// ambiguity is a tie-break, never an error.
#[derive(Debug, Clone)]
pub struct LabelPolicy {
    rules: Vec<LabelRule>,
    default: String,
}

impl LabelPolicy {
    pub fn new(rules: Vec<LabelRule>, default: impl Into<String>) -> Self {
        Self {
            rules,
            default: default.into(),
        }
    }

    /// The label ambiguous replies resolve to. The router uses the same
    /// default for unmapped labels, so the two cannot diverge.
    pub fn default_label(&self) -> &str {
        &self.default
    }

    /// Resolve a raw classifier reply to one allowed label.
    pub fn normalize(&self, raw: &str) -> &str {
        let cleaned = clean(raw);
        for rule in &self.rules {
            if cleaned.contains(&rule.pattern) {
                return &rule.label;
            }
        }
        &self.default
    }
}

fn clean(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_lowercase()
}
