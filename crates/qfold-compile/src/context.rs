//! Rewrite configuration shared by all passes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use qfold_ir::Instruction;

use crate::error::{CompileError, CompileResult};

/// Scope of a rewrite: which tags make instructions opaque, and whether
/// nested circuit bodies are rewritten too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformerContext {
    /// Instructions carrying any of these tags are left untouched.
    pub tags_to_ignore: BTreeSet<String>,
    /// Recurse into the bodies of circuit operations.
    pub deep: bool,
}

impl TransformerContext {
    /// A shallow context ignoring nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tags that make instructions opaque.
    #[must_use]
    pub fn with_tags_to_ignore<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags_to_ignore = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable recursion into nested bodies.
    #[must_use]
    pub fn with_deep(mut self, deep: bool) -> Self {
        self.deep = deep;
        self
    }

    /// Parse a context from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> CompileResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| CompileError::InvalidConfiguration(format!("context: {e}")))
    }

    /// Whether `inst` is opaque to rewriting.
    #[inline]
    pub fn is_ignored(&self, inst: &Instruction) -> bool {
        inst.has_any_tag(&self.tags_to_ignore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qfold_ir::{Gate, QubitId};

    #[test]
    fn test_context_from_json() {
        let ctx: TransformerContext =
            serde_json::from_str(r#"{"tags_to_ignore": ["ignore"], "deep": true}"#).unwrap();
        assert!(ctx.deep);
        assert!(ctx.tags_to_ignore.contains("ignore"));

        let defaulted = TransformerContext::from_json("{}").unwrap();
        assert_eq!(defaulted, TransformerContext::new());
        assert!(TransformerContext::from_json("{\"deep\": 1}").is_err());
    }

    #[test]
    fn test_is_ignored() {
        let ctx = TransformerContext::new().with_tags_to_ignore(["nocompile"]);
        let tagged = Instruction::gate(Gate::x(), [QubitId(0)]).with_tags(["nocompile", "other"]);
        let plain = Instruction::gate(Gate::x(), [QubitId(0)]).with_tags(["other"]);
        assert!(ctx.is_ignored(&tagged));
        assert!(!ctx.is_ignored(&plain));
    }
}
