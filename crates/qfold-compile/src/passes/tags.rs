//! Tag rewriting passes.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::debug;

use qfold_ir::{Circuit, Instruction};

use crate::context::TransformerContext;
use crate::error::{CompileError, CompileResult};
use crate::pass::Pass;
use crate::primitives::map_operations;

/// Predicate exempting an instruction from a tag rewrite.
pub type SkipFn = Arc<dyn Fn(&Instruction) -> bool + Send + Sync>;

fn check_targets(
    targets: &BTreeSet<String>,
    ctx: &TransformerContext,
    verb: &str,
) -> CompileResult<()> {
    let overlap: Vec<&str> = targets
        .intersection(&ctx.tags_to_ignore)
        .map(String::as_str)
        .collect();
    if overlap.is_empty() {
        Ok(())
    } else {
        Err(CompileError::InvalidConfiguration(format!(
            "can't {verb} tags that are ignored: {}",
            overlap.join(", ")
        )))
    }
}

/// Traversal context for tag rewrites: ignored instructions are rewritten
/// too, only `deep` is taken from the caller.
fn traversal(ctx: &TransformerContext) -> TransformerContext {
    TransformerContext::new().with_deep(ctx.deep)
}

/// Rename every target tag `t` to `t_k`, where `k` counts occurrences of
/// `t` in traversal order starting at zero.
#[derive(Clone, Default)]
pub struct IndexTags {
    target_tags: BTreeSet<String>,
    skip: Option<SkipFn>,
}

impl IndexTags {
    pub fn new<S: Into<String>>(target_tags: impl IntoIterator<Item = S>) -> Self {
        Self {
            target_tags: target_tags.into_iter().map(Into::into).collect(),
            skip: None,
        }
    }

    /// Leave instructions matching `skip` untouched; they do not advance
    /// the counters.
    #[must_use]
    pub fn with_skip(mut self, skip: impl Fn(&Instruction) -> bool + Send + Sync + 'static) -> Self {
        self.skip = Some(Arc::new(skip));
        self
    }

    pub(crate) fn with_skip_fn(mut self, skip: Option<SkipFn>) -> Self {
        self.skip = skip;
        self
    }
}

impl Pass for IndexTags {
    fn name(&self) -> &str {
        "index_tags"
    }

    fn should_run(&self, _circuit: &Circuit, _ctx: &TransformerContext) -> bool {
        !self.target_tags.is_empty()
    }

    fn run(&self, circuit: &Circuit, ctx: &TransformerContext) -> CompileResult<Circuit> {
        check_targets(&self.target_tags, ctx, "index")?;
        let mut counters: BTreeMap<String, usize> = BTreeMap::new();
        let out = map_operations(circuit, &traversal(ctx), |inst, _| {
            if self.skip.as_ref().is_some_and(|skip| skip(inst)) {
                return Ok(vec![inst.clone()]);
            }
            let mut indexed = inst.clone();
            for tag in inst.tags.intersection(&self.target_tags) {
                let counter = counters.entry(tag.clone()).or_default();
                indexed.tags.remove(tag);
                indexed.tags.insert(format!("{tag}_{counter}"));
                *counter += 1;
            }
            Ok(vec![indexed])
        })?;
        debug!(?counters, "indexed tags");
        Ok(out)
    }
}

/// Remove the target tags from every instruction.
#[derive(Clone, Default)]
pub struct RemoveTags {
    target_tags: BTreeSet<String>,
    skip: Option<SkipFn>,
}

impl RemoveTags {
    pub fn new<S: Into<String>>(target_tags: impl IntoIterator<Item = S>) -> Self {
        Self {
            target_tags: target_tags.into_iter().map(Into::into).collect(),
            skip: None,
        }
    }

    /// Leave instructions matching `skip` untouched. Call bodies are still
    /// traversed when the context is deep.
    #[must_use]
    pub fn with_skip(mut self, skip: impl Fn(&Instruction) -> bool + Send + Sync + 'static) -> Self {
        self.skip = Some(Arc::new(skip));
        self
    }
}

impl Pass for RemoveTags {
    fn name(&self) -> &str {
        "remove_tags"
    }

    fn run(&self, circuit: &Circuit, ctx: &TransformerContext) -> CompileResult<Circuit> {
        check_targets(&self.target_tags, ctx, "remove")?;
        let mut removed = 0usize;
        let out = map_operations(circuit, &traversal(ctx), |inst, _| {
            if self.skip.as_ref().is_some_and(|skip| skip(inst)) {
                return Ok(vec![inst.clone()]);
            }
            let mut stripped = inst.clone();
            stripped.tags.retain(|tag| !self.target_tags.contains(tag));
            removed += inst.tags.len() - stripped.tags.len();
            Ok(vec![stripped])
        })?;
        debug!(removed, "removed tags");
        Ok(out)
    }
}
