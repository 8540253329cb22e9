//! Free-function entry points for the built-in passes.
//!
//! Each function takes an optional context; `None` means a shallow rewrite
//! that ignores nothing.

use qfold_ir::{Circuit, Sweep};

use crate::context::TransformerContext;
use crate::error::CompileResult;
use crate::pass::Pass;
use crate::passes::{
    IndexTags, MergeSingleQubitGates, MergeSingleQubitGatesSymbolized, MergeSingleQubitMoments,
    RemoveTags,
};
use crate::passes::tags::SkipFn;

fn context_or_default(ctx: Option<&TransformerContext>) -> TransformerContext {
    ctx.cloned().unwrap_or_default()
}

/// Merge every run of single-qubit gates into at most a PhasedX followed by
/// a Z rotation.
pub fn merge_single_qubit_gates_to_phased_x_and_z(
    circuit: &Circuit,
    ctx: Option<&TransformerContext>,
    atol: f64,
) -> CompileResult<Circuit> {
    MergeSingleQubitGates::to_phased_x_and_z()
        .with_atol(atol)
        .run(circuit, &context_or_default(ctx))
}

/// Merge every run of single-qubit gates into at most one PhasedXZ gate.
pub fn merge_single_qubit_gates_to_phxz(
    circuit: &Circuit,
    ctx: Option<&TransformerContext>,
    atol: f64,
) -> CompileResult<Circuit> {
    MergeSingleQubitGates::to_phxz()
        .with_atol(atol)
        .run(circuit, &context_or_default(ctx))
}

/// Fuse adjacent single-qubit moments into moments of PhasedXZ gates.
pub fn merge_single_qubit_moments_to_phxz(
    circuit: &Circuit,
    ctx: Option<&TransformerContext>,
    atol: f64,
) -> CompileResult<Circuit> {
    MergeSingleQubitMoments::new()
        .with_atol(atol)
        .run(circuit, &context_or_default(ctx))
}

/// Merge single-qubit runs containing symbolic gates into PhasedXZ gates
/// over fresh symbols, returning the sweep that binds them.
pub fn merge_single_qubit_gates_to_phxz_symbolized(
    circuit: &Circuit,
    ctx: Option<&TransformerContext>,
    sweep: &Sweep,
    atol: f64,
) -> CompileResult<(Circuit, Sweep)> {
    MergeSingleQubitGatesSymbolized::new()
        .with_atol(atol)
        .run_with_sweep(circuit, &context_or_default(ctx), sweep)
}

/// Number every occurrence of the target tags.
///
/// Instructions matching `skip` keep their tags and do not advance the
/// counters.
pub fn index_tags<S: Into<String>>(
    circuit: &Circuit,
    ctx: Option<&TransformerContext>,
    target_tags: impl IntoIterator<Item = S>,
    skip: Option<SkipFn>,
) -> CompileResult<Circuit> {
    IndexTags::new(target_tags)
        .with_skip_fn(skip)
        .run(circuit, &context_or_default(ctx))
}

/// Remove the target tags from every instruction.
pub fn remove_tags<S: Into<String>>(
    circuit: &Circuit,
    ctx: Option<&TransformerContext>,
    target_tags: impl IntoIterator<Item = S>,
) -> CompileResult<Circuit> {
    RemoveTags::new(target_tags).run(circuit, &context_or_default(ctx))
}
