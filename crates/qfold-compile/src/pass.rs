//! Pass trait for circuit rewrites.

use qfold_ir::Circuit;

use crate::context::TransformerContext;
use crate::error::CompileResult;

/// A rewrite from one circuit to another.
///
/// Passes never mutate their input; nested bodies that a pass leaves
/// untouched stay shared between input and output.
pub trait Pass: Send + Sync {
    /// Get the name of this pass.
    fn name(&self) -> &str;

    /// Rewrite `circuit` under `ctx`.
    fn run(&self, circuit: &Circuit, ctx: &TransformerContext) -> CompileResult<Circuit>;

    /// Check if this pass should run based on current state.
    ///
    /// This can be overridden to skip passes that are not needed.
    fn should_run(&self, _circuit: &Circuit, _ctx: &TransformerContext) -> bool {
        true
    }
}
