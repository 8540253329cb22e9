//! Pass manager for orchestrating rewrites.

use tracing::{debug, info, instrument};

use qfold_ir::Circuit;

use crate::context::TransformerContext;
use crate::error::CompileResult;
use crate::pass::Pass;
use crate::passes::{MergeSingleQubitGates, MergeSingleQubitMoments};

/// Manages and executes a sequence of passes.
pub struct PassManager {
    /// The passes to execute, in order.
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    /// Create a new empty pass manager.
    pub fn new() -> Self {
        Self { passes: vec![] }
    }

    /// Add a pass to the manager.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Names of the passes, in order.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Run all passes on `circuit`.
    ///
    /// A failing pass aborts the pipeline with its own error.
    #[instrument(skip(self, circuit, ctx), fields(deep = ctx.deep))]
    pub fn run(&self, circuit: &Circuit, ctx: &TransformerContext) -> CompileResult<Circuit> {
        info!(
            "Running pass manager with {} passes on circuit with {} moments",
            self.passes.len(),
            circuit.len()
        );

        let mut current = circuit.clone();
        for pass in &self.passes {
            if !pass.should_run(&current, ctx) {
                debug!("Skipping pass: {}", pass.name());
                continue;
            }
            debug!("Running pass: {}", pass.name());
            current = pass.run(&current, ctx)?;
            debug!(
                "Pass {} completed, moments: {}, ops: {}",
                pass.name(),
                current.len(),
                current.num_operations()
            );
        }

        info!(
            "Pass manager completed, moments: {}, ops: {}",
            current.len(),
            current.num_operations()
        );
        Ok(current)
    }

    /// Get the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the manager has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating pass managers with preset configurations.
pub struct PassManagerBuilder {
    /// Optimization level (0-2).
    optimization_level: u8,
    /// Rewrite scope handed to every pass.
    context: TransformerContext,
}

impl PassManagerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            optimization_level: 1,
            context: TransformerContext::new(),
        }
    }

    /// Set the optimization level.
    ///
    /// - Level 0: No passes
    /// - Level 1: Merge single-qubit gates into PhasedXZ (default)
    /// - Level 2: Additionally fuse adjacent single-qubit moments
    #[must_use]
    pub fn with_optimization_level(mut self, level: u8) -> Self {
        self.optimization_level = level.min(2);
        self
    }

    /// Set the rewrite context.
    #[must_use]
    pub fn with_context(mut self, context: TransformerContext) -> Self {
        self.context = context;
        self
    }

    /// Build the pass manager and return it with the context.
    pub fn build(self) -> (PassManager, TransformerContext) {
        let mut pm = PassManager::new();

        if self.optimization_level >= 1 {
            pm.add_pass(MergeSingleQubitGates::to_phxz());
        }
        if self.optimization_level >= 2 {
            pm.add_pass(MergeSingleQubitMoments::new());
        }

        (pm, self.context)
    }
}

impl Default for PassManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
