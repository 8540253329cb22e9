//! Merge runs of single-qubit gates into canonical gates.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use qfold_ir::{Circuit, Gate, Instruction};

use crate::canonical::{SingleQubitDecomposer, ZyzDecomposer};
use crate::context::TransformerContext;
use crate::error::CompileResult;
use crate::pass::Pass;
use crate::primitives::transform_nested;
use crate::unitary::Unitary2x2;

use super::{DEFAULT_ATOL, MergeGroup, Splice, plan_groups};

/// Output form of [`MergeSingleQubitGates`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SingleQubitForm {
    /// At most a PhasedX followed by a Z rotation.
    PhasedXAndZ,
    /// At most one PhasedXZ gate.
    #[default]
    PhasedXZ,
}

impl SingleQubitForm {
    /// Whether `gates` already is a single merged unit in this form.
    fn is_canonical(self, gates: &[Gate]) -> bool {
        match self {
            Self::PhasedXZ => matches!(gates, [Gate::PhasedXZ { .. }]),
            Self::PhasedXAndZ => matches!(
                gates,
                [Gate::PhasedX { .. }] | [Gate::Z(_)] | [Gate::PhasedX { .. }, Gate::Z(_)]
            ),
        }
    }
}

/// Single-qubit gate merge pass.
///
/// Every maximal run of numeric single-qubit gates on a qubit is replaced
/// by its product in the configured [`SingleQubitForm`]. Runs that reduce
/// to the identity are deleted; runs that already are one canonical unit
/// are left untouched, which makes the pass idempotent.
pub struct MergeSingleQubitGates {
    form: SingleQubitForm,
    atol: f64,
    decomposer: Arc<dyn SingleQubitDecomposer>,
}

impl Default for MergeSingleQubitGates {
    fn default() -> Self {
        Self::new(SingleQubitForm::default())
    }
}

impl MergeSingleQubitGates {
    /// Create a merge pass producing `form`.
    pub fn new(form: SingleQubitForm) -> Self {
        Self {
            form,
            atol: DEFAULT_ATOL,
            decomposer: Arc::new(ZyzDecomposer),
        }
    }

    /// Merge into single PhasedXZ gates.
    pub fn to_phxz() -> Self {
        Self::new(SingleQubitForm::PhasedXZ)
    }

    /// Merge into PhasedX and Z pairs.
    pub fn to_phased_x_and_z() -> Self {
        Self::new(SingleQubitForm::PhasedXAndZ)
    }

    /// Set the tolerance below which a merged operator counts as identity.
    #[must_use]
    pub fn with_atol(mut self, atol: f64) -> Self {
        self.atol = atol;
        self
    }

    /// Replace the matrix-to-gate decomposer.
    #[must_use]
    pub fn with_decomposer(self, decomposer: impl SingleQubitDecomposer + 'static) -> Self {
        self.with_shared_decomposer(Arc::new(decomposer))
    }

    pub(crate) fn with_shared_decomposer(mut self, decomposer: Arc<dyn SingleQubitDecomposer>) -> Self {
        self.decomposer = decomposer;
        self
    }

    /// The configured output form.
    pub fn form(&self) -> SingleQubitForm {
        self.form
    }

    fn canonical_gates(&self, unitary: &Unitary2x2) -> Vec<Gate> {
        match self.form {
            SingleQubitForm::PhasedXZ => self.decomposer.to_phxz(unitary, self.atol).into_iter().collect(),
            SingleQubitForm::PhasedXAndZ => self.decomposer.to_phased_x_and_z(unitary, self.atol),
        }
    }

    /// Replacement for `group`, or `None` to keep it verbatim.
    pub(crate) fn replacement(&self, group: &MergeGroup) -> Option<Vec<Instruction>> {
        if self.form.is_canonical(&group.gates) && !group.unitary.is_identity(self.atol) {
            return None;
        }
        let qubit = group.qubit();
        Some(
            self.canonical_gates(&group.unitary)
                .into_iter()
                .map(|gate| Instruction::gate(gate, [qubit]))
                .collect(),
        )
    }

    fn merge_level(&self, circuit: &Circuit, ctx: &TransformerContext) -> CompileResult<Circuit> {
        let groups = plan_groups(circuit, ctx);
        let mut splice = Splice::default();
        for group in &groups {
            if let Some(replacement) = self.replacement(group) {
                splice.replace(group, replacement);
            }
        }
        debug!(
            groups = groups.len(),
            merged = splice.len(),
            "merging single-qubit runs"
        );
        splice.apply(circuit, ctx)
    }
}

impl Pass for MergeSingleQubitGates {
    fn name(&self) -> &str {
        match self.form {
            SingleQubitForm::PhasedXZ => "merge_single_qubit_gates_to_phxz",
            SingleQubitForm::PhasedXAndZ => "merge_single_qubit_gates_to_phased_x_and_z",
        }
    }

    fn run(&self, circuit: &Circuit, ctx: &TransformerContext) -> CompileResult<Circuit> {
        transform_nested(circuit, ctx, |level| self.merge_level(level, ctx))
    }
}
