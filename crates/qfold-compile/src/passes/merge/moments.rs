//! Merge adjacent single-qubit moments.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use qfold_ir::{Circuit, Gate, Instruction, Moment, QubitId};

use crate::canonical::{SingleQubitDecomposer, ZyzDecomposer};
use crate::context::TransformerContext;
use crate::error::CompileResult;
use crate::pass::Pass;
use crate::primitives::transform_nested;
use crate::unitary::Unitary2x2;

use super::{DEFAULT_ATOL, mergeable_unitary};

/// Per-qubit view of a moment made only of mergeable gates.
type Layer = BTreeMap<QubitId, (Instruction, Unitary2x2)>;

/// Moment-level merge pass.
///
/// Two adjacent moments that contain only numeric single-qubit gates are
/// fused into one moment holding at most one PhasedXZ per qubit. Qubits
/// whose product is the identity are left empty. A mergeable moment with
/// no mergeable neighbour is kept as it is.
pub struct MergeSingleQubitMoments {
    atol: f64,
    decomposer: Arc<dyn SingleQubitDecomposer>,
}

impl Default for MergeSingleQubitMoments {
    fn default() -> Self {
        Self::new()
    }
}

impl MergeSingleQubitMoments {
    pub fn new() -> Self {
        Self {
            atol: DEFAULT_ATOL,
            decomposer: Arc::new(ZyzDecomposer),
        }
    }

    #[must_use]
    pub fn with_atol(mut self, atol: f64) -> Self {
        self.atol = atol;
        self
    }

    #[must_use]
    pub fn with_decomposer(mut self, decomposer: impl SingleQubitDecomposer + 'static) -> Self {
        self.decomposer = Arc::new(decomposer);
        self
    }

    /// `None` unless every instruction of `moment` is mergeable.
    fn layer(moment: &Moment, ctx: &TransformerContext) -> Option<Layer> {
        moment
            .operations()
            .iter()
            .map(|inst| {
                let unitary = mergeable_unitary(inst, ctx)?;
                Some((inst.qubits[0], (inst.clone(), unitary)))
            })
            .collect()
    }

    fn canonical(&self, qubit: QubitId, unitary: Unitary2x2) -> Option<(Instruction, Unitary2x2)> {
        let gate = self.decomposer.to_phxz(&unitary, self.atol)?;
        Some((Instruction::gate(gate, [qubit]), unitary))
    }

    fn merge_layers(&self, first: Layer, second: Layer) -> Layer {
        let mut qubits: Vec<QubitId> = first.keys().chain(second.keys()).copied().collect();
        qubits.sort_unstable();
        qubits.dedup();

        let mut merged = Layer::new();
        for qubit in qubits {
            let entry = match (first.get(&qubit), second.get(&qubit)) {
                (Some((_, u1)), Some((_, u2))) => self.canonical(qubit, *u2 * *u1),
                (Some((inst, u)), None) | (None, Some((inst, u))) => {
                    if matches!(inst.as_gate(), Some(Gate::PhasedXZ { .. })) {
                        Some((inst.clone(), *u))
                    } else {
                        self.canonical(qubit, *u)
                    }
                }
                (None, None) => None,
            };
            if let Some(entry) = entry {
                merged.insert(qubit, entry);
            }
        }
        merged
    }

    fn merge_level(&self, circuit: &Circuit, ctx: &TransformerContext) -> CompileResult<Circuit> {
        let mut out: Vec<Moment> = Vec::with_capacity(circuit.len());
        // Layer of `out.last()` when that moment is mergeable.
        let mut tail: Option<Layer> = None;
        let mut fused = 0usize;

        for moment in circuit.moments() {
            match (tail.take(), Self::layer(moment, ctx)) {
                (Some(previous), Some(current)) => {
                    let merged = self.merge_layers(previous, current);
                    out.pop();
                    out.push(Moment::new(merged.values().map(|(inst, _)| inst.clone()))?);
                    tail = Some(merged);
                    fused += 1;
                }
                (_, current) => {
                    out.push(moment.clone());
                    tail = current;
                }
            }
        }

        debug!(
            before = circuit.len(),
            after = out.len(),
            fused,
            "merged single-qubit moments"
        );
        Ok(Circuit::from_moments(out))
    }
}

impl Pass for MergeSingleQubitMoments {
    fn name(&self) -> &str {
        "merge_single_qubit_moments_to_phxz"
    }

    fn run(&self, circuit: &Circuit, ctx: &TransformerContext) -> CompileResult<Circuit> {
        transform_nested(circuit, ctx, |level| self.merge_level(level, ctx))
    }
}
