//! Single-qubit merge passes.
//!
//! All variants share one accumulator: a linear scan over the moments that
//! keeps, per qubit, the run of mergeable instructions seen since the last
//! boundary on that qubit. A run is flushed into a [`MergeGroup`] when a
//! non-mergeable instruction touches the qubit, and at the end of the
//! circuit. The merged replacement is anchored at the run's first member.

mod gates;
mod moments;
mod symbolized;


use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};

use qfold_ir::{Circuit, Gate, Instruction, QubitId};

use crate::canonical::gate_unitary;
use crate::context::TransformerContext;
use crate::error::CompileResult;
use crate::primitives::map_operations;
use crate::unitary::Unitary2x2;

pub use gates::{MergeSingleQubitGates, SingleQubitForm};
pub use moments::MergeSingleQubitMoments;
pub use symbolized::{MergeSingleQubitGatesSymbolized, ParameterResolution, ResolveParameters};

/// Default absolute tolerance of the merge passes.
pub const DEFAULT_ATOL: f64 = 1e-8;

/// A single-qubit instruction's position: moment index and qubit.
pub(crate) type Slot = (usize, QubitId);

/// A run of single-qubit instructions merged into one operator.
#[derive(Debug, Clone)]
pub(crate) struct MergeGroup {
    /// Members in application order; never empty.
    pub members: Vec<Slot>,
    /// Member gates, aligned with `members`.
    pub gates: Vec<Gate>,
    /// Product of the member unitaries, last member leftmost.
    pub unitary: Unitary2x2,
}

impl MergeGroup {
    fn start(slot: Slot, gate: &Gate, unitary: Unitary2x2) -> Self {
        Self {
            members: vec![slot],
            gates: vec![gate.clone()],
            unitary,
        }
    }

    fn absorb(&mut self, slot: Slot, gate: &Gate, unitary: Unitary2x2) {
        self.members.push(slot);
        self.gates.push(gate.clone());
        self.unitary = unitary * self.unitary;
    }

    /// Where the merged replacement goes.
    pub fn anchor(&self) -> Slot {
        self.members[0]
    }

    /// The qubit the group acts on.
    pub fn qubit(&self) -> QubitId {
        self.anchor().1
    }
}

/// Unitary of `inst` when it may join a merge run.
///
/// Mergeable instructions are unconditioned, untagged-by-ignore, numeric
/// single-qubit gates.
pub(crate) fn mergeable_unitary(
    inst: &Instruction,
    ctx: &TransformerContext,
) -> Option<Unitary2x2> {
    if inst.qubits.len() != 1 || inst.condition.is_some() || ctx.is_ignored(inst) {
        return None;
    }
    inst.as_gate().and_then(gate_unitary)
}

/// Scan the top level of `circuit` and collect its merge groups, ordered
/// by anchor.
pub(crate) fn plan_groups(circuit: &Circuit, ctx: &TransformerContext) -> Vec<MergeGroup> {
    let mut pending: BTreeMap<QubitId, MergeGroup> = BTreeMap::new();
    let mut groups = Vec::new();

    for (index, moment) in circuit.moments().iter().enumerate() {
        for inst in moment {
            if let (Some(unitary), Some(gate)) = (mergeable_unitary(inst, ctx), inst.as_gate()) {
                let qubit = inst.qubits[0];
                let slot = (index, qubit);
                match pending.get_mut(&qubit) {
                    Some(group) => group.absorb(slot, gate, unitary),
                    None => {
                        pending.insert(qubit, MergeGroup::start(slot, gate, unitary));
                    }
                }
                continue;
            }
            let mut touched = inst.qubits.clone();
            touched.sort_unstable();
            for qubit in touched {
                if let Some(group) = pending.remove(&qubit) {
                    groups.push(group);
                }
            }
        }
    }

    groups.extend(pending.into_values());
    groups.sort_by_key(MergeGroup::anchor);
    groups
}

/// Planned edits to a circuit's top level.
#[derive(Default)]
pub(crate) struct Splice {
    replacements: FxHashMap<Slot, Vec<Instruction>>,
    removed: FxHashSet<Slot>,
}

impl Splice {
    /// Replace the whole group by `instructions`, placed at its anchor.
    pub fn replace(&mut self, group: &MergeGroup, instructions: Vec<Instruction>) {
        self.replacements.insert(group.anchor(), instructions);
        self.removed.extend(group.members.iter().skip(1).copied());
    }

    /// Number of groups replaced.
    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    /// Rewrite the top level of `circuit`.
    pub fn apply(mut self, circuit: &Circuit, ctx: &TransformerContext) -> CompileResult<Circuit> {
        if self.replacements.is_empty() {
            return Ok(circuit.clone());
        }
        let shallow = ctx.clone().with_deep(false);
        map_operations(circuit, &shallow, |inst, index| {
            if let [qubit] = inst.qubits[..] {
                let slot = (index, qubit);
                if self.removed.contains(&slot) {
                    return Ok(vec![]);
                }
                if let Some(replacement) = self.replacements.remove(&slot) {
                    return Ok(replacement);
                }
            }
            Ok(vec![inst.clone()])
        })
    }
}
