//! Moments: sets of instructions acting in one time step.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{IrError, IrResult};
use crate::instruction::Instruction;
use crate::qubit::QubitId;

/// Instructions on pairwise disjoint qubits.
///
/// Instructions are stored ordered by their qubits so that two moments
/// holding the same instructions compare equal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Moment {
    operations: Vec<Instruction>,
}

fn sort_key(inst: &Instruction) -> Vec<QubitId> {
    let mut qubits = inst.qubits.clone();
    qubits.sort_unstable();
    qubits
}

impl Moment {
    /// Create an empty moment.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a moment, rejecting instructions that share a qubit.
    pub fn new(operations: impl IntoIterator<Item = Instruction>) -> IrResult<Self> {
        let mut moment = Self::empty();
        for inst in operations {
            moment.push(inst)?;
        }
        Ok(moment)
    }

    /// Rebuild a moment with each instruction transformed by `f`.
    ///
    /// `f` must keep each instruction's qubits.
    pub(crate) fn map_in_place(&self, f: impl FnMut(&Instruction) -> Instruction) -> Self {
        Self {
            operations: self.operations.iter().map(f).collect(),
        }
    }

    /// Add an instruction, rejecting it if one of its qubits is taken.
    pub fn push(&mut self, inst: Instruction) -> IrResult<()> {
        if let Some(&qubit) = inst.qubits.iter().find(|q| self.operates_on(**q)) {
            return Err(IrError::OverlappingQubits {
                qubit,
                gate_name: Some(inst.name().to_string()),
            });
        }
        let key = sort_key(&inst);
        let pos = self.operations.partition_point(|op| sort_key(op) <= key);
        self.operations.insert(pos, inst);
        Ok(())
    }

    /// Instructions in qubit order.
    pub fn operations(&self) -> &[Instruction] {
        &self.operations
    }

    /// Consume the moment, yielding its instructions.
    pub fn into_operations(self) -> Vec<Instruction> {
        self.operations
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the moment holds no instructions.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Whether some instruction acts on `qubit`.
    pub fn operates_on(&self, qubit: QubitId) -> bool {
        self.operation_at(qubit).is_some()
    }

    /// The instruction acting on `qubit`, if any.
    pub fn operation_at(&self, qubit: QubitId) -> Option<&Instruction> {
        self.operations.iter().find(|op| op.qubits.contains(&qubit))
    }

    /// Qubits touched by this moment, sorted.
    pub fn qubits(&self) -> BTreeSet<QubitId> {
        self.operations
            .iter()
            .flat_map(|op| op.qubits.iter().copied())
            .collect()
    }

    /// Whether `inst` must be placed after this moment.
    ///
    /// True when they share a qubit, or when one reads a measurement key
    /// the other writes.
    pub fn conflicts_with(&self, inst: &Instruction) -> bool {
        if inst.qubits.iter().any(|q| self.operates_on(*q)) {
            return true;
        }
        let writes = inst.measurement_keys();
        let reads = inst.control_keys();
        if writes.is_empty() && reads.is_empty() {
            return false;
        }
        self.operations.iter().any(|op| {
            let op_writes = op.measurement_keys();
            !op_writes.is_disjoint(&reads)
                || !op_writes.is_disjoint(&writes)
                || !op.control_keys().is_disjoint(&writes)
        })
    }
}

impl<'a> IntoIterator for &'a Moment {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}
