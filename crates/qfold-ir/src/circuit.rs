//! Moment-based circuits and their frozen, shareable form.

use num_complex::Complex64;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::ops::Deref;
use std::sync::Arc;

use crate::error::{IrError, IrResult};
use crate::gate::Gate;
use crate::instruction::{Instruction, InstructionKind};
use crate::moment::Moment;
use crate::parameter::ParameterExpression;
use crate::qubit::QubitId;
use crate::resolver::ParamResolver;

/// A quantum circuit: an ordered sequence of moments.
///
/// The builder methods place each new instruction with the *earliest*
/// strategy: it lands in the moment right after the last moment it
/// conflicts with, opening a new moment only when needed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    moments: Vec<Moment>,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a circuit from explicit moments, kept as given.
    pub fn from_moments(moments: impl IntoIterator<Item = Moment>) -> Self {
        Self {
            moments: moments.into_iter().collect(),
        }
    }

    /// Append a whole moment at the end.
    pub fn push_moment(&mut self, moment: Moment) -> &mut Self {
        self.moments.push(moment);
        self
    }

    /// Append an instruction with the earliest placement strategy.
    pub fn append(&mut self, inst: Instruction) -> IrResult<&mut Self> {
        validate(&inst)?;
        let idx = self
            .moments
            .iter()
            .rposition(|m| m.conflicts_with(&inst))
            .map_or(0, |i| i + 1);
        if idx == self.moments.len() {
            self.moments.push(Moment::empty());
        }
        self.moments[idx].push(inst)?;
        Ok(self)
    }

    /// Append every instruction of `other`, in order.
    pub fn append_circuit(&mut self, other: &Circuit) -> IrResult<&mut Self> {
        for inst in other.all_operations() {
            self.append(inst.clone())?;
        }
        Ok(self)
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(Gate::h(), [qubit])
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(Gate::x(), [qubit])
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(Gate::y(), [qubit])
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(Gate::z(), [qubit])
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(Gate::s(), [qubit])
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(Gate::t(), [qubit])
    }

    /// Apply `X^t`.
    pub fn x_pow(
        &mut self,
        t: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(Gate::x_pow(t), [qubit])
    }

    /// Apply `Y^t`.
    pub fn y_pow(
        &mut self,
        t: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(Gate::y_pow(t), [qubit])
    }

    /// Apply `Z^t`.
    pub fn z_pow(
        &mut self,
        t: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(Gate::z_pow(t), [qubit])
    }

    /// Apply `H^t`.
    pub fn h_pow(
        &mut self,
        t: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(Gate::h_pow(t), [qubit])
    }

    /// Apply a phased X rotation.
    pub fn phased_x(
        &mut self,
        phase_exponent: impl Into<ParameterExpression>,
        exponent: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(Gate::phased_x(phase_exponent, exponent), [qubit])
    }

    /// Apply the canonical three-parameter gate.
    pub fn phxz(
        &mut self,
        axis_phase_exponent: impl Into<ParameterExpression>,
        x_exponent: impl Into<ParameterExpression>,
        z_exponent: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(
            Gate::phxz(axis_phase_exponent, x_exponent, z_exponent),
            [qubit],
        )
    }

    // =========================================================================
    // Two-qubit gates
    // =========================================================================

    /// Apply CZ gate.
    pub fn cz(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.gate(Gate::cz(), [q1, q2])
    }

    /// Apply `CZ^t`.
    pub fn cz_pow(
        &mut self,
        t: impl Into<ParameterExpression>,
        q1: QubitId,
        q2: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(Gate::cz_pow(t), [q1, q2])
    }

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(Gate::cx(), [control, target])
    }

    // =========================================================================
    // Other operations
    // =========================================================================

    /// Apply an arbitrary gate.
    pub fn gate(
        &mut self,
        gate: Gate,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.append(Instruction::gate(gate, qubits))
    }

    /// Measure qubits under a key.
    pub fn measure(
        &mut self,
        qubits: impl IntoIterator<Item = QubitId>,
        key: impl Into<String>,
    ) -> IrResult<&mut Self> {
        self.append(Instruction::measure(qubits, key))
    }

    /// Apply a global phase.
    pub fn global_phase(&mut self, coefficient: Complex64) -> IrResult<&mut Self> {
        self.gate(Gate::global_phase(coefficient), std::iter::empty())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The moments in order.
    pub fn moments(&self) -> &[Moment] {
        &self.moments
    }

    /// Consume the circuit, yielding its moments.
    pub fn into_moments(self) -> Vec<Moment> {
        self.moments
    }

    /// Number of moments.
    pub fn len(&self) -> usize {
        self.moments.len()
    }

    /// Whether the circuit has no moments.
    pub fn is_empty(&self) -> bool {
        self.moments.is_empty()
    }

    /// All qubits acted on, sorted.
    pub fn all_qubits(&self) -> Vec<QubitId> {
        let set: BTreeSet<QubitId> = self.moments.iter().flat_map(Moment::qubits).collect();
        set.into_iter().collect()
    }

    /// All instructions in moment order.
    pub fn all_operations(&self) -> impl Iterator<Item = &Instruction> {
        self.moments.iter().flat_map(Moment::operations)
    }

    /// Number of instructions at the top level.
    pub fn num_operations(&self) -> usize {
        self.moments.iter().map(Moment::len).sum()
    }

    /// Measurement keys written anywhere in the circuit.
    pub fn measurement_keys(&self) -> BTreeSet<String> {
        self.all_operations()
            .flat_map(Instruction::measurement_keys)
            .collect()
    }

    /// Measurement keys read anywhere in the circuit.
    pub fn control_keys(&self) -> BTreeSet<String> {
        self.all_operations().flat_map(Instruction::control_keys).collect()
    }

    /// Free symbols, nested bodies included.
    pub fn symbols(&self) -> BTreeSet<String> {
        self.all_operations().flat_map(Instruction::symbols).collect()
    }

    /// Whether any instruction has free symbols.
    pub fn is_parameterized(&self) -> bool {
        self.all_operations().any(Instruction::is_parameterized)
    }

    /// Substitute the symbols known to `resolver` everywhere.
    #[must_use]
    pub fn resolve(&self, resolver: &ParamResolver) -> Self {
        Self {
            moments: self
                .moments
                .iter()
                .map(|m| m.map_in_place(|op| op.resolve(resolver)))
                .collect(),
        }
    }

    /// A copy with every empty moment removed.
    #[must_use]
    pub fn without_empty_moments(&self) -> Self {
        Self {
            moments: self.moments.iter().filter(|m| !m.is_empty()).cloned().collect(),
        }
    }

    /// Moment-by-moment equality with gate exponents compared modulo 2.
    pub fn approx_eq(&self, other: &Circuit, atol: f64) -> bool {
        self.moments.len() == other.moments.len()
            && self.moments.iter().zip(&other.moments).all(|(a, b)| {
                a.len() == b.len()
                    && a
                        .operations()
                        .iter()
                        .zip(b.operations())
                        .all(|(x, y)| x.approx_eq(y, atol))
            })
    }

    /// Freeze into a shareable body.
    pub fn freeze(self) -> FrozenCircuit {
        FrozenCircuit(Arc::new(self))
    }
}

fn validate(inst: &Instruction) -> IrResult<()> {
    if let InstructionKind::Gate(gate) = &inst.kind {
        let expected = gate.num_qubits() as usize;
        let got = inst.qubits.len();
        if expected != got {
            return Err(IrError::QubitCountMismatch {
                gate_name: gate.name().to_string(),
                expected: expected as u32,
                got: got as u32,
            });
        }
    }

    let mut seen = FxHashSet::default();
    for &qubit in &inst.qubits {
        if !seen.insert(qubit) {
            return Err(IrError::DuplicateQubit {
                qubit,
                gate_name: Some(inst.name().to_string()),
            });
        }
    }
    Ok(())
}

impl FromIterator<Moment> for Circuit {
    fn from_iter<T: IntoIterator<Item = Moment>>(iter: T) -> Self {
        Self::from_moments(iter)
    }
}

/// An immutable circuit shared by reference, used as the body of calls.
///
/// Cloning is cheap and keeps the identity. Equality compares contents.
#[derive(Debug, Clone)]
pub struct FrozenCircuit(Arc<Circuit>);

impl FrozenCircuit {
    /// Identity of the shared body.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// Whether both handles share the same body.
    pub fn ptr_eq(&self, other: &FrozenCircuit) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// A mutable copy of the body.
    pub fn unfreeze(&self) -> Circuit {
        (*self.0).clone()
    }
}

impl Deref for FrozenCircuit {
    type Target = Circuit;

    fn deref(&self) -> &Circuit {
        &self.0
    }
}

impl From<Circuit> for FrozenCircuit {
    fn from(circuit: Circuit) -> Self {
        circuit.freeze()
    }
}

impl PartialEq for FrozenCircuit {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0 == *other.0
    }
}

impl Serialize for FrozenCircuit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FrozenCircuit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Circuit::deserialize(deserializer).map(Circuit::freeze)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(i: u32) -> QubitId {
        QubitId(i)
    }

    #[test]
    fn test_earliest_packing() {
        let mut circuit = Circuit::new();
        circuit
            .h(q(0))
            .unwrap()
            .cz(q(0), q(1))
            .unwrap()
            .x(q(2))
            .unwrap()
            .y(q(1))
            .unwrap();

        assert_eq!(circuit.len(), 3);
        assert!(circuit.moments()[0].operates_on(q(2)));
        assert!(circuit.moments()[2].operates_on(q(1)));
        assert_eq!(circuit.num_operations(), 4);
        assert_eq!(circuit.all_qubits(), vec![q(0), q(1), q(2)]);
    }

    #[test]
    fn test_condition_waits_for_measurement() {
        let mut circuit = Circuit::new();
        circuit.measure([q(0)], "m").unwrap();
        circuit
            .append(Instruction::gate(Gate::x(), [q(1)]).with_condition("m"))
            .unwrap();
        assert_eq!(circuit.len(), 2);
    }

    #[test]
    fn test_qubit_count_mismatch() {
        let mut circuit = Circuit::new();
        let result = circuit.gate(Gate::cz(), [q(0)]);
        match result {
            Err(IrError::QubitCountMismatch {
                gate_name,
                expected,
                got,
            }) => {
                assert_eq!(gate_name, "CZ");
                assert_eq!(expected, 2);
                assert_eq!(got, 1);
            }
            _ => panic!("Expected QubitCountMismatch error"),
        }
    }

    #[test]
    fn test_duplicate_qubit() {
        let mut circuit = Circuit::new();
        assert!(matches!(
            circuit.cz(q(0), q(0)),
            Err(IrError::DuplicateQubit { qubit: QubitId(0), .. })
        ));
    }

    #[test]
    fn test_global_phase_goes_to_first_moment() {
        let mut circuit = Circuit::new();
        circuit.x(q(0)).unwrap().y(q(0)).unwrap();
        circuit.global_phase(Complex64::new(0.0, 1.0)).unwrap();
        assert_eq!(circuit.len(), 2);
        assert_eq!(circuit.moments()[0].len(), 2);
    }

    #[test]
    fn test_resolve_and_symbols() {
        let mut circuit = Circuit::new();
        circuit.z_pow("a", q(0)).unwrap().x_pow("b", q(1)).unwrap();
        assert!(circuit.is_parameterized());
        assert_eq!(circuit.symbols().len(), 2);

        let resolved = circuit.resolve(&ParamResolver::new().with_value("a", 0.5).with_value("b", 1.0));
        assert!(!resolved.is_parameterized());
        assert_eq!(resolved.len(), circuit.len());
    }

    #[test]
    fn test_frozen_identity() {
        let mut body = Circuit::new();
        body.h(q(0)).unwrap();
        let frozen = body.clone().freeze();
        let alias = frozen.clone();
        let other = body.freeze();
        assert!(frozen.ptr_eq(&alias));
        assert_eq!(frozen.id(), alias.id());
        assert!(!frozen.ptr_eq(&other));
        assert_eq!(frozen, other);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut body = Circuit::new();
        body.x_pow(0.5, q(0)).unwrap();
        let mut circuit = Circuit::new();
        circuit
            .append(Instruction::circuit_op(body.freeze(), 2).with_tags(["t"]))
            .unwrap()
            .measure([q(0)], "m")
            .unwrap();
        let json = serde_json::to_string(&circuit).unwrap();
        let back: Circuit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, circuit);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn arb_ops() -> impl Strategy<Value = Vec<(u32, Option<u32>)>> {
            prop::collection::vec(
                (0_u32..4, prop::option::of(0_u32..4))
                    .prop_filter("qubits must differ", |(a, b)| Some(*a) != *b),
                0..30,
            )
        }

        fn build(ops: &[(u32, Option<u32>)]) -> Circuit {
            let mut circuit = Circuit::new();
            for &(a, b) in ops {
                match b {
                    Some(b) => circuit.cz(q(a), q(b)).unwrap(),
                    None => circuit.h(q(a)).unwrap(),
                };
            }
            circuit
        }

        proptest! {
            #[test]
            fn test_append_keeps_every_operation(ops in arb_ops()) {
                let circuit = build(&ops);
                prop_assert_eq!(circuit.num_operations(), ops.len());
                prop_assert!(circuit.len() <= ops.len());
            }

            /// Earliest placement never leaves an instruction that could move
            /// one moment earlier.
            #[test]
            fn test_append_is_earliest(ops in arb_ops()) {
                let circuit = build(&ops);
                for pair in circuit.moments().windows(2) {
                    let previous: BTreeSet<QubitId> = pair[0]
                        .operations()
                        .iter()
                        .flat_map(|op| op.qubits.iter().copied())
                        .collect();
                    for op in pair[1].operations() {
                        prop_assert!(op.qubits.iter().any(|qubit| previous.contains(qubit)));
                    }
                }
            }
        }
    }
}
