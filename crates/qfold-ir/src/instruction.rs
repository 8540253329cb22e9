//! Circuit instructions combining gates with operands.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::circuit::FrozenCircuit;
use crate::gate::Gate;
use crate::qubit::QubitId;
use crate::resolver::ParamResolver;

/// Classical control on a measurement key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassicalCondition {
    /// Measurement key the instruction is conditioned on.
    pub key: String,
}

impl ClassicalCondition {
    /// Create a new classical condition.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// A nested circuit replayed at the call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitOperation {
    /// The shared body.
    pub circuit: FrozenCircuit,
    /// How many times the body is replayed.
    pub repetitions: u32,
}

/// The kind of instruction in a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstructionKind {
    /// A quantum gate operation.
    Gate(Gate),
    /// Measurement recording its result under `key`.
    Measure {
        /// Measurement key.
        key: String,
    },
    /// A call into a nested circuit.
    Circuit(CircuitOperation),
}

/// A complete instruction with operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The kind of instruction.
    pub kind: InstructionKind,
    /// Qubits this instruction operates on.
    pub qubits: Vec<QubitId>,
    /// Annotations, kept sorted.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    /// Optional classical condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ClassicalCondition>,
}

impl Instruction {
    fn from_kind(kind: InstructionKind, qubits: Vec<QubitId>) -> Self {
        Self {
            kind,
            qubits,
            tags: BTreeSet::new(),
            condition: None,
        }
    }

    /// Create a gate instruction.
    pub fn gate(gate: Gate, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self::from_kind(InstructionKind::Gate(gate), qubits.into_iter().collect())
    }

    /// Create a measurement instruction.
    pub fn measure(qubits: impl IntoIterator<Item = QubitId>, key: impl Into<String>) -> Self {
        Self::from_kind(
            InstructionKind::Measure { key: key.into() },
            qubits.into_iter().collect(),
        )
    }

    /// Create a call into `circuit`, acting on the body's qubits.
    pub fn circuit_op(circuit: FrozenCircuit, repetitions: u32) -> Self {
        let qubits = circuit.all_qubits();
        Self::from_kind(
            InstructionKind::Circuit(CircuitOperation {
                circuit,
                repetitions,
            }),
            qubits,
        )
    }

    /// Add tags.
    #[must_use]
    pub fn with_tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Drop all tags.
    #[must_use]
    pub fn untagged(mut self) -> Self {
        self.tags.clear();
        self
    }

    /// Condition the instruction on a measurement key.
    #[must_use]
    pub fn with_condition(mut self, key: impl Into<String>) -> Self {
        self.condition = Some(ClassicalCondition::new(key));
        self
    }

    /// Swap the body of a call, keeping repetitions, tags and condition.
    ///
    /// Non-call instructions are returned unchanged.
    #[must_use]
    pub fn with_circuit(mut self, circuit: FrozenCircuit) -> Self {
        if let InstructionKind::Circuit(op) = &mut self.kind {
            op.circuit = circuit;
        }
        self
    }

    /// Check if this is a gate instruction.
    pub fn is_gate(&self) -> bool {
        matches!(self.kind, InstructionKind::Gate(_))
    }

    /// Check if this is a measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self.kind, InstructionKind::Measure { .. })
    }

    /// Check if this is a call into a nested circuit.
    pub fn is_circuit_op(&self) -> bool {
        matches!(self.kind, InstructionKind::Circuit(_))
    }

    /// Whether any tag is in `tags`.
    pub fn has_any_tag(&self, tags: &BTreeSet<String>) -> bool {
        !self.tags.is_disjoint(tags)
    }

    /// Get the gate if this is a gate instruction.
    pub fn as_gate(&self) -> Option<&Gate> {
        match &self.kind {
            InstructionKind::Gate(g) => Some(g),
            _ => None,
        }
    }

    /// Get the call if this is a circuit operation.
    pub fn as_circuit_op(&self) -> Option<&CircuitOperation> {
        match &self.kind {
            InstructionKind::Circuit(op) => Some(op),
            _ => None,
        }
    }

    /// Get the name of the instruction.
    pub fn name(&self) -> &str {
        match &self.kind {
            InstructionKind::Gate(g) => g.name(),
            InstructionKind::Measure { .. } => "measure",
            InstructionKind::Circuit(_) => "circuit",
        }
    }

    /// Measurement keys written by this instruction.
    pub fn measurement_keys(&self) -> BTreeSet<String> {
        match &self.kind {
            InstructionKind::Measure { key } => BTreeSet::from([key.clone()]),
            InstructionKind::Circuit(op) => op.circuit.measurement_keys(),
            InstructionKind::Gate(_) => BTreeSet::new(),
        }
    }

    /// Measurement keys read by this instruction.
    pub fn control_keys(&self) -> BTreeSet<String> {
        let mut keys = match &self.kind {
            InstructionKind::Circuit(op) => op.circuit.control_keys(),
            _ => BTreeSet::new(),
        };
        if let Some(cond) = &self.condition {
            keys.insert(cond.key.clone());
        }
        keys
    }

    /// Free symbols, including those of a nested body.
    pub fn symbols(&self) -> BTreeSet<String> {
        match &self.kind {
            InstructionKind::Gate(g) => g.symbols(),
            InstructionKind::Measure { .. } => BTreeSet::new(),
            InstructionKind::Circuit(op) => op.circuit.symbols(),
        }
    }

    /// Whether the instruction has free symbols.
    pub fn is_parameterized(&self) -> bool {
        match &self.kind {
            InstructionKind::Gate(g) => g.is_parameterized(),
            InstructionKind::Measure { .. } => false,
            InstructionKind::Circuit(op) => op.circuit.is_parameterized(),
        }
    }

    /// Substitute the symbols known to `resolver`.
    #[must_use]
    pub fn resolve(&self, resolver: &ParamResolver) -> Self {
        let kind = match &self.kind {
            InstructionKind::Gate(g) => InstructionKind::Gate(g.resolve(resolver)),
            InstructionKind::Measure { .. } => return self.clone(),
            InstructionKind::Circuit(op) if op.circuit.is_parameterized() => {
                InstructionKind::Circuit(CircuitOperation {
                    circuit: op.circuit.resolve(resolver).freeze(),
                    repetitions: op.repetitions,
                })
            }
            InstructionKind::Circuit(_) => return self.clone(),
        };
        Self {
            kind,
            qubits: self.qubits.clone(),
            tags: self.tags.clone(),
            condition: self.condition.clone(),
        }
    }

    /// Same operation on the same qubits, gate exponents compared modulo 2.
    pub fn approx_eq(&self, other: &Instruction, atol: f64) -> bool {
        if self.qubits != other.qubits || self.tags != other.tags || self.condition != other.condition
        {
            return false;
        }
        match (&self.kind, &other.kind) {
            (InstructionKind::Gate(a), InstructionKind::Gate(b)) => a.approx_eq(b, atol),
            (InstructionKind::Circuit(a), InstructionKind::Circuit(b)) => {
                a.repetitions == b.repetitions && a.circuit.approx_eq(&b.circuit, atol)
            }
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            InstructionKind::Gate(g) => write!(f, "{g}")?,
            InstructionKind::Measure { key } => write!(f, "M('{key}')")?,
            InstructionKind::Circuit(op) => write!(f, "Circuit**{}", op.repetitions)?,
        }
        let qubits: Vec<String> = self.qubits.iter().map(ToString::to_string).collect();
        write!(f, "({})", qubits.join(", "))?;
        if !self.tags.is_empty() {
            let tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
            write!(f, "[{}]", tags.join(", "))?;
        }
        if let Some(cond) = &self.condition {
            write!(f, ".with_condition('{}')", cond.key)?;
        }
        Ok(())
    }
}
