//! Unitary-level equivalence checks.
//!
//! Small circuits are simulated column by column into a dense matrix so a
//! rewrite can be checked against its input up to global phase.

use num_complex::Complex64;
use rustc_hash::FxHashMap;
use std::f64::consts::PI;
use tracing::debug;

use qfold_ir::{Circuit, Gate, Instruction, InstructionKind, QubitId};

use crate::canonical::gate_unitary;
use crate::error::{CompileError, CompileResult};
use crate::unitary::Unitary2x2;

/// Result of an equivalence check.
#[derive(Debug, Clone, Default)]
pub struct VerificationResult {
    /// Whether the circuits agree within tolerance.
    pub passed: bool,
    /// Number of qubits in the compared operators.
    pub qubits_checked: usize,
    /// Largest elementwise deviation after aligning global phase.
    pub max_deviation: f64,
}

/// Dense unitary of a circuit.
///
/// The first qubit of the ordering is the most significant bit of the
/// basis index.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseUnitary {
    dim: usize,
    /// Row-major elements.
    data: Vec<Complex64>,
}

impl DenseUnitary {
    /// Matrix dimension, `2^n`.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Element at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.data[row * self.dim + col]
    }

    /// Largest deviation between `self` and `other` once the global phase
    /// of `other` is aligned to `self`. `None` if dimensions differ.
    pub fn phase_aligned_deviation(&self, other: &DenseUnitary) -> Option<f64> {
        if self.dim != other.dim {
            return None;
        }
        let pivot = (0..other.data.len())
            .max_by(|&i, &j| other.data[i].norm().total_cmp(&other.data[j].norm()))?;
        let (a, b) = (self.data[pivot], other.data[pivot]);
        if a.norm() == 0.0 {
            return Some(f64::INFINITY);
        }
        let phase = (a / b) / (a / b).norm();
        Some(
            self.data
                .iter()
                .zip(&other.data)
                .map(|(x, y)| (x - phase * y).norm())
                .fold(0.0, f64::max),
        )
    }
}

/// Whether `a` equals `b` up to a global phase, elementwise within `atol`.
pub fn allclose_up_to_global_phase(a: &DenseUnitary, b: &DenseUnitary, atol: f64) -> bool {
    a.phase_aligned_deviation(b).is_some_and(|d| d <= atol)
}

/// Simulate `circuit` on the given qubit ordering.
///
/// Circuit operations are expanded by repetition. Measurements, classically
/// conditioned instructions and unresolved parameters have no unitary.
pub fn circuit_unitary(circuit: &Circuit, qubits: &[QubitId]) -> CompileResult<DenseUnitary> {
    let n = qubits.len();
    let dim = 1usize << n;
    let bits: FxHashMap<QubitId, usize> = qubits
        .iter()
        .enumerate()
        .map(|(i, &q)| (q, n - 1 - i))
        .collect();

    let mut columns: Vec<Vec<Complex64>> = (0..dim)
        .map(|col| {
            let mut state = vec![Complex64::new(0.0, 0.0); dim];
            state[col] = Complex64::new(1.0, 0.0);
            state
        })
        .collect();
    apply_circuit(circuit, &bits, &mut columns)?;

    let mut data = vec![Complex64::new(0.0, 0.0); dim * dim];
    for (col, state) in columns.iter().enumerate() {
        for (row, amp) in state.iter().enumerate() {
            data[row * dim + col] = *amp;
        }
    }
    Ok(DenseUnitary { dim, data })
}

/// Check that `after` implements the same operator as `before`.
pub fn verify_equivalent(
    before: &Circuit,
    after: &Circuit,
    atol: f64,
) -> CompileResult<VerificationResult> {
    let mut qubits = before.all_qubits();
    qubits.extend(after.all_qubits());
    qubits.sort_unstable();
    qubits.dedup();

    let expected = circuit_unitary(before, &qubits)?;
    let actual = circuit_unitary(after, &qubits)?;
    let max_deviation = expected
        .phase_aligned_deviation(&actual)
        .unwrap_or(f64::INFINITY);

    let result = VerificationResult {
        passed: max_deviation <= atol,
        qubits_checked: qubits.len(),
        max_deviation,
    };
    debug!(
        passed = result.passed,
        qubits = result.qubits_checked,
        deviation = result.max_deviation,
        "unitary equivalence check"
    );
    Ok(result)
}

fn apply_circuit(
    circuit: &Circuit,
    bits: &FxHashMap<QubitId, usize>,
    states: &mut [Vec<Complex64>],
) -> CompileResult<()> {
    for inst in circuit.all_operations() {
        apply_instruction(inst, bits, states)?;
    }
    Ok(())
}

fn apply_instruction(
    inst: &Instruction,
    bits: &FxHashMap<QubitId, usize>,
    states: &mut [Vec<Complex64>],
) -> CompileResult<()> {
    let non_unitary = || CompileError::NonUnitary {
        instruction: inst.to_string(),
    };
    if inst.condition.is_some() {
        return Err(non_unitary());
    }

    let gate = match &inst.kind {
        InstructionKind::Measure { .. } => return Err(non_unitary()),
        InstructionKind::Circuit(op) => {
            for _ in 0..op.repetitions {
                apply_circuit(&op.circuit, bits, states)?;
            }
            return Ok(());
        }
        InstructionKind::Gate(gate) => gate,
    };

    let positions = inst
        .qubits
        .iter()
        .map(|q| {
            bits.get(q).copied().ok_or_else(|| {
                CompileError::InvalidConfiguration(format!("qubit {q} is missing from the ordering"))
            })
        })
        .collect::<CompileResult<Vec<usize>>>()?;

    match gate {
        Gate::GlobalPhase(coefficient) => {
            for amp in states.iter_mut().flatten() {
                *amp *= *coefficient;
            }
        }
        Gate::CZ(e) | Gate::CX(e) => {
            let t = e.as_f64().ok_or_else(non_unitary)?;
            let matrix = controlled_matrix(gate, t);
            for state in states.iter_mut() {
                apply_two(state, positions[0], positions[1], &matrix);
            }
        }
        _ => {
            let u = gate_unitary(gate).ok_or_else(non_unitary)?;
            for state in states.iter_mut() {
                apply_one(state, positions[0], &u);
            }
        }
    }
    Ok(())
}

/// 4x4 matrix of a controlled gate, control first.
fn controlled_matrix(gate: &Gate, t: f64) -> [[Complex64; 4]; 4] {
    let zero = Complex64::new(0.0, 0.0);
    let one = Complex64::new(1.0, 0.0);
    let g = Complex64::from_polar(1.0, PI * t);
    let mut m = [[zero; 4]; 4];
    m[0][0] = one;
    m[1][1] = one;
    if matches!(gate, Gate::CX(_)) {
        let [a, b, c, d] = Unitary2x2::x_pow(t).data;
        m[2][2] = a;
        m[2][3] = b;
        m[3][2] = c;
        m[3][3] = d;
    } else {
        m[2][2] = one;
        m[3][3] = g;
    }
    m
}

fn apply_one(state: &mut [Complex64], bit: usize, u: &Unitary2x2) {
    let mask = 1usize << bit;
    let [a, b, c, d] = u.data;
    for i in 0..state.len() {
        if i & mask != 0 {
            continue;
        }
        let j = i | mask;
        let (x0, x1) = (state[i], state[j]);
        state[i] = a * x0 + b * x1;
        state[j] = c * x0 + d * x1;
    }
}

fn apply_two(state: &mut [Complex64], high: usize, low: usize, m: &[[Complex64; 4]; 4]) {
    let (hm, lm) = (1usize << high, 1usize << low);
    for base in 0..state.len() {
        if base & (hm | lm) != 0 {
            continue;
        }
        let index = [base, base | lm, base | hm, base | hm | lm];
        let amps = index.map(|i| state[i]);
        for (row, &i) in index.iter().enumerate() {
            state[i] = (0..4).map(|k| m[row][k] * amps[k]).sum();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(i: u32) -> QubitId {
        QubitId(i)
    }

    #[test]
    fn test_hh_is_identity() {
        let mut circuit = Circuit::new();
        circuit.h(q(0)).unwrap().h(q(0)).unwrap();
        assert!(verify_equivalent(&circuit, &Circuit::new(), 1e-9).unwrap().passed);
        let u = circuit_unitary(&circuit, &[q(0)]).unwrap();
        let id = circuit_unitary(&Circuit::new(), &[q(0)]).unwrap();
        assert!(allclose_up_to_global_phase(&u, &id, 1e-9));
    }

    #[test]
    fn test_big_endian_ordering() {
        let mut circuit = Circuit::new();
        circuit.x(q(0)).unwrap();
        let u = circuit_unitary(&circuit, &[q(0), q(1)]).unwrap();
        // X on the most significant qubit maps |00> to |10>.
        assert!((u.get(2, 0) - Complex64::new(1.0, 0.0)).norm() < 1e-12);
        let u = circuit_unitary(&circuit, &[q(1), q(0)]).unwrap();
        assert!((u.get(1, 0) - Complex64::new(1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_cx_from_h_cz_h() {
        let mut a = Circuit::new();
        a.cx(q(0), q(1)).unwrap();
        let mut b = Circuit::new();
        b.h(q(1)).unwrap().cz(q(0), q(1)).unwrap().h(q(1)).unwrap();
        assert!(verify_equivalent(&a, &b, 1e-9).unwrap().passed);
    }

    #[test]
    fn test_global_phase_ignored() {
        let mut a = Circuit::new();
        a.z(q(0)).unwrap();
        let mut b = a.clone();
        b.global_phase(Complex64::new(0.0, 1.0)).unwrap();
        assert!(verify_equivalent(&a, &b, 1e-9).unwrap().passed);
    }

    #[test]
    fn test_call_expanded_by_repetition() {
        let mut body = Circuit::new();
        body.x_pow(0.25, q(0)).unwrap();
        let mut called = Circuit::new();
        called
            .append(Instruction::circuit_op(body.freeze(), 4))
            .unwrap();
        let mut flat = Circuit::new();
        flat.x(q(0)).unwrap();
        assert!(verify_equivalent(&called, &flat, 1e-9).unwrap().passed);
    }

    #[test]
    fn test_measurement_has_no_unitary() {
        let mut circuit = Circuit::new();
        circuit.measure([q(0)], "m").unwrap();
        let err = circuit_unitary(&circuit, &[q(0)]).unwrap_err();
        assert!(matches!(err, CompileError::NonUnitary { .. }));
    }

    #[test]
    fn test_symbolic_has_no_unitary() {
        let mut circuit = Circuit::new();
        circuit.z_pow("t", q(0)).unwrap();
        assert!(circuit_unitary(&circuit, &[q(0)]).is_err());
    }

    #[test]
    fn test_inequivalent_detected() {
        let mut a = Circuit::new();
        a.x(q(0)).unwrap();
        let mut b = Circuit::new();
        b.y(q(0)).unwrap();
        let result = verify_equivalent(&a, &b, 1e-6).unwrap();
        assert!(!result.passed);
        assert!(result.max_deviation > 0.1);
    }
}
