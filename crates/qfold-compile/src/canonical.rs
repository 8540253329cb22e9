//! Canonical single-qubit forms.
//!
//! [`gate_unitary`] turns numeric single-qubit gates into matrices and a
//! [`SingleQubitDecomposer`] turns accumulated matrices back into gates.

use std::sync::LazyLock;

use qfold_ir::{Gate, ParameterExpression};

use crate::unitary::Unitary2x2;

/// Unitary of a numeric single-qubit gate.
///
/// Returns `None` for symbolic gates and for gates that do not act on
/// exactly one qubit.
pub fn gate_unitary(gate: &Gate) -> Option<Unitary2x2> {
    static U_I: LazyLock<Unitary2x2> = LazyLock::new(Unitary2x2::identity);
    static U_X: LazyLock<Unitary2x2> = LazyLock::new(Unitary2x2::x);
    static U_Y: LazyLock<Unitary2x2> = LazyLock::new(Unitary2x2::y);
    static U_Z: LazyLock<Unitary2x2> = LazyLock::new(Unitary2x2::z);
    static U_H: LazyLock<Unitary2x2> = LazyLock::new(Unitary2x2::h);

    fn pow(
        e: &ParameterExpression,
        whole: &LazyLock<Unitary2x2>,
        f: fn(f64) -> Unitary2x2,
    ) -> Option<Unitary2x2> {
        let t = e.as_f64()?;
        Some(if t == 1.0 { **whole } else { f(t) })
    }

    match gate {
        Gate::I => Some(*U_I),
        Gate::X(e) => pow(e, &U_X, Unitary2x2::x_pow),
        Gate::Y(e) => pow(e, &U_Y, Unitary2x2::y_pow),
        Gate::Z(e) => pow(e, &U_Z, Unitary2x2::z_pow),
        Gate::H(e) => pow(e, &U_H, Unitary2x2::h_pow),
        Gate::PhasedX {
            phase_exponent,
            exponent,
        } => Some(Unitary2x2::phased_x(
            phase_exponent.as_f64()?,
            exponent.as_f64()?,
        )),
        Gate::PhasedXZ {
            axis_phase_exponent,
            x_exponent,
            z_exponent,
        } => Some(Unitary2x2::phxz(
            axis_phase_exponent.as_f64()?,
            x_exponent.as_f64()?,
            z_exponent.as_f64()?,
        )),
        Gate::CZ(_) | Gate::CX(_) | Gate::GlobalPhase(_) => None,
    }
}

/// Converts accumulated single-qubit operators into canonical gates.
///
/// Implementations must return gates whose product equals the input up to
/// global phase, and must choose parameters deterministically.
pub trait SingleQubitDecomposer: Send + Sync {
    /// A single PhasedXZ gate, or `None` when the operator is the identity
    /// up to global phase.
    fn to_phxz(&self, unitary: &Unitary2x2, atol: f64) -> Option<Gate>;

    /// A PhasedX gate followed by a Z gate, either omitted when it is the
    /// identity. A half-turn PhasedX absorbs the Z rotation.
    fn to_phased_x_and_z(&self, unitary: &Unitary2x2, atol: f64) -> Vec<Gate>;
}

/// Decomposer built on the ZYZ Euler decomposition.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZyzDecomposer;

impl SingleQubitDecomposer for ZyzDecomposer {
    fn to_phxz(&self, unitary: &Unitary2x2, atol: f64) -> Option<Gate> {
        if unitary.is_identity(atol) {
            return None;
        }
        let (a, x, z) = unitary.phxz_exponents(atol);
        Some(Gate::phxz(a, x, z))
    }

    fn to_phased_x_and_z(&self, unitary: &Unitary2x2, atol: f64) -> Vec<Gate> {
        let (a, x, z) = unitary.phxz_exponents(atol);
        if (x - 1.0).abs() <= atol {
            return vec![Gate::phased_x(a, 1.0)];
        }
        let mut gates = Vec::with_capacity(2);
        if Unitary2x2::phased_x(a, x).trace_distance_bound() > atol {
            gates.push(Gate::phased_x(a, x));
        }
        if Unitary2x2::z_pow(z).trace_distance_bound() > atol {
            gates.push(Gate::z_pow(z));
        }
        gates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATOL: f64 = 1e-8;

    fn product(gates: &[Gate]) -> Unitary2x2 {
        gates
            .iter()
            .fold(Unitary2x2::identity(), |acc, g| gate_unitary(g).unwrap() * acc)
    }

    #[test]
    fn test_gate_unitary_numeric_only() {
        assert!(gate_unitary(&Gate::x()).is_some());
        assert!(gate_unitary(&Gate::phxz(0.1, 0.2, 0.3)).is_some());
        assert!(gate_unitary(&Gate::z_pow("t")).is_none());
        assert!(gate_unitary(&Gate::cz()).is_none());
    }

    #[test]
    fn test_phxz_of_identity_is_omitted() {
        let u = Unitary2x2::h() * Unitary2x2::h();
        assert!(ZyzDecomposer.to_phxz(&u, ATOL).is_none());
        assert!(ZyzDecomposer.to_phased_x_and_z(&u, ATOL).is_empty());
    }

    #[test]
    fn test_phxz_roundtrip() {
        let u = Unitary2x2::y() * Unitary2x2::z_pow(0.25) * Unitary2x2::x();
        let gate = ZyzDecomposer.to_phxz(&u, ATOL).unwrap();
        assert!(matches!(gate, Gate::PhasedXZ { .. }));
        assert!(gate_unitary(&gate).unwrap().approx_eq_up_to_phase(&u, 1e-7));
        assert!(gate.approx_eq(&Gate::phxz(0.0, 0.0, 0.75), 1e-7));
    }

    #[test]
    fn test_half_turn_absorbs_z() {
        let u = Unitary2x2::z_pow(0.5) * Unitary2x2::x();
        let gates = ZyzDecomposer.to_phased_x_and_z(&u, ATOL);
        assert_eq!(gates.len(), 1);
        assert!(matches!(gates[0], Gate::PhasedX { .. }));
        assert!(product(&gates).approx_eq_up_to_phase(&u, 1e-7));
    }

    #[test]
    fn test_phased_x_and_z_pair() {
        let u = Unitary2x2::z() * Unitary2x2::h();
        let gates = ZyzDecomposer.to_phased_x_and_z(&u, ATOL);
        assert_eq!(gates.len(), 1, "H·Z is a quarter-turn about a tilted axis");
        assert!(product(&gates).approx_eq_up_to_phase(&u, 1e-7));

        let u = Unitary2x2::h();
        let gates = ZyzDecomposer.to_phased_x_and_z(&u, ATOL);
        assert_eq!(gates.len(), 2);
        assert!(matches!(gates[0], Gate::PhasedX { .. }));
        assert!(matches!(gates[1], Gate::Z(_)));
        assert!(product(&gates).approx_eq_up_to_phase(&u, 1e-7));
    }

    #[test]
    fn test_pure_z_drops_phased_x() {
        let u = Unitary2x2::z_pow(0.25);
        let gates = ZyzDecomposer.to_phased_x_and_z(&u, ATOL);
        assert_eq!(gates.len(), 1);
        assert!(gates[0].approx_eq(&Gate::z_pow(0.25), 1e-9));
    }
}
