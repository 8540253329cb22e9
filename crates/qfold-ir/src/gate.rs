//! Quantum gate types.
//!
//! Every exponentiated gate follows the `G^t` convention: `G^1` is the plain
//! gate, `G^0` the identity, and exponents are periodic with period 2.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::parameter::ParameterExpression;
use crate::resolver::ParamResolver;

/// Period shared by all gate exponents.
pub const EXPONENT_PERIOD: f64 = 2.0;

/// The closed set of gates understood by the rewriting passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    /// Single-qubit identity.
    I,
    /// Pauli-X raised to an exponent.
    X(ParameterExpression),
    /// Pauli-Y raised to an exponent.
    Y(ParameterExpression),
    /// Pauli-Z raised to an exponent.
    Z(ParameterExpression),
    /// Hadamard raised to an exponent.
    H(ParameterExpression),
    /// `Z^p · X^t · Z^-p`.
    PhasedX {
        /// Phase exponent `p`.
        phase_exponent: ParameterExpression,
        /// Rotation exponent `t`.
        exponent: ParameterExpression,
    },
    /// `Z^(z+a) · X^x · Z^-a`, the canonical three-parameter form.
    PhasedXZ {
        /// Axis phase exponent `a`.
        axis_phase_exponent: ParameterExpression,
        /// X exponent `x`.
        x_exponent: ParameterExpression,
        /// Z exponent `z`.
        z_exponent: ParameterExpression,
    },
    /// Controlled-Z raised to an exponent.
    CZ(ParameterExpression),
    /// Controlled-X raised to an exponent, control first.
    CX(ParameterExpression),
    /// A global phase factor acting on no qubits.
    GlobalPhase(Complex64),
}

impl Gate {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Pauli-X.
    pub fn x() -> Self {
        Gate::X(1.0.into())
    }

    /// Pauli-Y.
    pub fn y() -> Self {
        Gate::Y(1.0.into())
    }

    /// Pauli-Z.
    pub fn z() -> Self {
        Gate::Z(1.0.into())
    }

    /// Hadamard.
    pub fn h() -> Self {
        Gate::H(1.0.into())
    }

    /// `Z^0.5`.
    pub fn s() -> Self {
        Gate::Z(0.5.into())
    }

    /// `Z^0.25`.
    pub fn t() -> Self {
        Gate::Z(0.25.into())
    }

    /// `X^t`.
    pub fn x_pow(t: impl Into<ParameterExpression>) -> Self {
        Gate::X(t.into())
    }

    /// `Y^t`.
    pub fn y_pow(t: impl Into<ParameterExpression>) -> Self {
        Gate::Y(t.into())
    }

    /// `Z^t`.
    pub fn z_pow(t: impl Into<ParameterExpression>) -> Self {
        Gate::Z(t.into())
    }

    /// `H^t`.
    pub fn h_pow(t: impl Into<ParameterExpression>) -> Self {
        Gate::H(t.into())
    }

    /// Phased X rotation.
    pub fn phased_x(
        phase_exponent: impl Into<ParameterExpression>,
        exponent: impl Into<ParameterExpression>,
    ) -> Self {
        Gate::PhasedX {
            phase_exponent: phase_exponent.into(),
            exponent: exponent.into(),
        }
    }

    /// Canonical three-parameter gate.
    pub fn phxz(
        axis_phase_exponent: impl Into<ParameterExpression>,
        x_exponent: impl Into<ParameterExpression>,
        z_exponent: impl Into<ParameterExpression>,
    ) -> Self {
        Gate::PhasedXZ {
            axis_phase_exponent: axis_phase_exponent.into(),
            x_exponent: x_exponent.into(),
            z_exponent: z_exponent.into(),
        }
    }

    /// Controlled-Z.
    pub fn cz() -> Self {
        Gate::CZ(1.0.into())
    }

    /// `CZ^t`.
    pub fn cz_pow(t: impl Into<ParameterExpression>) -> Self {
        Gate::CZ(t.into())
    }

    /// Controlled-X.
    pub fn cx() -> Self {
        Gate::CX(1.0.into())
    }

    /// `CX^t`.
    pub fn cx_pow(t: impl Into<ParameterExpression>) -> Self {
        Gate::CX(t.into())
    }

    /// Global phase `coefficient`.
    pub fn global_phase(coefficient: Complex64) -> Self {
        Gate::GlobalPhase(coefficient)
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Short gate name.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Gate::I => "I",
            Gate::X(_) => "X",
            Gate::Y(_) => "Y",
            Gate::Z(_) => "Z",
            Gate::H(_) => "H",
            Gate::PhasedX { .. } => "PhX",
            Gate::PhasedXZ { .. } => "PhXZ",
            Gate::CZ(_) => "CZ",
            Gate::CX(_) => "CX",
            Gate::GlobalPhase(_) => "GlobalPhase",
        }
    }

    /// Number of qubits the gate acts on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            Gate::GlobalPhase(_) => 0,
            Gate::I
            | Gate::X(_)
            | Gate::Y(_)
            | Gate::Z(_)
            | Gate::H(_)
            | Gate::PhasedX { .. }
            | Gate::PhasedXZ { .. } => 1,
            Gate::CZ(_) | Gate::CX(_) => 2,
        }
    }

    /// All exponent expressions of the gate.
    pub fn parameters(&self) -> Vec<&ParameterExpression> {
        match self {
            Gate::I | Gate::GlobalPhase(_) => vec![],
            Gate::X(e) | Gate::Y(e) | Gate::Z(e) | Gate::H(e) | Gate::CZ(e) | Gate::CX(e) => {
                vec![e]
            }
            Gate::PhasedX {
                phase_exponent,
                exponent,
            } => vec![phase_exponent, exponent],
            Gate::PhasedXZ {
                axis_phase_exponent,
                x_exponent,
                z_exponent,
            } => vec![axis_phase_exponent, x_exponent, z_exponent],
        }
    }

    /// Whether any exponent still contains a free symbol.
    pub fn is_parameterized(&self) -> bool {
        self.parameters().iter().any(|p| p.is_symbolic())
    }

    /// Free symbols of the gate, sorted.
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut set = BTreeSet::new();
        for p in self.parameters() {
            p.collect_symbols(&mut set);
        }
        set
    }

    /// Apply `f` to every exponent, keeping the gate shape.
    pub fn map_parameters(&self, mut f: impl FnMut(&ParameterExpression) -> ParameterExpression) -> Self {
        match self {
            Gate::I => Gate::I,
            Gate::GlobalPhase(c) => Gate::GlobalPhase(*c),
            Gate::X(e) => Gate::X(f(e)),
            Gate::Y(e) => Gate::Y(f(e)),
            Gate::Z(e) => Gate::Z(f(e)),
            Gate::H(e) => Gate::H(f(e)),
            Gate::CZ(e) => Gate::CZ(f(e)),
            Gate::CX(e) => Gate::CX(f(e)),
            Gate::PhasedX {
                phase_exponent,
                exponent,
            } => Gate::PhasedX {
                phase_exponent: f(phase_exponent),
                exponent: f(exponent),
            },
            Gate::PhasedXZ {
                axis_phase_exponent,
                x_exponent,
                z_exponent,
            } => Gate::PhasedXZ {
                axis_phase_exponent: f(axis_phase_exponent),
                x_exponent: f(x_exponent),
                z_exponent: f(z_exponent),
            },
        }
    }

    /// Substitute the symbols known to `resolver`.
    #[must_use]
    pub fn resolve(&self, resolver: &ParamResolver) -> Self {
        if !self.is_parameterized() {
            return self.clone();
        }
        self.map_parameters(|p| p.resolve(resolver))
    }

    /// Same variant with every exponent equal modulo the exponent period.
    pub fn approx_eq(&self, other: &Gate, atol: f64) -> bool {
        match (self, other) {
            (Gate::GlobalPhase(a), Gate::GlobalPhase(b)) => (a - b).norm() <= atol,
            _ if std::mem::discriminant(self) == std::mem::discriminant(other) => self
                .parameters()
                .iter()
                .zip(other.parameters())
                .all(|(a, b)| a.approx_eq_mod(b, EXPONENT_PERIOD, atol)),
            _ => false,
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::I => write!(f, "I"),
            Gate::GlobalPhase(c) => write!(f, "GlobalPhase({c})"),
            Gate::X(e) | Gate::Y(e) | Gate::Z(e) | Gate::H(e) | Gate::CZ(e) | Gate::CX(e) => {
                if e.as_f64() == Some(1.0) {
                    write!(f, "{}", self.name())
                } else {
                    write!(f, "{}**{e}", self.name())
                }
            }
            Gate::PhasedX {
                phase_exponent,
                exponent,
            } => write!(f, "PhX({phase_exponent})**{exponent}"),
            Gate::PhasedXZ {
                axis_phase_exponent,
                x_exponent,
                z_exponent,
            } => write!(
                f,
                "PhXZ(a={axis_phase_exponent},x={x_exponent},z={z_exponent})"
            ),
        }
    }
}
