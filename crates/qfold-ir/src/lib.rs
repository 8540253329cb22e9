//! qfold Circuit Model
//!
//! This crate provides the moment-based circuit representation consumed by
//! the rewriting passes in `qfold-compile`.
//!
//! # Overview
//!
//! A [`Circuit`] is an ordered list of [`Moment`]s; each moment holds
//! [`Instruction`]s acting on pairwise disjoint qubits. Instructions are
//! gates, measurements, or calls into a nested [`FrozenCircuit`] that is
//! shared by reference and replayed a number of times.
//!
//! # Core Components
//!
//! - **Qubits**: [`QubitId`], ordered identifiers
//! - **Gates**: [`Gate`], a closed set of exponentiated gates including the
//!   canonical `PhasedX` and `PhasedXZ` forms
//! - **Parameters**: [`ParameterExpression`] for symbolic exponents,
//!   [`ParamResolver`] and [`Sweep`] for concrete assignments
//! - **Instructions**: [`Instruction`] with tags and optional classical
//!   conditions
//! - **Circuit**: [`Circuit`] builder with earliest placement, and
//!   [`FrozenCircuit`] for call bodies
//!
//! # Example: Building a Circuit
//!
//! ```rust
//! use qfold_ir::{Circuit, QubitId};
//!
//! let q = QubitId::range(2);
//! let mut circuit = Circuit::new();
//! circuit.h(q[0]).unwrap().cz(q[0], q[1]).unwrap().t(q[1]).unwrap();
//! circuit.measure([q[0], q[1]], "m").unwrap();
//!
//! assert_eq!(circuit.len(), 4);
//! assert_eq!(circuit.all_qubits(), q);
//! ```
//!
//! # Example: Symbolic Exponents
//!
//! ```rust
//! use qfold_ir::{Circuit, ParamResolver, QubitId};
//!
//! let mut circuit = Circuit::new();
//! circuit.z_pow("theta", QubitId(0)).unwrap();
//! assert!(circuit.is_parameterized());
//!
//! let bound = circuit.resolve(&ParamResolver::new().with_value("theta", 0.5));
//! assert!(!bound.is_parameterized());
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `I` | 1 | Identity |
//! | `X^t`, `Y^t`, `Z^t` | 1 | Exponentiated Pauli gates |
//! | `H^t` | 1 | Exponentiated Hadamard |
//! | `PhX(p)^t` | 1 | `Z^p X^t Z^-p` |
//! | `PhXZ(a, x, z)` | 1 | `Z^(z+a) X^x Z^-a` |
//! | `CZ^t`, `CX^t` | 2 | Controlled gates |
//! | `GlobalPhase(c)` | 0 | Phase factor |

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod moment;
pub mod parameter;
pub mod qubit;
pub mod resolver;

pub use circuit::{Circuit, FrozenCircuit};
pub use error::{IrError, IrResult};
pub use gate::{EXPONENT_PERIOD, Gate};
pub use instruction::{CircuitOperation, ClassicalCondition, Instruction, InstructionKind};
pub use moment::Moment;
pub use parameter::ParameterExpression;
pub use qubit::QubitId;
pub use resolver::{ParamResolver, Sweep};
