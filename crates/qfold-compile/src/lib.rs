//! qfold Circuit Rewriting Framework
//!
//! This crate merges runs of single-qubit gates into canonical forms, with
//! support for nested circuit operations, tags that make instructions
//! opaque, and symbolic circuits evaluated over a parameter sweep.
//!
//! # Overview
//!
//! Rewrites are expressed as [`Pass`]es over a [`qfold_ir::Circuit`]. Every
//! pass receives a [`TransformerContext`] naming the tags to ignore and
//! whether nested bodies are rewritten too:
//!
//! 1. **Gate merge**: each run of single-qubit gates becomes one PhasedXZ,
//!    or a PhasedX followed by a Z rotation
//! 2. **Moment merge**: adjacent single-qubit moments fuse into one
//! 3. **Symbolized merge**: runs containing symbolic gates become PhasedXZ
//!    gates over fresh symbols, with a derived parameter sweep
//! 4. **Tags**: number or strip tags
//!
//! ```text
//! Input Circuit
//!       |
//!       v
//! +-------------+
//! | PassManager | <-- TransformerContext (tags_to_ignore, deep)
//! +-------------+
//!       |
//!       +-- MergeSingleQubitGates (PhasedXZ / PhasedX+Z)
//!       +-- MergeSingleQubitMoments
//!       |
//!       v
//! Output Circuit
//! ```
//!
//! # Example: Merging a run
//!
//! ```rust
//! use qfold_compile::{PassManagerBuilder, verify_equivalent};
//! use qfold_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::new();
//! circuit.h(QubitId(0)).unwrap().t(QubitId(0)).unwrap().h(QubitId(0)).unwrap();
//!
//! let (pm, ctx) = PassManagerBuilder::new().with_optimization_level(1).build();
//! let merged = pm.run(&circuit, &ctx).unwrap();
//!
//! assert_eq!(merged.num_operations(), 1);
//! assert!(verify_equivalent(&circuit, &merged, 1e-7).unwrap().passed);
//! ```
//!
//! # Example: Symbolic merge
//!
//! ```rust
//! use qfold_compile::merge_single_qubit_gates_to_phxz_symbolized;
//! use qfold_ir::{Circuit, QubitId, Sweep};
//!
//! let mut circuit = Circuit::new();
//! circuit.h(QubitId(0)).unwrap().z_pow("t", QubitId(0)).unwrap();
//!
//! let sweep = Sweep::points("t", [0.25, 0.5]);
//! let (merged, derived) =
//!     merge_single_qubit_gates_to_phxz_symbolized(&circuit, None, &sweep, 1e-8).unwrap();
//!
//! assert_eq!(merged.num_operations(), 1);
//! assert_eq!(derived.len(), 2);
//! assert!(derived.get(0).unwrap().contains("a0"));
//! ```
//!
//! # Custom Passes
//!
//! Implement the [`Pass`] trait, usually on top of [`map_operations`]:
//!
//! ```rust
//! use qfold_compile::{CompileResult, Pass, TransformerContext, map_operations};
//! use qfold_ir::Circuit;
//!
//! struct DropMeasurements;
//!
//! impl Pass for DropMeasurements {
//!     fn name(&self) -> &str { "drop_measurements" }
//!
//!     fn run(&self, circuit: &Circuit, ctx: &TransformerContext) -> CompileResult<Circuit> {
//!         map_operations(circuit, ctx, |op, _| {
//!             Ok(if op.is_measure() { vec![] } else { vec![op.clone()] })
//!         })
//!     }
//! }
//! ```

pub mod canonical;
pub mod context;
pub mod error;
pub mod manager;
pub mod pass;
pub mod primitives;
pub mod transformers;
pub mod unitary;
pub mod verification;

// Built-in passes
pub mod passes;

pub use canonical::{SingleQubitDecomposer, ZyzDecomposer, gate_unitary};
pub use context::TransformerContext;
pub use error::{CompileError, CompileResult};
pub use manager::{PassManager, PassManagerBuilder};
pub use pass::Pass;
pub use passes::{
    DEFAULT_ATOL, IndexTags, MergeSingleQubitGates, MergeSingleQubitGatesSymbolized, MergeSingleQubitMoments,
    ParameterResolution, RemoveTags, ResolveParameters, SingleQubitForm,
};
pub use primitives::{map_operations, transform_nested};
pub use transformers::{
    index_tags, merge_single_qubit_gates_to_phased_x_and_z, merge_single_qubit_gates_to_phxz,
    merge_single_qubit_gates_to_phxz_symbolized, merge_single_qubit_moments_to_phxz, remove_tags,
};
pub use unitary::Unitary2x2;
pub use verification::{
    DenseUnitary, VerificationResult, allclose_up_to_global_phase, circuit_unitary,
    verify_equivalent,
};
