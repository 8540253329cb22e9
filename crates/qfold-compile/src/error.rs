//! Error types for the compilation crate.

use thiserror::Error;

/// Errors that can occur while rewriting circuits.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Error from the IR crate.
    #[error("IR error: {0}")]
    Ir(#[from] qfold_ir::IrError),

    /// Invalid pass configuration.
    #[error("Invalid pass configuration: {0}")]
    InvalidConfiguration(String),

    /// A symbolic merge grouped instructions differently for some sweep entry.
    #[error(
        "Sweep entry {entry} produces different merged structures than entry 0; \
         the circuit cannot be merged symbolically"
    )]
    StructuralInconsistency {
        /// Index of the first disagreeing sweep entry.
        entry: usize,
    },

    /// A merged gate was not in the canonical form.
    #[error("Expected merged gate to be PhasedXZ or Identity, got {gate}")]
    UnexpectedGate {
        /// The offending gate.
        gate: String,
    },

    /// An instruction has no unitary.
    #[error("Instruction {instruction} has no unitary")]
    NonUnitary {
        /// The offending instruction.
        instruction: String,
    },
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
