//! Built-in rewrite passes.
//!
//! - [`merge`]: single-qubit gate, moment and symbolized merges
//! - [`tags`]: tag indexing and removal

pub mod merge;
pub mod tags;

pub use merge::{
    DEFAULT_ATOL, MergeSingleQubitGates, MergeSingleQubitGatesSymbolized, MergeSingleQubitMoments,
    ParameterResolution, ResolveParameters, SingleQubitForm,
};
pub use tags::{IndexTags, RemoveTags};
