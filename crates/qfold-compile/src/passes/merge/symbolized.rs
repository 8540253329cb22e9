//! Symbolic single-qubit merge over a parameter sweep.
//!
//! Every sweep entry is resolved and merged numerically. When all entries
//! agree on the grouping, each group that contained a symbolic gate becomes
//! a PhasedXZ gate over fresh symbols `a{k}`, `x{k}`, `z{k}`, and the sweep
//! is rewritten to carry the per-entry values of those symbols.

use std::collections::BTreeSet;
use std::sync::Arc;

use rayon::prelude::*;
use rustc_hash::FxHashSet;
use tracing::{debug, instrument};

use qfold_ir::{Circuit, Gate, Instruction, IrError, ParamResolver, Sweep};

use crate::canonical::{SingleQubitDecomposer, ZyzDecomposer};
use crate::context::TransformerContext;
use crate::error::{CompileError, CompileResult};
use crate::pass::Pass;

use super::gates::MergeSingleQubitGates;
use super::{DEFAULT_ATOL, MergeGroup, Slot, Splice, plan_groups};

/// Binds the parameters of a circuit for one sweep entry.
///
/// Implementations must keep the moment and qubit layout of the circuit;
/// only parameters and tags may change.
pub trait ParameterResolution: Send + Sync {
    fn resolve(&self, circuit: &Circuit, resolver: &ParamResolver) -> CompileResult<Circuit>;
}

/// Plain parameter substitution.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveParameters;

impl ParameterResolution for ResolveParameters {
    fn resolve(&self, circuit: &Circuit, resolver: &ParamResolver) -> CompileResult<Circuit> {
        Ok(circuit.resolve(resolver))
    }
}

/// Merge result for one sweep entry.
struct EntryPlan {
    groups: Vec<MergeGroup>,
    /// PhasedXZ exponents of each symbolized group, aligned with `groups`.
    exponents: Vec<Option<[f64; 3]>>,
}

impl EntryPlan {
    fn same_structure(&self, other: &EntryPlan) -> bool {
        self.groups.len() == other.groups.len()
            && self
                .groups
                .iter()
                .zip(&other.groups)
                .all(|(a, b)| a.members == b.members)
    }
}

/// Symbolic single-qubit merge pass.
pub struct MergeSingleQubitGatesSymbolized {
    atol: f64,
    decomposer: Arc<dyn SingleQubitDecomposer>,
    resolution: Box<dyn ParameterResolution>,
}

impl Default for MergeSingleQubitGatesSymbolized {
    fn default() -> Self {
        Self::new()
    }
}

impl MergeSingleQubitGatesSymbolized {
    pub fn new() -> Self {
        Self {
            atol: DEFAULT_ATOL,
            decomposer: Arc::new(ZyzDecomposer),
            resolution: Box::new(ResolveParameters),
        }
    }

    #[must_use]
    pub fn with_atol(mut self, atol: f64) -> Self {
        self.atol = atol;
        self
    }

    #[must_use]
    pub fn with_decomposer(mut self, decomposer: impl SingleQubitDecomposer + 'static) -> Self {
        self.decomposer = Arc::new(decomposer);
        self
    }

    /// Replace how each sweep entry is bound to the circuit.
    #[must_use]
    pub fn with_resolution(mut self, resolution: impl ParameterResolution + 'static) -> Self {
        self.resolution = Box::new(resolution);
        self
    }

    fn numeric_merge(&self) -> MergeSingleQubitGates {
        MergeSingleQubitGates::to_phxz()
            .with_atol(self.atol)
            .with_shared_decomposer(Arc::clone(&self.decomposer))
    }

    /// Merge `circuit` symbolically against `sweep`.
    ///
    /// Returns the merged circuit and a sweep of the same length that binds
    /// the surviving symbols and the fresh ones introduced by the merge.
    #[instrument(skip(self, circuit, ctx, sweep), fields(entries = sweep.len()))]
    pub fn run_with_sweep(
        &self,
        circuit: &Circuit,
        ctx: &TransformerContext,
        sweep: &Sweep,
    ) -> CompileResult<(Circuit, Sweep)> {
        if ctx.deep {
            return Err(CompileError::InvalidConfiguration(
                "symbolized merge does not support deep transformation".into(),
            ));
        }

        let candidates = symbolic_slots(circuit, ctx);
        let single_symbols: BTreeSet<String> = candidates
            .iter()
            .flat_map(|(_, inst)| inst.symbols())
            .collect();
        if single_symbols.is_empty() {
            let merged = self.numeric_merge().run(circuit, ctx)?;
            return Ok((merged, sweep.clone()));
        }
        if sweep.is_empty() {
            return Err(CompileError::InvalidConfiguration(
                "symbolized merge needs at least one sweep entry".into(),
            ));
        }
        let symbolic: FxHashSet<Slot> = candidates.iter().map(|(slot, _)| *slot).collect();

        let planned: Vec<CompileResult<EntryPlan>> = sweep
            .entries()
            .par_iter()
            .map(|entry| {
                let resolver = entry.filtered(|name| single_symbols.contains(name));
                self.plan_entry(circuit, ctx, &resolver, &symbolic)
            })
            .collect();

        let mut plans: Vec<EntryPlan> = Vec::with_capacity(planned.len());
        for (entry, plan) in planned.into_iter().enumerate() {
            let plan = plan?;
            if let Some(first) = plans.first() {
                if !first.same_structure(&plan) {
                    return Err(CompileError::StructuralInconsistency { entry });
                }
            }
            plans.push(plan);
        }
        let first = &plans[0];

        let merged_away: FxHashSet<Slot> = first
            .groups
            .iter()
            .zip(&first.exponents)
            .filter(|(_, exponents)| exponents.is_some())
            .flat_map(|(group, _)| group.members.iter().copied())
            .collect();
        let surviving = surviving_symbols(circuit, &merged_away);

        let numeric = self.numeric_merge();
        let mut splice = Splice::default();
        let mut fresh: Vec<(usize, [String; 3])> = Vec::new();
        let mut next = 0usize;
        for (index, group) in first.groups.iter().enumerate() {
            if first.exponents[index].is_none() {
                if let Some(replacement) = numeric.replacement(group) {
                    splice.replace(group, replacement);
                }
                continue;
            }
            let names = loop {
                let names = [format!("a{next}"), format!("x{next}"), format!("z{next}")];
                next += 1;
                if names.iter().all(|name| !surviving.contains(name)) {
                    break names;
                }
            };
            let gate = Gate::phxz(names[0].as_str(), names[1].as_str(), names[2].as_str());
            splice.replace(group, vec![Instruction::gate(gate, [group.qubit()])]);
            fresh.push((index, names));
        }
        let merged = splice.apply(circuit, ctx)?;

        let derived: Sweep = sweep
            .iter()
            .zip(&plans)
            .map(|(entry, plan)| {
                let mut resolver = entry.filtered(|name| surviving.contains(name));
                for (index, names) in &fresh {
                    if let Some(values) = plan.exponents[*index] {
                        for (name, value) in names.iter().zip(values) {
                            resolver.insert(name.as_str(), value);
                        }
                    }
                }
                resolver
            })
            .collect();

        debug!(
            groups = first.groups.len(),
            symbolized = fresh.len(),
            surviving = surviving.len(),
            "symbolized merge finished"
        );
        Ok((merged, derived))
    }

    fn plan_entry(
        &self,
        circuit: &Circuit,
        ctx: &TransformerContext,
        resolver: &ParamResolver,
        symbolic: &FxHashSet<Slot>,
    ) -> CompileResult<EntryPlan> {
        let resolved = self.resolution.resolve(circuit, resolver)?;
        if resolved.len() != circuit.len() {
            return Err(CompileError::InvalidConfiguration(
                "parameter resolution changed the moment layout".into(),
            ));
        }
        if let Some((_, inst)) = symbolic_slots(&resolved, ctx).first() {
            let symbol = inst.symbols().into_iter().next().unwrap_or_default();
            return Err(IrError::UnboundParameter(symbol).into());
        }

        let groups = plan_groups(&resolved, ctx);
        let exponents = groups
            .iter()
            .map(|group| {
                if group.members.iter().any(|slot| symbolic.contains(slot)) {
                    self.exponents(group).map(Some)
                } else {
                    Ok(None)
                }
            })
            .collect::<CompileResult<Vec<_>>>()?;
        Ok(EntryPlan { groups, exponents })
    }

    fn exponents(&self, group: &MergeGroup) -> CompileResult<[f64; 3]> {
        let Some(gate) = self.decomposer.to_phxz(&group.unitary, self.atol) else {
            return Ok([0.0; 3]);
        };
        if let Gate::PhasedXZ {
            axis_phase_exponent,
            x_exponent,
            z_exponent,
        } = &gate
        {
            if let (Some(a), Some(x), Some(z)) = (
                axis_phase_exponent.as_f64(),
                x_exponent.as_f64(),
                z_exponent.as_f64(),
            ) {
                return Ok([a, x, z]);
            }
        }
        Err(CompileError::UnexpectedGate {
            gate: gate.to_string(),
        })
    }
}

/// Top-level single-qubit gates that are symbolic and eligible for merging.
fn symbolic_slots<'a>(
    circuit: &'a Circuit,
    ctx: &TransformerContext,
) -> Vec<(Slot, &'a Instruction)> {
    circuit
        .moments()
        .iter()
        .enumerate()
        .flat_map(|(index, moment)| moment.operations().iter().map(move |inst| (index, inst)))
        .filter(|(_, inst)| {
            inst.qubits.len() == 1
                && inst.is_gate()
                && inst.condition.is_none()
                && !ctx.is_ignored(inst)
                && inst.is_parameterized()
        })
        .map(|(index, inst)| ((index, inst.qubits[0]), inst))
        .collect()
}

/// Symbols still referenced once the merged-away instructions are gone.
fn surviving_symbols(circuit: &Circuit, merged_away: &FxHashSet<Slot>) -> BTreeSet<String> {
    let mut symbols = BTreeSet::new();
    for (index, moment) in circuit.moments().iter().enumerate() {
        for inst in moment {
            if let [qubit] = inst.qubits[..] {
                if merged_away.contains(&(index, qubit)) {
                    continue;
                }
            }
            symbols.extend(inst.symbols());
        }
    }
    symbols
}
