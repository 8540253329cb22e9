//! Generic rewrite primitives.
//!
//! Both primitives recurse into the bodies of circuit operations when the
//! context is deep. A body is rewritten once per identity: every call
//! sharing that body in the input shares the rewritten body in the output,
//! and the call keeps its repetitions, tags and condition. Calls carrying
//! an ignored tag are never entered.

use rustc_hash::FxHashMap;
use tracing::debug;

use qfold_ir::{Circuit, FrozenCircuit, Instruction, Moment};

use crate::context::TransformerContext;
use crate::error::CompileResult;

/// Rewritten bodies keyed by the identity of the original body.
#[derive(Default)]
struct BodyCache {
    bodies: FxHashMap<usize, FrozenCircuit>,
    hits: usize,
}

impl BodyCache {
    fn get(&mut self, original: &FrozenCircuit) -> Option<FrozenCircuit> {
        let hit = self.bodies.get(&original.id()).cloned();
        if hit.is_some() {
            self.hits += 1;
        }
        hit
    }

    fn insert(&mut self, original: &FrozenCircuit, rewritten: FrozenCircuit) {
        self.bodies.insert(original.id(), rewritten);
    }
}

/// Replace every instruction by the output of `f`.
///
/// `f` receives the instruction and the index of its moment. Ignored
/// instructions are copied without calling `f`. The replacements of one
/// input moment are packed into as few output moments as the earliest
/// strategy allows; a moment whose instructions all vanish is dropped,
/// while a moment that was empty to begin with is kept.
pub fn map_operations<F>(
    circuit: &Circuit,
    ctx: &TransformerContext,
    mut f: F,
) -> CompileResult<Circuit>
where
    F: FnMut(&Instruction, usize) -> CompileResult<Vec<Instruction>>,
{
    let mut cache = BodyCache::default();
    let mapped = map_circuit(circuit, ctx, &mut f, &mut cache)?;
    if ctx.deep {
        debug!(
            bodies = cache.bodies.len(),
            reused = cache.hits,
            "map_operations rewrote nested bodies"
        );
    }
    Ok(mapped)
}

fn map_circuit<F>(
    circuit: &Circuit,
    ctx: &TransformerContext,
    f: &mut F,
    cache: &mut BodyCache,
) -> CompileResult<Circuit>
where
    F: FnMut(&Instruction, usize) -> CompileResult<Vec<Instruction>>,
{
    let mut out = Circuit::new();
    for (index, moment) in circuit.moments().iter().enumerate() {
        if moment.is_empty() {
            out.push_moment(Moment::empty());
            continue;
        }

        let mut block = Circuit::new();
        for inst in moment {
            if ctx.is_ignored(inst) {
                block.append(inst.clone())?;
                continue;
            }
            let replacements = match inst.as_circuit_op() {
                Some(op) if ctx.deep => {
                    let body = match cache.get(&op.circuit) {
                        Some(body) => body,
                        None => {
                            let body = map_circuit(&op.circuit, ctx, f, cache)?.freeze();
                            cache.insert(&op.circuit, body.clone());
                            body
                        }
                    };
                    f(&inst.clone().with_circuit(body), index)?
                }
                _ => f(inst, index)?,
            };
            for replacement in replacements {
                block.append(replacement)?;
            }
        }

        for packed in block.into_moments() {
            out.push_moment(packed);
        }
    }
    Ok(out)
}

/// Apply a whole-circuit transform to every nested body, innermost first,
/// and then to the circuit itself.
///
/// Without `deep` only the top level is transformed.
pub fn transform_nested<T>(
    circuit: &Circuit,
    ctx: &TransformerContext,
    mut transform: T,
) -> CompileResult<Circuit>
where
    T: FnMut(&Circuit) -> CompileResult<Circuit>,
{
    if !ctx.deep {
        return transform(circuit);
    }
    let mut cache = BodyCache::default();
    let out = transform_circuit(circuit, ctx, &mut transform, &mut cache)?;
    debug!(
        bodies = cache.bodies.len(),
        reused = cache.hits,
        "transform_nested rewrote nested bodies"
    );
    Ok(out)
}

fn transform_circuit<T>(
    circuit: &Circuit,
    ctx: &TransformerContext,
    transform: &mut T,
    cache: &mut BodyCache,
) -> CompileResult<Circuit>
where
    T: FnMut(&Circuit) -> CompileResult<Circuit>,
{
    let mut moments = Vec::with_capacity(circuit.len());
    for moment in circuit.moments() {
        let mut rebuilt = Moment::empty();
        for inst in moment {
            let inst = match inst.as_circuit_op() {
                Some(op) if !ctx.is_ignored(inst) => {
                    let body = match cache.get(&op.circuit) {
                        Some(body) => body,
                        None => {
                            let body =
                                transform_circuit(&op.circuit, ctx, transform, cache)?.freeze();
                            cache.insert(&op.circuit, body.clone());
                            body
                        }
                    };
                    inst.clone().with_circuit(body)
                }
                _ => inst.clone(),
            };
            rebuilt.push(inst)?;
        }
        moments.push(rebuilt);
    }
    transform(&Circuit::from_moments(moments))
}
