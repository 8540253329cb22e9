//! Integration tests for rewriting nested circuit operations.
//!
//! A body shared by several calls must be rewritten once, and every
//! non-ignored call must end up pointing at that one rewritten body.

use qfold_compile::{
    Pass, TransformerContext, merge_single_qubit_gates_to_phased_x_and_z,
    merge_single_qubit_gates_to_phxz, merge_single_qubit_moments_to_phxz, remove_tags,
    verify_equivalent,
};
use qfold_ir::{Circuit, FrozenCircuit, Gate, Instruction, QubitId};

const ATOL: f64 = 1e-8;

fn q(i: u32) -> QubitId {
    QubitId(i)
}

/// Two single-qubit runs around a CZ.
fn body() -> FrozenCircuit {
    let mut body = Circuit::new();
    body.h(q(0))
        .unwrap()
        .t(q(0))
        .unwrap()
        .x_pow(0.5, q(1))
        .unwrap()
        .cz(q(0), q(1))
        .unwrap()
        .y_pow(0.25, q(1))
        .unwrap()
        .z_pow(0.1, q(1))
        .unwrap();
    body.freeze()
}

/// The same body reached through a plain call, a repeat-4 ignored call, a
/// repeat-5 call tagged `preserve_tags` and a plain repeat-6 call.
fn shared_body_circuit(body: &FrozenCircuit) -> Circuit {
    let mut circuit = Circuit::new();
    circuit
        .append(Instruction::circuit_op(body.clone(), 1))
        .unwrap()
        .append(Instruction::circuit_op(body.clone(), 4).with_tags(["ignore"]))
        .unwrap()
        .append(Instruction::circuit_op(body.clone(), 5).with_tags(["preserve_tags"]))
        .unwrap()
        .append(Instruction::circuit_op(body.clone(), 6))
        .unwrap();
    circuit
}

fn calls(circuit: &Circuit) -> Vec<&Instruction> {
    circuit
        .all_operations()
        .filter(|op| op.is_circuit_op())
        .collect()
}

fn body_of(inst: &Instruction) -> &FrozenCircuit {
    &inst.as_circuit_op().unwrap().circuit
}

#[test]
fn test_deep_merge_rewrites_shared_body_once() {
    let body = body();
    let circuit = shared_body_circuit(&body);
    let ctx = TransformerContext::new()
        .with_deep(true)
        .with_tags_to_ignore(["ignore"]);

    let out = merge_single_qubit_gates_to_phxz(&circuit, Some(&ctx), ATOL).unwrap();
    let out_calls = calls(&out);
    assert_eq!(out_calls.len(), 4);

    // Ignored call keeps the original body.
    assert!(body_of(out_calls[1]).ptr_eq(&body));
    assert_eq!(out_calls[1], calls(&circuit)[1]);

    // Every other call shares one rewritten body.
    let merged = body_of(out_calls[0]);
    assert!(!merged.ptr_eq(&body));
    assert!(body_of(out_calls[2]).ptr_eq(merged));
    assert!(body_of(out_calls[3]).ptr_eq(merged));
    assert_eq!(merged.num_operations(), 4);

    let reps: Vec<u32> = out_calls
        .iter()
        .map(|op| op.as_circuit_op().unwrap().repetitions)
        .collect();
    assert_eq!(reps, vec![1, 4, 5, 6]);
    assert!(out_calls[2].tags.contains("preserve_tags"));

    assert!(verify_equivalent(&circuit, &out, 1e-7).unwrap().passed);
}

#[test]
fn test_shallow_merge_leaves_bodies_identical() {
    let body = body();
    let circuit = shared_body_circuit(&body);
    let ctx = TransformerContext::new().with_tags_to_ignore(["ignore"]);

    for out in [
        merge_single_qubit_gates_to_phxz(&circuit, Some(&ctx), ATOL).unwrap(),
        merge_single_qubit_gates_to_phased_x_and_z(&circuit, Some(&ctx), ATOL).unwrap(),
        merge_single_qubit_moments_to_phxz(&circuit, Some(&ctx), ATOL).unwrap(),
    ] {
        assert_eq!(out, circuit);
        assert!(calls(&out).iter().all(|op| body_of(op).ptr_eq(&body)));
    }
}

#[test]
fn test_deep_merge_into_nested_levels() {
    let inner = body();
    let mut middle = Circuit::new();
    middle
        .x(q(0))
        .unwrap()
        .append(Instruction::circuit_op(inner.clone(), 2))
        .unwrap()
        .x(q(0))
        .unwrap()
        .x(q(0))
        .unwrap();
    let middle = middle.freeze();

    let mut circuit = Circuit::new();
    circuit
        .append(Instruction::circuit_op(middle.clone(), 3))
        .unwrap()
        .h(q(2))
        .unwrap()
        .h(q(2))
        .unwrap();

    let ctx = TransformerContext::new().with_deep(true);
    let out = merge_single_qubit_gates_to_phxz(&circuit, Some(&ctx), ATOL).unwrap();

    assert_eq!(out.all_operations().filter(|op| op.is_gate()).count(), 0);
    let middle_out = body_of(calls(&out)[0]);
    // X, call, X·X = identity
    assert_eq!(middle_out.num_operations(), 2);
    let inner_out = middle_out
        .all_operations()
        .find_map(Instruction::as_circuit_op)
        .unwrap();
    assert_eq!(inner_out.repetitions, 2);
    assert!(!inner_out.circuit.ptr_eq(&inner));
    assert!(verify_equivalent(&circuit, &out, 1e-7).unwrap().passed);
}

#[test]
fn test_deep_moment_merge() {
    let mut body = Circuit::new();
    body.x(q(0)).unwrap().y(q(0)).unwrap().z(q(0)).unwrap();
    let body = body.freeze();
    let mut circuit = Circuit::new();
    circuit
        .append(Instruction::circuit_op(body.clone(), 2))
        .unwrap()
        .append(Instruction::circuit_op(body.clone(), 1))
        .unwrap();

    let ctx = TransformerContext::new().with_deep(true);
    let out = merge_single_qubit_moments_to_phxz(&circuit, Some(&ctx), ATOL).unwrap();
    let out_calls = calls(&out);
    assert!(body_of(out_calls[0]).ptr_eq(body_of(out_calls[1])));
    // Z·Y·X is a global phase, so the fused moment is empty.
    assert_eq!(body_of(out_calls[0]).len(), 1);
    assert_eq!(body_of(out_calls[0]).num_operations(), 0);
    assert!(verify_equivalent(&circuit, &out, 1e-7).unwrap().passed);
}

#[test]
fn test_deep_remove_tags_reaches_bodies() {
    let mut body = Circuit::new();
    body.append(Instruction::gate(Gate::x(), [q(0)]).with_tags(["tmp"]))
        .unwrap();
    let body = body.freeze();
    let mut circuit = Circuit::new();
    circuit
        .append(Instruction::circuit_op(body.clone(), 1).with_tags(["tmp"]))
        .unwrap();

    let ctx = TransformerContext::new().with_deep(true);
    let out = remove_tags(&circuit, Some(&ctx), ["tmp"]).unwrap();
    let call = calls(&out)[0];
    assert!(call.tags.is_empty());
    assert!(body_of(call).all_operations().all(|op| op.tags.is_empty()));

    let shallow = qfold_compile::RemoveTags::new(["tmp"])
        .run(&circuit, &TransformerContext::new())
        .unwrap();
    assert!(body_of(calls(&shallow)[0]).ptr_eq(&body));
}
