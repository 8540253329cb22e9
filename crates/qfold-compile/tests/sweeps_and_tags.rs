//! Integration tests for the symbolized merge, tag passes and global phase.

use num_complex::Complex64;

use qfold_compile::{
    CompileError, PassManagerBuilder, TransformerContext, index_tags,
    merge_single_qubit_gates_to_phased_x_and_z, merge_single_qubit_gates_to_phxz,
    merge_single_qubit_gates_to_phxz_symbolized, merge_single_qubit_moments_to_phxz, remove_tags,
    verify_equivalent,
};
use qfold_ir::{Circuit, Gate, Instruction, QubitId, Sweep};

const ATOL: f64 = 1e-8;

fn q(i: u32) -> QubitId {
    QubitId(i)
}

// ============================================================================
// Symbolized merge
// ============================================================================

/// Two symbolic single-qubit rotations around a symbolic CZ.
fn symbolic_circuit() -> Circuit {
    let mut circuit = Circuit::new();
    circuit
        .h(q(0))
        .unwrap()
        .z_pow("a", q(0))
        .unwrap()
        .h(q(1))
        .unwrap()
        .cz_pow("c", q(0), q(1))
        .unwrap()
        .x_pow("b", q(1))
        .unwrap()
        .y_pow(0.5, q(1))
        .unwrap();
    circuit
}

#[test]
fn test_symbolized_merge_matches_every_entry() {
    let circuit = symbolic_circuit();
    let sweep = Sweep::points("a", [0.0, 1.0])
        .product(&Sweep::points("b", [0.0, 1.0]))
        .product(&Sweep::points("c", [0.0, 1.0]));
    assert_eq!(sweep.len(), 8);

    let (merged, derived) =
        merge_single_qubit_gates_to_phxz_symbolized(&circuit, None, &sweep, ATOL).unwrap();
    assert_eq!(derived.len(), sweep.len());
    assert!(merged.symbols().contains("c"));
    assert!(!merged.symbols().contains("a"));

    for (entry, derived_entry) in sweep.iter().zip(&derived) {
        let expected = circuit.resolve(entry);
        let actual = merged.resolve(derived_entry);
        assert!(!actual.is_parameterized());
        let result = verify_equivalent(&expected, &actual, 1e-7).unwrap();
        assert!(result.passed, "entry {entry:?} deviates by {}", result.max_deviation);
    }
}

#[test]
fn test_symbolized_merge_is_shallow_only() {
    let mut circuit = Circuit::new();
    circuit
        .x(q(0))
        .unwrap()
        .append(Instruction::gate(Gate::z_pow("t"), [q(0)]))
        .unwrap()
        .y(q(0))
        .unwrap();
    let sweep = Sweep::points("t", [0.5, 0.25]);

    let (merged, _) =
        merge_single_qubit_gates_to_phxz_symbolized(&circuit, None, &sweep, ATOL).unwrap();
    assert_eq!(merged.num_operations(), 1);

    let ctx = TransformerContext::new().with_deep(true);
    let err =
        merge_single_qubit_gates_to_phxz_symbolized(&circuit, Some(&ctx), &sweep, ATOL).unwrap_err();
    assert!(matches!(err, CompileError::InvalidConfiguration(_)));
}

#[test]
fn test_symbolized_merge_leaves_ignored_symbols() {
    let mut circuit = Circuit::new();
    circuit
        .append(Instruction::gate(Gate::z_pow("t"), [q(0)]).with_tags(["ignore"]))
        .unwrap()
        .x_pow("s", q(0))
        .unwrap()
        .h(q(0))
        .unwrap();
    let ctx = TransformerContext::new().with_tags_to_ignore(["ignore"]);
    let sweep = Sweep::zip([Sweep::points("t", [0.1, 0.2]), Sweep::points("s", [0.3, 0.4])]);

    let (merged, derived) =
        merge_single_qubit_gates_to_phxz_symbolized(&circuit, Some(&ctx), &sweep, ATOL).unwrap();
    assert!(merged.symbols().contains("t"));
    assert_eq!(derived.get(1).unwrap().value_of("t"), Some(0.2));
    assert!(!derived.get(1).unwrap().contains("s"));
    for (entry, derived_entry) in sweep.iter().zip(&derived) {
        assert!(
            verify_equivalent(&circuit.resolve(entry), &merged.resolve(derived_entry), 1e-7)
                .unwrap()
                .passed
        );
    }
}

// ============================================================================
// Global phase
// ============================================================================

#[test]
fn test_global_phase_only_circuit_is_unchanged() {
    let mut circuit = Circuit::new();
    circuit.global_phase(Complex64::new(0.0, -1.0)).unwrap();

    assert_eq!(merge_single_qubit_gates_to_phxz(&circuit, None, ATOL).unwrap(), circuit);
    assert_eq!(
        merge_single_qubit_gates_to_phased_x_and_z(&circuit, None, ATOL).unwrap(),
        circuit
    );
    assert_eq!(merge_single_qubit_moments_to_phxz(&circuit, None, ATOL).unwrap(), circuit);
    let (merged, derived) =
        merge_single_qubit_gates_to_phxz_symbolized(&circuit, None, &Sweep::unit(), ATOL)
            .unwrap();
    assert_eq!(merged, circuit);
    assert_eq!(derived, Sweep::unit());
}

// ============================================================================
// Tags
// ============================================================================

#[test]
fn test_index_tags_deterministic() {
    let mut circuit = Circuit::new();
    for i in 0..3 {
        circuit
            .append(Instruction::gate(Gate::x(), [q(i)]).with_tags(["x"]))
            .unwrap();
    }

    let out = index_tags(&circuit, None, ["x", "y"], None).unwrap();
    let tags: Vec<String> = out
        .all_operations()
        .flat_map(|op| op.tags.iter().cloned())
        .collect();
    assert_eq!(tags, vec!["x_0", "x_1", "x_2"]);

    let again = index_tags(&out, None, ["x", "y"], None).unwrap();
    assert_eq!(again, out);
}

#[test]
fn test_tag_round_trip_through_pipeline() {
    let mut circuit = Circuit::new();
    circuit
        .append(Instruction::gate(Gate::h(), [q(0)]).with_tags(["nocompile"]))
        .unwrap()
        .h(q(0))
        .unwrap()
        .h(q(0))
        .unwrap();

    let ctx = TransformerContext::from_json(r#"{"tags_to_ignore": ["nocompile"]}"#).unwrap();
    let (pm, ctx) = PassManagerBuilder::new()
        .with_optimization_level(2)
        .with_context(ctx)
        .build();
    let merged = pm.run(&circuit, &ctx).unwrap();
    assert_eq!(merged.num_operations(), 1);

    let err = remove_tags(&merged, Some(&ctx), ["nocompile"]).unwrap_err();
    assert!(matches!(err, CompileError::InvalidConfiguration(_)));
    let stripped = remove_tags(&merged, None, ["nocompile"]).unwrap();
    assert!(stripped.all_operations().all(|op| op.tags.is_empty()));
}

#[test]
fn test_deep_index_tags_shares_indexed_body() {
    let mut body = Circuit::new();
    body.append(Instruction::gate(Gate::x(), [q(0)]).with_tags(["x"]))
        .unwrap();
    let body = body.freeze();

    let mut circuit = Circuit::new();
    circuit
        .append(Instruction::circuit_op(body.clone(), 1))
        .unwrap()
        .append(Instruction::circuit_op(body.clone(), 2))
        .unwrap()
        .append(Instruction::gate(Gate::y(), [q(0)]).with_tags(["x"]))
        .unwrap();

    let ctx = TransformerContext::new().with_deep(true);
    let out = index_tags(&circuit, Some(&ctx), ["x"], None).unwrap();
    let ops: Vec<&Instruction> = out.all_operations().collect();
    assert_eq!(ops.len(), 3);

    // One rewritten body serves both calls, so its tag is numbered once.
    let first = &ops[0].as_circuit_op().unwrap().circuit;
    let second = &ops[1].as_circuit_op().unwrap().circuit;
    assert!(first.ptr_eq(second));
    assert!(!first.ptr_eq(&body));
    let body_tags: Vec<String> = first
        .all_operations()
        .flat_map(|op| op.tags.iter().cloned())
        .collect();
    assert_eq!(body_tags, vec!["x_0"]);
    assert!(ops[2].tags.contains("x_1"));
}
