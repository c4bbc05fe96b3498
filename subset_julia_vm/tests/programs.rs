//! End-to-end tests that assemble a program with
//! [`Builder`](subset_julia_vm_parser::Builder) and run it through
//! [`run_program`].

use pretty_assertions::assert_eq;

use subset_julia_vm::{run_program, RunError, Value};
use subset_julia_vm_parser::{BinOp, Builder};

#[test]
fn struct_construction_and_field_access_round_trip() {
    let b = Builder::new();
    let point = b.struct_decl(
        "Point",
        vec![
            b.field_decl("x", b.ty_named("Int")),
            b.field_decl("y", b.ty_named("Int")),
        ],
    );
    let p = b.var_decl("p", None, b.construct("Point", vec![b.int(3), b.int(4)]));
    let sum = b.binary(BinOp::Add, b.field(b.reference("p"), "x"), b.field(b.reference("p"), "y"));
    let program = b.program(vec![point, p, b.return_(Some(sum))]);

    let outcome = run_program(&program).expect("program should run");
    assert_eq!(outcome.returned, Some(Value::Int(7)));
}

#[test]
fn struct_field_assignment_mutates_through_every_handle() {
    let b = Builder::new();
    let counter = b.struct_decl("Counter", vec![b.field_decl("n", b.ty_named("Int"))]);
    let a = b.var_decl("a", None, b.construct("Counter", vec![b.int(0)]));
    let b_alias = b.var_decl("b", None, b.reference("a"));
    let bump = b.expr_stmt(b.assign(b.field(b.reference("a"), "n"), b.int(5)));
    let program = b.program(vec![
        counter,
        a,
        b_alias,
        bump,
        b.return_(Some(b.field(b.reference("b"), "n"))),
    ]);

    let outcome = run_program(&program).expect("program should run");
    assert_eq!(outcome.returned, Some(Value::Int(5)));
}

#[test]
fn case_matches_array_shape_against_a_wildcard_element() {
    let b = Builder::new();
    let pair_arm = b.case_body(
        b.array(vec![b.wildcard(), b.int(0)]),
        b.block(vec![b.return_(Some(b.string("ends in zero")))]),
    );
    let default = b.block(vec![b.return_(Some(b.string("no match")))]);
    let case = b.case_(b.array(vec![b.int(9), b.int(0)]), vec![pair_arm], Some(default));
    let program = b.program(vec![case]);

    let outcome = run_program(&program).expect("program should run");
    assert_eq!(outcome.returned, Some(Value::Str("ends in zero".into())));
}

#[test]
fn case_matches_fixed_length_string_with_a_wildcard_character() {
    let b = Builder::new();
    let arm = b.case_body(
        b.string("a\u{000C}c"),
        b.block(vec![b.return_(Some(b.string("matched")))]),
    );
    let case = b.case_(b.string("abc"), vec![arm], None);
    let program = b.program(vec![case]);

    let outcome = run_program(&program).expect("program should run");
    assert_eq!(outcome.returned, Some(Value::Str("matched".into())));
}

#[test]
fn matrix_generator_builds_a_filled_shape() {
    let b = Builder::new();
    let gen = b.matrix_gen(b.int(0), vec![b.int(2), b.int(3)]);
    let program = b.program(vec![b.return_(Some(gen))]);

    let outcome = run_program(&program).expect("program should run");
    assert_eq!(
        outcome.returned,
        Some(Value::matrix(vec![
            vec![Value::Int(0), Value::Int(0), Value::Int(0)],
            vec![Value::Int(0), Value::Int(0), Value::Int(0)],
        ]))
    );
}

#[test]
fn matmul_on_vectors_is_a_dot_product() {
    let b = Builder::new();
    let dot = b.binary(
        BinOp::MatMul,
        b.array(vec![b.int(1), b.int(2), b.int(3)]),
        b.array(vec![b.int(4), b.int(5), b.int(6)]),
    );
    let program = b.program(vec![b.return_(Some(dot))]);

    let outcome = run_program(&program).expect("program should run");
    assert_eq!(outcome.returned, Some(Value::Int(32)));
}

#[test]
fn matmul_on_matrices_multiplies_rows_by_columns() {
    let b = Builder::new();
    let lhs = b.matrix(vec![vec![b.int(1), b.int(2)], vec![b.int(3), b.int(4)]]);
    let rhs = b.matrix(vec![vec![b.int(5), b.int(6)], vec![b.int(7), b.int(8)]]);
    let product = b.binary(BinOp::MatMul, lhs, rhs);
    let program = b.program(vec![b.return_(Some(product))]);

    let outcome = run_program(&program).expect("program should run");
    assert_eq!(
        outcome.returned,
        Some(Value::matrix(vec![
            vec![Value::Int(19), Value::Int(22)],
            vec![Value::Int(43), Value::Int(50)],
        ]))
    );
}

#[test]
fn negative_index_slicing_counts_from_the_end() {
    let b = Builder::new();
    let arr = b.array(vec![b.int(10), b.int(20), b.int(30), b.int(40), b.int(50)]);
    let tail = b.slice(arr, Some(b.int(-2)), None);
    let program = b.program(vec![b.return_(Some(tail))]);

    let outcome = run_program(&program).expect("program should run");
    assert_eq!(
        outcome.returned,
        Some(Value::array(vec![Value::Int(40), Value::Int(50)]))
    );
}

#[test]
fn array_predicate_one_ge_is_true_if_any_element_qualifies() {
    let b = Builder::new();
    let pred = b.binary(
        BinOp::OneGe,
        b.array(vec![b.int(1), b.int(2), b.int(9)]),
        b.array(vec![b.int(5), b.int(5), b.int(5)]),
    );
    let program = b.program(vec![b.return_(Some(pred))]);

    let outcome = run_program(&program).expect("program should run");
    assert_eq!(outcome.returned, Some(Value::Bool(true)));
}

#[test]
fn vectorizing_a_scalar_parameter_over_a_matrix_argument_preserves_shape() {
    let b = Builder::new();
    let double_body = b.block(vec![b.return_(Some(b.binary(
        BinOp::Mul,
        b.reference("x"),
        b.int(2),
    )))]);
    let double = b.fun_decl(
        "double",
        vec![b.param("x", b.ty_named("Int"))],
        b.ty_named("Int"),
        double_body,
    );
    let arg = b.matrix(vec![vec![b.int(1), b.int(2)], vec![b.int(3), b.int(4)]]);
    let top = b.block(vec![double, b.return_(Some(b.call_named("double", vec![arg])))]);
    let program = b.program(top.stmts);

    let outcome = run_program(&program).expect("program should run");
    assert_eq!(
        outcome.returned,
        Some(Value::matrix(vec![
            vec![Value::Int(2), Value::Int(4)],
            vec![Value::Int(6), Value::Int(8)],
        ]))
    );
}

#[test]
fn division_by_zero_is_a_runtime_fault_not_a_panic() {
    let b = Builder::new();
    let div = b.binary(BinOp::Div, b.int(1), b.int(0));
    let program = b.program(vec![b.return_(Some(div))]);

    match run_program(&program) {
        Err(RunError::Runtime(_)) => {}
        other => panic!("expected a runtime fault, got {other:?}"),
    }
}

#[test]
fn case_array_wildcard_consumes_several_elements_in_the_middle() {
    let b = Builder::new();
    let arm = b.case_body(
        b.array(vec![b.int(1), b.int(2), b.wildcard(), b.int(5)]),
        b.block(vec![b.return_(Some(b.int(1)))]),
    );
    let default = b.block(vec![b.return_(Some(b.int(2)))]);
    let subject = b.array(vec![b.int(1), b.int(2), b.int(3), b.int(4), b.int(5)]);
    let case = b.case_(subject, vec![arm], Some(default));
    let program = b.program(vec![case]);

    let outcome = run_program(&program).expect("program should run");
    assert_eq!(outcome.returned, Some(Value::Int(1)));
}

#[test]
fn declaring_a_float_matrix_promotes_integer_literal_elements() {
    let b = Builder::new();
    let m = b.var_decl(
        "m",
        Some(b.ty_mat(b.ty_named("Float"))),
        b.matrix(vec![vec![b.int(1), b.int(2)], vec![b.int(3), b.int(4)]]),
    );
    let program = b.program(vec![m, b.return_(Some(b.reference("m")))]);

    let outcome = run_program(&program).expect("program should run");
    assert_eq!(
        outcome.returned,
        Some(Value::matrix(vec![
            vec![Value::Float(1.0), Value::Float(2.0)],
            vec![Value::Float(3.0), Value::Float(4.0)],
        ]))
    );
}

#[test]
fn slice_assignment_replaces_a_half_open_span() {
    let b = Builder::new();
    let a = b.var_decl(
        "a",
        Some(b.ty_array(b.ty_named("Int"))),
        b.array(vec![b.int(1), b.int(2), b.int(3), b.int(4)]),
    );
    let replace = b.expr_stmt(b.assign(
        b.slice(b.reference("a"), Some(b.int(1)), Some(b.int(3))),
        b.array(vec![b.int(9), b.int(9)]),
    ));
    let program = b.program(vec![a, replace, b.return_(Some(b.reference("a")))]);

    let outcome = run_program(&program).expect("program should run");
    assert_eq!(
        outcome.returned,
        Some(Value::array(vec![
            Value::Int(1),
            Value::Int(9),
            Value::Int(9),
            Value::Int(4),
        ]))
    );
}

#[test]
fn while_loop_accumulates_across_iterations() {
    let b = Builder::new();
    let total = b.var_decl("total", None, b.int(0));
    let i = b.var_decl("i", None, b.int(0));
    let body = b.block(vec![
        b.expr_stmt(b.assign(
            b.reference("total"),
            b.binary(BinOp::Add, b.reference("total"), b.reference("i")),
        )),
        b.expr_stmt(b.assign(b.reference("i"), b.binary(BinOp::Add, b.reference("i"), b.int(1)))),
    ]);
    let loop_stmt = b.while_(b.binary(BinOp::Lt, b.reference("i"), b.int(5)), body);
    let program = b.program(vec![total, i, loop_stmt, b.return_(Some(b.reference("total")))]);

    let outcome = run_program(&program).expect("program should run");
    assert_eq!(outcome.returned, Some(Value::Int(10)));
}
