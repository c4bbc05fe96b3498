//! A tree-walking interpreter for a small statically-typed scripting
//! language with arrays, matrices, parametric generics, implicit
//! vectorization, and a pattern-matching `case` statement.
//!
//! [`run_program`] is the single entry point: it runs semantic analysis
//! over a [`Program`](subset_julia_vm_parser::Program), and only if that
//! analysis reports no errors does it hand the program to the
//! interpreter.

pub mod error;
pub mod reactor;
pub mod scope;
pub mod semantic;
pub mod types;
pub mod value;
pub mod vm;

use std::fmt;

use subset_julia_vm_parser::Program;

pub use error::{RuntimeFault, SemanticError};
pub use value::Value;

use reactor::Reactor;

/// Either phase of running a program can fail; the two error channels stay
/// disjoint rather than being flattened into one enum of strings, so a
/// caller can tell at a glance whether the program never ran at all.
#[derive(Debug, Clone)]
pub enum RunError {
    Semantic(Vec<SemanticError>),
    Runtime(RuntimeFault),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Semantic(errors) => {
                writeln!(f, "{} semantic error(s):", errors.len())?;
                for (i, err) in errors.iter().enumerate() {
                    writeln!(f, "  {}. {err}", i + 1)?;
                }
                Ok(())
            }
            RunError::Runtime(fault) => write!(f, "runtime error: {fault}"),
        }
    }
}

impl std::error::Error for RunError {}

/// The value (if any) the program's top level returned.
#[derive(Debug, Clone)]
pub struct ProgramOutcome {
    pub returned: Option<Value>,
}

/// Analyzes, then interprets, `program`. Analysis runs unconditionally;
/// interpretation only runs if it found no [`SemanticError`]s.
pub fn run_program(program: &Program) -> Result<ProgramOutcome, RunError> {
    let reactor = Reactor::new();
    let (report, decls) = semantic::analyze(program, &reactor);
    if !report.is_ok() {
        return Err(RunError::Semantic(report.errors));
    }
    let mut interpreter = vm::Vm::new(&reactor, &decls);
    let outcome = interpreter.run(program).map_err(RunError::Runtime)?;
    Ok(ProgramOutcome {
        returned: outcome.returned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use subset_julia_vm_parser::{BinOp, Builder};

    #[test]
    fn runs_a_function_call_end_to_end() {
        let b = Builder::new();
        let double_body = b.block(vec![b.return_(Some(b.binary(
            BinOp::Mul,
            b.reference("x"),
            b.int(2),
        )))]);
        let double = b.fun_decl("double", vec![b.param("x", b.ty_named("Int"))], b.ty_named("Int"), double_body);
        let top = b.block(vec![
            double,
            b.return_(Some(b.call_named("double", vec![b.int(21)]))),
        ]);
        let program = b.program(top.stmts);

        let outcome = run_program(&program).expect("program should run");
        assert_eq!(outcome.returned, Some(Value::Int(42)));
    }

    #[test]
    fn reports_semantic_errors_without_running() {
        let b = Builder::new();
        let program = b.program(vec![b.expr_stmt(b.reference("never_declared"))]);
        match run_program(&program) {
            Err(RunError::Semantic(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected a semantic error, got {other:?}"),
        }
    }

    #[test]
    fn vectorizes_a_scalar_parameter_over_an_array_argument() {
        let b = Builder::new();
        let square_body = b.block(vec![b.return_(Some(b.binary(
            BinOp::Mul,
            b.reference("x"),
            b.reference("x"),
        )))]);
        let square = b.fun_decl("square", vec![b.param("x", b.ty_named("Int"))], b.ty_named("Int"), square_body);
        let top = b.block(vec![
            square,
            b.return_(Some(b.call_named(
                "square",
                vec![b.array(vec![b.int(1), b.int(2), b.int(3)])],
            ))),
        ]);
        let program = b.program(top.stmts);

        let outcome = run_program(&program).expect("program should run");
        assert_eq!(
            outcome.returned,
            Some(Value::array(vec![Value::Int(1), Value::Int(4), Value::Int(9)]))
        );
    }
}
