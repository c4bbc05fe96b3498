//! The two error channels: accumulated analysis-time [`SemanticError`]s and
//! the single in-flight [`RuntimeFault`] that unwinds an evaluation.

use std::fmt;

use subset_julia_vm_parser::Span;

use crate::types::Type;

/// A problem found while resolving names, checking types, or validating
/// structure, before any code runs. These accumulate; a program with one or
/// more is never handed to the interpreter.
#[derive(Debug, Clone)]
pub enum SemanticError {
    UndeclaredName { name: String, span: Span },
    Redeclaration { name: String, span: Span },
    NotAType { name: String, span: Span },
    NotCallable { span: Span },
    TypeMismatch {
        expected: Type,
        found: Type,
        span: Span,
    },
    ArityMismatch {
        expected: usize,
        found: usize,
        span: Span,
    },
    NoCommonType { left: Type, right: Type, span: Span },
    MissingReturn { fun: String, span: Span },
    UnknownField { name: String, span: Span },
    DuplicateWildcard { span: Span },
    InvalidAssignmentTarget { span: Span },
}

impl SemanticError {
    pub fn span(&self) -> Span {
        match self {
            SemanticError::UndeclaredName { span, .. }
            | SemanticError::Redeclaration { span, .. }
            | SemanticError::NotAType { span, .. }
            | SemanticError::NotCallable { span }
            | SemanticError::TypeMismatch { span, .. }
            | SemanticError::ArityMismatch { span, .. }
            | SemanticError::NoCommonType { span, .. }
            | SemanticError::MissingReturn { span, .. }
            | SemanticError::UnknownField { span, .. }
            | SemanticError::DuplicateWildcard { span }
            | SemanticError::InvalidAssignmentTarget { span } => *span,
        }
    }
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticError::UndeclaredName { name, .. } => {
                write!(f, "undeclared name `{name}`")
            }
            SemanticError::Redeclaration { name, .. } => {
                write!(f, "`{name}` is already declared in this scope")
            }
            SemanticError::NotAType { name, .. } => {
                write!(f, "`{name}` does not name a type")
            }
            SemanticError::NotCallable { .. } => write!(f, "value is not callable"),
            SemanticError::TypeMismatch { expected, found, .. } => {
                write!(f, "expected type {expected}, found {found}")
            }
            SemanticError::ArityMismatch { expected, found, .. } => {
                write!(f, "expected {expected} argument(s), found {found}")
            }
            SemanticError::NoCommonType { left, right, .. } => {
                write!(f, "no common type between {left} and {right}")
            }
            SemanticError::MissingReturn { fun, .. } => {
                write!(f, "function `{fun}` does not return on every path")
            }
            SemanticError::UnknownField { name, .. } => {
                write!(f, "unknown field `{name}`")
            }
            SemanticError::DuplicateWildcard { .. } => {
                write!(f, "pattern cannot use `_` more than once")
            }
            SemanticError::InvalidAssignmentTarget { .. } => {
                write!(f, "this expression cannot be assigned to")
            }
        }
    }
}

impl std::error::Error for SemanticError {}

/// Analysis-phase output: the attributes the reactor resolved, or the
/// errors it accumulated along the way. A [`Program`](subset_julia_vm_parser::Program)
/// with a non-empty `errors` never reaches the interpreter.
#[derive(Debug, Default)]
pub struct AnalysisReport {
    pub errors: Vec<SemanticError>,
}

impl AnalysisReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push(&mut self, error: SemanticError) {
        self.errors.push(error);
    }
}

/// A problem detected only while running a well-typed program. Unlike
/// `SemanticError`, only one is ever in flight: raising one unwinds the
/// interpreter up to the nearest boundary that can report it (currently,
/// the top of `run_program`).
#[derive(Debug, Clone)]
pub enum RuntimeFault {
    DivisionByZero { span: Span },
    IndexOutOfBounds { index: i64, len: usize, span: Span },
    ShapeMismatch { left: Vec<usize>, right: Vec<usize>, span: Span },
    NullDereference { span: Span },
    NegativeDimension { dim: i64, span: Span },
}

impl RuntimeFault {
    pub fn span(&self) -> Span {
        match self {
            RuntimeFault::DivisionByZero { span }
            | RuntimeFault::IndexOutOfBounds { span, .. }
            | RuntimeFault::ShapeMismatch { span, .. }
            | RuntimeFault::NullDereference { span }
            | RuntimeFault::NegativeDimension { span, .. } => *span,
        }
    }
}

impl fmt::Display for RuntimeFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeFault::DivisionByZero { .. } => write!(f, "division by zero"),
            RuntimeFault::IndexOutOfBounds { index, len, .. } => {
                write!(f, "index {index} out of bounds for length {len}")
            }
            RuntimeFault::ShapeMismatch { left, right, .. } => {
                write!(f, "shape mismatch: {left:?} vs {right:?}")
            }
            RuntimeFault::NullDereference { .. } => write!(f, "dereferenced null"),
            RuntimeFault::NegativeDimension { dim, .. } => {
                write!(f, "matrix generator dimension {dim} is negative")
            }
        }
    }
}

impl std::error::Error for RuntimeFault {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_human_readable() {
        let err = SemanticError::ArityMismatch {
            expected: 2,
            found: 1,
            span: Span::empty(),
        };
        assert_eq!(err.to_string(), "expected 2 argument(s), found 1");

        let fault = RuntimeFault::DivisionByZero { span: Span::empty() };
        assert_eq!(fault.to_string(), "division by zero");
    }

    #[test]
    fn report_tracks_ok_state() {
        let mut report = AnalysisReport::default();
        assert!(report.is_ok());
        report.push(SemanticError::NotCallable { span: Span::empty() });
        assert!(!report.is_ok());
    }
}
