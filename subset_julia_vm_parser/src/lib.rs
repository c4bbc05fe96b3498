//! subset_julia_vm_parser
//!
//! Defines the AST contract consumed by the subset-Julia semantic core
//! (`subset_julia_vm`). There is no concrete-syntax grammar or lexer in this
//! crate: the parser producing these nodes from source text sits above the
//! core and is out of scope here. Callers build a [`ast::Program`] directly,
//! either by hand (see [`ast::build::Builder`]) or by lowering from a future
//! grammar.

pub mod ast;
pub mod node_id;
pub mod span;

pub use ast::build::Builder;
pub use ast::{
    BinOp, Block, CaseBody, CaseStmt, Expr, FieldDecl, FunDecl, IfStmt, Param, Program, ReturnStmt,
    Stmt, StructDecl, TypeNode, VarDecl, WhileStmt,
};
pub use node_id::{NodeId, NodeIdGen};
pub use span::Span;
