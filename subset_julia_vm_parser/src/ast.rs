//! The AST contract consumed by the semantic core.
//!
//! This crate does not parse source text (no concrete-syntax grammar lives
//! here); it defines the node shapes a producer — a hand-written builder
//! (see [`build`]), or a future grammar/parser crate — must populate before
//! handing a [`Program`] to `subset_julia_vm::analyze::run_program`.
//!
//! Every node carries a [`NodeId`] (the key the attribute reactor uses to
//! store `type`/`decl`/`scope`/… attributes) and a [`Span`] (defaulted to
//! `Span::empty()` by nodes with no source text behind them).

use crate::node_id::NodeId;
use crate::span::Span;

/// A type-denoting node: `Int`, `Mat#Float`, `T`, `Point[]`, …
///
/// Resolved by the analyzer into a `subset_julia_vm::types::Type` and stored
/// as the node's `value` attribute. A bare [`TypeNode::Named`] that fails to
/// resolve against any declaration while inside a function body becomes a
/// fresh [`crate::node_id`]-keyed generic.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeNode {
    /// Simple name reference: a primitive (`Int`), a struct name, or a
    /// parameter's generic name (`T`).
    Named {
        id: NodeId,
        span: Span,
        name: String,
    },
    /// `Elem[]` / `Array#Elem`.
    ArrayOf {
        id: NodeId,
        span: Span,
        element: Box<TypeNode>,
    },
    /// `Mat#Elem`.
    MatOf {
        id: NodeId,
        span: Span,
        element: Box<TypeNode>,
    },
}

impl TypeNode {
    pub fn id(&self) -> NodeId {
        match self {
            TypeNode::Named { id, .. } => *id,
            TypeNode::ArrayOf { id, .. } => *id,
            TypeNode::MatOf { id, .. } => *id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            TypeNode::Named { span, .. } => *span,
            TypeNode::ArrayOf { span, .. } => *span,
            TypeNode::MatOf { span, .. } => *span,
        }
    }
}

/// Binary operators: arithmetic, scalar relational/equality, logical,
/// and the ten array-like one-/all- predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    MatMul, // `@`, dot product
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    OneEq,   // =?
    OneNe,   // !=?
    AllEq,   // <=>
    AllNe,   // !<=>
    OneLt,   // <?
    OneLe,   // <=?
    OneGt,   // >?
    OneGe,   // >=?
    AllLt,   // <<
    AllLe,   // <<=
    AllGt,   // >>
    AllGe,   // >>=
}

impl BinOp {
    /// The ten array-like relational/equality operators.
    pub fn is_array_like_predicate(self) -> bool {
        matches!(
            self,
            BinOp::OneEq
                | BinOp::OneNe
                | BinOp::AllEq
                | BinOp::AllNe
                | BinOp::OneLt
                | BinOp::OneLe
                | BinOp::OneGt
                | BinOp::OneGe
                | BinOp::AllLt
                | BinOp::AllLe
                | BinOp::AllGt
                | BinOp::AllGe
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod | BinOp::MatMul
        )
    }

    pub fn is_scalar_comparison(self) -> bool {
        matches!(self, BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge)
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinOp::Eq | BinOp::Ne)
    }
}

/// Expression nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLit {
        id: NodeId,
        span: Span,
        value: i64,
    },
    FloatLit {
        id: NodeId,
        span: Span,
        value: f64,
    },
    StringLit {
        id: NodeId,
        span: Span,
        value: String,
    },
    /// A bare identifier: a variable, `true`/`false`/`null`, a function or
    /// struct name, or the wildcard `_`.
    Ref {
        id: NodeId,
        span: Span,
        name: String,
    },
    ArrayLit {
        id: NodeId,
        span: Span,
        elements: Vec<Expr>,
    },
    /// A matrix literal: a list of array-literal rows, all equal length.
    MatrixLit {
        id: NodeId,
        span: Span,
        rows: Vec<Expr>,
    },
    /// `[filler](rows, cols)`; `shape` has 1 or 2 elements.
    MatrixGen {
        id: NodeId,
        span: Span,
        filler: Box<Expr>,
        shape: Vec<Expr>,
    },
    Paren {
        id: NodeId,
        span: Span,
        inner: Box<Expr>,
    },
    Field {
        id: NodeId,
        span: Span,
        object: Box<Expr>,
        name: String,
    },
    Index {
        id: NodeId,
        span: Span,
        array: Box<Expr>,
        index: Box<Expr>,
    },
    /// `a[start:end]`. Builders fill in the conventional defaults
    /// (integer literal `0` / `-1`) when a bound is omitted in source.
    Slice {
        id: NodeId,
        span: Span,
        array: Box<Expr>,
        start: Box<Expr>,
        end: Box<Expr>,
    },
    Not {
        id: NodeId,
        span: Span,
        operand: Box<Expr>,
    },
    Binary {
        id: NodeId,
        span: Span,
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `$S(args)`: constructor application for struct `S`.
    Construct {
        id: NodeId,
        span: Span,
        struct_name: String,
        args: Vec<Expr>,
    },
    Call {
        id: NodeId,
        span: Span,
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// Assignment used as an expression; the LHS must be a reference, field
    /// access, array access, or slice.
    Assign {
        id: NodeId,
        span: Span,
        target: Box<Expr>,
        value: Box<Expr>,
    },
}

impl Expr {
    pub fn id(&self) -> NodeId {
        match self {
            Expr::IntLit { id, .. }
            | Expr::FloatLit { id, .. }
            | Expr::StringLit { id, .. }
            | Expr::Ref { id, .. }
            | Expr::ArrayLit { id, .. }
            | Expr::MatrixLit { id, .. }
            | Expr::MatrixGen { id, .. }
            | Expr::Paren { id, .. }
            | Expr::Field { id, .. }
            | Expr::Index { id, .. }
            | Expr::Slice { id, .. }
            | Expr::Not { id, .. }
            | Expr::Binary { id, .. }
            | Expr::Construct { id, .. }
            | Expr::Call { id, .. }
            | Expr::Assign { id, .. } => *id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expr::IntLit { span, .. }
            | Expr::FloatLit { span, .. }
            | Expr::StringLit { span, .. }
            | Expr::Ref { span, .. }
            | Expr::ArrayLit { span, .. }
            | Expr::MatrixLit { span, .. }
            | Expr::MatrixGen { span, .. }
            | Expr::Paren { span, .. }
            | Expr::Field { span, .. }
            | Expr::Index { span, .. }
            | Expr::Slice { span, .. }
            | Expr::Not { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Construct { span, .. }
            | Expr::Call { span, .. }
            | Expr::Assign { span, .. } => *span,
        }
    }

    /// True for the bare wildcard reference `_`.
    pub fn is_wildcard_ref(&self) -> bool {
        matches!(self, Expr::Ref { name, .. } if name == "_")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
    pub declared_type: Option<TypeNode>,
    pub init: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
    pub declared_type: TypeNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
    pub declared_type: TypeNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunDecl {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: TypeNode,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
    pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: NodeId,
    pub span: Span,
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub id: NodeId,
    pub span: Span,
    pub cond: Expr,
    pub then_branch: Block,
    pub else_branch: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub id: NodeId,
    pub span: Span,
    pub cond: Expr,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub id: NodeId,
    pub span: Span,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub id: NodeId,
    pub span: Span,
    pub expr: Expr,
}

/// `pattern: block` arm of a `case` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseBody {
    pub id: NodeId,
    pub span: Span,
    pub pattern: Expr,
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseStmt {
    pub id: NodeId,
    pub span: Span,
    pub subject: Expr,
    pub bodies: Vec<CaseBody>,
    pub default: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VarDecl(VarDecl),
    FunDecl(FunDecl),
    StructDecl(StructDecl),
    Block(Block),
    If(IfStmt),
    While(WhileStmt),
    Return(ReturnStmt),
    ExprStmt(ExprStmt),
    Case(CaseStmt),
}

impl Stmt {
    pub fn id(&self) -> NodeId {
        match self {
            Stmt::VarDecl(d) => d.id,
            Stmt::FunDecl(d) => d.id,
            Stmt::StructDecl(d) => d.id,
            Stmt::Block(b) => b.id,
            Stmt::If(s) => s.id,
            Stmt::While(s) => s.id,
            Stmt::Return(s) => s.id,
            Stmt::ExprStmt(s) => s.id,
            Stmt::Case(s) => s.id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Stmt::VarDecl(d) => d.span,
            Stmt::FunDecl(d) => d.span,
            Stmt::StructDecl(d) => d.span,
            Stmt::Block(b) => b.span,
            Stmt::If(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::ExprStmt(s) => s.span,
            Stmt::Case(s) => s.span,
        }
    }
}

/// The root of a program: a sequence of top-level declarations and
/// statements, treated by the analyzer like an implicit function body that
/// may (but need not) return.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub id: NodeId,
    pub span: Span,
    pub top: Block,
}

pub mod build;
