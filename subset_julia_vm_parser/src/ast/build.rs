//! Ergonomic constructors for hand-assembling an AST without a parser.
//!
//! Every method here stamps a fresh [`NodeId`] and a default
//! `Span::empty()`, so tests (and any future parser) can write
//! `b.binary(BinOp::Add, lhs, rhs)` instead of filling in `id`/`span` by
//! hand.

use super::{
    Block, CaseBody, CaseStmt, Expr, ExprStmt, FieldDecl, FunDecl, IfStmt, Param, Program,
    ReturnStmt, Stmt, StructDecl, TypeNode, VarDecl, WhileStmt,
};
use crate::node_id::{NodeId, NodeIdGen};
use crate::span::Span;

/// Assigns fresh [`NodeId`]s while assembling an AST by hand.
#[derive(Debug, Default)]
pub struct Builder {
    ids: NodeIdGen,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            ids: NodeIdGen::new(),
        }
    }

    fn id(&self) -> NodeId {
        self.ids.next()
    }

    // ---- types -----------------------------------------------------

    pub fn ty_named(&self, name: impl Into<String>) -> TypeNode {
        TypeNode::Named {
            id: self.id(),
            span: Span::empty(),
            name: name.into(),
        }
    }

    pub fn ty_array(&self, element: TypeNode) -> TypeNode {
        TypeNode::ArrayOf {
            id: self.id(),
            span: Span::empty(),
            element: Box::new(element),
        }
    }

    pub fn ty_mat(&self, element: TypeNode) -> TypeNode {
        TypeNode::MatOf {
            id: self.id(),
            span: Span::empty(),
            element: Box::new(element),
        }
    }

    // ---- expressions -------------------------------------------------

    pub fn int(&self, value: i64) -> Expr {
        Expr::IntLit {
            id: self.id(),
            span: Span::empty(),
            value,
        }
    }

    pub fn float(&self, value: f64) -> Expr {
        Expr::FloatLit {
            id: self.id(),
            span: Span::empty(),
            value,
        }
    }

    pub fn string(&self, value: impl Into<String>) -> Expr {
        Expr::StringLit {
            id: self.id(),
            span: Span::empty(),
            value: value.into(),
        }
    }

    pub fn reference(&self, name: impl Into<String>) -> Expr {
        Expr::Ref {
            id: self.id(),
            span: Span::empty(),
            name: name.into(),
        }
    }

    /// The wildcard reference `_`, for use inside `case` patterns.
    pub fn wildcard(&self) -> Expr {
        self.reference("_")
    }

    pub fn array(&self, elements: Vec<Expr>) -> Expr {
        Expr::ArrayLit {
            id: self.id(),
            span: Span::empty(),
            elements,
        }
    }

    /// Build a matrix literal from row element lists; each row becomes an
    /// `ArrayLit` node internally, matching the AST shape ("list of
    /// equal-length array literals").
    pub fn matrix(&self, rows: Vec<Vec<Expr>>) -> Expr {
        let rows = rows.into_iter().map(|r| self.array(r)).collect();
        Expr::MatrixLit {
            id: self.id(),
            span: Span::empty(),
            rows,
        }
    }

    pub fn matrix_gen(&self, filler: Expr, shape: Vec<Expr>) -> Expr {
        Expr::MatrixGen {
            id: self.id(),
            span: Span::empty(),
            filler: Box::new(filler),
            shape,
        }
    }

    pub fn paren(&self, inner: Expr) -> Expr {
        Expr::Paren {
            id: self.id(),
            span: Span::empty(),
            inner: Box::new(inner),
        }
    }

    pub fn field(&self, object: Expr, name: impl Into<String>) -> Expr {
        Expr::Field {
            id: self.id(),
            span: Span::empty(),
            object: Box::new(object),
            name: name.into(),
        }
    }

    pub fn index(&self, array: Expr, index: Expr) -> Expr {
        Expr::Index {
            id: self.id(),
            span: Span::empty(),
            array: Box::new(array),
            index: Box::new(index),
        }
    }

    /// `array[start:end]`. Pass `None` for either bound to get the
    /// conventional default (integer literal `0` / `-1`).
    pub fn slice(&self, array: Expr, start: Option<Expr>, end: Option<Expr>) -> Expr {
        let start = start.unwrap_or_else(|| self.int(0));
        let end = end.unwrap_or_else(|| self.int(-1));
        Expr::Slice {
            id: self.id(),
            span: Span::empty(),
            array: Box::new(array),
            start: Box::new(start),
            end: Box::new(end),
        }
    }

    pub fn not_(&self, operand: Expr) -> Expr {
        Expr::Not {
            id: self.id(),
            span: Span::empty(),
            operand: Box::new(operand),
        }
    }

    pub fn binary(&self, op: super::BinOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            id: self.id(),
            span: Span::empty(),
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn construct(&self, struct_name: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::Construct {
            id: self.id(),
            span: Span::empty(),
            struct_name: struct_name.into(),
            args,
        }
    }

    pub fn call(&self, callee: Expr, args: Vec<Expr>) -> Expr {
        Expr::Call {
            id: self.id(),
            span: Span::empty(),
            callee: Box::new(callee),
            args,
        }
    }

    /// Shorthand for `call(reference(name), args)`.
    pub fn call_named(&self, name: impl Into<String>, args: Vec<Expr>) -> Expr {
        let callee = self.reference(name);
        self.call(callee, args)
    }

    pub fn assign(&self, target: Expr, value: Expr) -> Expr {
        Expr::Assign {
            id: self.id(),
            span: Span::empty(),
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    // ---- statements / declarations -------------------------------------

    pub fn var_decl(
        &self,
        name: impl Into<String>,
        declared_type: Option<TypeNode>,
        init: Expr,
    ) -> Stmt {
        Stmt::VarDecl(VarDecl {
            id: self.id(),
            span: Span::empty(),
            name: name.into(),
            declared_type,
            init,
        })
    }

    pub fn field_decl(&self, name: impl Into<String>, declared_type: TypeNode) -> FieldDecl {
        FieldDecl {
            id: self.id(),
            span: Span::empty(),
            name: name.into(),
            declared_type,
        }
    }

    pub fn param(&self, name: impl Into<String>, declared_type: TypeNode) -> Param {
        Param {
            id: self.id(),
            span: Span::empty(),
            name: name.into(),
            declared_type,
        }
    }

    pub fn fun_decl(
        &self,
        name: impl Into<String>,
        params: Vec<Param>,
        return_type: TypeNode,
        body: Block,
    ) -> Stmt {
        Stmt::FunDecl(FunDecl {
            id: self.id(),
            span: Span::empty(),
            name: name.into(),
            params,
            return_type,
            body,
        })
    }

    pub fn struct_decl(&self, name: impl Into<String>, fields: Vec<FieldDecl>) -> Stmt {
        Stmt::StructDecl(StructDecl {
            id: self.id(),
            span: Span::empty(),
            name: name.into(),
            fields,
        })
    }

    pub fn block(&self, stmts: Vec<Stmt>) -> Block {
        Block {
            id: self.id(),
            span: Span::empty(),
            stmts,
        }
    }

    pub fn if_(&self, cond: Expr, then_branch: Block, else_branch: Option<Block>) -> Stmt {
        Stmt::If(IfStmt {
            id: self.id(),
            span: Span::empty(),
            cond,
            then_branch,
            else_branch,
        })
    }

    pub fn while_(&self, cond: Expr, body: Block) -> Stmt {
        Stmt::While(WhileStmt {
            id: self.id(),
            span: Span::empty(),
            cond,
            body,
        })
    }

    pub fn return_(&self, value: Option<Expr>) -> Stmt {
        Stmt::Return(ReturnStmt {
            id: self.id(),
            span: Span::empty(),
            value,
        })
    }

    pub fn expr_stmt(&self, expr: Expr) -> Stmt {
        Stmt::ExprStmt(ExprStmt {
            id: self.id(),
            span: Span::empty(),
            expr,
        })
    }

    pub fn case_body(&self, pattern: Expr, block: Block) -> CaseBody {
        CaseBody {
            id: self.id(),
            span: Span::empty(),
            pattern,
            block,
        }
    }

    pub fn case_(&self, subject: Expr, bodies: Vec<CaseBody>, default: Option<Block>) -> Stmt {
        Stmt::Case(CaseStmt {
            id: self.id(),
            span: Span::empty(),
            subject,
            bodies,
            default,
        })
    }

    pub fn program(&self, stmts: Vec<Stmt>) -> Program {
        Program {
            id: self.id(),
            span: Span::empty(),
            top: self.block(stmts),
        }
    }
}
