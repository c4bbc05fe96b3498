//! Semantic analysis: scope construction, name resolution, and the typing
//! judgements for every expression and statement shape. Every node's
//! resolved type and (for references and calls) resolved declaration are
//! written into the [`Reactor`] as they're computed, so the interpreter
//! never re-derives them.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use subset_julia_vm_parser::{
    BinOp, Block, CaseStmt, Expr, FunDecl, IfStmt, NodeId, Program, ReturnStmt, Stmt, StructDecl,
    TypeNode, WhileStmt,
};

use crate::error::{AnalysisReport, SemanticError};
use crate::reactor::Reactor;
use crate::scope::{Binding, Scope};
use crate::types::{common_supertype, is_assignable_to, GenericSlot, StructSig, Type};

/// Declarations the interpreter needs by [`NodeId`], gathered once while
/// analyzing so it never has to re-walk the tree looking for a function or
/// struct by name.
#[derive(Debug, Default)]
pub struct Declarations {
    pub funs: HashMap<NodeId, Rc<FunDecl>>,
    pub structs: HashMap<NodeId, Rc<StructDecl>>,
    pub struct_sigs: HashMap<NodeId, Rc<StructSig>>,
    pub struct_by_name: HashMap<String, NodeId>,
}

/// Per-function table of generic names introduced by unresolved type
/// references in its signature or body, shared so every occurrence of `T`
/// inside one function sees the same [`GenericSlot`].
type GenericEnv = RefCell<HashMap<String, Rc<GenericSlot>>>;

struct FunSig {
    params: Vec<Type>,
    ret: Type,
    /// The generic-name environment used while resolving this signature,
    /// reused (not recreated) when checking the body so a `T` mentioned
    /// again there binds to the same [`GenericSlot`] as the parameter's.
    generics: Rc<GenericEnv>,
}

struct Analyzer<'a> {
    reactor: &'a Reactor,
    report: AnalysisReport,
    decls: Declarations,
    fun_sigs: HashMap<NodeId, FunSig>,
    current_generics: Option<Rc<GenericEnv>>,
    current_return: Option<Type>,
}

pub fn analyze(program: &Program, reactor: &Reactor) -> (AnalysisReport, Declarations) {
    let mut analyzer = Analyzer {
        reactor,
        report: AnalysisReport::default(),
        decls: Declarations::default(),
        fun_sigs: HashMap::new(),
        current_generics: None,
        current_return: None,
    };
    let root = Scope::root(program.id);
    analyzer.check_block(&program.top, &root);
    (analyzer.report, analyzer.decls)
}

impl<'a> Analyzer<'a> {
    fn resolve_type_node(&mut self, node: &TypeNode, scope: &Rc<Scope>) -> Type {
        match node {
            TypeNode::Named { id, span, name } => {
                let ty = match scope.resolve(name) {
                    Some(Binding::BuiltinType) => {
                        Type::primitive_named(name).unwrap_or(Type::Symbolic)
                    }
                    Some(Binding::Struct(decl_id)) => {
                        Type::Struct(Rc::clone(&self.decls.struct_sigs[&decl_id]))
                    }
                    _ => match &self.current_generics {
                        Some(env) => {
                            let mut env = env.borrow_mut();
                            let slot = env
                                .entry(name.clone())
                                .or_insert_with(|| GenericSlot::new(name.clone()))
                                .clone();
                            Type::Generic(slot)
                        }
                        None => {
                            self.report.push(SemanticError::NotAType {
                                name: name.clone(),
                                span: *span,
                            });
                            Type::Symbolic
                        }
                    },
                };
                self.reactor.set_type(*id, ty.clone());
                ty
            }
            TypeNode::ArrayOf { id, element, .. } => {
                let elem = self.resolve_type_node(element, scope);
                let ty = Type::array_of(elem);
                self.reactor.set_type(*id, ty.clone());
                ty
            }
            TypeNode::MatOf { id, element, .. } => {
                let elem = self.resolve_type_node(element, scope);
                let ty = Type::mat_of(elem);
                self.reactor.set_type(*id, ty.clone());
                ty
            }
        }
    }

    /// Hoists every `FunDecl`/`StructDecl` in this block's own statement
    /// list so later statements (and sibling hoisted declarations) can
    /// forward-reference them, then checks every statement in order.
    fn check_block(&mut self, block: &Block, parent: &Rc<Scope>) {
        let scope = parent.child(block.id);
        for stmt in &block.stmts {
            match stmt {
                Stmt::StructDecl(decl) => self.hoist_struct(decl, &scope),
                Stmt::FunDecl(decl) => self.hoist_fun(decl, &scope),
                _ => {}
            }
        }
        for stmt in &block.stmts {
            self.check_stmt(stmt, &scope);
        }
    }

    fn hoist_struct(&mut self, decl: &StructDecl, scope: &Rc<Scope>) {
        if scope.is_declared_locally(&decl.name) {
            self.report.push(SemanticError::Redeclaration {
                name: decl.name.clone(),
                span: decl.span,
            });
            return;
        }
        scope.declare(decl.name.clone(), Binding::Struct(decl.id));
        let sig = StructSig::new(decl.name.clone());
        self.decls.struct_sigs.insert(decl.id, Rc::clone(&sig));
        self.decls.structs.insert(decl.id, Rc::new(decl.clone()));
        self.decls.struct_by_name.insert(decl.name.clone(), decl.id);
        // Resolve field types after registering the name so a field can
        // reference the struct itself.
        let mut fields = Vec::with_capacity(decl.fields.len());
        for field in &decl.fields {
            let ty = self.resolve_type_node(&field.declared_type, scope);
            fields.push((field.name.clone(), ty));
        }
        *sig.fields.borrow_mut() = fields;
    }

    fn hoist_fun(&mut self, decl: &FunDecl, scope: &Rc<Scope>) {
        if scope.is_declared_locally(&decl.name) {
            self.report.push(SemanticError::Redeclaration {
                name: decl.name.clone(),
                span: decl.span,
            });
            return;
        }
        scope.declare(decl.name.clone(), Binding::Fun(decl.id));
        let generics: Rc<GenericEnv> = Rc::new(RefCell::new(HashMap::new()));
        self.current_generics = Some(Rc::clone(&generics));
        let params: Vec<Type> = decl
            .params
            .iter()
            .map(|p| {
                let ty = self.resolve_type_node(&p.declared_type, scope);
                self.reactor.set_type(p.id, ty.clone());
                ty
            })
            .collect();
        let ret = self.resolve_type_node(&decl.return_type, scope);
        self.current_generics = None;
        self.reactor
            .set_type(decl.id, Type::Fun(Box::new(ret.clone()), params.clone()));
        self.decls.funs.insert(decl.id, Rc::new(decl.clone()));
        self.fun_sigs.insert(decl.id, FunSig { params, ret, generics });
    }

    fn check_stmt(&mut self, stmt: &Stmt, scope: &Rc<Scope>) {
        match stmt {
            Stmt::StructDecl(_) => {} // handled by hoist_struct
            Stmt::VarDecl(decl) => {
                let init_ty = self.check_expr(&decl.init, scope);
                let declared = decl
                    .declared_type
                    .as_ref()
                    .map(|t| self.resolve_type_node(t, scope));
                let final_ty = match declared {
                    Some(declared_ty) => {
                        if !is_assignable_to(&init_ty, &declared_ty) {
                            self.report.push(SemanticError::TypeMismatch {
                                expected: declared_ty.clone(),
                                found: init_ty,
                                span: decl.span,
                            });
                        }
                        declared_ty
                    }
                    None => init_ty,
                };
                if scope.is_declared_locally(&decl.name) {
                    self.report.push(SemanticError::Redeclaration {
                        name: decl.name.clone(),
                        span: decl.span,
                    });
                }
                scope.declare(decl.name.clone(), Binding::Var(decl.id));
                self.reactor.set_type(decl.id, final_ty);
            }
            Stmt::FunDecl(decl) => self.check_fun_body(decl, scope),
            Stmt::Block(block) => self.check_block(block, scope),
            Stmt::If(if_stmt) => self.check_if(if_stmt, scope),
            Stmt::While(while_stmt) => self.check_while(while_stmt, scope),
            Stmt::Return(ret) => self.check_return(ret, scope),
            Stmt::ExprStmt(e) => {
                self.check_expr(&e.expr, scope);
            }
            Stmt::Case(case) => self.check_case(case, scope),
        }
    }

    fn check_fun_body(&mut self, decl: &FunDecl, scope: &Rc<Scope>) {
        let body_scope = scope.child(decl.body.id);
        for param in &decl.params {
            if body_scope.is_declared_locally(&param.name) {
                self.report.push(SemanticError::Redeclaration {
                    name: param.name.clone(),
                    span: param.span,
                });
            }
            body_scope.declare(param.name.clone(), Binding::Param(param.id));
        }
        let (ret, generics) = {
            let sig = &self.fun_sigs[&decl.id];
            (sig.ret.clone(), Rc::clone(&sig.generics))
        };
        self.current_generics = Some(generics);
        self.current_return = Some(ret.clone());
        for stmt in &decl.body.stmts {
            if let Stmt::FunDecl(d) = stmt {
                self.hoist_fun(d, &body_scope);
            } else if let Stmt::StructDecl(d) = stmt {
                self.hoist_struct(d, &body_scope);
            }
        }
        for stmt in &decl.body.stmts {
            self.check_stmt(stmt, &body_scope);
        }
        self.current_generics = None;
        self.current_return = None;
        if !matches!(ret, Type::Void) && !block_always_returns(&decl.body) {
            self.report.push(SemanticError::MissingReturn {
                fun: decl.name.clone(),
                span: decl.span,
            });
        }
    }

    fn check_if(&mut self, stmt: &IfStmt, scope: &Rc<Scope>) {
        let cond_ty = self.check_expr(&stmt.cond, scope);
        if cond_ty != Type::Bool {
            self.report.push(SemanticError::TypeMismatch {
                expected: Type::Bool,
                found: cond_ty,
                span: stmt.cond.span(),
            });
        }
        self.check_block(&stmt.then_branch, scope);
        if let Some(else_branch) = &stmt.else_branch {
            self.check_block(else_branch, scope);
        }
    }

    fn check_while(&mut self, stmt: &WhileStmt, scope: &Rc<Scope>) {
        let cond_ty = self.check_expr(&stmt.cond, scope);
        if cond_ty != Type::Bool {
            self.report.push(SemanticError::TypeMismatch {
                expected: Type::Bool,
                found: cond_ty,
                span: stmt.cond.span(),
            });
        }
        self.check_block(&stmt.body, scope);
    }

    fn check_return(&mut self, stmt: &ReturnStmt, scope: &Rc<Scope>) {
        let expected = self.current_return.clone();
        match (&stmt.value, expected) {
            (Some(value), Some(expected)) => {
                let found = self.check_expr(value, scope);
                if !is_assignable_to(&found, &expected) {
                    self.report.push(SemanticError::TypeMismatch {
                        expected,
                        found,
                        span: stmt.span,
                    });
                }
            }
            (Some(value), None) => {
                // Top-level return: the program has no declared return
                // type to check against.
                self.check_expr(value, scope);
            }
            (None, Some(expected)) if expected != Type::Void => {
                self.report.push(SemanticError::TypeMismatch {
                    expected,
                    found: Type::Void,
                    span: stmt.span,
                });
            }
            _ => {}
        }
    }

    fn check_case(&mut self, stmt: &CaseStmt, scope: &Rc<Scope>) {
        let subject_ty = self.check_expr(&stmt.subject, scope);
        for body in &stmt.bodies {
            let arm_scope = scope.child(body.id);
            arm_scope.declare("_", Binding::Symbolic);
            reject_adjacent_wildcards(&body.pattern, &mut self.report);
            let pattern_ty = self.check_expr(&body.pattern, &arm_scope);
            if common_supertype(&subject_ty, &pattern_ty).is_none() {
                self.report.push(SemanticError::NoCommonType {
                    left: subject_ty.clone(),
                    right: pattern_ty,
                    span: body.pattern.span(),
                });
            }
            self.check_block(&body.block, &arm_scope);
        }
        if let Some(default) = &stmt.default {
            self.check_block(default, scope);
        }
    }

    fn check_expr(&mut self, expr: &Expr, scope: &Rc<Scope>) -> Type {
        let ty = self.infer_expr(expr, scope);
        self.reactor.set_type(expr.id(), ty.clone());
        ty
    }

    fn infer_expr(&mut self, expr: &Expr, scope: &Rc<Scope>) -> Type {
        match expr {
            Expr::IntLit { .. } => Type::Int,
            Expr::FloatLit { .. } => Type::Float,
            Expr::StringLit { .. } => Type::String,
            Expr::Ref { id, span, name } => self.infer_ref(*id, *span, name, scope),
            Expr::ArrayLit { elements, span, .. } => self.infer_array_lit(elements, *span, scope),
            Expr::MatrixLit { rows, span, .. } => self.infer_matrix_lit(rows, *span, scope),
            Expr::MatrixGen {
                filler, shape, span, ..
            } => self.infer_matrix_gen(filler, shape, *span, scope),
            Expr::Paren { inner, .. } => self.check_expr(inner, scope),
            Expr::Field {
                object, name, span, ..
            } => self.infer_field(object, name, *span, scope),
            Expr::Index {
                array, index, span, ..
            } => self.infer_index(array, index, *span, scope),
            Expr::Slice {
                array, start, end, span, ..
            } => self.infer_slice(array, start, end, *span, scope),
            Expr::Not { operand, span, .. } => self.infer_not(operand, *span, scope),
            Expr::Binary {
                op, left, right, span, ..
            } => self.infer_binary(*op, left, right, *span, scope),
            Expr::Construct {
                struct_name,
                args,
                span,
                ..
            } => self.infer_construct(struct_name, args, *span, scope),
            Expr::Call {
                callee, args, span, ..
            } => self.infer_call(callee, args, *span, scope),
            Expr::Assign {
                target, value, span, ..
            } => self.infer_assign(target, value, *span, scope),
        }
    }

    fn infer_ref(
        &mut self,
        id: NodeId,
        span: subset_julia_vm_parser::Span,
        name: &str,
        scope: &Rc<Scope>,
    ) -> Type {
        let Some(binding) = scope.resolve(name) else {
            self.report.push(SemanticError::UndeclaredName {
                name: name.to_string(),
                span,
            });
            return Type::Symbolic;
        };
        self.reactor.set_binding(id, binding.clone());
        match binding {
            Binding::BuiltinType => Type::Type,
            Binding::BuiltinValue => match name {
                "true" | "false" => Type::Bool,
                _ => Type::Null,
            },
            Binding::BuiltinFun => Type::Fun(Box::new(Type::Void), vec![Type::Symbolic]),
            Binding::Var(decl_id) | Binding::Param(decl_id) => self
                .reactor
                .get_type(decl_id)
                .unwrap_or(Type::Symbolic),
            Binding::Fun(decl_id) => {
                let sig = &self.fun_sigs[&decl_id];
                Type::Fun(Box::new(sig.ret.clone()), sig.params.clone())
            }
            Binding::Struct(_) => Type::Type,
            Binding::Symbolic => Type::Symbolic,
        }
    }

    fn infer_array_lit(
        &mut self,
        elements: &[Expr],
        span: subset_julia_vm_parser::Span,
        scope: &Rc<Scope>,
    ) -> Type {
        if elements.is_empty() {
            return Type::array_of(Type::Symbolic);
        }
        let mut component = self.check_expr(&elements[0], scope);
        for element in &elements[1..] {
            let next = self.check_expr(element, scope);
            match common_supertype(&component, &next) {
                Some(common) => component = common,
                None => {
                    self.report.push(SemanticError::NoCommonType {
                        left: component.clone(),
                        right: next,
                        span,
                    });
                }
            }
        }
        Type::array_of(component)
    }

    fn infer_matrix_lit(
        &mut self,
        rows: &[Expr],
        span: subset_julia_vm_parser::Span,
        scope: &Rc<Scope>,
    ) -> Type {
        let mut component = Type::Symbolic;
        let mut first = true;
        for row in rows {
            let row_ty = self.check_expr(row, scope);
            let Some(row_component) = row_ty.array_like_component().cloned() else {
                self.report.push(SemanticError::TypeMismatch {
                    expected: Type::array_of(Type::Symbolic),
                    found: row_ty,
                    span: row.span(),
                });
                continue;
            };
            if first {
                component = row_component;
                first = false;
            } else {
                match common_supertype(&component, &row_component) {
                    Some(common) => component = common,
                    None => self.report.push(SemanticError::NoCommonType {
                        left: component.clone(),
                        right: row_component,
                        span,
                    }),
                }
            }
        }
        Type::mat_of(component)
    }

    fn infer_matrix_gen(
        &mut self,
        filler: &Expr,
        shape: &[Expr],
        span: subset_julia_vm_parser::Span,
        scope: &Rc<Scope>,
    ) -> Type {
        let filler_ty = self.check_expr(filler, scope);
        if filler_ty.is_array_like() {
            self.report.push(SemanticError::TypeMismatch {
                expected: Type::Symbolic,
                found: filler_ty.clone(),
                span,
            });
        }
        for dim in shape {
            let dim_ty = self.check_expr(dim, scope);
            if dim_ty != Type::Int {
                self.report.push(SemanticError::TypeMismatch {
                    expected: Type::Int,
                    found: dim_ty,
                    span: dim.span(),
                });
            }
        }
        if shape.len() == 1 {
            Type::array_of(filler_ty)
        } else {
            Type::mat_of(filler_ty)
        }
    }

    fn infer_field(
        &mut self,
        object: &Expr,
        name: &str,
        span: subset_julia_vm_parser::Span,
        scope: &Rc<Scope>,
    ) -> Type {
        let object_ty = self.check_expr(object, scope);
        if object_ty.is_array_like() {
            return match name {
                "length" => Type::Int,
                "shape" => Type::array_of(Type::Int),
                _ => {
                    self.report.push(SemanticError::UnknownField {
                        name: name.to_string(),
                        span,
                    });
                    Type::Symbolic
                }
            };
        }
        if let Type::Struct(sig) = &object_ty {
            return sig.field_type(name).unwrap_or_else(|| {
                self.report.push(SemanticError::UnknownField {
                    name: name.to_string(),
                    span,
                });
                Type::Symbolic
            });
        }
        if object_ty == Type::Symbolic {
            return Type::Symbolic;
        }
        self.report.push(SemanticError::UnknownField {
            name: name.to_string(),
            span,
        });
        Type::Symbolic
    }

    fn infer_index(
        &mut self,
        array: &Expr,
        index: &Expr,
        span: subset_julia_vm_parser::Span,
        scope: &Rc<Scope>,
    ) -> Type {
        let array_ty = self.check_expr(array, scope);
        let index_ty = self.check_expr(index, scope);
        if index_ty != Type::Int {
            self.report.push(SemanticError::TypeMismatch {
                expected: Type::Int,
                found: index_ty,
                span: index.span(),
            });
        }
        match &array_ty {
            Type::Array(component) => (**component).clone(),
            Type::Mat(component) => Type::array_of((**component).clone()),
            Type::Symbolic => Type::Symbolic,
            _ => {
                self.report.push(SemanticError::TypeMismatch {
                    expected: Type::array_of(Type::Symbolic),
                    found: array_ty,
                    span,
                });
                Type::Symbolic
            }
        }
    }

    fn infer_slice(
        &mut self,
        array: &Expr,
        start: &Expr,
        end: &Expr,
        span: subset_julia_vm_parser::Span,
        scope: &Rc<Scope>,
    ) -> Type {
        let array_ty = self.check_expr(array, scope);
        for bound in [start, end] {
            let bound_ty = self.check_expr(bound, scope);
            if bound_ty != Type::Int {
                self.report.push(SemanticError::TypeMismatch {
                    expected: Type::Int,
                    found: bound_ty,
                    span: bound.span(),
                });
            }
        }
        if !array_ty.is_array_like() && array_ty != Type::Symbolic {
            self.report.push(SemanticError::TypeMismatch {
                expected: Type::array_of(Type::Symbolic),
                found: array_ty.clone(),
                span,
            });
        }
        array_ty
    }

    fn infer_not(
        &mut self,
        operand: &Expr,
        span: subset_julia_vm_parser::Span,
        scope: &Rc<Scope>,
    ) -> Type {
        let operand_ty = self.check_expr(operand, scope);
        if operand_ty != Type::Bool {
            self.report.push(SemanticError::TypeMismatch {
                expected: Type::Bool,
                found: operand_ty,
                span,
            });
        }
        Type::Bool
    }

    fn infer_binary(
        &mut self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        span: subset_julia_vm_parser::Span,
        scope: &Rc<Scope>,
    ) -> Type {
        let left_ty = self.check_expr(left, scope);
        let right_ty = self.check_expr(right, scope);

        if op == BinOp::Add && (left_ty == Type::String || right_ty == Type::String) {
            return Type::String;
        }

        if op.is_logical() {
            if left_ty != Type::Bool || right_ty != Type::Bool {
                self.report.push(SemanticError::TypeMismatch {
                    expected: Type::Bool,
                    found: if left_ty != Type::Bool { left_ty } else { right_ty },
                    span,
                });
            }
            return Type::Bool;
        }

        if op.is_scalar_comparison() {
            if !left_ty.is_numeric() || !right_ty.is_numeric() {
                self.report.push(SemanticError::TypeMismatch {
                    expected: Type::Float,
                    found: if !left_ty.is_numeric() { left_ty } else { right_ty },
                    span,
                });
            }
            return Type::Bool;
        }

        if op.is_equality() {
            if common_supertype(&left_ty, &right_ty).is_none() {
                self.report.push(SemanticError::NoCommonType {
                    left: left_ty,
                    right: right_ty,
                    span,
                });
            }
            return Type::Bool;
        }

        if op.is_array_like_predicate() {
            if !left_ty.is_array_like() || !right_ty.is_array_like() {
                self.report.push(SemanticError::TypeMismatch {
                    expected: Type::array_of(Type::Symbolic),
                    found: if !left_ty.is_array_like() { left_ty } else { right_ty },
                    span,
                });
                return Type::Bool;
            }
            let lc = left_ty.array_like_component().unwrap().clone();
            let rc = right_ty.array_like_component().unwrap().clone();
            if common_supertype(&lc, &rc).is_none() {
                self.report.push(SemanticError::NoCommonType {
                    left: lc,
                    right: rc,
                    span,
                });
            }
            return Type::Bool;
        }

        // Arithmetic, including `@` (matrix multiplication / dot product).
        if op == BinOp::MatMul {
            if !left_ty.is_array_like() || !right_ty.is_array_like() {
                self.report.push(SemanticError::TypeMismatch {
                    expected: Type::array_of(Type::Symbolic),
                    found: if !left_ty.is_array_like() { left_ty } else { right_ty },
                    span,
                });
                return Type::Symbolic;
            }
            let lc = left_ty.array_like_component().unwrap().clone();
            let rc = right_ty.array_like_component().unwrap().clone();
            let component = match common_supertype(&lc, &rc) {
                Some(c) => c,
                None => {
                    self.report.push(SemanticError::NoCommonType {
                        left: lc,
                        right: rc,
                        span,
                    });
                    return Type::Symbolic;
                }
            };
            let both_plain_array = matches!(left_ty, Type::Array(_)) && matches!(right_ty, Type::Array(_));
            return if both_plain_array { component } else { Type::mat_of(component) };
        }

        match (left_ty.is_array_like(), right_ty.is_array_like()) {
            (false, false) => match common_supertype(&left_ty, &right_ty) {
                Some(common) if common.is_numeric() => common,
                _ => {
                    self.report.push(SemanticError::NoCommonType {
                        left: left_ty,
                        right: right_ty,
                        span,
                    });
                    Type::Symbolic
                }
            },
            (true, true) => {
                let lc = left_ty.array_like_component().unwrap().clone();
                let rc = right_ty.array_like_component().unwrap().clone();
                match common_supertype(&lc, &rc) {
                    Some(component) => {
                        let both_plain_array =
                            matches!(left_ty, Type::Array(_)) && matches!(right_ty, Type::Array(_));
                        if both_plain_array { Type::array_of(component) } else { Type::mat_of(component) }
                    }
                    None => {
                        self.report.push(SemanticError::NoCommonType { left: lc, right: rc, span });
                        Type::Symbolic
                    }
                }
            }
            (array_left, _) => {
                let (array_ty, scalar_ty) = if array_left { (&left_ty, &right_ty) } else { (&right_ty, &left_ty) };
                let component = array_ty.array_like_component().unwrap().clone();
                match common_supertype(&component, scalar_ty) {
                    // A scalar broadcast against a 1-D array always yields a
                    // matrix, even when the array side was plain `Array`.
                    Some(result_component) => Type::mat_of(result_component),
                    None => {
                        self.report.push(SemanticError::NoCommonType {
                            left: component,
                            right: scalar_ty.clone(),
                            span,
                        });
                        Type::Symbolic
                    }
                }
            }
        }
    }

    fn infer_construct(
        &mut self,
        struct_name: &str,
        args: &[Expr],
        span: subset_julia_vm_parser::Span,
        scope: &Rc<Scope>,
    ) -> Type {
        let Some(Binding::Struct(decl_id)) = scope.resolve(struct_name) else {
            self.report.push(SemanticError::UndeclaredName {
                name: struct_name.to_string(),
                span,
            });
            for arg in args {
                self.check_expr(arg, scope);
            }
            return Type::Symbolic;
        };
        let sig = Rc::clone(&self.decls.struct_sigs[&decl_id]);
        let fields = sig.field_names_and_types();
        if fields.len() != args.len() {
            self.report.push(SemanticError::ArityMismatch {
                expected: fields.len(),
                found: args.len(),
                span,
            });
        }
        for (arg, (_, field_ty)) in args.iter().zip(fields.iter()) {
            let arg_ty = self.check_expr(arg, scope);
            if !is_assignable_to(&arg_ty, field_ty) {
                self.report.push(SemanticError::TypeMismatch {
                    expected: field_ty.clone(),
                    found: arg_ty,
                    span: arg.span(),
                });
            }
        }
        for arg in args.iter().skip(fields.len()) {
            self.check_expr(arg, scope);
        }
        Type::Struct(sig)
    }

    fn infer_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        span: subset_julia_vm_parser::Span,
        scope: &Rc<Scope>,
    ) -> Type {
        let callee_ty = self.check_expr(callee, scope);
        let arg_tys: Vec<Type> = args.iter().map(|a| self.check_expr(a, scope)).collect();
        let Type::Fun(ret, params) = callee_ty else {
            if callee_ty != Type::Symbolic {
                self.report.push(SemanticError::NotCallable { span });
            }
            return Type::Symbolic;
        };
        if params.len() != arg_tys.len() {
            self.report.push(SemanticError::ArityMismatch {
                expected: params.len(),
                found: arg_tys.len(),
                span,
            });
            return *ret;
        }
        let mut bound: HashMap<String, Type> = HashMap::new();
        let mut vectorized = false;
        let mut vector_is_mat = false;
        for (param, arg) in params.iter().zip(arg_tys.iter()) {
            match param {
                Type::Generic(slot) => {
                    let candidate = match bound.get(&slot.name) {
                        Some(existing) => match common_supertype(existing, arg) {
                            Some(c) => c,
                            None => {
                                self.report.push(SemanticError::NoCommonType {
                                    left: existing.clone(),
                                    right: arg.clone(),
                                    span,
                                });
                                continue;
                            }
                        },
                        None => arg.clone(),
                    };
                    bound.insert(slot.name.clone(), candidate);
                }
                p if !p.is_array_like() && arg.is_array_like() => {
                    vectorized = true;
                    vector_is_mat |= matches!(arg, Type::Mat(_));
                    let mut base = arg.clone();
                    while let Some(inner) = base.array_like_component() {
                        base = inner.clone();
                    }
                    if !is_assignable_to(&base, p) {
                        self.report.push(SemanticError::TypeMismatch {
                            expected: p.clone(),
                            found: base,
                            span,
                        });
                    }
                }
                p => {
                    if !is_assignable_to(arg, p) {
                        self.report.push(SemanticError::TypeMismatch {
                            expected: p.clone(),
                            found: arg.clone(),
                            span,
                        });
                    }
                }
            }
        }
        let result = substitute_generics(&ret, &bound);
        if vectorized && result != Type::Void {
            if vector_is_mat { Type::mat_of(result) } else { Type::array_of(result) }
        } else {
            result
        }
    }

    fn infer_assign(
        &mut self,
        target: &Expr,
        value: &Expr,
        span: subset_julia_vm_parser::Span,
        scope: &Rc<Scope>,
    ) -> Type {
        if !matches!(target, Expr::Ref { .. } | Expr::Field { .. } | Expr::Index { .. } | Expr::Slice { .. }) {
            self.report.push(SemanticError::InvalidAssignmentTarget { span });
        }
        let target_ty = self.check_expr(target, scope);
        let value_ty = self.check_expr(value, scope);
        if !is_assignable_to(&value_ty, &target_ty) {
            self.report.push(SemanticError::TypeMismatch {
                expected: target_ty.clone(),
                found: value_ty,
                span,
            });
        }
        target_ty
    }
}

fn substitute_generics(ty: &Type, bound: &HashMap<String, Type>) -> Type {
    match ty {
        Type::Generic(slot) => bound.get(&slot.name).cloned().unwrap_or_else(|| ty.clone()),
        Type::Array(c) => Type::array_of(substitute_generics(c, bound)),
        Type::Mat(c) => Type::mat_of(substitute_generics(c, bound)),
        Type::Fun(r, p) => Type::Fun(
            Box::new(substitute_generics(r, bound)),
            p.iter().map(|t| substitute_generics(t, bound)).collect(),
        ),
        other => other.clone(),
    }
}

/// True if every control path through `block` hits a `return`.
fn block_always_returns(block: &Block) -> bool {
    for stmt in &block.stmts {
        match stmt {
            Stmt::Return(_) => return true,
            Stmt::If(if_stmt) => {
                if let Some(else_branch) = &if_stmt.else_branch {
                    if block_always_returns(&if_stmt.then_branch) && block_always_returns(else_branch) {
                        return true;
                    }
                }
            }
            Stmt::Case(case) => {
                if let Some(default) = &case.default {
                    if block_always_returns(default)
                        && case.bodies.iter().all(|b| block_always_returns(&b.block))
                    {
                        return true;
                    }
                }
            }
            Stmt::Block(inner) => {
                if block_always_returns(inner) {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

/// Rejects patterns like `[_, _]` where two wildcard elements sit next to
/// each other in the same array literal, which would make the match
/// ambiguous about how many elements each `_` should consume.
fn reject_adjacent_wildcards(pattern: &Expr, report: &mut AnalysisReport) {
    if let Expr::ArrayLit { elements, span, .. } = pattern {
        for pair in elements.windows(2) {
            if pair[0].is_wildcard_ref() && pair[1].is_wildcard_ref() {
                report.push(SemanticError::DuplicateWildcard { span: *span });
            }
        }
        for element in elements {
            reject_adjacent_wildcards(element, report);
        }
    }
}
