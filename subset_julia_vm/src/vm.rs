//! The tree-walking interpreter. Runs purely on dynamic [`Value`] shapes;
//! the static types the analyzer wrote into the reactor have already done
//! their job catching mistyped programs before any of this runs, so
//! evaluation never has to consult them — only the `decl` bindings on
//! [`Expr::Ref`] nodes, to know what a name refers to.

use std::cell::RefCell;
use std::rc::Rc;

use subset_julia_vm_parser::{
    BinOp, Block, CaseStmt, Expr, FunDecl, IfStmt, Program, ReturnStmt, Span, Stmt, WhileStmt,
};

use crate::error::RuntimeFault;
use crate::reactor::Reactor;
use crate::scope::{Binding, ScopeStorage};
use crate::semantic::Declarations;
use crate::types::Type;
use crate::value::{StructInstance, Value};

/// What finishing a statement or block did, besides possibly raising a
/// [`RuntimeFault`] (a wholly separate channel threaded through `?`).
enum Signal {
    Return(Value),
}

type Flow = Result<Option<Signal>, RuntimeFault>;
type Eval = Result<Value, RuntimeFault>;

pub struct Outcome {
    pub returned: Option<Value>,
}

pub struct Vm<'a> {
    reactor: &'a Reactor,
    decls: &'a Declarations,
}

impl<'a> Vm<'a> {
    pub fn new(reactor: &'a Reactor, decls: &'a Declarations) -> Self {
        Vm { reactor, decls }
    }

    pub fn run(&mut self, program: &Program) -> Result<Outcome, RuntimeFault> {
        let globals = ScopeStorage::root();
        match self.exec_block(&program.top, &globals)? {
            Some(Signal::Return(v)) => Ok(Outcome { returned: Some(v) }),
            None => Ok(Outcome { returned: None }),
        }
    }

    fn exec_block(&mut self, block: &Block, parent: &Rc<ScopeStorage>) -> Flow {
        let storage = parent.child();
        for stmt in &block.stmts {
            if let Stmt::FunDecl(decl) = stmt {
                storage.bind(decl.name.clone(), Value::Function(Rc::new(decl.clone())));
            }
        }
        for stmt in &block.stmts {
            if let Some(signal) = self.exec_stmt(stmt, &storage)? {
                return Ok(Some(signal));
            }
        }
        Ok(None)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, storage: &Rc<ScopeStorage>) -> Flow {
        match stmt {
            Stmt::StructDecl(_) | Stmt::FunDecl(_) => Ok(None),
            Stmt::VarDecl(decl) => {
                let value = self.eval(&decl.init, storage)?;
                let value = self.coerce_to_declared(decl.id, value);
                storage.bind(decl.name.clone(), value);
                Ok(None)
            }
            Stmt::Block(block) => self.exec_block(block, storage),
            Stmt::If(if_stmt) => self.exec_if(if_stmt, storage),
            Stmt::While(while_stmt) => self.exec_while(while_stmt, storage),
            Stmt::Return(ret) => self.exec_return(ret, storage),
            Stmt::ExprStmt(e) => {
                self.eval(&e.expr, storage)?;
                Ok(None)
            }
            Stmt::Case(case) => self.exec_case(case, storage),
        }
    }

    fn exec_if(&mut self, stmt: &IfStmt, storage: &Rc<ScopeStorage>) -> Flow {
        if self.eval(&stmt.cond, storage)?.is_truthy() {
            self.exec_block(&stmt.then_branch, storage)
        } else if let Some(else_branch) = &stmt.else_branch {
            self.exec_block(else_branch, storage)
        } else {
            Ok(None)
        }
    }

    fn exec_while(&mut self, stmt: &WhileStmt, storage: &Rc<ScopeStorage>) -> Flow {
        while self.eval(&stmt.cond, storage)?.is_truthy() {
            if let Some(signal) = self.exec_block(&stmt.body, storage)? {
                return Ok(Some(signal));
            }
        }
        Ok(None)
    }

    fn exec_return(&mut self, stmt: &ReturnStmt, storage: &Rc<ScopeStorage>) -> Flow {
        let value = match &stmt.value {
            Some(expr) => self.eval(expr, storage)?,
            None => Value::Null,
        };
        Ok(Some(Signal::Return(value)))
    }

    fn exec_case(&mut self, stmt: &CaseStmt, storage: &Rc<ScopeStorage>) -> Flow {
        let subject = self.eval(&stmt.subject, storage)?;
        for body in &stmt.bodies {
            if pattern_matches(&body.pattern, &subject) {
                return self.exec_block(&body.block, storage);
            }
        }
        match &stmt.default {
            Some(default) => self.exec_block(default, storage),
            None => Ok(None),
        }
    }

    fn eval(&mut self, expr: &Expr, storage: &Rc<ScopeStorage>) -> Eval {
        match expr {
            Expr::IntLit { value, .. } => Ok(Value::Int(*value)),
            Expr::FloatLit { value, .. } => Ok(Value::Float(*value)),
            Expr::StringLit { value, .. } => Ok(Value::Str(value.clone())),
            Expr::Ref { id, name, .. } => self.eval_ref(*id, name, storage),
            Expr::ArrayLit { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval(element, storage)?);
                }
                Ok(Value::array(values))
            }
            Expr::MatrixLit { rows, span, .. } => self.eval_matrix_lit(rows, *span, storage),
            Expr::MatrixGen {
                filler, shape, span, ..
            } => self.eval_matrix_gen(filler, shape, *span, storage),
            Expr::Paren { inner, .. } => self.eval(inner, storage),
            Expr::Field {
                object, name, span, ..
            } => self.eval_field(object, name, *span, storage),
            Expr::Index {
                array, index, span, ..
            } => self.eval_index(array, index, *span, storage),
            Expr::Slice {
                array, start, end, span, ..
            } => self.eval_slice(array, start, end, *span, storage),
            Expr::Not { operand, .. } => Ok(Value::Bool(!self.eval(operand, storage)?.is_truthy())),
            Expr::Binary {
                op, left, right, span, ..
            } => {
                let l = self.eval(left, storage)?;
                let r = self.eval(right, storage)?;
                self.eval_binary(*op, l, r, *span)
            }
            Expr::Construct {
                struct_name, args, span, ..
            } => self.eval_construct(struct_name, args, *span, storage),
            Expr::Call {
                callee, args, span, ..
            } => self.eval_call(callee, args, *span, storage),
            Expr::Assign {
                target, value, ..
            } => self.eval_assign(target, value, storage),
        }
    }

    fn eval_ref(&mut self, id: subset_julia_vm_parser::NodeId, name: &str, storage: &Rc<ScopeStorage>) -> Eval {
        match self.reactor.get_binding(id) {
            Some(Binding::BuiltinFun) => Ok(Value::Builtin("print")),
            Some(Binding::BuiltinType) => {
                Ok(Value::TypeRef(Type::primitive_named(name).unwrap_or(Type::Symbolic)))
            }
            Some(Binding::Struct(decl_id)) => {
                Ok(Value::TypeRef(Type::Struct(Rc::clone(&self.decls.struct_sigs[&decl_id]))))
            }
            Some(Binding::Fun(decl_id)) => Ok(Value::Function(Rc::clone(&self.decls.funs[&decl_id]))),
            Some(Binding::Var(_)) | Some(Binding::Param(_)) | Some(Binding::BuiltinValue) | None => {
                Ok(storage.get(name).unwrap_or(Value::Null))
            }
            Some(Binding::Symbolic) => Ok(Value::Null),
        }
    }

    fn eval_matrix_lit(&mut self, rows: &[Expr], span: Span, storage: &Rc<ScopeStorage>) -> Eval {
        let mut out = Vec::with_capacity(rows.len());
        let mut width = None;
        for row in rows {
            let value = self.eval(row, storage)?;
            let row_values = match &value {
                Value::Array(a) => a.borrow().clone(),
                _ => vec![value],
            };
            match width {
                Some(w) if w != row_values.len() => {
                    return Err(RuntimeFault::ShapeMismatch {
                        left: vec![w],
                        right: vec![row_values.len()],
                        span,
                    })
                }
                None => width = Some(row_values.len()),
                _ => {}
            }
            out.push(row_values);
        }
        Ok(Value::matrix(out))
    }

    fn eval_matrix_gen(&mut self, filler: &Expr, shape: &[Expr], span: Span, storage: &Rc<ScopeStorage>) -> Eval {
        let filler_value = self.eval(filler, storage)?;
        let mut dims = Vec::with_capacity(shape.len());
        for dim in shape {
            let dim_value = self.eval(dim, storage)?;
            let n = match dim_value {
                Value::Int(n) => n,
                other => other.as_f64().unwrap_or(0.0) as i64,
            };
            if n < 0 {
                return Err(RuntimeFault::NegativeDimension { dim: n, span });
            }
            dims.push(n as usize);
        }
        if dims.len() == 1 {
            Ok(Value::array(vec![filler_value; dims[0]]))
        } else {
            let cols = dims.get(1).copied().unwrap_or(0);
            Ok(Value::matrix(vec![vec![filler_value; cols]; dims[0]]))
        }
    }

    fn eval_field(&mut self, object: &Expr, name: &str, span: Span, storage: &Rc<ScopeStorage>) -> Eval {
        let value = self.eval(object, storage)?;
        match &value {
            Value::Null => Err(RuntimeFault::NullDereference { span }),
            Value::Array(_) | Value::Matrix(_) if name == "length" => {
                Ok(Value::Int(value.length().unwrap_or(0) as i64))
            }
            Value::Array(_) | Value::Matrix(_) if name == "shape" => Ok(Value::array(
                value
                    .shape()
                    .unwrap_or_default()
                    .into_iter()
                    .map(|d| Value::Int(d as i64))
                    .collect(),
            )),
            Value::Struct(s) => Ok(s.borrow().get(name).cloned().unwrap_or(Value::Null)),
            _ => Ok(Value::Null),
        }
    }

    fn eval_index(&mut self, array: &Expr, index: &Expr, span: Span, storage: &Rc<ScopeStorage>) -> Eval {
        let array_value = self.eval(array, storage)?;
        let index_value = self.eval(index, storage)?;
        let i = match index_value {
            Value::Int(i) => i,
            _ => 0,
        };
        match &array_value {
            Value::Array(a) => {
                let a = a.borrow();
                let idx = normalize_index(i, a.len(), span)?;
                Ok(a[idx].clone())
            }
            Value::Matrix(m) => {
                let m = m.borrow();
                let idx = normalize_index(i, m.len(), span)?;
                Ok(Value::array(m[idx].clone()))
            }
            _ => Err(RuntimeFault::IndexOutOfBounds { index: i, len: 0, span }),
        }
    }

    fn eval_slice(&mut self, array: &Expr, start: &Expr, end: &Expr, span: Span, storage: &Rc<ScopeStorage>) -> Eval {
        let array_value = self.eval(array, storage)?;
        let start_value = self.eval(start, storage)?;
        let end_value = self.eval(end, storage)?;
        let (s, e) = (
            value_as_i64(&start_value),
            value_as_i64(&end_value),
        );
        match &array_value {
            Value::Array(a) => {
                let a = a.borrow();
                let (lo, hi) = normalize_range(s, e, a.len());
                Ok(Value::array(a.get(lo..hi).map(|s| s.to_vec()).unwrap_or_default()))
            }
            Value::Matrix(m) => {
                let m = m.borrow();
                let (lo, hi) = normalize_range(s, e, m.len());
                Ok(Value::matrix(m.get(lo..hi).map(|s| s.to_vec()).unwrap_or_default()))
            }
            _ => Ok(Value::array(vec![])),
        }
    }

    fn eval_construct(&mut self, struct_name: &str, args: &[Expr], span: Span, storage: &Rc<ScopeStorage>) -> Eval {
        let Some(&decl_id) = self.decls.struct_by_name.get(struct_name) else {
            return Err(RuntimeFault::NullDereference { span });
        };
        let sig = &self.decls.struct_sigs[&decl_id];
        let field_names: Vec<String> = sig.field_names_and_types().into_iter().map(|(n, _)| n).collect();
        let mut fields = Vec::with_capacity(args.len());
        for (name, arg) in field_names.into_iter().zip(args.iter()) {
            let value = self.eval(arg, storage)?;
            fields.push((name, value));
        }
        Ok(Value::Struct(Rc::new(RefCell::new(StructInstance {
            struct_name: struct_name.to_string(),
            fields,
        }))))
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], span: Span, storage: &Rc<ScopeStorage>) -> Eval {
        let callee_value = self.eval(callee, storage)?;
        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.eval(arg, storage)?);
        }
        match callee_value {
            Value::Builtin("print") => {
                if let Some(v) = arg_values.first() {
                    println!("{v}");
                }
                Ok(Value::Null)
            }
            Value::Builtin(_) => Ok(Value::Null),
            Value::Function(decl) => self.call_function(&decl, arg_values, span),
            _ => Err(RuntimeFault::NullDereference { span }),
        }
    }

    fn call_function(&mut self, decl: &Rc<FunDecl>, args: Vec<Value>, span: Span) -> Eval {
        // A function that receives an array-like argument in a scalar
        // parameter slot is vectorized: apply it once per element and
        // collect the results, instead of running the body once.
        if let Some((vec_index, len)) = self.vectorized_slot(decl, &args) {
            let is_mat = matches!(args[vec_index], Value::Matrix(_));
            let mut results = Vec::with_capacity(len);
            for i in 0..len {
                let mut call_args = args.clone();
                call_args[vec_index] = element_at(&args[vec_index], i);
                results.push(self.call_function_once(decl, call_args, span)?);
            }
            return Ok(if is_mat {
                Value::matrix(results.into_iter().map(row_of).collect())
            } else {
                Value::array(results)
            });
        }
        self.call_function_once(decl, args, span)
    }

    fn call_function_once(&mut self, decl: &Rc<FunDecl>, args: Vec<Value>, _span: Span) -> Eval {
        let storage = ScopeStorage::root();
        for (param, value) in decl.params.iter().zip(args.into_iter()) {
            storage.bind(param.name.clone(), value);
        }
        match self.exec_block(&decl.body, &storage)? {
            Some(Signal::Return(v)) => Ok(v),
            None => Ok(Value::Null),
        }
    }

    fn eval_assign(&mut self, target: &Expr, value: &Expr, storage: &Rc<ScopeStorage>) -> Eval {
        let raw_value = self.eval(value, storage)?;
        let new_value = self.coerce_to_declared(target.id(), raw_value);
        match target {
            Expr::Ref { name, .. } => {
                storage.assign(name, new_value.clone());
                Ok(new_value)
            }
            Expr::Field { object, name, span, .. } => {
                let obj = self.eval(object, storage)?;
                match &obj {
                    Value::Struct(s) => {
                        s.borrow_mut().set(name, new_value.clone());
                        Ok(new_value)
                    }
                    Value::Null => Err(RuntimeFault::NullDereference { span: *span }),
                    _ => Ok(new_value),
                }
            }
            Expr::Index { array, index, span, .. } => {
                let arr = self.eval(array, storage)?;
                let idx_value = self.eval(index, storage)?;
                let i = value_as_i64(&idx_value);
                match &arr {
                    Value::Array(a) => {
                        let mut a = a.borrow_mut();
                        let idx = normalize_index(i, a.len(), *span)?;
                        a[idx] = new_value.clone();
                        Ok(new_value)
                    }
                    Value::Matrix(m) => {
                        let mut m = m.borrow_mut();
                        let idx = normalize_index(i, m.len(), *span)?;
                        if let Value::Array(row) = &new_value {
                            m[idx] = row.borrow().clone();
                        }
                        Ok(new_value)
                    }
                    _ => Err(RuntimeFault::IndexOutOfBounds { index: i, len: 0, span: *span }),
                }
            }
            Expr::Slice { array, start, end, .. } => {
                let arr = self.eval(array, storage)?;
                let s = value_as_i64(&self.eval(start, storage)?);
                let e = value_as_i64(&self.eval(end, storage)?);
                if let Value::Array(a) = &arr {
                    let mut a = a.borrow_mut();
                    let (lo, hi) = normalize_range(s, e, a.len());
                    if let Value::Array(replacement) = &new_value {
                        let replacement = replacement.borrow().clone();
                        let len = a.len();
                        a.splice(lo.min(len)..hi.min(len), replacement);
                    }
                }
                Ok(new_value)
            }
            _ => Ok(new_value),
        }
    }

    /// Promotes `value` against the type the analyzer resolved for `node`
    /// (a `VarDecl`'s own id, or an assignment target's own expression id),
    /// or returns it unchanged if analysis recorded no type for it.
    fn coerce_to_declared(&self, node: subset_julia_vm_parser::NodeId, value: Value) -> Value {
        match self.reactor.get_type(node) {
            Some(declared) => coerce_numeric(value, &declared),
            None => value,
        }
    }

    fn eval_binary(&mut self, op: BinOp, l: Value, r: Value, span: Span) -> Eval {
        if op == BinOp::Add && (matches!(l, Value::Str(_)) || matches!(r, Value::Str(_))) {
            return Ok(Value::Str(format!("{l}{r}")));
        }
        if op.is_logical() {
            return Ok(match op {
                BinOp::And => Value::Bool(l.is_truthy() && r.is_truthy()),
                _ => Value::Bool(l.is_truthy() || r.is_truthy()),
            });
        }
        if op.is_equality() {
            return Ok(Value::Bool(if op == BinOp::Eq { l == r } else { l != r }));
        }
        if op.is_scalar_comparison() {
            return self.scalar_compare(op, &l, &r, span).map(Value::Bool);
        }
        if op.is_array_like_predicate() {
            return self.array_predicate(op, &l, &r, span);
        }
        if op == BinOp::MatMul {
            return self.matmul(&l, &r, span);
        }
        self.elementwise(op, &l, &r, span)
    }

    fn scalar_binary(&self, op: BinOp, l: &Value, r: &Value, span: Span) -> Eval {
        let (a, b) = match (l, r) {
            (Value::Int(a), Value::Int(b)) => {
                return self.int_binary(op, *a, *b, span);
            }
            _ => (l.as_f64().unwrap_or(0.0), r.as_f64().unwrap_or(0.0)),
        };
        match op {
            BinOp::Add => Ok(Value::Float(a + b)),
            BinOp::Sub => Ok(Value::Float(a - b)),
            BinOp::Mul => Ok(Value::Float(a * b)),
            BinOp::Div => {
                if b == 0.0 {
                    Err(RuntimeFault::DivisionByZero { span })
                } else {
                    Ok(Value::Float(a / b))
                }
            }
            BinOp::Mod => {
                if b == 0.0 {
                    Err(RuntimeFault::DivisionByZero { span })
                } else {
                    Ok(Value::Float(a % b))
                }
            }
            _ => Ok(Value::Null),
        }
    }

    fn int_binary(&self, op: BinOp, a: i64, b: i64, span: Span) -> Eval {
        match op {
            BinOp::Add => Ok(Value::Int(a.wrapping_add(b))),
            BinOp::Sub => Ok(Value::Int(a.wrapping_sub(b))),
            BinOp::Mul => Ok(Value::Int(a.wrapping_mul(b))),
            BinOp::Div => {
                if b == 0 {
                    Err(RuntimeFault::DivisionByZero { span })
                } else {
                    Ok(Value::Float(a as f64 / b as f64))
                }
            }
            BinOp::Mod => {
                if b == 0 {
                    Err(RuntimeFault::DivisionByZero { span })
                } else {
                    Ok(Value::Int(a % b))
                }
            }
            _ => Ok(Value::Null),
        }
    }

    fn scalar_compare(&self, op: BinOp, l: &Value, r: &Value, _span: Span) -> Result<bool, RuntimeFault> {
        let a = l.as_f64().unwrap_or(0.0);
        let b = r.as_f64().unwrap_or(0.0);
        Ok(match op {
            BinOp::Lt => a < b,
            BinOp::Le => a <= b,
            BinOp::Gt => a > b,
            BinOp::Ge => a >= b,
            BinOp::Eq => l == r,
            BinOp::Ne => l != r,
            _ => false,
        })
    }

    fn elementwise(&mut self, op: BinOp, l: &Value, r: &Value, span: Span) -> Eval {
        match (l.as_rows(), r.as_rows()) {
            (Some(lrows), Some(rrows)) => {
                if lrows.len() != rrows.len() {
                    return Err(RuntimeFault::ShapeMismatch {
                        left: vec![lrows.len()],
                        right: vec![rrows.len()],
                        span,
                    });
                }
                let mut out = Vec::with_capacity(lrows.len());
                for (lr, rr) in lrows.iter().zip(rrows.iter()) {
                    if lr.len() != rr.len() {
                        return Err(RuntimeFault::ShapeMismatch {
                            left: vec![lr.len()],
                            right: vec![rr.len()],
                            span,
                        });
                    }
                    let mut row = Vec::with_capacity(lr.len());
                    for (a, b) in lr.iter().zip(rr.iter()) {
                        row.push(self.scalar_binary(op, a, b, span)?);
                    }
                    out.push(row);
                }
                if matches!(l, Value::Array(_)) && matches!(r, Value::Array(_)) && out.len() == 1 {
                    Ok(Value::array(out.into_iter().next().unwrap_or_default()))
                } else {
                    Ok(Value::matrix(out))
                }
            }
            (Some(lrows), None) => {
                let out: Vec<Vec<Value>> = lrows
                    .iter()
                    .map(|row| row.iter().map(|a| self.scalar_binary(op, a, r, span)).collect())
                    .collect::<Result<_, _>>()?;
                Ok(Value::matrix(out))
            }
            (None, Some(rrows)) => {
                let out: Vec<Vec<Value>> = rrows
                    .iter()
                    .map(|row| row.iter().map(|b| self.scalar_binary(op, l, b, span)).collect())
                    .collect::<Result<_, _>>()?;
                Ok(Value::matrix(out))
            }
            (None, None) => self.scalar_binary(op, l, r, span),
        }
    }

    fn matmul(&mut self, l: &Value, r: &Value, span: Span) -> Eval {
        if let (Value::Array(a), Value::Array(b)) = (l, r) {
            let a = a.borrow();
            let b = b.borrow();
            if a.len() != b.len() {
                return Err(RuntimeFault::ShapeMismatch {
                    left: vec![a.len()],
                    right: vec![b.len()],
                    span,
                });
            }
            let mut sum = Value::Int(0);
            for (x, y) in a.iter().zip(b.iter()) {
                let prod = self.scalar_binary(BinOp::Mul, x, y, span)?;
                sum = self.scalar_binary(BinOp::Add, &sum, &prod, span)?;
            }
            return Ok(sum);
        }
        let lrows = l.as_rows().unwrap_or_default();
        let rrows = r.as_rows().unwrap_or_default();
        let lcols = lrows.first().map_or(0, |row| row.len());
        let rcols = rrows.first().map_or(0, |row| row.len());
        if lcols != rrows.len() {
            return Err(RuntimeFault::ShapeMismatch {
                left: vec![lrows.len(), lcols],
                right: vec![rrows.len(), rcols],
                span,
            });
        }
        let mut out = Vec::with_capacity(lrows.len());
        for lrow in &lrows {
            let mut orow = Vec::with_capacity(rcols);
            for c in 0..rcols {
                let mut sum = Value::Int(0);
                for (k, item) in lrow.iter().enumerate() {
                    let prod = self.scalar_binary(BinOp::Mul, item, &rrows[k][c], span)?;
                    sum = self.scalar_binary(BinOp::Add, &sum, &prod, span)?;
                }
                orow.push(sum);
            }
            out.push(orow);
        }
        Ok(Value::matrix(out))
    }

    fn array_predicate(&mut self, op: BinOp, l: &Value, r: &Value, span: Span) -> Eval {
        let lrows = l.as_rows().unwrap_or_default();
        let rrows = r.as_rows().unwrap_or_default();
        if lrows.len() != rrows.len() {
            return Err(RuntimeFault::ShapeMismatch {
                left: vec![lrows.len()],
                right: vec![rrows.len()],
                span,
            });
        }
        let scalar_op = match op {
            BinOp::OneEq | BinOp::AllEq => BinOp::Eq,
            BinOp::OneNe | BinOp::AllNe => BinOp::Ne,
            BinOp::OneLt | BinOp::AllLt => BinOp::Lt,
            BinOp::OneLe | BinOp::AllLe => BinOp::Le,
            BinOp::OneGt | BinOp::AllGt => BinOp::Gt,
            _ => BinOp::Ge,
        };
        let is_all = matches!(
            op,
            BinOp::AllEq | BinOp::AllNe | BinOp::AllLt | BinOp::AllLe | BinOp::AllGt | BinOp::AllGe
        );
        let mut results = Vec::new();
        for (lr, rr) in lrows.iter().zip(rrows.iter()) {
            if lr.len() != rr.len() {
                return Err(RuntimeFault::ShapeMismatch {
                    left: vec![lr.len()],
                    right: vec![rr.len()],
                    span,
                });
            }
            for (a, b) in lr.iter().zip(rr.iter()) {
                results.push(self.scalar_compare(scalar_op, a, b, span)?);
            }
        }
        Ok(Value::Bool(if is_all {
            results.iter().all(|b| *b)
        } else {
            results.iter().any(|b| *b)
        }))
    }

    /// Finds the first parameter slot that received an array-like argument
    /// while its own declared type is a concrete, non-array-like type —
    /// matching the analyzer's rule that a generic parameter unifies
    /// directly with an array-like argument instead of being vectorized
    /// over it. Returns that slot's index plus the shared element count
    /// every array-like argument must agree on.
    fn vectorized_slot(&self, decl: &FunDecl, args: &[Value]) -> Option<(usize, usize)> {
        for (i, (param, arg)) in decl.params.iter().zip(args.iter()).enumerate() {
            let declared = self.reactor.get_type(param.id).unwrap_or(Type::Symbolic);
            let is_candidate = !declared.is_array_like() && !matches!(declared, Type::Generic(_));
            if is_candidate {
                if let Some(len) = vectorizable_len(arg) {
                    return Some((i, len));
                }
            }
        }
        None
    }
}

fn value_as_i64(v: &Value) -> i64 {
    match v {
        Value::Int(i) => *i,
        other => other.as_f64().unwrap_or(0.0) as i64,
    }
}

fn normalize_index(i: i64, len: usize, span: Span) -> Result<usize, RuntimeFault> {
    let resolved = if i < 0 { i + len as i64 } else { i };
    if resolved < 0 || resolved as usize >= len {
        Err(RuntimeFault::IndexOutOfBounds { index: i, len, span })
    } else {
        Ok(resolved as usize)
    }
}

/// `start` is inclusive, `end` is exclusive: `a[s:e]` has `e - s` elements.
/// Both accept negative indices counting from the end. `-1` is the builder's
/// sentinel for an omitted end bound ("through the end of the array"), so it
/// always means `len` rather than the index one before the last element.
fn normalize_range(start: i64, end: i64, len: usize) -> (usize, usize) {
    let norm = |i: i64| -> i64 {
        if i < 0 {
            i + len as i64
        } else {
            i
        }
    };
    let lo = norm(start).clamp(0, len as i64) as usize;
    let hi = if end == -1 {
        len
    } else {
        norm(end).clamp(0, len as i64) as usize
    };
    (lo, hi.max(lo))
}

/// Promotes `Int` values to `Float` wherever `declared`'s corresponding
/// component is `Float`, recursing through `Array`/`Matrix` structure.
/// Leaves everything else (including an already-`Float` value) untouched.
fn coerce_numeric(value: Value, declared: &Type) -> Value {
    match (value, declared) {
        (Value::Int(i), Type::Float) => Value::Float(i as f64),
        (Value::Array(a), Type::Array(component)) => {
            let coerced = a.borrow().iter().cloned().map(|v| coerce_numeric(v, component)).collect();
            Value::array(coerced)
        }
        (Value::Matrix(m), Type::Mat(component)) => {
            let coerced = m
                .borrow()
                .iter()
                .map(|row| row.iter().cloned().map(|v| coerce_numeric(v, component)).collect())
                .collect();
            Value::matrix(coerced)
        }
        (other, _) => other,
    }
}

/// The count `call_function` should iterate over when peeling this value
/// element-by-element: rows for a matrix (`element_at` hands back one row
/// per index), elements for a flat array. `Value::length()` reports a
/// matrix's *flat* element count instead, which would desync the loop
/// bound from what `element_at` actually returns.
fn vectorizable_len(value: &Value) -> Option<usize> {
    match value {
        Value::Array(a) => Some(a.borrow().len()),
        Value::Matrix(m) => Some(m.borrow().len()),
        _ => None,
    }
}

fn element_at(value: &Value, index: usize) -> Value {
    match value {
        Value::Array(a) => a.borrow().get(index).cloned().unwrap_or(Value::Null),
        Value::Matrix(m) => m
            .borrow()
            .get(index)
            .map(|row| Value::array(row.clone()))
            .unwrap_or(Value::Null),
        other => other.clone(),
    }
}

/// Reassembles one row of a vectorized-over-a-matrix call result. The
/// per-row call already broadcasts through the ordinary elementwise
/// dispatch once a row is bound in place of a scalar parameter, so the
/// result is already row-shaped — either a plain `Array` (array op array)
/// or a single-row `Matrix` (array op scalar always widens to `Mat`, see
/// `elementwise`). Either way this unwraps it back into a flat row; a
/// genuinely scalar result (e.g. a reduction) becomes a one-element row.
fn row_of(value: Value) -> Vec<Value> {
    match &value {
        Value::Array(a) => a.borrow().clone(),
        Value::Matrix(m) => m.borrow().first().cloned().unwrap_or_default(),
        _ => vec![value],
    }
}

/// Matches a `case` pattern against a runtime value. A bare wildcard `_`
/// matches any whole subject value; every other pattern shape requires
/// structural equality, except that a `_` used as one element of an array
/// pattern instead consumes zero or more consecutive subject elements (see
/// `pattern_matches_elements`).
fn pattern_matches(pattern: &Expr, subject: &Value) -> bool {
    if pattern.is_wildcard_ref() {
        return true;
    }
    match pattern {
        Expr::ArrayLit { elements, .. } => match subject {
            Value::Array(a) => pattern_matches_elements(elements, &a.borrow()),
            _ => false,
        },
        Expr::StringLit { value, .. } => pattern_matches_string(value, subject),
        Expr::IntLit { value, .. } => matches!(subject, Value::Int(i) if i == value)
            || matches!(subject, Value::Float(f) if *f == *value as f64),
        Expr::FloatLit { value, .. } => subject.as_f64() == Some(*value),
        Expr::Ref { name, .. } if name == "true" => matches!(subject, Value::Bool(true)),
        Expr::Ref { name, .. } if name == "false" => matches!(subject, Value::Bool(false)),
        Expr::Ref { name, .. } if name == "null" => matches!(subject, Value::Null),
        _ => false,
    }
}

/// Matches an array pattern's elements against a subject slice. A wildcard
/// element doesn't pin down exactly one subject element: it backtracks over
/// every span it could consume (zero elements up to the rest of the slice)
/// and accepts if matching the remaining pattern against what's left works
/// for any of them.
fn pattern_matches_elements(patterns: &[Expr], values: &[Value]) -> bool {
    match patterns.split_first() {
        None => values.is_empty(),
        Some((p, rest)) if p.is_wildcard_ref() => {
            (0..=values.len()).any(|take| pattern_matches_elements(rest, &values[take..]))
        }
        Some((p, rest)) => {
            !values.is_empty() && pattern_matches(p, &values[0]) && pattern_matches_elements(rest, &values[1..])
        }
    }
}

/// `\f` inside a string pattern consumes zero or more consecutive subject
/// characters, the same backtracking `pattern_matches_elements` does for an
/// array pattern's `_`.
fn pattern_matches_string(pattern: &str, subject: &Value) -> bool {
    let Value::Str(s) = subject else { return false };
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let subject_chars: Vec<char> = s.chars().collect();
    chars_match(&pattern_chars, &subject_chars)
}

fn chars_match(pattern: &[char], subject: &[char]) -> bool {
    match pattern.split_first() {
        None => subject.is_empty(),
        Some((&'\u{000C}', rest)) => (0..=subject.len()).any(|take| chars_match(rest, &subject[take..])),
        Some((p, rest)) => !subject.is_empty() && *p == subject[0] && chars_match(rest, &subject[1..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_range_default_end_covers_whole_array() {
        assert_eq!(normalize_range(0, -1, 5), (0, 5));
    }

    #[test]
    fn normalize_range_is_half_open_on_an_explicit_end() {
        assert_eq!(normalize_range(1, 3, 4), (1, 3));
    }

    #[test]
    fn normalize_index_accepts_negative_as_from_end() {
        assert_eq!(normalize_index(-1, 3, Span::empty()).unwrap(), 2);
        assert!(normalize_index(3, 3, Span::empty()).is_err());
    }

    #[test]
    fn wildcard_pattern_matches_any_value() {
        let builder = subset_julia_vm_parser::Builder::new();
        assert!(pattern_matches(&builder.wildcard(), &Value::Int(42)));
    }

    #[test]
    fn array_pattern_wildcard_consumes_multiple_elements() {
        let b = subset_julia_vm_parser::Builder::new();
        let pattern = b.array(vec![b.int(1), b.int(2), b.wildcard(), b.int(5)]);
        let subject = Value::array(vec![
            Value::Int(1),
            Value::Int(2),
            Value::Int(3),
            Value::Int(4),
            Value::Int(5),
        ]);
        assert!(pattern_matches(&pattern, &subject));
    }

    #[test]
    fn array_pattern_wildcard_can_consume_nothing() {
        let b = subset_julia_vm_parser::Builder::new();
        let pattern = b.array(vec![b.int(1), b.wildcard(), b.int(2)]);
        let subject = Value::array(vec![Value::Int(1), Value::Int(2)]);
        assert!(pattern_matches(&pattern, &subject));
    }

    #[test]
    fn string_pattern_wildcard_matches_one_char() {
        assert!(pattern_matches_string("a\u{000C}c", &Value::Str("abc".into())));
    }

    #[test]
    fn string_pattern_wildcard_consumes_multiple_chars() {
        assert!(pattern_matches_string("a\u{000C}d", &Value::Str("abcd".into())));
    }

    #[test]
    fn string_pattern_requires_trailing_literal_to_align_with_the_end() {
        assert!(!pattern_matches_string("a\u{000C}c", &Value::Str("abcd".into())));
    }
}
