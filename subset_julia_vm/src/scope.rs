//! Lexical scoping: a tree of name -> declaration tables, one per owning
//! node (program, function body, block, case arm), plus the runtime value
//! storage that parallels it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use subset_julia_vm_parser::NodeId;

use crate::value::Value;

/// What a name in scope refers to, for name-resolution purposes. Holds
/// enough to let the analyzer look up the declaring node without re-walking
/// the AST.
#[derive(Debug, Clone)]
pub enum Binding {
    Var(NodeId),
    Param(NodeId),
    Fun(NodeId),
    Struct(NodeId),
    /// One of the built-in primitive type names (`Int`, `Float`, ...).
    BuiltinType,
    /// `true`, `false`, `null`.
    BuiltinValue,
    /// The `print` builtin function.
    BuiltinFun,
    /// The wildcard `_` bound inside a `case` arm.
    Symbolic,
}

/// One lexical scope. Scopes nest via `parent`; `owner` is the AST node
/// that introduced this scope (a function body's `Block`, an `if`/`while`
/// body, a `case` arm's `Block`, or the program's top-level `Block`).
#[derive(Debug)]
pub struct Scope {
    pub owner: NodeId,
    pub parent: Option<Rc<Scope>>,
    names: RefCell<HashMap<String, Binding>>,
}

impl Scope {
    pub fn root(owner: NodeId) -> Rc<Scope> {
        let scope = Rc::new(Scope {
            owner,
            parent: None,
            names: RefCell::new(HashMap::new()),
        });
        for name in ["Int", "Float", "Bool", "String", "Void", "Type"] {
            scope.declare(name, Binding::BuiltinType);
        }
        for name in ["true", "false", "null"] {
            scope.declare(name, Binding::BuiltinValue);
        }
        scope.declare("print", Binding::BuiltinFun);
        scope
    }

    pub fn child(self: &Rc<Self>, owner: NodeId) -> Rc<Scope> {
        Rc::new(Scope {
            owner,
            parent: Some(Rc::clone(self)),
            names: RefCell::new(HashMap::new()),
        })
    }

    /// Declares a name in this scope, returning the shadowed binding (if
    /// any) it replaces. Re-declaration inside the same scope is a
    /// semantic error the analyzer reports separately; the scope table
    /// itself just overwrites.
    pub fn declare(&self, name: impl Into<String>, binding: Binding) -> Option<Binding> {
        self.names.borrow_mut().insert(name.into(), binding)
    }

    pub fn is_declared_locally(&self, name: &str) -> bool {
        self.names.borrow().contains_key(name)
    }

    /// Walks outward through enclosing scopes looking for `name`.
    pub fn resolve(self: &Rc<Self>, name: &str) -> Option<Binding> {
        if let Some(binding) = self.names.borrow().get(name) {
            return Some(binding.clone());
        }
        self.parent.as_ref().and_then(|p| p.resolve(name))
    }
}

/// Runtime value storage, mirroring the `Scope` tree one-for-one: each
/// `Scope` that can hold mutable local state gets a `ScopeStorage` with the
/// same lifetime.
#[derive(Debug)]
pub struct ScopeStorage {
    pub parent: Option<Rc<ScopeStorage>>,
    values: RefCell<HashMap<String, Value>>,
}

impl ScopeStorage {
    pub fn root() -> Rc<ScopeStorage> {
        let storage = Rc::new(ScopeStorage {
            parent: None,
            values: RefCell::new(HashMap::new()),
        });
        storage.bind("true", Value::Bool(true));
        storage.bind("false", Value::Bool(false));
        storage.bind("null", Value::Null);
        storage
    }

    pub fn child(self: &Rc<Self>) -> Rc<ScopeStorage> {
        Rc::new(ScopeStorage {
            parent: Some(Rc::clone(self)),
            values: RefCell::new(HashMap::new()),
        })
    }

    pub fn bind(&self, name: impl Into<String>, value: Value) {
        self.values.borrow_mut().insert(name.into(), value);
    }

    pub fn get(self: &Rc<Self>, name: &str) -> Option<Value> {
        if let Some(v) = self.values.borrow().get(name) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Assigns to the nearest enclosing binding of `name`, returning
    /// `false` if no such binding exists anywhere in the chain.
    pub fn assign(self: &Rc<Self>, name: &str, value: Value) -> bool {
        if self.values.borrow().contains_key(name) {
            self.values.borrow_mut().insert(name.to_string(), value);
            return true;
        }
        match &self.parent {
            Some(p) => p.assign(name, value),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subset_julia_vm_parser::NodeId;

    fn nid() -> NodeId {
        NodeId::DANGLING
    }

    #[test]
    fn root_scope_has_builtins() {
        let root = Scope::root(nid());
        assert!(matches!(root.resolve("Int"), Some(Binding::BuiltinType)));
        assert!(matches!(root.resolve("print"), Some(Binding::BuiltinFun)));
        assert!(root.resolve("nonexistent").is_none());
    }

    #[test]
    fn child_scope_sees_parent_bindings() {
        let root = Scope::root(nid());
        let child = root.child(nid());
        child.declare("x", Binding::Var(nid()));
        assert!(matches!(child.resolve("x"), Some(Binding::Var(_))));
        assert!(matches!(child.resolve("Int"), Some(Binding::BuiltinType)));
    }

    #[test]
    fn storage_assign_walks_up_to_declaring_scope() {
        let root = ScopeStorage::root();
        root.bind("x", Value::Int(1));
        let child = root.child();
        assert!(child.assign("x", Value::Int(2)));
        assert_eq!(child.get("x"), Some(Value::Int(2)));
        assert!(!child.assign("never_declared", Value::Int(0)));
    }
}
