//! The attribute reactor: a write-once store keyed by `(NodeId, attribute
//! name)`, demand-driven rather than push-based — an attribute's rule runs
//! the first time something asks for it, and the result is memoized for
//! every later asker. This gives the analyzer and interpreter a single
//! place to park "the type of this node" / "what this reference resolves
//! to" without threading extra return values through every recursive call.

use std::cell::RefCell;
use std::collections::HashMap;

use subset_julia_vm_parser::NodeId;

use crate::scope::Binding;
use crate::types::Type;

#[derive(Debug, Clone)]
pub enum Attr {
    Type(Type),
    Binding(Binding),
}

impl Attr {
    pub fn into_type(self) -> Option<Type> {
        match self {
            Attr::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn into_binding(self) -> Option<Binding> {
        match self {
            Attr::Binding(b) => Some(b),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Reactor {
    attrs: RefCell<HashMap<(NodeId, &'static str), Attr>>,
}

impl Reactor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: NodeId, key: &'static str) -> Option<Attr> {
        self.attrs.borrow().get(&(node, key)).cloned()
    }

    pub fn get_type(&self, node: NodeId) -> Option<Type> {
        self.get(node, "type").and_then(Attr::into_type)
    }

    pub fn get_binding(&self, node: NodeId) -> Option<Binding> {
        self.get(node, "decl").and_then(Attr::into_binding)
    }

    /// Installs an attribute. Installing the same `(node, key)` pair twice
    /// is an analyzer bug, not a user-facing error: each attribute has
    /// exactly one rule and that rule runs once per node.
    pub fn set(&self, node: NodeId, key: &'static str, value: Attr) {
        let previous = self.attrs.borrow_mut().insert((node, key), value);
        debug_assert!(previous.is_none(), "attribute {key:?} set twice for {node:?}");
    }

    pub fn set_type(&self, node: NodeId, ty: Type) {
        self.set(node, "type", Attr::Type(ty));
    }

    pub fn set_binding(&self, node: NodeId, binding: Binding) {
        self.set(node, "decl", Attr::Binding(binding));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_type_attribute() {
        let reactor = Reactor::new();
        let node = NodeId::DANGLING;
        assert!(reactor.get_type(node).is_none());
        reactor.set_type(node, Type::Int);
        assert_eq!(reactor.get_type(node), Some(Type::Int));
    }

    #[test]
    fn distinct_keys_on_same_node_do_not_collide() {
        let reactor = Reactor::new();
        let node = NodeId::DANGLING;
        reactor.set_type(node, Type::Bool);
        reactor.set_binding(node, Binding::BuiltinType);
        assert_eq!(reactor.get_type(node), Some(Type::Bool));
        assert!(matches!(reactor.get_binding(node), Some(Binding::BuiltinType)));
    }
}
