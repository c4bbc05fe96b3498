//! The type universe (closed set of type variants).
//!
//! Sub-modules:
//! - `comparison`: equality, the array/matrix equivalence lemma,
//!   assignability, and common-supertype computation.

mod comparison;

pub use comparison::{common_supertype, is_assignable_to};

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A user-defined struct's field signature, shared by every `Type::Struct`
/// that names the same declaration. Fields live behind a `RefCell` so a
/// self-referential struct (a field whose type is the struct itself) can be
/// registered under its name before its field list is fully resolved.
#[derive(Debug)]
pub struct StructSig {
    pub name: String,
    pub fields: RefCell<Vec<(String, Type)>>,
}

impl StructSig {
    pub fn new(name: impl Into<String>) -> Rc<StructSig> {
        Rc::new(StructSig {
            name: name.into(),
            fields: RefCell::new(Vec::new()),
        })
    }

    pub fn field_type(&self, name: &str) -> Option<Type> {
        self.fields
            .borrow()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t.clone())
    }

    pub fn field_count(&self) -> usize {
        self.fields.borrow().len()
    }

    pub fn field_names_and_types(&self) -> Vec<(String, Type)> {
        self.fields.borrow().clone()
    }
}

/// The name behind a `Type::Generic`. Two `Type::Generic` values with the
/// same `name` are the *same* type variable for equality purposes even if
/// they wrap different slots; in practice the analyzer installs exactly one
/// `GenericSlot` per declared generic name per function and every reference
/// to that name inside the function shares it via `Rc`. Resolution of a
/// generic to a concrete type for one particular call is tracked separately,
/// in the analyzer's own per-call binding table, since the same declaration
/// is called with different argument types across a program's lifetime.
#[derive(Debug)]
pub struct GenericSlot {
    pub name: String,
}

impl GenericSlot {
    pub fn new(name: impl Into<String>) -> Rc<GenericSlot> {
        Rc::new(GenericSlot { name: name.into() })
    }
}

/// Inhabitants of the source language's type universe.
#[derive(Debug, Clone)]
pub enum Type {
    Int,
    Float,
    Bool,
    String,
    Void,
    Null,
    /// The type of types themselves (the type of a type-denoting reference
    /// like `Int` used as a value, and of the Symbolic wildcard's
    /// reflexive partner).
    Type,
    Array(Box<Type>),
    Mat(Box<Type>),
    Struct(Rc<StructSig>),
    Fun(Box<Type>, Vec<Type>),
    Generic(Rc<GenericSlot>),
    /// The type of the wildcard element `_`; equal to every type.
    Symbolic,
}

impl Type {
    pub fn array_like_component(&self) -> Option<&Type> {
        match self {
            Type::Array(t) | Type::Mat(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_array_like(&self) -> bool {
        matches!(self, Type::Array(_) | Type::Mat(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    /// Reference types are the ones `Null` can stand in for.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Type::String | Type::Array(_) | Type::Mat(_) | Type::Struct(_) | Type::Fun(_, _)
        )
    }

    pub fn array_of(component: Type) -> Type {
        Type::Array(Box::new(component))
    }

    pub fn mat_of(component: Type) -> Type {
        Type::Mat(Box::new(component))
    }

    /// The primitive type a root-scope builtin type name denotes, or `None`
    /// if `name` isn't one of them.
    pub fn primitive_named(name: &str) -> Option<Type> {
        Some(match name {
            "Int" => Type::Int,
            "Float" => Type::Float,
            "Bool" => Type::Bool,
            "String" => Type::String,
            "Void" => Type::Void,
            "Type" => Type::Type,
            _ => return None,
        })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "Int"),
            Type::Float => write!(f, "Float"),
            Type::Bool => write!(f, "Bool"),
            Type::String => write!(f, "String"),
            Type::Void => write!(f, "Void"),
            Type::Null => write!(f, "Null"),
            Type::Type => write!(f, "Type"),
            Type::Array(t) => write!(f, "Array#{}", t),
            Type::Mat(t) => write!(f, "Mat#{}", t),
            Type::Struct(s) => write!(f, "{}", s.name),
            Type::Fun(r, p) => {
                write!(f, "Fun(")?;
                for (i, t) in p.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", t)?;
                }
                write!(f, ") -> {}", r)
            }
            Type::Generic(slot) => write!(f, "{}", slot.name),
            Type::Symbolic => write!(f, "_"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_nested_array_like() {
        assert_eq!(Type::array_of(Type::Int).to_string(), "Array#Int");
        assert_eq!(Type::mat_of(Type::Float).to_string(), "Mat#Float");
    }

    #[test]
    fn generic_display_shows_its_declared_name() {
        let slot = GenericSlot::new("T");
        assert_eq!(Type::Generic(slot).to_string(), "T");
    }
}
