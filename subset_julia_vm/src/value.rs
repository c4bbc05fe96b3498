//! Runtime values.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use subset_julia_vm_parser::FunDecl;

use crate::types::Type;

/// A struct instance: an ordered, named field map shared by every handle to
/// the same object (so mutating one field through one reference is visible
/// through every other reference to that object).
#[derive(Debug)]
pub struct StructInstance {
    pub struct_name: String,
    pub fields: Vec<(String, Value)>,
}

impl StructInstance {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn set(&mut self, name: &str, value: Value) -> bool {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Null,
    /// A 1-dimensional array-like value.
    Array(Rc<RefCell<Vec<Value>>>),
    /// A 2-dimensional array-like value: a non-empty list of equal-length
    /// rows.
    Matrix(Rc<RefCell<Vec<Vec<Value>>>>),
    Struct(Rc<RefCell<StructInstance>>),
    /// A bound function handle.
    Function(Rc<FunDecl>),
    /// The `print` builtin, referenced by name rather than called directly.
    Builtin(&'static str),
    /// A type used as a first-class value: a primitive name (`Int`) or a
    /// struct name referenced without the `$` constructor syntax.
    TypeRef(Type),
}

impl Value {
    pub fn array(elements: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(elements)))
    }

    pub fn matrix(rows: Vec<Vec<Value>>) -> Value {
        Value::Matrix(Rc::new(RefCell::new(rows)))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        matches!(self, Value::Bool(true))
    }

    /// Flat element count: a row-major count for matrices.
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::Array(a) => Some(a.borrow().len()),
            Value::Matrix(m) => {
                let rows = m.borrow();
                Some(rows.len() * rows.first().map_or(0, |r| r.len()))
            }
            Value::Str(s) => Some(s.chars().count()),
            _ => None,
        }
    }

    /// `[rows]` for an array, `[rows, cols]` for a matrix.
    pub fn shape(&self) -> Option<Vec<usize>> {
        match self {
            Value::Array(a) => Some(vec![a.borrow().len()]),
            Value::Matrix(m) => {
                let rows = m.borrow();
                let cols = rows.first().map_or(0, |r| r.len());
                Some(vec![rows.len(), cols])
            }
            _ => None,
        }
    }

    /// Normalizes any array-like value to row-major rows, treating a flat
    /// array as a single row and an array of arrays as its own rows. This
    /// is how the interpreter reconciles `Value::Array` holding nested
    /// `Value::Array`s with `Value::Matrix`'s native row storage, mirroring
    /// the `Array(Array(T)) == Mat(T)` type-level equivalence.
    pub fn as_rows(&self) -> Option<Vec<Vec<Value>>> {
        match self {
            Value::Matrix(m) => Some(m.borrow().clone()),
            Value::Array(a) => {
                let elements = a.borrow();
                if elements.iter().all(|e| matches!(e, Value::Array(_))) && !elements.is_empty() {
                    Some(
                        elements
                            .iter()
                            .map(|e| match e {
                                Value::Array(inner) => inner.borrow().clone(),
                                _ => unreachable!(),
                            })
                            .collect(),
                    )
                } else {
                    Some(vec![elements.clone()])
                }
            }
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => *a.borrow() == *b.borrow(),
            (Value::Matrix(a), Value::Matrix(b)) => *a.borrow() == *b.borrow(),
            (Value::Struct(a), Value::Struct(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::TypeRef(a), Value::TypeRef(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Null => write!(f, "null"),
            Value::Array(a) => {
                write!(f, "[")?;
                for (i, v) in a.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Matrix(m) => {
                write!(f, "[")?;
                for (i, row) in m.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    for (j, v) in row.iter().enumerate() {
                        if j > 0 {
                            write!(f, " ")?;
                        }
                        write!(f, "{v}")?;
                    }
                }
                write!(f, "]")
            }
            Value::Struct(s) => {
                let s = s.borrow();
                write!(f, "{}(", s.struct_name)?;
                for (i, (name, v)) in s.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}={v}")?;
                }
                write!(f, ")")
            }
            Value::Function(decl) => write!(f, "<function {}>", decl.name),
            Value::Builtin(name) => write!(f, "<builtin {name}>"),
            Value::TypeRef(ty) => write!(f, "{ty}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_and_float_compare_by_numeric_value() {
        assert_eq!(Value::Int(2), Value::Float(2.0));
    }

    #[test]
    fn array_of_arrays_normalizes_to_rows() {
        let v = Value::array(vec![
            Value::array(vec![Value::Int(1), Value::Int(2)]),
            Value::array(vec![Value::Int(3), Value::Int(4)]),
        ]);
        assert_eq!(
            v.as_rows(),
            Some(vec![
                vec![Value::Int(1), Value::Int(2)],
                vec![Value::Int(3), Value::Int(4)],
            ])
        );
    }

    #[test]
    fn matrix_shape_is_rows_then_cols() {
        let m = Value::matrix(vec![
            vec![Value::Int(1), Value::Int(2), Value::Int(3)],
            vec![Value::Int(4), Value::Int(5), Value::Int(6)],
        ]);
        assert_eq!(m.shape(), Some(vec![2, 3]));
        assert_eq!(m.length(), Some(6));
    }

    #[test]
    fn struct_equality_is_reference_identity() {
        let a = Rc::new(RefCell::new(StructInstance {
            struct_name: "Point".into(),
            fields: vec![("x".into(), Value::Int(1))],
        }));
        let b = Rc::new(RefCell::new(StructInstance {
            struct_name: "Point".into(),
            fields: vec![("x".into(), Value::Int(1))],
        }));
        assert_ne!(Value::Struct(Rc::clone(&a)), Value::Struct(b));
        assert_eq!(Value::Struct(Rc::clone(&a)), Value::Struct(a));
    }
}
