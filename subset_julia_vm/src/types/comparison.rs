//! Equality, assignability, and common-supertype computation over [`Type`].

use super::Type;

impl PartialEq for Type {
    fn eq(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Symbolic, _) | (_, Type::Symbolic) => true,
            (Type::Int, Type::Int)
            | (Type::Float, Type::Float)
            | (Type::Bool, Type::Bool)
            | (Type::String, Type::String)
            | (Type::Void, Type::Void)
            | (Type::Null, Type::Null)
            | (Type::Type, Type::Type) => true,
            (Type::Generic(a), Type::Generic(b)) => a.name == b.name,
            (Type::Struct(a), Type::Struct(b)) => a.name == b.name,
            (Type::Fun(ra, pa), Type::Fun(rb, pb)) => ra == rb && pa == pb,
            // The equivalence lemma: Array(Array(T)) == Mat(T), both ways.
            (Type::Array(a), Type::Mat(b)) | (Type::Mat(b), Type::Array(a)) => {
                matches!(a.as_ref(), Type::Array(inner) if inner.as_ref() == b.as_ref())
            }
            (Type::Array(a), Type::Array(b)) => a == b,
            (Type::Mat(a), Type::Mat(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Type {}

/// `a <= b`: can a value of type `a` be used wherever `b` is expected.
pub fn is_assignable_to(a: &Type, b: &Type) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Type::Null, _) if b.is_reference() => true,
        (Type::Int, Type::Float) => true,
        (Type::Array(ca), Type::Array(cb)) => is_assignable_to(ca, cb),
        (Type::Mat(ca), Type::Mat(cb)) => is_assignable_to(ca, cb),
        _ => false,
    }
}

/// The least type both `a` and `b` are assignable to, or `None` if they
/// share no common type. Array-likes dominate toward `Mat` except when both
/// sides are plain `Array`s, matching the rule arithmetic lifting uses.
pub fn common_supertype(a: &Type, b: &Type) -> Option<Type> {
    if a == b {
        return Some(a.clone());
    }
    if is_assignable_to(a, b) {
        return Some(b.clone());
    }
    if is_assignable_to(b, a) {
        return Some(a.clone());
    }
    if a.is_numeric() && b.is_numeric() {
        return Some(Type::Float);
    }
    match (a.array_like_component(), b.array_like_component()) {
        (Some(ca), Some(cb)) => {
            let component = common_supertype(ca, cb)?;
            let both_plain_array = matches!(a, Type::Array(_)) && matches!(b, Type::Array(_));
            Some(if both_plain_array {
                Type::array_of(component)
            } else {
                Type::mat_of(component)
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StructSig;

    #[test]
    fn array_of_array_equals_mat() {
        let lhs = Type::array_of(Type::array_of(Type::Int));
        let rhs = Type::mat_of(Type::Int);
        assert_eq!(lhs, rhs);
        assert_eq!(rhs, lhs);
    }

    #[test]
    fn symbolic_equals_everything() {
        assert_eq!(Type::Symbolic, Type::Int);
        assert_eq!(Type::Bool, Type::Symbolic);
    }

    #[test]
    fn null_assignable_to_reference_types_only() {
        assert!(is_assignable_to(&Type::Null, &Type::String));
        assert!(is_assignable_to(&Type::Null, &Type::array_of(Type::Int)));
        assert!(!is_assignable_to(&Type::Null, &Type::Int));
    }

    #[test]
    fn int_assignable_to_float_not_reverse() {
        assert!(is_assignable_to(&Type::Int, &Type::Float));
        assert!(!is_assignable_to(&Type::Float, &Type::Int));
    }

    #[test]
    fn assignable_implies_common_supertype_is_target() {
        assert_eq!(
            common_supertype(&Type::Int, &Type::Float),
            Some(Type::Float)
        );
    }

    #[test]
    fn distinct_struct_names_have_no_common_supertype() {
        let a = Type::Struct(StructSig::new("A"));
        let b = Type::Struct(StructSig::new("B"));
        assert_eq!(common_supertype(&a, &b), None);
    }

    #[test]
    fn array_op_array_stays_array_mat_op_anything_is_mat() {
        let arr = Type::array_of(Type::Int);
        let mat = Type::mat_of(Type::Int);
        assert_eq!(common_supertype(&arr, &arr), Some(arr.clone()));
        assert_eq!(common_supertype(&mat, &arr), Some(mat.clone()));
    }
}
