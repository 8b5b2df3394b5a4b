//! Type inspection helpers.
//!
//! Matching is syntactic on the last path segment, so `Option<T>`,
//! `std::option::Option<T>` and `sprig::Result<T>` are all recognized.

use syn::{GenericArgument, PathArguments, Type};

/// The `N`-th generic argument of `Name<..>`, if `ty` is that type.
fn generic_argument<'a>(ty: &'a Type, name: &str) -> Option<&'a Type> {
    if let Type::Path(type_path) = ty
        && type_path.qself.is_none()
        && let Some(segment) = type_path.path.segments.last()
        && segment.ident == name
        && let PathArguments::AngleBracketed(args) = &segment.arguments
        && let Some(GenericArgument::Type(inner)) = args.args.first()
    {
        return Some(inner);
    }
    None
}

/// Unwrap `Result<T>` (or `Result<T, E>`) to get `T`.
pub(crate) fn unwrap_result_type(ty: &Type) -> Option<&Type> {
    generic_argument(ty, "Result")
}

/// Unwrap `Option<T>` to get `T`.
pub(crate) fn unwrap_option_type(ty: &Type) -> Option<&Type> {
    generic_argument(ty, "Option")
}

pub(crate) fn is_option_type(ty: &Type) -> bool {
    unwrap_option_type(ty).is_some()
}

pub(crate) fn is_vec_type(ty: &Type) -> bool {
    generic_argument(ty, "Vec").is_some()
}

/// Check if a type is the unit type `()`.
pub(crate) fn is_unit_type(ty: &Type) -> bool {
    matches!(ty, Type::Tuple(tuple) if tuple.elems.is_empty())
}

/// Scalar family of a parameter type, used to type-check template defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scalar {
    SignedInt,
    UnsignedInt,
    Float,
    Bool,
    Char,
    /// `&str` and friends: the default is passed as a string literal.
    Str,
    /// `String`: the default is passed as an owned string.
    OwnedString,
}

/// Classify `ty`, looking through `Option<T>` and references.
pub(crate) fn scalar_of(ty: &Type) -> Option<Scalar> {
    let ty = unwrap_option_type(ty).unwrap_or(ty);
    match ty {
        Type::Reference(reference) => match scalar_of(&reference.elem) {
            Some(Scalar::OwnedString) => Some(Scalar::Str),
            other => other,
        },
        Type::Paren(paren) => scalar_of(&paren.elem),
        Type::Group(group) => scalar_of(&group.elem),
        Type::Path(type_path) if type_path.qself.is_none() => {
            let ident = type_path.path.segments.last()?.ident.to_string();
            match ident.as_str() {
                "i8" | "i16" | "i32" | "i64" | "i128" | "isize" => Some(Scalar::SignedInt),
                "u8" | "u16" | "u32" | "u64" | "u128" | "usize" => Some(Scalar::UnsignedInt),
                "f32" | "f64" => Some(Scalar::Float),
                "bool" => Some(Scalar::Bool),
                "char" => Some(Scalar::Char),
                "str" => Some(Scalar::Str),
                "String" => Some(Scalar::OwnedString),
                _ => None,
            }
        }
        _ => None,
    }
}
