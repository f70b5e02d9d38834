//! Type utilities for the derive macro.

const SCALARS: &[&str] = &[
    "bool", "char", "f32", "f64", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32",
    "u64", "u128", "usize",
];

/// Returns `true` for a bare primitive scalar name such as `u32` or `bool`.
///
/// Qualified paths, generic types and aliases are not recognized: they fall
/// through to the `ScrubText` bound, which rejects them if they carry no text.
pub(crate) fn is_scalar_type(ty: &syn::Type) -> bool {
    let syn::Type::Path(path) = ty else {
        return false;
    };
    if path.qself.is_some() || path.path.leading_colon.is_some() {
        return false;
    }
    match path.path.segments.first() {
        Some(segment) if path.path.segments.len() == 1 && segment.arguments.is_empty() => {
            SCALARS.iter().any(|scalar| segment.ident == scalar)
        }
        _ => false,
    }
}
