//! Generic type parameter handling and trait bound management.
//!
//! Bounds are added only for generics used by walked or scrubbed fields.
//! `PhantomData<T>` is skipped, so marker parameters never need
//! `Scrubbable`.

use syn::{parse_quote, Ident};

use crate::crate_path;

pub(crate) fn collect_generics_from_type(
    ty: &syn::Type,
    generics: &syn::Generics,
    result: &mut Vec<Ident>,
) {
    let syn::Type::Path(path) = ty else {
        return;
    };
    let Some(segment) = path.path.segments.last() else {
        return;
    };
    if segment.ident == "PhantomData" {
        return;
    }

    if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
        for arg in &args.args {
            if let syn::GenericArgument::Type(inner_ty) = arg {
                collect_generics_from_type(inner_ty, generics, result);
            }
        }
    }

    for param in generics.type_params() {
        if segment.ident == param.ident && !result.iter().any(|g| g == &param.ident) {
            result.push(param.ident.clone());
        }
    }
}

fn add_bounds(mut generics: syn::Generics, used_generics: &[Ident], item: &str) -> syn::Generics {
    for param in generics.type_params_mut() {
        if used_generics.iter().any(|g| g == &param.ident) {
            let bound = crate_path(item);
            param.bounds.push(parse_quote!(#bound));
        }
    }
    generics
}

/// Adds `Scrubbable` bounds to generic parameters used in walked fields.
pub(crate) fn add_scrubbable_bounds(generics: syn::Generics, used_generics: &[Ident]) -> syn::Generics {
    add_bounds(generics, used_generics, "Scrubbable")
}

/// Adds `ScrubText` bounds to generic parameters used in scrubbed fields.
pub(crate) fn add_scrub_text_bounds(generics: syn::Generics, used_generics: &[Ident]) -> syn::Generics {
    add_bounds(generics, used_generics, "ScrubText")
}
