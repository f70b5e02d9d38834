//! Derive macros for `sanitization`.
//!
//! This crate generates the traversal code behind `#[derive(Scrub)]`. It:
//! - reads `#[scrub(...)]` field attributes
//! - emits a `Scrubbable` implementation that calls into a mapper
//!
//! It does **not** define Rule Sets or scrubbers. Those live in the main
//! `sanitization` crate and are applied at runtime.

// <https://doc.rust-lang.org/rustc/lints/listing/allowed-by-default.html>
#![warn(
    anonymous_parameters,
    bare_trait_objects,
    elided_lifetimes_in_paths,
    missing_copy_implementations,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces
)]
// <https://rust-lang.github.io/rust-clippy/stable>
#![warn(
    clippy::all,
    clippy::cargo,
    clippy::dbg_macro,
    clippy::float_cmp_const,
    clippy::get_unwrap,
    clippy::mem_forget,
    clippy::nursery,
    clippy::pedantic,
    clippy::todo,
    clippy::unwrap_used,
    clippy::uninlined_format_args
)]
// Allow some clippy lints
#![allow(
    clippy::default_trait_access,
    clippy::doc_markdown,
    clippy::if_not_else,
    clippy::module_name_repetitions,
    clippy::multiple_crate_versions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::use_self,
    clippy::cargo_common_metadata,
    clippy::missing_errors_doc,
    clippy::enum_glob_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::option_if_let_else
)]
// Allow some lints while testing
#![cfg_attr(test, allow(clippy::non_ascii_literal, clippy::unwrap_used))]

#[allow(unused_extern_crates)]
extern crate proc_macro;

use proc_macro2::{Ident, TokenStream};
use proc_macro_crate::{crate_name, FoundCrate};
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, Data, DeriveInput, Result};

mod derive_enum;
mod derive_struct;
mod generics;
mod strategy;
mod transform;
mod types;
use derive_enum::derive_enum;
use derive_struct::derive_struct;
use generics::{add_scrub_text_bounds, add_scrubbable_bounds};

/// Derives `sanitization::Scrubbable` for structs and enums.
///
/// # Field Attributes
///
/// - **No annotation**: The field passes through unchanged. Use this for fields that carry no
///   untrusted input, including external types like `chrono::DateTime` or `uuid::Uuid`.
///
/// - `#[scrub]`: Walks the field with the active Rule Set. Strings are scrubbed by the Rule Set's
///   value scrubber, string-keyed maps have their keys screened, `sanitization::Value` runs the
///   full engine, and nested types that derive `Scrub` are walked recursively. Scalars pass
///   through unchanged.
///
/// - `#[scrub(Scrubber)]`: Applies `Scrubber::default()` to the field's text, regardless of the
///   Rule Set. `Scrubber` must implement `ValueScrubber + Default`; the field must implement
///   `ScrubText` (`String`, `Cow<str>`, and `Option`/`Vec`/`Box` of them). Scalar fields are
///   rejected.
///
/// Unions are rejected at compile time.
#[proc_macro_derive(Scrub, attributes(scrub))]
pub fn derive_scrub(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

/// Returns the token stream to reference the sanitization crate root.
///
/// Handles crate renaming (e.g., `clean = { package = "sanitization", ... }`)
/// and internal usage (when the derive is used inside the sanitization crate
/// itself).
fn crate_root() -> TokenStream {
    match crate_name("sanitization") {
        Ok(FoundCrate::Itself) => quote! { crate },
        Ok(FoundCrate::Name(name)) => {
            let ident = format_ident!("{}", name);
            quote! { ::#ident }
        }
        Err(_) => quote! { ::sanitization },
    }
}

fn crate_path(item: &str) -> TokenStream {
    let root = crate_root();
    let item_ident = format_ident!("{}", item);
    quote! { #root::#item_ident }
}

/// Names used inside the generated `scrub_with`. They must not collide with the
/// deriving type's own generic parameters or field names.
pub(crate) fn mapper_ident() -> Ident {
    format_ident!("__scrub_mapper")
}

fn mapper_type_ident() -> Ident {
    format_ident!("__ScrubMapper")
}

pub(crate) struct DeriveOutput {
    pub(crate) scrub_body: TokenStream,
    pub(crate) walked_generics: Vec<Ident>,
    pub(crate) text_generics: Vec<Ident>,
}

fn expand(input: DeriveInput) -> Result<TokenStream> {
    let DeriveInput {
        ident,
        generics,
        data,
        ..
    } = input;

    let crate_root = crate_root();

    let output = match &data {
        Data::Struct(data) => derive_struct(data.clone(), &generics)?,
        Data::Enum(data) => derive_enum(&ident, data.clone(), &generics)?,
        Data::Union(u) => {
            return Err(syn::Error::new(
                u.union_token.span(),
                "`Scrub` cannot be derived for unions",
            ));
        }
    };

    let DeriveOutput {
        scrub_body,
        walked_generics,
        text_generics,
    } = output;

    let bounded = add_scrubbable_bounds(generics, &walked_generics);
    let bounded = add_scrub_text_bounds(bounded, &text_generics);
    let (impl_generics, ty_generics, where_clause) = bounded.split_for_impl();
    let mapper = mapper_ident();
    let mapper_ty = mapper_type_ident();

    Ok(quote! {
        impl #impl_generics #crate_root::Scrubbable for #ident #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn scrub_with<#mapper_ty: #crate_root::ScrubMapper>(self, #mapper: &#mapper_ty) -> Self {
                #scrub_body
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_str(tokens: TokenStream) -> Result<String> {
        let input: DeriveInput = syn::parse2(tokens)?;
        expand(input).map(|tokens| tokens.to_string())
    }

    #[test]
    fn struct_expands_to_scrubbable_impl() {
        let out = expand_str(quote! {
            struct Query {
                #[scrub]
                filter: String,
                id: u64,
            }
        })
        .unwrap();
        assert!(out.contains("Scrubbable for Query"));
        assert!(out.contains("scrub_with"));
    }

    #[test]
    fn walked_generics_get_bounds() {
        let out = expand_str(quote! {
            struct Wrapper<T, U> {
                #[scrub]
                inner: T,
                untouched: U,
            }
        })
        .unwrap();
        assert!(out.contains("< T :"));
        assert!(!out.contains("U :"));
    }

    #[test]
    fn user_generic_named_m_does_not_clash_with_the_mapper() {
        let out = expand_str(quote! {
            struct Envelope<T, M> {
                #[scrub]
                payload: T,
                mapper: String,
                _marker: PhantomData<M>,
            }
        })
        .unwrap();
        assert!(out.contains("scrub_with < __ScrubMapper"));
        assert!(out.contains("__scrub_mapper : & __ScrubMapper"));
        assert!(out.contains("let mapper = mapper ;"));
    }

    #[test]
    fn unions_are_rejected() {
        let err = expand_str(quote! {
            union Bits {
                a: u32,
                b: f32,
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("cannot be derived for unions"));
    }

    #[test]
    fn scrubber_on_scalar_is_rejected() {
        let err = expand_str(quote! {
            struct Row {
                #[scrub(SqlScrubber)]
                age: u32,
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("scalar fields cannot use a scrubber"));
    }
}
