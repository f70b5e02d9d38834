//! Shared field transformation logic for struct and enum derivation.

use proc_macro2::{Ident, Span, TokenStream};
use quote::quote_spanned;
use syn::Result;

use crate::{
    crate_path, generics::collect_generics_from_type, mapper_ident, strategy::Strategy,
    types::is_scalar_type,
};

/// Accumulated state during field processing.
pub(crate) struct DeriveContext<'a> {
    pub(crate) generics: &'a syn::Generics,
    pub(crate) walked_generics: &'a mut Vec<Ident>,
    pub(crate) text_generics: &'a mut Vec<Ident>,
}

/// Generates the statement that rebinds one field to its scrubbed value.
///
/// | Annotation | Behavior |
/// |------------|----------|
/// | None | Rebind unchanged |
/// | `#[scrub]` | `Scrubbable::scrub_with(field, mapper)` |
/// | `#[scrub(S)]` | `ScrubText::scrub_text(field, &S::default())` |
pub(crate) fn generate_field_transform(
    ctx: &mut DeriveContext<'_>,
    ty: &syn::Type,
    binding: &Ident,
    span: Span,
    strategy: &Strategy,
) -> Result<TokenStream> {
    match strategy {
        Strategy::PassThrough => Ok(quote_spanned! { span =>
            let #binding = #binding;
        }),
        Strategy::Walk => {
            collect_generics_from_type(ty, ctx.generics, ctx.walked_generics);
            let scrubbable = crate_path("Scrubbable");
            let mapper = mapper_ident();
            Ok(quote_spanned! { span =>
                let #binding = #scrubbable::scrub_with(#binding, #mapper);
            })
        }
        Strategy::Scrubber(scrubber) => {
            if is_scalar_type(ty) {
                return Err(syn::Error::new(
                    span,
                    "scalar fields cannot use a scrubber: scrubbers apply to text. \
                    Use bare #[scrub] or no annotation.",
                ));
            }
            collect_generics_from_type(ty, ctx.generics, ctx.text_generics);
            let scrub_text = crate_path("ScrubText");
            Ok(quote_spanned! { span =>
                let #binding = #scrub_text::scrub_text(
                    #binding,
                    &<#scrubber as ::core::default::Default>::default(),
                );
            })
        }
    }
}
