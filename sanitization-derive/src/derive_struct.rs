//! Struct-specific `Scrubbable` derivation.

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use syn::{spanned::Spanned, DataStruct, Fields, Result};

use crate::{
    strategy::parse_field_strategy,
    transform::{generate_field_transform, DeriveContext},
    DeriveOutput,
};

pub(crate) fn derive_struct(data: DataStruct, generics: &syn::Generics) -> Result<DeriveOutput> {
    let mut walked_generics = Vec::new();
    let mut text_generics = Vec::new();
    let mut ctx = DeriveContext {
        generics,
        walked_generics: &mut walked_generics,
        text_generics: &mut text_generics,
    };

    let scrub_body = match data.fields {
        Fields::Named(fields) => {
            let (bindings, transforms) = named_fields(&mut ctx, fields)?;
            quote! {
                let Self { #(#bindings),* } = self;
                #(#transforms)*
                Self { #(#bindings),* }
            }
        }
        Fields::Unnamed(fields) => {
            let (bindings, transforms) = unnamed_fields(&mut ctx, fields)?;
            quote! {
                let Self ( #(#bindings),* ) = self;
                #(#transforms)*
                Self ( #(#bindings),* )
            }
        }
        Fields::Unit => quote! { self },
    };

    Ok(DeriveOutput {
        scrub_body,
        walked_generics,
        text_generics,
    })
}

/// Bindings and rebinding statements for named fields.
pub(crate) fn named_fields(
    ctx: &mut DeriveContext<'_>,
    fields: syn::FieldsNamed,
) -> Result<(Vec<Ident>, Vec<TokenStream>)> {
    let mut bindings = Vec::new();
    let mut transforms = Vec::new();

    for field in fields.named {
        let span = field.span();
        let strategy = parse_field_strategy(&field.attrs)?;
        let Some(ident) = field.ident else {
            return Err(syn::Error::new(span, "named field should have an identifier"));
        };
        transforms.push(generate_field_transform(ctx, &field.ty, &ident, span, &strategy)?);
        bindings.push(ident);
    }

    Ok((bindings, transforms))
}

/// Bindings (`field_0`, `field_1`, ...) and rebinding statements for tuple
/// fields.
pub(crate) fn unnamed_fields(
    ctx: &mut DeriveContext<'_>,
    fields: syn::FieldsUnnamed,
) -> Result<(Vec<Ident>, Vec<TokenStream>)> {
    let mut bindings = Vec::new();
    let mut transforms = Vec::new();

    for (index, field) in fields.unnamed.into_iter().enumerate() {
        let span = field.span();
        let strategy = parse_field_strategy(&field.attrs)?;
        let ident = format_ident!("field_{index}");
        transforms.push(generate_field_transform(ctx, &field.ty, &ident, span, &strategy)?);
        bindings.push(ident);
    }

    Ok((bindings, transforms))
}
