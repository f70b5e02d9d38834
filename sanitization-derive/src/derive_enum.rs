//! Enum-specific `Scrubbable` derivation.
//!
//! Each variant becomes one match arm that rebinds its fields and rebuilds the
//! same variant.

use proc_macro2::Ident;
use quote::quote;
use syn::{DataEnum, Fields, Result};

use crate::{
    derive_struct::{named_fields, unnamed_fields},
    transform::DeriveContext,
    DeriveOutput,
};

pub(crate) fn derive_enum(
    name: &Ident,
    data: DataEnum,
    generics: &syn::Generics,
) -> Result<DeriveOutput> {
    let mut arms = Vec::new();
    let mut walked_generics = Vec::new();
    let mut text_generics = Vec::new();
    let mut ctx = DeriveContext {
        generics,
        walked_generics: &mut walked_generics,
        text_generics: &mut text_generics,
    };

    for variant in data.variants {
        let variant_ident = &variant.ident;
        let arm = match variant.fields {
            Fields::Unit => quote! { #name::#variant_ident => #name::#variant_ident },
            Fields::Named(fields) => {
                let (bindings, transforms) = named_fields(&mut ctx, fields)?;
                quote! {
                    #name::#variant_ident { #(#bindings),* } => {
                        #(#transforms)*
                        #name::#variant_ident { #(#bindings),* }
                    }
                }
            }
            Fields::Unnamed(fields) => {
                let (bindings, transforms) = unnamed_fields(&mut ctx, fields)?;
                quote! {
                    #name::#variant_ident ( #(#bindings),* ) => {
                        #(#transforms)*
                        #name::#variant_ident ( #(#bindings),* )
                    }
                }
            }
        };
        arms.push(arm);
    }

    // An empty enum has no values to match on.
    let scrub_body = if arms.is_empty() {
        quote! { match self {} }
    } else {
        quote! {
            match self {
                #(#arms),*
            }
        }
    };

    Ok(DeriveOutput {
        scrub_body,
        walked_generics,
        text_generics,
    })
}
