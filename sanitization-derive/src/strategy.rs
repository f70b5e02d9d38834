//! Parsing of `#[scrub(...)]` field attributes.
//!
//! This module maps attribute syntax to traversal decisions and produces
//! structured errors for invalid forms.

use proc_macro2::Span;
use syn::{spanned::Spanned, Attribute, Meta, Result};

/// Field transformation strategy based on `#[scrub(...)]` attributes.
///
/// | Attribute | Strategy | Behavior |
/// |-----------|----------|----------|
/// | None | `PassThrough` | Field passes through unchanged |
/// | `#[scrub]` | `Walk` | Walk with the active Rule Set |
/// | `#[scrub(Scrubber)]` | `Scrubber(Scrubber)` | Apply one scrubber to the field's text |
#[derive(Clone, Debug)]
pub(crate) enum Strategy {
    /// No annotation: pass through unchanged.
    PassThrough,
    /// Bare `#[scrub]`: walk using `Scrubbable::scrub_with`.
    Walk,
    /// `#[scrub(Scrubber)]`: apply `Scrubber::default()` through `ScrubText`.
    Scrubber(syn::Path),
}

fn set_strategy(target: &mut Option<Strategy>, next: Strategy, span: Span) -> Result<()> {
    if target.is_some() {
        return Err(syn::Error::new(
            span,
            "multiple #[scrub] attributes specified on the same field",
        ));
    }
    *target = Some(next);
    Ok(())
}

pub(crate) fn parse_field_strategy(attrs: &[Attribute]) -> Result<Strategy> {
    let mut strategy: Option<Strategy> = None;
    for attr in attrs {
        if !attr.path().is_ident("scrub") {
            continue;
        }

        match &attr.meta {
            Meta::Path(_) => {
                set_strategy(&mut strategy, Strategy::Walk, attr.span())?;
            }
            Meta::List(list) => match syn::parse2::<syn::Path>(list.tokens.clone()) {
                Ok(path) => {
                    set_strategy(&mut strategy, Strategy::Scrubber(path), attr.span())?;
                }
                Err(_) => {
                    return Err(syn::Error::new(
                        attr.span(),
                        "expected a scrubber type (e.g., #[scrub(SqlScrubber)])",
                    ));
                }
            },
            Meta::NameValue(_) => {
                return Err(syn::Error::new(
                    attr.span(),
                    "name-value syntax is not supported for #[scrub]",
                ));
            }
        }
    }

    Ok(strategy.unwrap_or(Strategy::PassThrough))
}

#[cfg(test)]
mod tests {
    use quote::quote;
    use syn::DeriveInput;

    use super::*;

    fn parse_attrs(tokens: proc_macro2::TokenStream) -> Vec<Attribute> {
        let input: DeriveInput = syn::parse2(quote! {
            #tokens
            struct Dummy;
        })
        .expect("should parse as DeriveInput");
        input.attrs
    }

    #[test]
    fn no_attribute_returns_passthrough() {
        let attrs = parse_attrs(quote! {});
        let strategy = parse_field_strategy(&attrs).unwrap();
        assert!(matches!(strategy, Strategy::PassThrough));
    }

    #[test]
    fn bare_scrub_returns_walk() {
        let attrs = parse_attrs(quote! { #[scrub] });
        let strategy = parse_field_strategy(&attrs).unwrap();
        assert!(matches!(strategy, Strategy::Walk));
    }

    #[test]
    fn scrub_with_path_returns_scrubber() {
        let attrs = parse_attrs(quote! { #[scrub(sanitization::backends::SqlScrubber)] });
        match parse_field_strategy(&attrs).unwrap() {
            Strategy::Scrubber(path) => assert_eq!(path.segments.len(), 3),
            other => panic!("expected Scrubber, got {other:?}"),
        }
    }

    #[test]
    fn multiple_scrub_attributes_error() {
        let attrs = parse_attrs(quote! {
            #[scrub]
            #[scrub(CrlfScrubber)]
        });
        let err = parse_field_strategy(&attrs).unwrap_err();
        assert!(err.to_string().contains("multiple #[scrub] attributes"));
    }

    #[test]
    fn name_value_syntax_error() {
        let attrs = parse_attrs(quote! { #[scrub = "sql"] });
        let err = parse_field_strategy(&attrs).unwrap_err();
        assert!(err.to_string().contains("name-value syntax is not supported"));
    }

    #[test]
    fn non_path_argument_error() {
        let attrs = parse_attrs(quote! { #[scrub("sql")] });
        let err = parse_field_strategy(&attrs).unwrap_err();
        assert!(err.to_string().contains("expected a scrubber type"));
    }

    #[test]
    fn other_attributes_ignored() {
        let attrs = parse_attrs(quote! {
            #[derive(Clone)]
            #[serde(skip)]
        });
        let strategy = parse_field_strategy(&attrs).unwrap();
        assert!(matches!(strategy, Strategy::PassThrough));
    }
}
