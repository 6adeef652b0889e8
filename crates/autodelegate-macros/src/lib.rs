//! The `#[auto_delegate(...)]` attribute, plus the helper the generated
//! `<Type>_impl!` macros expand to.
//!
//! Generation happens in the build script; the attribute only checks that
//! the delegation metadata is well formed and returns the struct unchanged.

use autodelegate_core::DelegateArgs;
use darling::{FromMeta, ast::NestedMeta};
use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{ToTokens, quote};
use std::collections::HashSet;
use syn::{
    ImplItem, ImplItemFn, Item, ItemImpl, braced,
    parse::{Parse, ParseStream},
    spanned::Spanned,
};

/// Mark a struct whose forwarding base `AutoDelegate_<Name>` is generated
/// by `autodelegate_build::build!`.
///
/// ```ignore
/// #[auto_delegate(value = "Counter", field = "inner")]
/// #[auto_delegate(to(Named, "Store<V>"))]
/// ```
#[proc_macro_attribute]
pub fn auto_delegate(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr.into(), item.into()).into()
}

// The item is always emitted so that one bad attribute does not cascade
// into unrelated errors at every use of the struct.
fn expand(attr: TokenStream2, item: TokenStream2) -> TokenStream2 {
    match check(attr, &item) {
        Ok(()) => item,
        Err(errors) => quote! {
            #errors
            #item
        },
    }
}

fn check(attr: TokenStream2, item: &TokenStream2) -> Result<(), TokenStream2> {
    let parsed: Item = syn::parse2(item.clone()).map_err(|err| err.to_compile_error())?;
    if !matches!(parsed, Item::Struct(_)) {
        return Err(
            syn::Error::new(parsed.span(), "#[auto_delegate] can only be applied to structs")
                .to_compile_error(),
        );
    }

    let span = if attr.is_empty() {
        Span::call_site()
    } else {
        attr.span()
    };

    let nested = NestedMeta::parse_meta_list(attr).map_err(|err| err.to_compile_error())?;
    let args = DelegateArgs::from_list(&nested).map_err(darling::Error::write_errors)?;

    args.into_metadata()
        .map(|_| ())
        .map_err(|err| syn::Error::new(span, err.to_string()).to_compile_error())
}

///
/// InheritInput
///
/// `impl Trait for Type { overrides } { inherited fns }`
///

struct InheritInput {
    item: ItemImpl,
    inherited: Vec<ImplItemFn>,
}

impl Parse for InheritInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let item = input.parse()?;

        let content;
        braced!(content in input);
        let mut inherited = Vec::new();
        while !content.is_empty() {
            inherited.push(content.parse()?);
        }

        Ok(Self { item, inherited })
    }
}

/// Complete an impl block with the inherited methods it does not define.
/// Called by the generated `AutoDelegate_<Name>_impl!` macros.
#[doc(hidden)]
#[proc_macro]
pub fn inherit_missing(input: TokenStream) -> TokenStream {
    inherit(input.into()).into()
}

fn inherit(input: TokenStream2) -> TokenStream2 {
    let InheritInput {
        mut item,
        inherited,
    } = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    let defined: HashSet<String> = item
        .items
        .iter()
        .filter_map(|item| match item {
            ImplItem::Fn(f) => Some(f.sig.ident.to_string()),
            _ => None,
        })
        .collect();

    item.items.extend(
        inherited
            .into_iter()
            .filter(|f| !defined.contains(&f.sig.ident.to_string()))
            .map(ImplItem::Fn),
    );

    item.into_token_stream()
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> TokenStream2 {
        quote!(
            pub struct Tag {
                base: AutoDelegate_Tag,
            }
        )
    }

    fn is_error(tokens: &TokenStream2) -> bool {
        tokens.to_string().contains("compile_error")
    }

    #[test]
    fn valid_forms_pass_through_unchanged() {
        for attr in [
            quote!(value = "Named"),
            quote!(value = Named, field = "inner"),
            quote!(to(Named, "Store<V>")),
        ] {
            let out = expand(attr.clone(), item());
            assert_eq!(out.to_string(), item().to_string(), "{attr}");
        }
    }

    #[test]
    fn conflicting_forms_are_reported() {
        let out = expand(quote!(value = "Named", to(Store)), item());

        assert!(is_error(&out));
        assert!(out.to_string().contains("cannot be combined"));
        assert!(out.to_string().contains("pub struct Tag"), "item is kept");
    }

    #[test]
    fn missing_target_is_reported() {
        assert!(is_error(&expand(TokenStream2::new(), item())));
        assert!(is_error(&expand(quote!(to()), item())));
    }

    #[test]
    fn unknown_arguments_are_reported() {
        assert!(is_error(&expand(quote!(target = "Named"), item())));
    }

    fn inherited_fns() -> TokenStream2 {
        quote!({
            fn count(&self) -> u64 {
                crate::Counter::count(&self.base)
            }
            fn increment(&mut self) {
                crate::Counter::increment(&mut self.base);
            }
        })
    }

    #[test]
    fn overrides_win_and_the_rest_is_inherited() {
        let user = quote!(impl crate::Counter for Audited {
            fn increment(&mut self) {
                self.calls += 1;
                self.base.increment();
            }
        });
        let inherited = inherited_fns();
        let out = inherit(quote!(#user #inherited));

        let expected = quote!(impl crate::Counter for Audited {
            fn increment(&mut self) {
                self.calls += 1;
                self.base.increment();
            }
            fn count(&self) -> u64 {
                crate::Counter::count(&self.base)
            }
        });
        assert_eq!(out.to_string(), expected.to_string());
    }

    #[test]
    fn empty_impl_inherits_everything() {
        let inherited = inherited_fns();
        let out = inherit(quote!(impl<V: Clone> crate::Counter for Audited<V> {} #inherited));
        let out = out.to_string();

        assert!(out.contains(&quote!(impl<V: Clone> crate::Counter for Audited<V>).to_string()));
        assert!(out.contains("fn count"));
        assert!(out.contains("fn increment"));
    }

    #[test]
    fn malformed_input_is_a_compile_error() {
        assert!(is_error(&inherit(quote!(struct NotAnImpl;))));
        assert!(is_error(&inherit(quote!(impl crate::Counter for Audited {}))));
    }

    #[test]
    fn non_structs_are_rejected() {
        let out = expand(quote!(value = "Named"), quote!(pub enum Tag { A }));

        assert!(is_error(&out));
        assert!(out.to_string().contains("only be applied to structs"));
    }
}
