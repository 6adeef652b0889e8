use super::{InheritSpec, MethodSpec, TypeSpec};
use crate::prelude::*;

impl ToTokens for TypeSpec {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let Self {
            name,
            vis,
            doc,
            generics,
            fields,
            impls,
            inherit,
        } = self;
        let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

        let field_names: Vec<_> = fields.iter().map(|field| &field.name).collect();
        let field_types: Vec<_> = fields.iter().map(|field| &field.ty).collect();

        let impl_blocks = impls.iter().map(|imp| {
            let capability = &imp.capability;
            let methods = &imp.methods;

            quote! {
                impl #impl_generics #capability for #name #ty_generics #where_clause {
                    #(#methods)*
                }
            }
        });

        tokens.extend(quote! {
            #[doc = #doc]
            #[allow(non_camel_case_types)]
            #vis struct #name #generics #where_clause {
                #(#field_names: #field_types,)*
            }

            impl #impl_generics #name #ty_generics #where_clause {
                #[must_use]
                pub fn new(#(#field_names: #field_types),*) -> Self {
                    Self { #(#field_names),* }
                }
            }

            #(#impl_blocks)*

            #inherit
        });
    }
}

impl ToTokens for InheritSpec {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let Self {
            name,
            declaration,
            generics,
            arms,
        } = self;
        if arms.is_empty() {
            return;
        }
        let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

        // matched by simple trait name, expanded with the absolute path
        let arms = arms.iter().map(|arm| {
            let local = arm.capability.local_tokens();
            let capability = &arm.capability;
            let methods = &arm.methods;

            quote! {
                (impl #local for #declaration via $field:ident { $($body:tt)* }) => {
                    ::autodelegate::inherit_missing! {
                        impl #impl_generics #capability for #declaration #ty_generics #where_clause {
                            $($body)*
                        }
                        {
                            #(#methods)*
                        }
                    }
                };
            }
        });

        tokens.extend(quote! {
            #[allow(unused_macros)]
            macro_rules! #name {
                #(#arms)*
            }
        });
    }
}

impl ToTokens for MethodSpec {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let op = &self.operation;
        let name = &op.name;
        let generics = &op.generics;
        let where_clause = &op.generics.where_clause;
        let receiver = &op.receiver;
        let unsafety = op.is_unsafe.then(|| quote!(unsafe));
        let output = op.output.as_ref().map(|ty| quote!(-> #ty));
        let body = &self.body;

        let params = op.params.iter().map(|param| {
            let (name, ty) = (&param.name, &param.ty);
            quote!(#name: #ty)
        });

        tokens.extend(quote! {
            #unsafety fn #name #generics (#receiver #(, #params)*) #output #where_clause {
                #body
            }
        });
    }
}

///
/// TESTS
///
