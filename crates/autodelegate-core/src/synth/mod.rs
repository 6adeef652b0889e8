//! Structured description of a generated forwarding type and its rendering.

mod emit;
mod render;

pub use emit::{GENERATED_HEADER, MemoryEmitter, SourceEmitter, render_namespace};

use crate::{model::GeneratedTypeModel, prelude::*};
use syn::Visibility;

///
/// TypeSpec
///
/// What a source emitter receives: a struct with one field per delegation
/// target, a constructor taking those fields in order, and one impl block
/// per capability in each target's closure. The inherit macro lets the
/// declaration implement the same traits while only writing its overrides.
///

#[derive(Clone, Debug)]
pub struct TypeSpec {
    pub name: Ident,
    pub vis: Visibility,
    pub doc: String,
    pub generics: Generics,
    pub fields: Vec<FieldSpec>,
    pub impls: Vec<ImplSpec>,
    pub inherit: InheritSpec,
}

///
/// FieldSpec
///

#[derive(Clone, Debug)]
pub struct FieldSpec {
    pub name: Ident,
    pub ty: Type,
}

///
/// ImplSpec
///

#[derive(Clone, Debug)]
pub struct ImplSpec {
    pub capability: CapabilityType,
    pub methods: Vec<MethodSpec>,
}

///
/// InheritSpec
///
/// A `macro_rules!` named `<type>_impl`. Each arm accepts
/// `impl <Trait> for <Declaration> via <field> { overrides }` and expands to
/// that impl with every operation not overridden forwarded to `field`, which
/// holds the generated base.
///

#[derive(Clone, Debug)]
pub struct InheritSpec {
    pub name: Ident,
    pub declaration: Ident,
    pub generics: Generics,
    pub arms: Vec<ImplSpec>,
}

///
/// MethodSpec
///

#[derive(Clone, Debug)]
pub struct MethodSpec {
    pub operation: Operation,
    pub body: TokenStream,
}

impl TypeSpec {
    /// Lower a model into the emitter's structured form.
    #[must_use]
    pub fn from_model(model: &GeneratedTypeModel) -> Self {
        let mut fields = Vec::new();
        let mut impls = Vec::new();
        let mut arms = Vec::new();

        for target in model.targets() {
            let field = target.descriptor.field();
            let capability = target.descriptor.capability();

            fields.push(FieldSpec {
                name: field.clone(),
                ty: syn::parse_quote!(::std::boxed::Box<dyn #capability>),
            });

            let boxed = quote!(*self.#field);
            let base = quote!(self.$field);

            for group in &target.members.groups {
                impls.push(ImplSpec::forwarding(&group.capability, &group.operations, &boxed));
                arms.push(ImplSpec::forwarding(&group.capability, &group.operations, &base));
            }
        }

        let inherit = InheritSpec {
            name: format_ident!("{}_impl", model.name()),
            declaration: model.declaration().clone(),
            generics: model.declaration_generics().clone(),
            arms,
        };

        Self {
            name: model.name().clone(),
            vis: model.vis().clone(),
            doc: doc_line(model),
            generics: model.generics().clone(),
            fields,
            impls,
            inherit,
        }
    }
}

impl ImplSpec {
    // every operation forwarded to the value at `place`
    fn forwarding(
        capability: &CapabilityType,
        operations: &[Operation],
        place: &TokenStream,
    ) -> Self {
        let methods = operations
            .iter()
            .map(|op| MethodSpec {
                operation: op.clone(),
                body: forward_body(capability, place, op),
            })
            .collect();

        Self {
            capability: capability.clone(),
            methods,
        }
    }
}

// single fully-qualified call on the value at `place`
fn forward_body(capability: &CapabilityType, place: &TokenStream, op: &Operation) -> TokenStream {
    let path = capability.expr_path();
    let name = &op.name;
    let args = op.params.iter().map(|param| &param.name);
    let target = match op.receiver {
        Receiver::RefMut(_) => quote!(&mut #place),
        _ => quote!(&#place),
    };

    let call = quote!(#path::#name(#target #(, #args)*));
    let call = if op.is_unsafe {
        quote!(unsafe { #call })
    } else {
        call
    };

    if op.returns_value() {
        call
    } else {
        quote!(#call;)
    }
}

fn doc_line(model: &GeneratedTypeModel) -> String {
    let targets = model
        .descriptors()
        .map(|descriptor| {
            format!(
                "`{}` to `{}`",
                descriptor.capability().key(),
                descriptor.field()
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        " Forwarding base for `{}`: delegates {targets}.",
        model.declaration()
    )
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use syn::{TraitItemFn, parse_quote};

    fn op(item: TraitItemFn) -> Operation {
        Operation::from_trait_fn(&item)
    }

    #[test]
    fn value_returning_operation_returns_the_call() {
        let cap = CapabilityType::parse("Greeter").unwrap();
        let body = forward_body(
            &cap,
            &quote!(*self.target0),
            &op(parse_quote!(fn b(&self, x: i32) -> String;)),
        );

        assert_eq!(
            body.to_string(),
            quote!(Greeter::b(&*self.target0, x)).to_string()
        );
    }

    #[test]
    fn unit_operation_discards_the_result() {
        let cap = CapabilityType::parse("Greeter").unwrap();
        let body = forward_body(
            &cap,
            &quote!(*self.target0),
            &op(parse_quote!(fn a(&mut self);)),
        );

        assert_eq!(
            body.to_string(),
            quote!(Greeter::a(&mut *self.target0);).to_string()
        );
    }

    #[test]
    fn generic_capability_uses_turbofish_and_unsafe_block() {
        let cap = CapabilityType::parse("Raw<u8>").unwrap();
        let body = forward_body(
            &cap,
            &quote!(*self.inner),
            &op(parse_quote!(unsafe fn peek(&self, at: usize) -> u8;)),
        );

        assert_eq!(
            body.to_string(),
            quote!(unsafe { Raw::<u8>::peek(&*self.inner, at) }).to_string()
        );
    }

    #[test]
    fn inherited_operation_borrows_the_base_field() {
        let cap = CapabilityType::parse("crate::Counter").unwrap();
        let body = forward_body(
            &cap,
            &quote!(self.$field),
            &op(parse_quote!(fn increment(&mut self, by: u32);)),
        );

        assert_eq!(
            body.to_string(),
            quote!(crate::Counter::increment(&mut self.$field, by);).to_string()
        );
    }
}
