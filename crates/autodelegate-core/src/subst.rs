use crate::prelude::*;
use std::collections::{BTreeSet, HashMap};
use syn::{
    GenericParam, Lifetime, TypeParamBound, TypePath, WherePredicate,
    visit::Visit,
    visit_mut::{self, VisitMut},
};

///
/// Substitution
///
/// Maps a trait's generic parameters onto the arguments it was used with.
/// Only bare single-segment paths are replaced; associated paths such as
/// `T::Item` are left alone.
///

#[derive(Clone, Debug, Default)]
pub struct Substitution {
    types: HashMap<Ident, Type>,
    lifetimes: HashMap<Ident, Lifetime>,
}

impl Substitution {
    /// Bind `generics` (a trait's parameter list) to `args`.
    /// Missing trailing type arguments fall back to the parameter default.
    pub fn bind(generics: &Generics, args: &[GenericArgument]) -> Result<Self, String> {
        if generics.const_params().next().is_some() {
            return Err("const generic parameters are not supported".to_string());
        }

        let mut lifetime_args = Vec::new();
        let mut type_args = Vec::new();
        for arg in args {
            match arg {
                GenericArgument::Lifetime(lifetime) => lifetime_args.push(lifetime),
                GenericArgument::Type(ty) => type_args.push(ty),
                _ => return Err("only lifetime and type arguments are supported".to_string()),
            }
        }

        let lifetime_params = generics.lifetimes().count();
        if lifetime_args.len() != lifetime_params {
            return Err(format!(
                "expected {lifetime_params} lifetime argument(s), found {}",
                lifetime_args.len()
            ));
        }

        let type_params = generics.type_params().count();
        if type_args.len() > type_params {
            return Err(format!(
                "expected at most {type_params} type argument(s), found {}",
                type_args.len()
            ));
        }

        let mut subst = Self::default();
        for (param, arg) in generics.lifetimes().zip(lifetime_args) {
            subst
                .lifetimes
                .insert(param.lifetime.ident.clone(), arg.clone());
        }

        for (i, param) in generics.type_params().enumerate() {
            let ty = match (type_args.get(i), &param.default) {
                (Some(arg), _) => (*arg).clone(),
                (None, Some(default)) => subst.apply_type(default),
                (None, None) => {
                    return Err(format!(
                        "expected {type_params} type argument(s), found {}",
                        type_args.len()
                    ));
                }
            };
            subst.types.insert(param.ident.clone(), ty);
        }

        Ok(subst)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.lifetimes.is_empty()
    }

    #[must_use]
    pub fn apply_type(&self, ty: &Type) -> Type {
        let mut ty = ty.clone();
        Replace(self).visit_type_mut(&mut ty);

        ty
    }

    #[must_use]
    pub fn apply_arg(&self, arg: &GenericArgument) -> GenericArgument {
        let mut arg = arg.clone();
        Replace(self).visit_generic_argument_mut(&mut arg);

        arg
    }

    #[must_use]
    pub fn apply_generics(&self, generics: &Generics) -> Generics {
        let mut generics = generics.clone();
        Replace(self).visit_generics_mut(&mut generics);

        generics
    }

    /// Instantiate a capability's arguments.
    #[must_use]
    pub fn apply_capability(&self, cap: &CapabilityType) -> CapabilityType {
        cap.with_args(cap.args.iter().map(|arg| self.apply_arg(arg)).collect())
    }

    fn lookup(&self, ty: &Type) -> Option<Type> {
        let Type::Path(TypePath { qself: None, path }) = ty else {
            return None;
        };
        let ident = path.get_ident()?;

        self.types.get(ident).cloned()
    }
}

struct Replace<'a>(&'a Substitution);

impl VisitMut for Replace<'_> {
    fn visit_type_mut(&mut self, ty: &mut Type) {
        if let Some(replacement) = self.0.lookup(ty) {
            *ty = replacement;
            return;
        }

        visit_mut::visit_type_mut(self, ty);
    }

    fn visit_lifetime_mut(&mut self, lifetime: &mut Lifetime) {
        if let Some(replacement) = self.0.lifetimes.get(&lifetime.ident) {
            *lifetime = replacement.clone();
        }
    }
}

///
/// Self detection
///

#[derive(Default)]
struct SelfFinder {
    found: bool,
}

impl Visit<'_> for SelfFinder {
    fn visit_ident(&mut self, ident: &Ident) {
        if ident == "Self" {
            self.found = true;
        }
    }
}

/// Does `Self` occur anywhere in the operation's parameters, output or bounds?
#[must_use]
pub fn mentions_self(op: &Operation) -> bool {
    let mut finder = SelfFinder::default();

    for param in &op.params {
        finder.visit_type(&param.ty);
    }
    if let Some(output) = &op.output {
        finder.visit_type(output);
    }
    finder.visit_generics(&op.generics);

    finder.found
}

///
/// Parameter usage
///

#[derive(Default)]
struct IdentCollector(BTreeSet<String>);

impl Visit<'_> for IdentCollector {
    fn visit_ident(&mut self, ident: &Ident) {
        self.0.insert(ident.to_string());
    }
}

/// Every identifier (including lifetime names) used in the given arguments.
#[must_use]
pub fn used_idents<'a>(args: impl IntoIterator<Item = &'a GenericArgument>) -> BTreeSet<String> {
    let mut collector = IdentCollector::default();
    for arg in args {
        collector.visit_generic_argument(arg);
    }

    collector.0
}

/// Every identifier referenced by a trait or lifetime bound.
#[must_use]
pub fn bound_idents(bound: &TypeParamBound) -> BTreeSet<String> {
    let mut collector = IdentCollector::default();
    collector.visit_type_param_bound(bound);

    collector.0
}

/// Every identifier referenced by a where-clause predicate.
#[must_use]
pub fn predicate_idents(predicate: &WherePredicate) -> BTreeSet<String> {
    let mut collector = IdentCollector::default();
    collector.visit_where_predicate(predicate);

    collector.0
}

#[must_use]
pub fn param_name(param: &GenericParam) -> String {
    match param {
        GenericParam::Lifetime(lt) => lt.lifetime.ident.to_string(),
        GenericParam::Type(ty) => ty.ident.to_string(),
        GenericParam::Const(c) => c.ident.to_string(),
    }
}

/// The parameter list written back as arguments (`<'a, T>` becomes `'a, T`).
#[must_use]
pub fn params_as_args(generics: &Generics) -> Vec<GenericArgument> {
    generics
        .params
        .iter()
        .map(|param| match param {
            GenericParam::Lifetime(lt) => GenericArgument::Lifetime(lt.lifetime.clone()),
            GenericParam::Type(ty) => {
                let ident = &ty.ident;
                GenericArgument::Type(syn::parse_quote!(#ident))
            }
            GenericParam::Const(c) => {
                let ident = &c.ident;
                GenericArgument::Type(syn::parse_quote!(#ident))
            }
        })
        .collect()
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use syn::{TraitItemFn, parse_quote};

    fn render(ty: &Type) -> String {
        ty.to_token_stream().to_string()
    }

    #[test]
    fn binds_type_parameters_in_order() {
        let generics: Generics = parse_quote!(<K, V>);
        let args: Vec<GenericArgument> = vec![parse_quote!(String), parse_quote!(u32)];
        let subst = Substitution::bind(&generics, &args).unwrap();

        let ty: Type = parse_quote!(Option<(K, &V)>);
        assert_eq!(
            render(&subst.apply_type(&ty)),
            quote!(Option<(String, &u32)>).to_string()
        );
    }

    #[test]
    fn leaves_unrelated_paths_untouched() {
        let generics: Generics = parse_quote!(<E>);
        let subst = Substitution::bind(&generics, &[parse_quote!(String)]).unwrap();

        let ty: Type = parse_quote!(Vec<Element>);
        assert_eq!(render(&subst.apply_type(&ty)), render(&ty));
    }

    #[test]
    fn substitutes_lifetimes() {
        let generics: Generics = parse_quote!(<'a, T>);
        let args: Vec<GenericArgument> = vec![parse_quote!('static), parse_quote!(u8)];
        let subst = Substitution::bind(&generics, &args).unwrap();

        let ty: Type = parse_quote!(&'a T);
        assert_eq!(render(&subst.apply_type(&ty)), quote!(&'static u8).to_string());
    }

    #[test]
    fn missing_argument_uses_default() {
        let generics: Generics = parse_quote!(<T, U = T>);
        let subst = Substitution::bind(&generics, &[parse_quote!(i64)]).unwrap();

        let ty: Type = parse_quote!(U);
        assert_eq!(render(&subst.apply_type(&ty)), "i64");
    }

    #[test]
    fn rejects_wrong_arity() {
        let generics: Generics = parse_quote!(<T>);

        assert!(Substitution::bind(&generics, &[]).is_err());
        assert!(
            Substitution::bind(&generics, &[parse_quote!(u8), parse_quote!(u16)]).is_err()
        );
    }

    #[test]
    fn finds_self_in_signature() {
        let by_ref: TraitItemFn = parse_quote!(fn merge(&mut self, other: &Self););
        let plain: TraitItemFn = parse_quote!(fn len(&self) -> usize;);

        assert!(mentions_self(&Operation::from_trait_fn(&by_ref)));
        assert!(!mentions_self(&Operation::from_trait_fn(&plain)));
    }

    #[test]
    fn params_round_trip_to_arguments() {
        let generics: Generics = parse_quote!(<'a, T: Clone>);
        let args = params_as_args(&generics);

        assert_eq!(quote!(#(#args),*).to_string(), quote!('a, T).to_string());
        assert!(used_idents(&args).contains("T"));
        assert!(used_idents(&args).contains("a"));
    }
}
