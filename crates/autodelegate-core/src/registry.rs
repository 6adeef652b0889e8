use crate::{
    introspect::DeclarationSource,
    prelude::*,
    subst::{Substitution, params_as_args},
};
use std::collections::{BTreeMap, HashSet, VecDeque};
use syn::{ItemTrait, TraitBoundModifier, TraitItem, TypeParamBound, WherePredicate};

/// Auto traits carry no operations and are never forwarded.
const MARKER_TRAITS: &[&str] = &["Send", "Sync", "Unpin"];

///
/// CapabilityDef
///
/// A trait definition reduced to what forwarding needs.
///

#[derive(Clone, Debug)]
pub struct CapabilityDef {
    pub name: Ident,
    pub namespace: String,
    pub generics: Generics,
    pub supertraits: Vec<CapabilityType>,
    pub operations: Vec<Operation>,

    /// Items that keep the trait from being used as `dyn Trait`: associated
    /// types and constants, or a `Sized` requirement on `Self`.
    pub unsupported: Vec<String>,
}

impl CapabilityDef {
    #[must_use]
    pub fn from_trait(item: &ItemTrait, namespace: impl Into<String>) -> Self {
        let mut unsupported = Vec::new();
        if requires_sized(item) {
            unsupported.push("a `Self: Sized` requirement".to_string());
        }

        let supertraits = item
            .supertraits
            .iter()
            .filter_map(|bound| match bound {
                TypeParamBound::Trait(bound) if matches!(bound.modifier, TraitBoundModifier::None) => {
                    Some(CapabilityType::from_path(&bound.path))
                }
                _ => None,
            })
            .filter(|cap| cap.name() != "Sized" && !MARKER_TRAITS.contains(&cap.name().as_str()))
            .collect();

        let mut operations = Vec::new();
        for trait_item in &item.items {
            match trait_item {
                TraitItem::Fn(f) => operations.push(Operation::from_trait_fn(f)),
                TraitItem::Type(ty) => {
                    unsupported.push(format!("associated type `{}`", ty.ident));
                }
                TraitItem::Const(c) => {
                    unsupported.push(format!("associated constant `{}`", c.ident));
                }
                _ => {}
            }
        }

        Self {
            name: item.ident.clone(),
            namespace: namespace.into(),
            generics: item.generics.clone(),
            supertraits,
            operations,
            unsupported,
        }
    }

    /// Absolute path of the trait inside its crate (`crate::shop::Store`).
    #[must_use]
    pub fn path(&self) -> Path {
        let name = &self.name;
        if self.namespace.is_empty() {
            return Path::from(name.clone());
        }

        syn::parse_str(&format!("{}::{name}", self.namespace))
            .unwrap_or_else(|_| Path::from(name.clone()))
    }

    /// The trait referenced by its own parameter names (`Store<V>`).
    #[must_use]
    pub fn capability(&self) -> CapabilityType {
        let name = &self.name;

        CapabilityType {
            path: syn::parse_quote!(#name),
            args: params_as_args(&self.generics),
        }
    }

    fn ensure_forwardable(&self) -> Result<(), IntrospectionError> {
        match self.unsupported.first() {
            Some(item) => Err(IntrospectionError::UnsupportedItem {
                capability: self.name.to_string(),
                item: item.clone(),
            }),
            None => Ok(()),
        }
    }
}

// `trait X: Sized` or `trait X where Self: Sized`
fn requires_sized(item: &ItemTrait) -> bool {
    let is_sized = |bound: &TypeParamBound| match bound {
        TypeParamBound::Trait(bound) => {
            matches!(bound.modifier, TraitBoundModifier::None)
                && bound.path.segments.last().is_some_and(|seg| seg.ident == "Sized")
        }
        _ => false,
    };

    let in_where = item.generics.where_clause.iter().any(|clause| {
        clause.predicates.iter().any(|predicate| match predicate {
            WherePredicate::Type(pred) => {
                let on_self = matches!(
                    &pred.bounded_ty,
                    Type::Path(ty) if ty.qself.is_none() && ty.path.is_ident("Self")
                );

                on_self && pred.bounds.iter().any(is_sized)
            }
            _ => false,
        })
    });

    item.supertraits.iter().any(is_sized) || in_where
}

///
/// Registry
///
/// In-memory trait model and declaration list. Traits are identified by
/// simple name; a name defined in two namespaces is ambiguous. Trait impls
/// are keyed by the fully qualified self type.
///

#[derive(Debug, Default)]
pub struct Registry {
    capabilities: BTreeMap<String, Vec<CapabilityDef>>,
    declarations: Vec<AnnotatedDeclaration>,

    // self type -> implemented traits, in registration order
    impls: BTreeMap<QualifiedName, Vec<CapabilityType>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_capability(&mut self, def: CapabilityDef) {
        self.capabilities
            .entry(def.name.to_string())
            .or_default()
            .push(def);
    }

    pub fn add_trait(&mut self, item: &ItemTrait, namespace: &str) {
        self.add_capability(CapabilityDef::from_trait(item, namespace));
    }

    pub fn add_declaration(&mut self, decl: AnnotatedDeclaration) {
        self.declarations.push(decl);
    }

    /// Record `impl <capability> for <self_ty>`.
    pub fn add_impl(&mut self, self_ty: QualifiedName, capability: CapabilityType) {
        self.impls.entry(self_ty).or_default().push(capability);
    }

    #[must_use]
    pub fn capability_count(&self) -> usize {
        self.capabilities.values().map(Vec::len).sum()
    }

    #[must_use]
    pub const fn declaration_count(&self) -> usize {
        self.declarations.len()
    }

    pub fn capability(&self, name: &str) -> Result<&CapabilityDef, IntrospectionError> {
        match self.capabilities.get(name).map(Vec::as_slice) {
            None | Some([]) => Err(IntrospectionError::UnknownCapability {
                name: name.to_string(),
            }),
            Some([def]) => Ok(def),
            Some(defs) => Err(IntrospectionError::AmbiguousCapability {
                name: name.to_string(),
                namespaces: defs.iter().map(|def| def.namespace.clone()).collect(),
            }),
        }
    }

    fn bind(
        def: &CapabilityDef,
        capability: &CapabilityType,
    ) -> Result<Substitution, IntrospectionError> {
        Substitution::bind(&def.generics, &capability.args).map_err(|reason| {
            IntrospectionError::MalformedCapability {
                text: capability.to_string(),
                reason,
            }
        })
    }
}

impl TypeIntrospector for Registry {
    fn canonical(&self, capability: &CapabilityType) -> Result<CapabilityType, IntrospectionError> {
        let def = self.capability(&capability.name())?;

        Ok(capability.with_path(def.path()))
    }

    fn type_parameters(&self, capability: &CapabilityType) -> Result<Generics, IntrospectionError> {
        Ok(self.capability(&capability.name())?.generics.clone())
    }

    fn supertype_closure(
        &self,
        capability: &CapabilityType,
    ) -> Result<Vec<CapabilityType>, IntrospectionError> {
        let mut closure = Vec::new();
        let mut seen = HashSet::from([capability.key()]);
        let mut queue = VecDeque::from([capability.clone()]);

        while let Some(current) = queue.pop_front() {
            let def = self.capability(&current.name())?;
            let subst = Self::bind(def, &current)?;

            for supertrait in &def.supertraits {
                // written relative to the trait's module; rendered elsewhere
                let supertrait = self.canonical(&subst.apply_capability(supertrait))?;
                if seen.insert(supertrait.key()) {
                    closure.push(supertrait.clone());
                    queue.push_back(supertrait);
                }
            }
        }

        Ok(closure)
    }

    fn required_operations(
        &self,
        capability: &CapabilityType,
    ) -> Result<Vec<Operation>, IntrospectionError> {
        let def = self.capability(&capability.name())?;
        def.ensure_forwardable()?;

        Ok(def.operations.clone())
    }
}

impl DeclarationSource for Registry {
    fn declarations(&self) -> Vec<AnnotatedDeclaration> {
        self.declarations
            .iter()
            .map(|decl| {
                let mut decl = decl.clone();
                if let Some(impls) = self.impls.get(&decl.qualified_name()) {
                    decl.capabilities.extend(impls.iter().cloned());
                }

                decl
            })
            .collect()
    }
}

///
/// TESTS
///
