use crate::{
    collect::MemberSet,
    prelude::*,
    subst::{bound_idents, param_name, predicate_idents, used_idents},
};
use std::collections::{BTreeSet, HashMap, HashSet};
use syn::{GenericParam, Visibility, WhereClause, punctuated::Punctuated};

///
/// DelegationTarget
///

#[derive(Clone, Debug)]
pub struct DelegationTarget {
    pub descriptor: DelegationTargetDescriptor,
    pub members: MemberSet,
}

///
/// GeneratedTypeModel
///
/// Complete description of one forwarding type. Built once per declaration
/// and never changed afterwards; the synthesizer only reads it.
///

#[derive(Clone, Debug)]
pub struct GeneratedTypeModel {
    namespace: String,
    name: Ident,
    declaration: Ident,
    declaration_generics: Generics,
    vis: Visibility,
    generics: Generics,
    targets: Vec<DelegationTarget>,
}

impl GeneratedTypeModel {
    pub fn build(
        decl: &AnnotatedDeclaration,
        targets: Vec<DelegationTarget>,
        config: &Config,
    ) -> Result<Self, ResolutionFailure> {
        check_fields(&targets)?;
        check_overlap(&targets)?;

        Ok(Self {
            namespace: decl.namespace.clone(),
            name: config.type_name(&decl.name)?,
            declaration: decl.name.clone(),
            declaration_generics: decl.generics.clone(),
            vis: decl.vis.clone(),
            generics: generated_generics(&decl.generics, &targets),
            targets,
        })
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub const fn name(&self) -> &Ident {
        &self.name
    }

    /// Name of the declaration this type was generated for.
    #[must_use]
    pub const fn declaration(&self) -> &Ident {
        &self.declaration
    }

    /// The declaration's own generics, bounds included.
    #[must_use]
    pub const fn declaration_generics(&self) -> &Generics {
        &self.declaration_generics
    }

    #[must_use]
    pub const fn vis(&self) -> &Visibility {
        &self.vis
    }

    #[must_use]
    pub const fn generics(&self) -> &Generics {
        &self.generics
    }

    #[must_use]
    pub fn targets(&self) -> &[DelegationTarget] {
        &self.targets
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &DelegationTargetDescriptor> {
        self.targets.iter().map(|target| &target.descriptor)
    }

    /// Operations forwarded through `descriptor`, if it belongs to this model.
    #[must_use]
    pub fn operations(&self, descriptor: &DelegationTargetDescriptor) -> Option<&MemberSet> {
        self.targets
            .iter()
            .find(|target| &target.descriptor == descriptor)
            .map(|target| &target.members)
    }

    #[must_use]
    pub fn destination(&self) -> QualifiedName {
        QualifiedName::new(&self.namespace, self.name.to_string())
    }
}

fn check_fields(targets: &[DelegationTarget]) -> Result<(), ResolutionFailure> {
    let mut seen = HashSet::new();

    for target in targets {
        let field = target.descriptor.field().to_string();
        if !seen.insert(field.clone()) {
            return Err(ResolutionFailure::DuplicateField { field });
        }
    }

    Ok(())
}

// A type can implement each trait instantiation once, so closures of
// different targets must be disjoint.
fn check_overlap(targets: &[DelegationTarget]) -> Result<(), ResolutionFailure> {
    let mut owners: HashMap<String, &Ident> = HashMap::new();

    for target in targets {
        let field = target.descriptor.field();
        for capability in target.members.capabilities() {
            if let Some(first) = owners.insert(capability.key(), field)
                && first != field
            {
                return Err(ResolutionFailure::OverlappingCapability {
                    capability: capability.to_string(),
                    first: first.to_string(),
                    second: field.to_string(),
                });
            }
        }
    }

    Ok(())
}

// The declaration's parameters that occur in any delegated capability, in
// declaration order. Bounds and predicates survive only when every
// declaration parameter they mention is kept.
fn generated_generics(declared: &Generics, targets: &[DelegationTarget]) -> Generics {
    let names: BTreeSet<String> = declared.params.iter().map(param_name).collect();
    let used = used_idents(
        targets
            .iter()
            .flat_map(|target| target.descriptor.capability().args.iter()),
    );
    let kept: BTreeSet<String> = names.intersection(&used).cloned().collect();
    let admissible = |idents: &BTreeSet<String>| {
        idents
            .iter()
            .filter(|ident| names.contains(*ident))
            .all(|ident| kept.contains(ident))
    };

    let mut params = Punctuated::new();
    for param in &declared.params {
        if !kept.contains(&param_name(param)) {
            continue;
        }

        let mut param = param.clone();
        match &mut param {
            GenericParam::Type(ty) => {
                ty.attrs.clear();
                ty.bounds = ty
                    .bounds
                    .iter()
                    .filter(|bound| admissible(&bound_idents(bound)))
                    .cloned()
                    .collect();
                if ty.bounds.is_empty() {
                    ty.colon_token = None;
                }
            }
            GenericParam::Lifetime(lt) => {
                lt.attrs.clear();
                lt.bounds = lt
                    .bounds
                    .iter()
                    .filter(|bound| kept.contains(&bound.ident.to_string()))
                    .cloned()
                    .collect();
                if lt.bounds.is_empty() {
                    lt.colon_token = None;
                }
            }
            GenericParam::Const(c) => c.attrs.clear(),
        }
        params.push(param);
    }

    let where_clause = declared
        .where_clause
        .as_ref()
        .map(|clause| WhereClause {
            where_token: clause.where_token,
            predicates: clause
                .predicates
                .iter()
                .filter(|predicate| {
                    let idents = predicate_idents(predicate);
                    idents.iter().any(|ident| kept.contains(ident)) && admissible(&idents)
                })
                .cloned()
                .collect(),
        })
        .filter(|clause| !clause.predicates.is_empty());

    let has_params = !params.is_empty();

    Generics {
        lt_token: has_params.then(Default::default),
        params,
        gt_token: has_params.then(Default::default),
        where_clause,
    }
}

///
/// TESTS
///
