use crate::{
    prelude::*,
    subst::{Substitution, param_name, params_as_args},
};
use std::collections::BTreeSet;

/// Resolve a declaration's delegation metadata into ordered descriptors.
///
/// Targets follow the declaration's own capability order, never the
/// metadata order, so field and constructor order stay stable.
pub fn match_targets<I>(
    introspector: &I,
    decl: &AnnotatedDeclaration,
    config: &Config,
) -> Result<Vec<DelegationTargetDescriptor>, ResolutionFailure>
where
    I: TypeIntrospector + ?Sized,
{
    let requested = decl.metadata.requested();
    if requested.is_empty() {
        return Err(ResolutionFailure::MissingTarget);
    }

    let declared = introspector.declared_capabilities(decl);
    let mut selected = vec![false; declared.len()];

    for request in requested {
        let hits: Vec<usize> = declared
            .iter()
            .enumerate()
            .filter(|(_, candidate)| introspector.is_assignable(candidate, request))
            .map(|(i, _)| i)
            .collect();

        match hits.as_slice() {
            [] => {
                return Err(ResolutionFailure::UnmatchedTarget {
                    requested: request.to_string(),
                    declared: declared.iter().map(ToString::to_string).collect(),
                });
            }
            [_, _, ..] if decl.metadata.is_single() => {
                return Err(ResolutionFailure::AmbiguousTarget {
                    requested: request.to_string(),
                    candidates: hits.iter().map(|&i| declared[i].to_string()).collect(),
                });
            }
            _ => hits.iter().for_each(|&i| selected[i] = true),
        }
    }

    let mut targets = Vec::new();
    for (capability, _) in declared.iter().zip(&selected).filter(|(_, hit)| **hit) {
        let capability = normalize(introspector, decl, capability)?;
        let field = match decl.metadata.explicit_field() {
            Some(field) => field.clone(),
            None => config.field_name(targets.len())?,
        };

        targets.push(DelegationTargetDescriptor::new(capability, field));
    }

    Ok(targets)
}

// A capability used without arguments is parameterised by the trait's own
// parameter names, which must then exist on the declaration. The result
// names the trait by its absolute path.
fn normalize<I>(
    introspector: &I,
    decl: &AnnotatedDeclaration,
    capability: &CapabilityType,
) -> Result<CapabilityType, ResolutionFailure>
where
    I: TypeIntrospector + ?Sized,
{
    let params = introspector.type_parameters(capability)?;
    let canonical = introspector.canonical(capability)?;
    let mismatch = |reason: String| ResolutionFailure::TypeParameterMismatch {
        capability: capability.to_string(),
        reason,
    };

    if capability.args.is_empty() && !params.params.is_empty() {
        let available: BTreeSet<String> = decl.generics.params.iter().map(param_name).collect();
        let missing: Vec<String> = params
            .params
            .iter()
            .map(param_name)
            .filter(|name| !available.contains(name))
            .collect();

        if !missing.is_empty() {
            return Err(mismatch(format!(
                "implicit parameter(s) {missing:?} are not declared on '{}'",
                decl.name
            )));
        }

        return Ok(canonical.with_args(params_as_args(&params)));
    }

    Substitution::bind(&params, &capability.args).map_err(mismatch)?;

    Ok(canonical)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use syn::parse_quote;

    fn cap(s: &str) -> CapabilityType {
        CapabilityType::parse(s).unwrap()
    }

    fn registry() -> Registry {
        let mut reg = Registry::new();
        reg.add_trait(&parse_quote!(trait Named { fn name(&self) -> String; }), "crate");
        reg.add_trait(&parse_quote!(trait Counter { fn total(&self) -> u32; }), "crate");
        reg.add_trait(&parse_quote!(trait Store<V> { fn len(&self) -> usize; }), "crate");

        reg
    }

    fn decl(metadata: DelegationMetadata, declared: &[&str]) -> AnnotatedDeclaration {
        declared.iter().fold(
            AnnotatedDeclaration::new(format_ident!("Widget"), metadata),
            |decl, c| decl.with_capability(cap(c)),
        )
    }

    fn fields(targets: &[DelegationTargetDescriptor]) -> Vec<String> {
        targets.iter().map(|t| t.field().to_string()).collect()
    }

    #[test]
    fn single_target_uses_explicit_field() {
        let metadata = DelegationMetadata::Single {
            capability: cap("Counter"),
            field: Some(format_ident!("inner")),
        };
        let targets =
            match_targets(&registry(), &decl(metadata, &["Named", "Counter"]), &Config::default())
                .unwrap();

        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].field(), "inner");
        assert_eq!(targets[0].capability(), &cap("crate::Counter"));
    }

    #[test]
    fn single_target_defaults_field_name() {
        let metadata = DelegationMetadata::single(cap("Counter"));
        let targets =
            match_targets(&registry(), &decl(metadata, &["Counter"]), &Config::default()).unwrap();

        assert_eq!(fields(&targets), vec!["target0"]);
    }

    #[test]
    fn multi_target_follows_declared_order() {
        let metadata = DelegationMetadata::multi(vec![cap("Named"), cap("Counter")]);
        let targets =
            match_targets(&registry(), &decl(metadata, &["Counter", "Named"]), &Config::default())
                .unwrap();

        assert_eq!(fields(&targets), vec!["target0", "target1"]);
        assert_eq!(targets[0].capability(), &cap("crate::Counter"));
        assert_eq!(targets[1].capability(), &cap("crate::Named"));
    }

    #[test]
    fn field_base_comes_from_config() {
        let metadata = DelegationMetadata::multi(vec![cap("Named"), cap("Counter")]);
        let config = Config::default().with_field_base("slot");
        let targets =
            match_targets(&registry(), &decl(metadata, &["Named", "Counter"]), &config).unwrap();

        assert_eq!(fields(&targets), vec!["slot0", "slot1"]);
    }

    #[test]
    fn empty_field_base_fails_resolution() {
        let metadata = DelegationMetadata::multi(vec![cap("Named"), cap("Counter")]);
        let config = Config::default().with_field_base("");
        let err = match_targets(&registry(), &decl(metadata, &["Named", "Counter"]), &config)
            .unwrap_err();

        assert!(matches!(err, ResolutionFailure::Config(_)), "{err:?}");
    }

    #[test]
    fn targets_name_traits_by_defining_module() {
        let mut reg = Registry::new();
        reg.add_trait(&parse_quote!(trait Counter { fn total(&self) -> u32; }), "crate::counting");
        let metadata = DelegationMetadata::single(cap("Counter"));
        let decl = decl(metadata, &["super::counting::Counter"]);

        let targets = match_targets(&reg, &decl, &Config::default()).unwrap();
        assert_eq!(targets[0].capability(), &cap("crate::counting::Counter"));
    }

    #[test]
    fn undeclared_capability_is_unmatched() {
        let metadata = DelegationMetadata::single(cap("Counter"));
        let err =
            match_targets(&registry(), &decl(metadata, &["Named"]), &Config::default()).unwrap_err();

        assert_eq!(
            err,
            ResolutionFailure::UnmatchedTarget {
                requested: "Counter".to_string(),
                declared: vec!["Named".to_string()],
            }
        );
    }

    #[test]
    fn single_target_guards_against_ambiguity() {
        let metadata = DelegationMetadata::single(cap("Store"));
        let err = match_targets(
            &registry(),
            &decl(metadata, &["Store<u8>", "Store<u16>"]),
            &Config::default(),
        )
        .unwrap_err();

        assert!(matches!(err, ResolutionFailure::AmbiguousTarget { .. }), "{err}");
    }

    #[test]
    fn argument_count_must_match_trait() {
        let metadata = DelegationMetadata::single(cap("Store"));
        let err = match_targets(
            &registry(),
            &decl(metadata, &["Store<u8, u16>"]),
            &Config::default(),
        )
        .unwrap_err();

        assert!(matches!(err, ResolutionFailure::TypeParameterMismatch { .. }), "{err}");
    }

    #[test]
    fn implicit_parameters_must_exist_on_declaration() {
        let metadata = DelegationMetadata::single(cap("Store"));
        let bare = decl(metadata, &["Store"]);

        let err = match_targets(&registry(), &bare, &Config::default()).unwrap_err();
        assert!(matches!(err, ResolutionFailure::TypeParameterMismatch { .. }), "{err}");

        let generic = bare.with_generics(parse_quote!(<V>));
        let targets = match_targets(&registry(), &generic, &Config::default()).unwrap();
        assert_eq!(targets[0].capability(), &cap("crate::Store<V>"));
    }

    #[test]
    fn empty_request_is_missing_target() {
        let metadata = DelegationMetadata::multi(Vec::new());
        let err =
            match_targets(&registry(), &decl(metadata, &["Named"]), &Config::default()).unwrap_err();

        assert_eq!(err, ResolutionFailure::MissingTarget);
    }
}
