use crate::{
    prelude::*,
    subst::{Substitution, mentions_self},
};
use std::collections::HashSet;

///
/// CapabilityMembers
///
/// Operations one trait of the closure requires, already instantiated.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CapabilityMembers {
    pub capability: CapabilityType,
    pub operations: Vec<Operation>,
}

///
/// MemberSet
///
/// Every operation a delegated capability requires, grouped by the trait
/// that declares it. The delegated trait comes first, followed by its
/// supertraits in breadth-first order. Groups without operations are kept:
/// Rust still needs an impl for each supertrait.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MemberSet {
    pub groups: Vec<CapabilityMembers>,
}

impl MemberSet {
    pub fn capabilities(&self) -> impl Iterator<Item = &CapabilityType> {
        self.groups.iter().map(|group| &group.capability)
    }

    pub fn operations(&self) -> impl Iterator<Item = (&CapabilityType, &Operation)> {
        self.groups.iter().flat_map(|group| {
            group
                .operations
                .iter()
                .map(move |op| (&group.capability, op))
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.iter().map(|group| group.operations.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Collect the operations `capability` requires across its supertrait
/// closure, with trait parameters replaced by the arguments in use.
pub fn collect_members<I>(
    introspector: &I,
    capability: &CapabilityType,
    config: &Config,
) -> Result<MemberSet, ResolutionFailure>
where
    I: TypeIntrospector + ?Sized,
{
    let mut closure = vec![capability.clone()];
    for supertrait in introspector.supertype_closure(capability)? {
        if closure.iter().all(|known| known.key() != supertrait.key()) {
            closure.push(supertrait);
        }
    }

    let mut seen = HashSet::new();
    let mut groups = Vec::with_capacity(closure.len());

    for current in closure {
        let params = introspector.type_parameters(&current)?;
        let subst = Substitution::bind(&params, &current.args).map_err(|reason| {
            ResolutionFailure::TypeParameterMismatch {
                capability: current.to_string(),
                reason,
            }
        })?;

        let mut operations = Vec::new();
        for op in introspector.required_operations(&current)? {
            if op.has_default && !config.forward_defaults {
                continue;
            }

            if let Some(reason) = unforwardable_reason(&op) {
                // a default body stays with the trait
                if op.has_default {
                    continue;
                }

                return Err(ResolutionFailure::Unforwardable {
                    capability: current.to_string(),
                    operation: op.name.to_string(),
                    reason: reason.to_string(),
                });
            }

            let op = op.substitute(&subst);
            if seen.insert((current.clone(), op.signature_key())) {
                operations.push(op);
            }
        }

        groups.push(CapabilityMembers {
            capability: current,
            operations,
        });
    }

    Ok(MemberSet { groups })
}

// Only operations callable through `dyn Capability` can be forwarded.
fn unforwardable_reason(op: &Operation) -> Option<&'static str> {
    match op.receiver {
        Receiver::None => return Some("associated function without a `self` receiver"),
        Receiver::Value => return Some("takes `self` by value"),
        Receiver::Ref(_) | Receiver::RefMut(_) => {}
    }

    if op.generics.type_params().next().is_some() || op.generics.const_params().next().is_some()
    {
        return Some("generic over types or constants");
    }

    if mentions_self(op) {
        return Some("signature mentions `Self`");
    }

    None
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

    fn names(set: &MemberSet) -> Vec<String> {
        set.operations()
            .map(|(cap, op)| format!("{}::{}", cap.name(), op.name))
            .collect()
    }

    #[test]
    fn diamond_contributes_one_method() {
        let mut reg = Registry::new();
        reg.add_trait(&parse_quote!(trait Id { fn id(&self) -> u64; }), "crate");
        reg.add_trait(&parse_quote!(trait Left: Id { fn left(&self); }), "crate");
        reg.add_trait(&parse_quote!(trait Right: Id { fn right(&self); }), "crate");
        reg.add_trait(&parse_quote!(trait Both: Left + Right {}), "crate");

        let set = collect_members(&reg, &cap("Both"), &Config::default()).unwrap();

        assert_eq!(names(&set), vec!["Left::left", "Right::right", "Id::id"]);
        assert_eq!(set.capabilities().count(), 4, "empty Both group is kept");
    }

    #[test]
    fn substitutes_capability_arguments() {
        let mut reg = Registry::new();
        reg.add_trait(
            &parse_quote!(trait Store<E> { fn get(&self, index: usize) -> Option<&E>; }),
            "crate",
        );

        let set = collect_members(&reg, &cap("Store<String>"), &Config::default()).unwrap();
        let (_, get) = set.operations().next().unwrap();

        assert_eq!(
            get.output.to_token_stream().to_string(),
            quote!(Option<&String>).to_string()
        );
    }

    #[test]
    fn substitution_flows_into_supertraits() {
        let mut reg = Registry::new();
        reg.add_trait(&parse_quote!(trait Feed<T> { fn feed(&mut self, batch: T); }), "crate");
        reg.add_trait(&parse_quote!(trait Sink<E>: Feed<Vec<E>> {}), "crate");

        let set = collect_members(&reg, &cap("Sink<u8>"), &Config::default()).unwrap();
        let (owner, feed) = set.operations().next().unwrap();

        assert_eq!(owner, &cap("crate::Feed<Vec<u8>>"));
        assert_eq!(
            feed.params[0].ty.to_token_stream().to_string(),
            quote!(Vec<u8>).to_string()
        );
    }

    #[test]
    fn default_operations_follow_config() {
        let mut reg = Registry::new();
        reg.add_trait(
            &parse_quote!(trait Counter {
                fn total(&self) -> u32;
                fn describe(&self) -> String { String::new() }
            }),
            "crate",
        );

        let all = collect_members(&reg, &cap("Counter"), &Config::default()).unwrap();
        let required = collect_members(
            &reg,
            &cap("Counter"),
            &Config::default().forward_defaults(false),
        )
        .unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(names(&required), vec!["Counter::total"]);
    }

    #[test]
    fn rejects_operations_that_cannot_be_forwarded() {
        let mut reg = Registry::new();
        reg.add_trait(&parse_quote!(trait Build { fn build() -> u8; }), "crate");
        reg.add_trait(&parse_quote!(trait Merge { fn merge(&mut self, other: Self); }), "crate");
        reg.add_trait(&parse_quote!(trait Visit { fn visit<T>(&self, item: T); }), "crate");

        for name in ["Build", "Merge", "Visit"] {
            let err = collect_members(&reg, &cap(name), &Config::default()).unwrap_err();
            assert!(matches!(err, ResolutionFailure::Unforwardable { .. }), "{name}: {err}");
        }
    }

    #[test]
    fn unforwardable_defaults_are_inherited() {
        let mut reg = Registry::new();
        reg.add_trait(
            &parse_quote!(trait Shape {
                fn area(&self) -> f64;
                fn boxed(self) -> Box<Self> where Self: Sized { Box::new(self) }
            }),
            "crate",
        );

        let set = collect_members(&reg, &cap("Shape"), &Config::default()).unwrap();

        assert_eq!(names(&set), vec!["Shape::area"]);
    }

    #[test]
    fn unknown_capability_is_an_introspection_failure() {
        let err = collect_members(&Registry::new(), &cap("Nope"), &Config::default()).unwrap_err();

        assert!(matches!(err, ResolutionFailure::IntrospectionFailure(_)));
    }
}
