use super::TypeSpec;
use crate::prelude::*;
use std::collections::BTreeMap;

/// First line of every rendered namespace.
pub const GENERATED_HEADER: &str = "// @generated by autodelegate. Do not edit.";

///
/// SourceEmitter
///
/// Receives one structured type per declaration. Implementations decide how
/// namespaces map onto files or buffers.
///

pub trait SourceEmitter {
    fn write(
        &mut self,
        namespace: &str,
        name: &Ident,
        spec: &TypeSpec,
    ) -> Result<(), EmissionFailure>;
}

impl<E: SourceEmitter + ?Sized> SourceEmitter for &mut E {
    fn write(
        &mut self,
        namespace: &str,
        name: &Ident,
        spec: &TypeSpec,
    ) -> Result<(), EmissionFailure> {
        (**self).write(namespace, name, spec)
    }
}

/// Render every type of one namespace, in the order given.
#[must_use]
pub fn render_namespace<'a>(specs: impl IntoIterator<Item = &'a TypeSpec>) -> String {
    let mut source = String::from(GENERATED_HEADER);
    source.push('\n');

    for spec in specs {
        source.push('\n');
        source.push_str(&spec.to_token_stream().to_string());
        source.push('\n');
    }

    source
}

///
/// MemoryEmitter
///
/// Keeps emitted types in memory, keyed by namespace and then by name so
/// rendering order does not depend on emission order.
///

#[derive(Debug, Default)]
pub struct MemoryEmitter {
    namespaces: BTreeMap<String, BTreeMap<String, TypeSpec>>,
}

impl MemoryEmitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, namespace: &str, name: &str) -> Option<&TypeSpec> {
        self.namespaces.get(namespace)?.get(name)
    }

    #[must_use]
    pub fn source(&self, namespace: &str) -> Option<String> {
        self.namespaces
            .get(namespace)
            .map(|types| render_namespace(types.values()))
    }

    /// Rendered source of every namespace written so far.
    #[must_use]
    pub fn sources(&self) -> BTreeMap<String, String> {
        self.namespaces
            .iter()
            .map(|(namespace, types)| (namespace.clone(), render_namespace(types.values())))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.namespaces.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SourceEmitter for MemoryEmitter {
    fn write(
        &mut self,
        namespace: &str,
        name: &Ident,
        spec: &TypeSpec,
    ) -> Result<(), EmissionFailure> {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(name.to_string(), spec.clone());

        Ok(())
    }
}
