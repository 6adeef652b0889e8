use crate::prelude::*;

///
/// TypeIntrospector
///
/// Read-only view of the host's trait model. Implementations must answer
/// every query from immutable data; the pipeline may ask the same question
/// more than once per declaration.
///

pub trait TypeIntrospector {
    /// Traits the declaration implements directly, in source order.
    fn declared_capabilities(&self, decl: &AnnotatedDeclaration) -> Vec<CapabilityType> {
        decl.capabilities.clone()
    }

    /// The capability with the trait path generated code should use.
    /// Defaults to the path as written at the point of use.
    fn canonical(&self, capability: &CapabilityType) -> Result<CapabilityType, IntrospectionError> {
        Ok(capability.clone())
    }

    /// The trait's own generic parameter list.
    fn type_parameters(&self, capability: &CapabilityType) -> Result<Generics, IntrospectionError>;

    /// Every supertrait reachable from `capability`, instantiated with the
    /// arguments it carries, excluding `capability` itself.
    fn supertype_closure(
        &self,
        capability: &CapabilityType,
    ) -> Result<Vec<CapabilityType>, IntrospectionError>;

    /// Operations declared directly on the trait, in terms of its own
    /// generic parameters.
    fn required_operations(
        &self,
        capability: &CapabilityType,
    ) -> Result<Vec<Operation>, IntrospectionError>;

    /// Can a value of `source` stand in where `target` is requested?
    fn is_assignable(&self, source: &CapabilityType, target: &CapabilityType) -> bool {
        target.matches(source)
    }
}

///
/// DeclarationSource
///
/// Supplies the declarations carrying delegation metadata for one pass.
///

pub trait DeclarationSource {
    fn declarations(&self) -> Vec<AnnotatedDeclaration>;
}

impl DeclarationSource for [AnnotatedDeclaration] {
    fn declarations(&self) -> Vec<AnnotatedDeclaration> {
        self.to_vec()
    }
}

impl DeclarationSource for Vec<AnnotatedDeclaration> {
    fn declarations(&self) -> Vec<AnnotatedDeclaration> {
        self.clone()
    }
}
