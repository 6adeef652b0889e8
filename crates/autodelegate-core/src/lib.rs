//! Resolution-and-synthesis pipeline for auto-delegated forwarding types.
//!
//! A declaration marked with delegation metadata names one or more of the
//! traits it implements. The pipeline matches those against the declaration's
//! trait list, collects every operation each trait requires across its
//! supertrait closure, models a forwarding struct, and renders it for a
//! source emitter.

pub mod collect;
pub mod config;
pub mod declaration;
pub mod descriptor;
pub mod error;
pub mod introspect;
pub mod matcher;
pub mod model;
pub mod orchestrate;
pub mod registry;
pub mod subst;
pub mod synth;
pub mod types;

/// Prefix joined with the declaration name to form the generated type name.
pub const DEFAULT_PREFIX: &str = "AutoDelegate";

/// Base name for generated field names (`target0`, `target1`, ...).
pub const DEFAULT_FIELD_BASE: &str = "target";

/// Namespace assigned to items declared at the crate root.
pub const ROOT_NAMESPACE: &str = "crate";

pub use crate::{
    config::{Config, ConfigError},
    declaration::{AnnotatedDeclaration, DelegateArgs, DelegationMetadata},
    descriptor::DelegationTargetDescriptor,
    error::{
        DeclarationFailure, EmissionFailure, Error, IntrospectionError, Report, ResolutionFailure,
    },
    introspect::{DeclarationSource, TypeIntrospector},
    model::GeneratedTypeModel,
    orchestrate::Orchestrator,
    registry::{CapabilityDef, Registry},
    synth::{MemoryEmitter, SourceEmitter, TypeSpec},
    types::{CapabilityType, Operation, Param, QualifiedName, Receiver},
};

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        config::Config,
        declaration::{AnnotatedDeclaration, DelegationMetadata},
        descriptor::DelegationTargetDescriptor,
        error::{EmissionFailure, IntrospectionError, ResolutionFailure},
        introspect::TypeIntrospector,
        types::{CapabilityType, Operation, Param, QualifiedName, Receiver},
    };
    pub use proc_macro2::TokenStream;
    pub use quote::{ToTokens, format_ident, quote};
    pub use syn::{GenericArgument, Generics, Ident, Path, Type};
}
