use crate::{ROOT_NAMESPACE, error::ResolutionFailure, prelude::*};
use darling::{Error as DarlingError, FromMeta, ast::NestedMeta};
use derive_more::{Deref, IntoIterator};
use syn::{Attribute, Expr, Meta, Visibility};

/// Name of the attribute carrying delegation metadata.
pub const ATTRIBUTE: &str = "auto_delegate";

///
/// AnnotatedDeclaration
///
/// A struct carrying delegation metadata, as read from the host source.
/// `capabilities` lists the traits it implements, in source order.
///

#[derive(Clone, Debug)]
pub struct AnnotatedDeclaration {
    pub name: Ident,
    pub namespace: String,
    pub vis: Visibility,
    pub generics: Generics,
    pub capabilities: Vec<CapabilityType>,
    pub metadata: DelegationMetadata,
}

impl AnnotatedDeclaration {
    #[must_use]
    pub fn new(name: Ident, metadata: DelegationMetadata) -> Self {
        Self {
            name,
            namespace: ROOT_NAMESPACE.to_string(),
            vis: Visibility::Inherited,
            generics: Generics::default(),
            capabilities: Vec::new(),
            metadata,
        }
    }

    #[must_use]
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[must_use]
    pub fn with_generics(mut self, generics: Generics) -> Self {
        self.generics = generics;
        self
    }

    #[must_use]
    pub fn with_visibility(mut self, vis: Visibility) -> Self {
        self.vis = vis;
        self
    }

    #[must_use]
    pub fn with_capability(mut self, capability: CapabilityType) -> Self {
        self.capabilities.push(capability);
        self
    }

    #[must_use]
    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::new(&self.namespace, self.name.to_string())
    }
}

///
/// DelegationMetadata
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DelegationMetadata {
    /// One capability, with an optional explicit field name.
    Single {
        capability: CapabilityType,
        field: Option<Ident>,
    },

    /// Several capabilities; field names are generated.
    Multi { capabilities: Vec<CapabilityType> },
}

impl DelegationMetadata {
    #[must_use]
    pub const fn single(capability: CapabilityType) -> Self {
        Self::Single {
            capability,
            field: None,
        }
    }

    #[must_use]
    pub const fn multi(capabilities: Vec<CapabilityType>) -> Self {
        Self::Multi { capabilities }
    }

    /// The requested capabilities, in metadata order.
    #[must_use]
    pub fn requested(&self) -> &[CapabilityType] {
        match self {
            Self::Single { capability, .. } => std::slice::from_ref(capability),
            Self::Multi { capabilities } => capabilities,
        }
    }

    #[must_use]
    pub const fn explicit_field(&self) -> Option<&Ident> {
        match self {
            Self::Single { field, .. } => field.as_ref(),
            Self::Multi { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_single(&self) -> bool {
        matches!(self, Self::Single { .. })
    }
}

///
/// DelegateArgs
///
/// Raw `#[auto_delegate(...)]` arguments. Both forms are optional here so
/// that conflicts can be reported rather than rejected by the parser.
///

#[derive(Clone, Debug, Default, FromMeta)]
pub struct DelegateArgs {
    pub value: Option<CapabilityMeta>,
    pub field: Option<Ident>,
    pub to: Option<CapabilityList>,
}

impl DelegateArgs {
    /// Parse a full attribute; a bare `#[auto_delegate]` yields empty args.
    pub fn parse_attribute(attr: &Attribute) -> Result<Self, DarlingError> {
        match &attr.meta {
            Meta::Path(_) => Ok(Self::default()),
            meta => Self::from_meta(meta),
        }
    }

    /// Parse and interpret an attribute in one step.
    pub fn metadata(attr: &Attribute) -> Result<DelegationMetadata, ResolutionFailure> {
        Self::parse_attribute(attr)
            .map_err(|err| ResolutionFailure::MalformedMetadata {
                reason: err.to_string(),
            })?
            .into_metadata()
    }

    pub fn into_metadata(self) -> Result<DelegationMetadata, ResolutionFailure> {
        match (self.value, self.to) {
            (Some(_), Some(_)) => Err(ResolutionFailure::ConflictingForm {
                reason: "`value` and `to` cannot be combined".to_string(),
            }),
            (None, Some(_)) if self.field.is_some() => Err(ResolutionFailure::ConflictingForm {
                reason: "`field` only applies to the single-target `value` form".to_string(),
            }),
            (Some(value), None) => Ok(DelegationMetadata::Single {
                capability: value.0,
                field: self.field,
            }),
            (None, Some(list)) if list.is_empty() => Err(ResolutionFailure::MissingTarget),
            (None, Some(list)) => Ok(DelegationMetadata::Multi {
                capabilities: list.0,
            }),
            (None, None) => Err(ResolutionFailure::MissingTarget),
        }
    }
}

/// Find the delegation attribute among an item's attributes.
#[must_use]
pub fn find_attribute(attrs: &[Attribute]) -> Option<&Attribute> {
    attrs.iter().find(|attr| {
        attr.path()
            .segments
            .last()
            .is_some_and(|segment| segment.ident == ATTRIBUTE)
    })
}

///
/// CapabilityMeta
/// Accepts `Counter`, `path::Counter` or `"Store<V>"`.
///

#[derive(Clone, Debug, Deref)]
pub struct CapabilityMeta(pub CapabilityType);

impl FromMeta for CapabilityMeta {
    fn from_string(value: &str) -> Result<Self, DarlingError> {
        CapabilityType::parse(value)
            .map(Self)
            .map_err(|err| DarlingError::custom(format!("invalid capability '{value}': {err}")))
    }

    fn from_expr(expr: &Expr) -> Result<Self, DarlingError> {
        match expr {
            Expr::Path(path) if path.qself.is_none() => {
                Ok(Self(CapabilityType::from_path(&path.path)))
            }
            Expr::Lit(lit) => Self::from_value(&lit.lit).map_err(|err| err.with_span(expr)),
            Expr::Group(group) => Self::from_expr(&group.expr),
            _ => Err(DarlingError::unexpected_expr_type(expr).with_span(expr)),
        }
    }
}

///
/// CapabilityList
///

#[derive(Clone, Debug, Default, Deref, IntoIterator)]
pub struct CapabilityList(pub Vec<CapabilityType>);

impl FromMeta for CapabilityList {
    fn from_list(items: &[NestedMeta]) -> Result<Self, DarlingError> {
        let mut capabilities = Vec::with_capacity(items.len());

        for item in items {
            let capability = match item {
                NestedMeta::Meta(Meta::Path(path)) => CapabilityType::from_path(path),
                NestedMeta::Lit(lit) => {
                    CapabilityMeta::from_value(lit).map_err(|err| err.with_span(item))?.0
                }
                NestedMeta::Meta(_) => {
                    return Err(DarlingError::custom(
                        "expected a capability path or string literal",
                    )
                    .with_span(item));
                }
            };
            capabilities.push(capability);
        }

        Ok(Self(capabilities))
    }
}

///
/// TESTS
///
