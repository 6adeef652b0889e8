use crate::prelude::*;
use std::fmt::{self, Display};

///
/// DelegationTargetDescriptor
///
/// Immutable (capability, field) pair driving one delegation target.
/// Equality and hashing are structural over both parts.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct DelegationTargetDescriptor {
    capability: CapabilityType,
    field: Ident,
}

impl DelegationTargetDescriptor {
    #[must_use]
    pub const fn new(capability: CapabilityType, field: Ident) -> Self {
        Self { capability, field }
    }

    #[must_use]
    pub const fn capability(&self) -> &CapabilityType {
        &self.capability
    }

    #[must_use]
    pub const fn field(&self) -> &Ident {
        &self.field
    }
}

impl Display for DelegationTargetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.capability)
    }
}

///
/// TESTS
///
