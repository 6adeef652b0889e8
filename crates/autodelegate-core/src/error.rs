use crate::{config::ConfigError, types::QualifiedName};
use std::io;
use thiserror::Error as ThisError;

///
/// ResolutionFailure
///
/// Structural problems found while turning one declaration into a model.
/// All are deterministic and recur until the declaration is corrected.
///

#[remain::sorted]
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ResolutionFailure {
    #[error("capability '{requested}' matches more than one declared capability: {candidates:?}")]
    AmbiguousTarget {
        requested: String,
        candidates: Vec<String>,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("conflicting delegation metadata: {reason}")]
    ConflictingForm { reason: String },

    #[error("field name '{field}' is used by more than one delegation target")]
    DuplicateField { field: String },

    #[error(transparent)]
    IntrospectionFailure(#[from] IntrospectionError),

    #[error("malformed delegation metadata: {reason}")]
    MalformedMetadata { reason: String },

    #[error("delegation metadata names no capability")]
    MissingTarget,

    #[error("capability '{capability}' is reached through both '{first}' and '{second}'")]
    OverlappingCapability {
        capability: String,
        first: String,
        second: String,
    },

    #[error("type parameters of '{capability}' cannot be unified: {reason}")]
    TypeParameterMismatch { capability: String, reason: String },

    #[error("operation '{capability}::{operation}' cannot be forwarded: {reason}")]
    Unforwardable {
        capability: String,
        operation: String,
        reason: String,
    },

    #[error("capability '{requested}' is not implemented by the declaration (declared: {declared:?})")]
    UnmatchedTarget {
        requested: String,
        declared: Vec<String>,
    },
}

///
/// IntrospectionError
///
/// Raised by a type-introspection collaborator that cannot resolve a
/// capability's structure.
///

#[remain::sorted]
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum IntrospectionError {
    #[error("capability '{name}' is defined in more than one namespace: {namespaces:?}")]
    AmbiguousCapability {
        name: String,
        namespaces: Vec<String>,
    },

    #[error("capability '{text}' is malformed: {reason}")]
    MalformedCapability { text: String, reason: String },

    #[error("unknown capability '{name}'")]
    UnknownCapability { name: String },

    #[error("capability '{capability}' declares {item}, which cannot be forwarded")]
    UnsupportedItem { capability: String, item: String },
}

///
/// EmissionFailure
///

#[remain::sorted]
#[derive(Debug, ThisError)]
pub enum EmissionFailure {
    #[error("destination '{destination}' is already produced by '{previous}'")]
    DuplicateDestination {
        destination: QualifiedName,
        previous: QualifiedName,
    },

    #[error("namespace '{namespace}' is not a crate module path")]
    InvalidNamespace { namespace: String },

    #[error("failed to write '{destination}': {error}")]
    Write {
        destination: QualifiedName,
        #[source]
        error: io::Error,
    },
}

///
/// Error
///
/// Everything that can fail for one declaration.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Emission(#[from] EmissionFailure),

    #[error(transparent)]
    Resolution(#[from] ResolutionFailure),
}

impl Error {
    #[must_use]
    pub const fn as_resolution(&self) -> Option<&ResolutionFailure> {
        match self {
            Self::Resolution(err) => Some(err),
            Self::Emission(_) => None,
        }
    }
}

///
/// DeclarationFailure
///

#[derive(Debug, ThisError)]
#[error("{declaration}: {error}")]
pub struct DeclarationFailure {
    pub declaration: QualifiedName,
    pub error: Error,
}

impl DeclarationFailure {
    pub fn new(declaration: QualifiedName, error: impl Into<Error>) -> Self {
        Self {
            declaration,
            error: error.into(),
        }
    }
}

///
/// Report
///
/// Outcome of one run: destinations written, plus every per-declaration
/// failure. A failure never stops the remaining declarations.
///

#[derive(Debug, Default, ThisError)]
#[error("auto-delegation failed for {} declaration(s)", .failures.len())]
pub struct Report {
    pub generated: Vec<QualifiedName>,
    pub failures: Vec<DeclarationFailure>,
}

impl Report {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_result(self) -> Result<Vec<QualifiedName>, Self> {
        if self.is_ok() {
            Ok(self.generated)
        } else {
            Err(self)
        }
    }

    /// Fold another run's outcome into this one.
    pub fn absorb(&mut self, other: Self) {
        self.generated.extend(other.generated);
        self.failures.extend(other.failures);
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn introspection_errors_convert_into_resolution_failures() {
        let err: ResolutionFailure = IntrospectionError::UnknownCapability {
            name: "Counter".to_string(),
        }
        .into();

        assert!(matches!(err, ResolutionFailure::IntrospectionFailure(_)));
        assert_eq!(err.to_string(), "unknown capability 'Counter'");
    }

    #[test]
    fn report_result_reflects_failures() {
        let mut report = Report::default();
        report.generated.push(QualifiedName::new("crate", "AutoDelegate_A"));
        assert_eq!(report.into_result().unwrap().len(), 1);

        let mut report = Report::default();
        report.failures.push(DeclarationFailure::new(
            QualifiedName::new("crate", "B"),
            ResolutionFailure::MissingTarget,
        ));

        let err = report.into_result().unwrap_err();
        assert_eq!(err.to_string(), "auto-delegation failed for 1 declaration(s)");
        assert_eq!(
            err.failures[0].to_string(),
            "crate::B: delegation metadata names no capability"
        );
    }
}
