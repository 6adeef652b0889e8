use crate::{
    collect::collect_members,
    error::{DeclarationFailure, Error, Report},
    introspect::DeclarationSource,
    matcher::match_targets,
    model::{DelegationTarget, GeneratedTypeModel},
    prelude::*,
    synth::{SourceEmitter, TypeSpec},
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

///
/// Orchestrator
///
/// Drives match, collect, model and emit once per declaration. Declarations
/// are processed sequentially; a failure is recorded and the run moves on.
///

pub struct Orchestrator<'a, I: ?Sized> {
    introspector: &'a I,
    config: Config,
}

impl<'a, I> Orchestrator<'a, I>
where
    I: TypeIntrospector + ?Sized,
{
    #[must_use]
    pub fn new(introspector: &'a I) -> Self {
        Self {
            introspector,
            config: Config::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve one declaration into its model. Pure apart from introspection.
    pub fn generate(
        &self,
        decl: &AnnotatedDeclaration,
    ) -> Result<GeneratedTypeModel, ResolutionFailure> {
        let targets = match_targets(self.introspector, decl, &self.config)?
            .into_iter()
            .map(|descriptor| {
                let members =
                    collect_members(self.introspector, descriptor.capability(), &self.config)?;

                Ok(DelegationTarget {
                    descriptor,
                    members,
                })
            })
            .collect::<Result<Vec<_>, ResolutionFailure>>()?;

        GeneratedTypeModel::build(decl, targets, &self.config)
    }

    /// Synthesize the model and hand it to the emitter.
    pub fn emit<E>(&self, model: &GeneratedTypeModel, emitter: &mut E) -> Result<(), EmissionFailure>
    where
        E: SourceEmitter + ?Sized,
    {
        let spec = TypeSpec::from_model(model);

        emitter.write(model.namespace(), model.name(), &spec)
    }

    /// Process every declaration from `source`, aggregating all failures.
    pub fn run<S, E>(&self, source: &S, emitter: &mut E) -> Report
    where
        S: DeclarationSource + ?Sized,
        E: SourceEmitter + ?Sized,
    {
        let mut report = Report::default();
        let mut claimed = HashMap::new();

        for decl in source.declarations() {
            let declaration = decl.qualified_name();

            match self.process(&decl, &mut claimed, emitter) {
                Ok(destination) => {
                    debug!(%declaration, %destination, "generated forwarding type");
                    report.generated.push(destination);
                }
                Err(error) => {
                    warn!(%declaration, %error, "auto-delegation failed");
                    report.failures.push(DeclarationFailure { declaration, error });
                }
            }
        }

        info!(
            generated = report.generated.len(),
            failed = report.failures.len(),
            "auto-delegation run complete"
        );

        report
    }

    // destinations must be unique across the run; checked, not assumed
    fn process<E>(
        &self,
        decl: &AnnotatedDeclaration,
        claimed: &mut HashMap<QualifiedName, QualifiedName>,
        emitter: &mut E,
    ) -> Result<QualifiedName, Error>
    where
        E: SourceEmitter + ?Sized,
    {
        let model = self.generate(decl)?;
        let destination = model.destination();

        if let Some(previous) = claimed.get(&destination) {
            return Err(EmissionFailure::DuplicateDestination {
                destination,
                previous: previous.clone(),
            }
            .into());
        }
        claimed.insert(destination.clone(), decl.qualified_name());

        self.emit(&model, emitter)?;

        Ok(destination)
    }
}

///
/// TESTS
///
