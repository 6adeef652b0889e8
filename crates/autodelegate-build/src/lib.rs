//! Build-script host for auto-delegation.
//!
//! Scans a crate's sources with `syn`, runs the core pipeline, and writes one
//! file per module namespace under `$OUT_DIR/autodelegate/`.

pub mod emit;
pub mod macros;
pub mod scan;

pub use autodelegate_core::{Config, ConfigError, Report, config::CONFIG_ENV_KEYS};
pub use emit::FileEmitter;
pub use scan::{Scan, SourceScanner};

use autodelegate_core::{MemoryEmitter, Orchestrator};
use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;

/// Directory under `OUT_DIR` that receives generated namespaces.
pub const OUTPUT_DIR: &str = "autodelegate";

///
/// BuildError
///

#[remain::sorted]
#[derive(Debug, ThisError)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Generation(#[from] Report),

    #[error("failed to read '{}': {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to parse '{}': {source}", .path.display())]
    Parse { path: PathBuf, source: syn::Error },
}

///
/// BuildOutput
///

#[derive(Debug)]
pub struct BuildOutput {
    pub report: Report,

    /// Every source file the scan read, for `rerun-if-changed`.
    pub files: Vec<PathBuf>,
}

/// Generate with the default configuration and return each namespace's
/// rendered source, keyed by namespace.
pub fn generate(source_path: impl AsRef<Path>) -> Result<BTreeMap<String, String>, BuildError> {
    generate_with(source_path, &Config::default())
}

pub fn generate_with(
    source_path: impl AsRef<Path>,
    config: &Config,
) -> Result<BTreeMap<String, String>, BuildError> {
    config.validate()?;

    let scan = SourceScanner::scan(source_path.as_ref())?;
    let mut emitter = MemoryEmitter::new();
    run(scan, config, &mut emitter).into_result()?;

    Ok(emitter.sources())
}

/// Generate into `<out_dir>/autodelegate/`, replacing any previous output.
/// Per-declaration failures are returned in the report, not as an error.
pub fn generate_to(
    source_path: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    config: &Config,
) -> Result<BuildOutput, BuildError> {
    config.validate()?;

    let scan = SourceScanner::scan(source_path.as_ref())?;
    let files = scan.files.clone();

    let mut emitter = FileEmitter::new(out_dir);
    emitter.reset()?;
    let report = run(scan, config, &mut emitter);

    Ok(BuildOutput { report, files })
}

fn run(scan: Scan, config: &Config, emitter: &mut impl autodelegate_core::SourceEmitter) -> Report {
    let Scan {
        registry, rejected, ..
    } = scan;

    let mut report = Report {
        generated: Vec::new(),
        failures: rejected,
    };
    report.absorb(
        Orchestrator::new(&registry)
            .with_config(config.clone())
            .run(&registry, emitter),
    );

    report
}

///
/// TESTS
///
