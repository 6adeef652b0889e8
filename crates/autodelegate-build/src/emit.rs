use crate::{BuildError, OUTPUT_DIR};
use autodelegate_core::{
    EmissionFailure, QualifiedName, ROOT_NAMESPACE, SourceEmitter, TypeSpec,
    synth::{InheritSpec, render_namespace},
};
use proc_macro2::Ident;
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};
use tracing::debug;

/// File holding the crate-root namespace. `crate` is a keyword, so no
/// module path can map onto the same file.
pub const ROOT_FILE: &str = "crate.rs";

///
/// FileEmitter
///
/// Writes one file per namespace: `crate` goes to `crate.rs` and
/// `crate::a::b` to `a/b.rs`. Each write rewrites the namespace file with
/// every type emitted into it so far, sorted by name.
///

#[derive(Debug)]
pub struct FileEmitter {
    root: PathBuf,
    namespaces: BTreeMap<String, BTreeMap<String, TypeSpec>>,
}

impl FileEmitter {
    pub fn new(out_dir: impl AsRef<Path>) -> Self {
        Self {
            root: out_dir.as_ref().join(OUTPUT_DIR),
            namespaces: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Remove output from earlier runs so deleted declarations leave nothing behind.
    pub fn reset(&mut self) -> Result<(), BuildError> {
        self.namespaces.clear();

        match fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(BuildError::Io {
                path: self.root.clone(),
                source,
            }),
        }
    }

    /// File that receives `namespace`.
    pub fn path_for(&self, namespace: &str) -> Result<PathBuf, EmissionFailure> {
        let invalid = || EmissionFailure::InvalidNamespace {
            namespace: namespace.to_string(),
        };

        let mut segments = namespace.split("::");
        if segments.next() != Some(ROOT_NAMESPACE) {
            return Err(invalid());
        }

        let rest: Vec<&str> = segments.collect();
        if rest.is_empty() {
            return Ok(self.root.join(ROOT_FILE));
        }
        if rest
            .iter()
            .any(|segment| segment.is_empty() || *segment == ROOT_NAMESPACE)
        {
            return Err(invalid());
        }

        let mut path = self.root.join(rest.join("/"));
        path.set_extension("rs");

        Ok(path)
    }
}

impl SourceEmitter for FileEmitter {
    fn write(
        &mut self,
        namespace: &str,
        name: &Ident,
        spec: &TypeSpec,
    ) -> Result<(), EmissionFailure> {
        let path = self.path_for(namespace)?;
        let types = self.namespaces.entry(namespace.to_string()).or_default();
        types.insert(name.to_string(), spec.clone());

        let source = render_namespace(types.values());
        let failed = |error| EmissionFailure::Write {
            destination: QualifiedName::new(namespace, name.to_string()),
            error,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(failed)?;
        }
        fs::write(&path, source).map_err(failed)?;

        debug!(path = %path.display(), %name, "wrote generated namespace");

        Ok(())
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use autodelegate_core::synth::GENERATED_HEADER;
    use quote::format_ident;
    use syn::Visibility;

    fn spec(name: &str) -> TypeSpec {
        TypeSpec {
            name: format_ident!("{}", name),
            vis: Visibility::Inherited,
            doc: String::new(),
            generics: syn::Generics::default(),
            fields: Vec::new(),
            impls: Vec::new(),
            inherit: InheritSpec {
                name: format_ident!("{}_impl", name),
                declaration: format_ident!("{}", name),
                generics: syn::Generics::default(),
                arms: Vec::new(),
            },
        }
    }

    fn write(emitter: &mut FileEmitter, namespace: &str, name: &str) {
        emitter
            .write(namespace, &format_ident!("{}", name), &spec(name))
            .unwrap();
    }

    #[test]
    fn maps_namespaces_to_files() {
        let emitter = FileEmitter::new("/out");

        assert_eq!(
            emitter.path_for("crate").unwrap(),
            Path::new("/out/autodelegate/crate.rs")
        );
        assert_eq!(
            emitter.path_for("crate::shapes::round").unwrap(),
            Path::new("/out/autodelegate/shapes/round.rs")
        );
        assert!(emitter.path_for("std::io").is_err());
        assert!(emitter.path_for("crate::crate").is_err());
        assert!(emitter.path_for("crate::::x").is_err());
    }

    #[test]
    fn root_file_is_distinct_from_every_module_file() {
        let emitter = FileEmitter::new("/out");
        let root = emitter.path_for("crate").unwrap();

        for namespace in ["crate::root", "crate::krate", "crate::root::crate_"] {
            assert_ne!(emitter.path_for(namespace).unwrap(), root, "{namespace}");
        }
    }

    #[test]
    fn root_and_root_module_keep_separate_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut emitter = FileEmitter::new(dir.path());

        write(&mut emitter, "crate", "Top");
        write(&mut emitter, "crate::root", "Nested");

        let top = fs::read_to_string(emitter.path_for("crate").unwrap()).unwrap();
        let nested = fs::read_to_string(emitter.path_for("crate::root").unwrap()).unwrap();
        assert!(top.contains("Top") && !top.contains("Nested"));
        assert!(nested.contains("Nested") && !nested.contains("Top"));
    }

    #[test]
    fn namespace_file_holds_all_types_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let mut emitter = FileEmitter::new(dir.path());

        write(&mut emitter, "crate::zoo", "Zebra");
        write(&mut emitter, "crate::zoo", "Ant");

        let source = fs::read_to_string(emitter.path_for("crate::zoo").unwrap()).unwrap();
        assert!(source.starts_with(GENERATED_HEADER));
        assert!(source.find("Ant").unwrap() < source.find("Zebra").unwrap());
    }

    #[test]
    fn reset_clears_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut emitter = FileEmitter::new(dir.path());
        write(&mut emitter, "crate", "Stale");
        assert!(emitter.root().join(ROOT_FILE).is_file());

        emitter.reset().unwrap();
        assert!(!emitter.root().exists());

        emitter.reset().unwrap();
    }

    #[test]
    fn invalid_namespace_is_an_emission_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut emitter = FileEmitter::new(dir.path());

        let err = emitter
            .write("other", &format_ident!("Thing"), &spec("Thing"))
            .unwrap_err();

        assert!(matches!(err, EmissionFailure::InvalidNamespace { .. }), "{err}");
    }
}
