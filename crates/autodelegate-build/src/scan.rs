use crate::BuildError;
use autodelegate_core::{
    AnnotatedDeclaration, CapabilityType, DeclarationFailure, DelegateArgs, QualifiedName,
    ROOT_NAMESPACE, Registry, declaration::find_attribute,
};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use syn::{
    Attribute, Ident, Item, ItemImpl, ItemMacro, ItemMod, ItemStruct, Meta, Path as SynPath,
    Token, Type, UseTree, braced, parse::ParseStream,
};
use tracing::{debug, warn};

/// Suffix of the generated inherit macros (`AutoDelegate_Tag_impl!`).
const INHERIT_MACRO_SUFFIX: &str = "_impl";

///
/// Scan
///
/// Everything learned from one crate's sources.
///

#[derive(Debug, Default)]
pub struct Scan {
    pub registry: Registry,

    /// Declarations whose metadata could not be interpreted.
    pub rejected: Vec<DeclarationFailure>,

    /// Files read, root first.
    pub files: Vec<PathBuf>,
}

///
/// SourceScanner
///
/// Walks a crate from its root file, following inline modules and
/// `mod name;` declarations (`name.rs` or `name/mod.rs`). Test modules and
/// modules with a `#[path]` attribute are skipped.
///
/// Trait impls are attributed to the self type's full path, resolved
/// through `crate::`, `self::`, `super::` and the module's `use` items.
/// Invocations of a generated `<Type>_impl!` macro count as impls.
///

#[derive(Debug, Default)]
pub struct SourceScanner {
    scan: Scan,
}

impl SourceScanner {
    /// Scan the crate rooted at `root` (usually `src/lib.rs`).
    pub fn scan(root: &Path) -> Result<Scan, BuildError> {
        let mut scanner = Self::default();
        let dir = root.parent().map(Path::to_path_buf).unwrap_or_default();
        scanner.scan_file(root, ROOT_NAMESPACE, Some(&dir))?;

        Ok(scanner.scan)
    }

    /// Scan a single source string as the crate root. Out-of-line modules
    /// cannot be resolved and are skipped.
    pub fn scan_str(source: &str) -> Result<Scan, BuildError> {
        let file = syn::parse_file(source).map_err(|source| BuildError::Parse {
            path: PathBuf::from("<source>"),
            source,
        })?;

        let mut scanner = Self::default();
        scanner.scan_items(&file.items, ROOT_NAMESPACE, None)?;

        Ok(scanner.scan)
    }

    fn scan_file(
        &mut self,
        path: &Path,
        namespace: &str,
        dir: Option<&Path>,
    ) -> Result<(), BuildError> {
        let source = fs::read_to_string(path).map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file = syn::parse_file(&source).map_err(|source| BuildError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), namespace, "scanning source file");
        self.scan.files.push(path.to_path_buf());

        self.scan_items(&file.items, namespace, dir)
    }

    fn scan_items(
        &mut self,
        items: &[Item],
        namespace: &str,
        dir: Option<&Path>,
    ) -> Result<(), BuildError> {
        let scope = Scope::new(namespace, items);

        for item in items {
            match item {
                Item::Trait(item) => self.scan.registry.add_trait(item, namespace),
                Item::Impl(item) => self.scan_impl(item, &scope),
                Item::Macro(item) => self.scan_macro(item, &scope),
                Item::Struct(item) => self.scan_struct(item, namespace),
                Item::Mod(item) => self.scan_mod(item, namespace, dir)?,
                _ => {}
            }
        }

        Ok(())
    }

    fn scan_impl(&mut self, item: &ItemImpl, scope: &Scope) {
        let Some((None, path, _)) = &item.trait_ else {
            return;
        };

        self.add_impl(path, &item.self_ty, scope);
    }

    // `AutoDelegate_Tag_impl! { impl Named for Tag via base { .. } }`
    fn scan_macro(&mut self, item: &ItemMacro, scope: &Scope) {
        let is_inherit = item
            .mac
            .path
            .segments
            .last()
            .is_some_and(|seg| seg.ident.to_string().ends_with(INHERIT_MACRO_SUFFIX));
        if !is_inherit {
            return;
        }

        match item.mac.parse_body_with(parse_inherit_impl) {
            Ok((path, self_ty)) => self.add_impl(&path, &self_ty, scope),
            Err(err) => debug!(%err, "macro is not an inherit invocation"),
        }
    }

    fn add_impl(&mut self, path: &SynPath, self_ty: &Type, scope: &Scope) {
        match self_type_path(self_ty).and_then(|segments| scope.resolve(&segments)) {
            Some(self_ty) => {
                self.scan
                    .registry
                    .add_impl(self_ty, CapabilityType::from_path(path));
            }
            None => debug!(namespace = %scope.namespace(), "impl self type not resolved"),
        }
    }

    fn scan_struct(&mut self, item: &ItemStruct, namespace: &str) {
        let Some(attr) = find_attribute(&item.attrs) else {
            return;
        };

        match DelegateArgs::metadata(attr) {
            Ok(metadata) => {
                let decl = AnnotatedDeclaration::new(item.ident.clone(), metadata)
                    .in_namespace(namespace)
                    .with_generics(item.generics.clone())
                    .with_visibility(item.vis.clone());

                self.scan.registry.add_declaration(decl);
            }
            Err(error) => {
                let declaration = QualifiedName::new(namespace, item.ident.to_string());
                self.scan
                    .rejected
                    .push(DeclarationFailure::new(declaration, error));
            }
        }
    }

    fn scan_mod(
        &mut self,
        item: &ItemMod,
        namespace: &str,
        dir: Option<&Path>,
    ) -> Result<(), BuildError> {
        let name = item.ident.to_string();
        let child_namespace = format!("{namespace}::{name}");

        if is_test_module(&item.attrs) {
            return Ok(());
        }
        if has_path_attribute(&item.attrs) {
            warn!(module = %child_namespace, "skipping module with #[path] attribute");
            return Ok(());
        }

        let child_dir = dir.map(|dir| dir.join(&name));

        if let Some((_, items)) = &item.content {
            return self.scan_items(items, &child_namespace, child_dir.as_deref());
        }

        let Some(child_dir) = child_dir else {
            warn!(module = %child_namespace, "cannot resolve out-of-line module");
            return Ok(());
        };

        // `name.rs` keeps `name/` as the directory for its own children
        let flat = child_dir.with_extension("rs");
        let nested = child_dir.join("mod.rs");
        let path = if flat.is_file() { flat } else { nested };

        self.scan_file(&path, &child_namespace, Some(&child_dir))
    }
}

///
/// Scope
///
/// One module's absolute path plus the names its `use` items bring in.
///

#[derive(Debug)]
struct Scope {
    segments: Vec<String>,
    aliases: HashMap<String, Vec<String>>,
}

impl Scope {
    fn new(namespace: &str, items: &[Item]) -> Self {
        let mut scope = Self {
            segments: namespace.split("::").map(str::to_string).collect(),
            aliases: HashMap::new(),
        };

        for item in items {
            if let Item::Use(item) = item {
                scope.add_use(&item.tree, Vec::new());
            }
        }

        scope
    }

    fn namespace(&self) -> String {
        self.segments.join("::")
    }

    fn add_use(&mut self, tree: &UseTree, mut prefix: Vec<String>) {
        match tree {
            UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.add_use(&path.tree, prefix);
            }
            UseTree::Name(name) if name.ident == "self" => {
                if let Some(last) = prefix.last().cloned() {
                    self.alias(last, &prefix);
                }
            }
            UseTree::Name(name) => {
                prefix.push(name.ident.to_string());
                self.alias(name.ident.to_string(), &prefix);
            }
            UseTree::Rename(rename) if rename.rename == "_" => {}
            UseTree::Rename(rename) => {
                if rename.ident != "self" {
                    prefix.push(rename.ident.to_string());
                }
                self.alias(rename.rename.to_string(), &prefix);
            }
            UseTree::Group(group) => {
                for tree in &group.items {
                    self.add_use(tree, prefix.clone());
                }
            }
            UseTree::Glob(_) => {}
        }
    }

    fn alias(&mut self, name: String, path: &[String]) {
        if let Some(absolute) = self.absolute(path, false) {
            self.aliases.insert(name, absolute);
        }
    }

    /// Full path of the item `path` names from inside this module.
    fn resolve(&self, path: &[String]) -> Option<QualifiedName> {
        let mut absolute = self.absolute(path, true)?;
        let name = absolute.pop()?;
        if absolute.is_empty() {
            return None;
        }

        Some(QualifiedName::new(absolute.join("::"), name))
    }

    fn absolute(&self, path: &[String], with_aliases: bool) -> Option<Vec<String>> {
        let (first, rest) = path.split_first()?;

        let mut absolute = match first.as_str() {
            ROOT_NAMESPACE => vec![ROOT_NAMESPACE.to_string()],
            "self" => self.segments.clone(),
            "super" => self.segments[..self.segments.len().checked_sub(1)?].to_vec(),
            "Self" => return None,
            _ => match self.aliases.get(first) {
                Some(target) if with_aliases => target.clone(),
                _ => {
                    let mut local = self.segments.clone();
                    local.push(first.clone());
                    local
                }
            },
        };

        for segment in rest {
            if segment == "super" {
                absolute.pop();
            } else {
                absolute.push(segment.clone());
            }
        }

        // climbing above the crate root
        (absolute.first().map(String::as_str) == Some(ROOT_NAMESPACE)).then_some(absolute)
    }
}

// path segments of a self type, without generic arguments
fn self_type_path(ty: &Type) -> Option<Vec<String>> {
    match ty {
        Type::Path(path) if path.qself.is_none() => Some(
            path.path
                .segments
                .iter()
                .map(|seg| seg.ident.to_string())
                .collect(),
        ),
        Type::Group(group) => self_type_path(&group.elem),
        Type::Paren(paren) => self_type_path(&paren.elem),
        _ => None,
    }
}

// `impl <Trait> for <Type> via <field> { .. }`
fn parse_inherit_impl(input: ParseStream) -> syn::Result<(SynPath, Type)> {
    input.parse::<Token![impl]>()?;
    let path: SynPath = input.parse()?;
    input.parse::<Token![for]>()?;
    let self_ty: Type = input.parse()?;

    let via: Ident = input.parse()?;
    if via != "via" {
        return Err(syn::Error::new(via.span(), "expected `via`"));
    }
    input.parse::<Ident>()?;

    let body;
    braced!(body in input);
    body.parse::<proc_macro2::TokenStream>()?;

    Ok((path, self_ty))
}

fn is_test_module(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| match &attr.meta {
        Meta::List(list) => list.path.is_ident("cfg") && list.tokens.to_string() == "test",
        _ => false,
    })
}

fn has_path_attribute(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident("path"))
}

///
/// TESTS
///
