use crate::{prelude::*, subst::Substitution};
use std::fmt::{self, Display};
use syn::{FnArg, Lifetime, Pat, PathArguments, ReturnType, TraitItemFn};

///
/// CapabilityType
///
/// A trait reference as it appears at the point of delegation: the trait
/// path without arguments, plus its ordered generic arguments.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CapabilityType {
    pub path: Path,
    pub args: Vec<GenericArgument>,
}

impl CapabilityType {
    /// Split a trait path into its argument-free path and generic arguments.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let mut path = path.clone();
        let mut args = Vec::new();

        if let Some(last) = path.segments.last_mut()
            && let PathArguments::AngleBracketed(angle) = &last.arguments
        {
            args = angle.args.iter().cloned().collect();
            last.arguments = PathArguments::None;
        }

        Self { path, args }
    }

    /// Parse a capability from source text such as `Store<V>`.
    pub fn parse(source: &str) -> syn::Result<Self> {
        let path: Path = syn::parse_str(source)?;

        Ok(Self::from_path(&path))
    }

    /// Trait identity used for lookups: the last path segment.
    #[must_use]
    pub fn name(&self) -> String {
        self.path
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .unwrap_or_default()
    }

    /// Does this (requested) capability select the `declared` one?
    /// A request without arguments selects any parameterisation of the trait.
    #[must_use]
    pub fn matches(&self, declared: &Self) -> bool {
        self.name() == declared.name() && (self.args.is_empty() || self.args == declared.args)
    }

    /// Identity independent of how the path was written: `Store<u8>`
    /// whether spelled `Store<u8>`, `super::Store<u8>` or `crate::a::Store<u8>`.
    #[must_use]
    pub fn key(&self) -> String {
        let args = &self.args;
        if args.is_empty() {
            return self.name();
        }

        format!("{}<{}>", self.name(), compact(&quote!(#(#args),*)))
    }

    /// The trait by simple name with its arguments (`Store<V>`).
    #[must_use]
    pub fn local_tokens(&self) -> TokenStream {
        let name = format_ident!("{}", self.name());
        let args = &self.args;

        if args.is_empty() {
            quote!(#name)
        } else {
            quote!(#name<#(#args),*>)
        }
    }

    /// Same trait and arguments, with `path` as the trait path.
    #[must_use]
    pub fn with_path(&self, path: Path) -> Self {
        Self {
            path,
            args: self.args.clone(),
        }
    }

    #[must_use]
    pub fn with_args(&self, args: Vec<GenericArgument>) -> Self {
        Self {
            path: self.path.clone(),
            args,
        }
    }

    /// The trait path in expression position (`Store::<V>`).
    #[must_use]
    pub fn expr_path(&self) -> TokenStream {
        let path = &self.path;
        let args = &self.args;

        if args.is_empty() {
            quote!(#path)
        } else {
            quote!(#path::<#(#args),*>)
        }
    }
}

impl Display for CapabilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&compact(&self.to_token_stream()))
    }
}

impl ToTokens for CapabilityType {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let path = &self.path;
        let args = &self.args;

        if args.is_empty() {
            tokens.extend(quote!(#path));
        } else {
            tokens.extend(quote!(#path<#(#args),*>));
        }
    }
}

///
/// Receiver
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Receiver {
    /// Associated function without `self`.
    None,
    /// `self`, `mut self` or a typed receiver such as `self: Box<Self>`.
    Value,
    Ref(Option<Lifetime>),
    RefMut(Option<Lifetime>),
}

impl Receiver {
    fn from_syn(receiver: &syn::Receiver) -> Self {
        if receiver.colon_token.is_some() {
            return Self::Value;
        }

        match &receiver.reference {
            Some((_, lifetime)) if receiver.mutability.is_some() => Self::RefMut(lifetime.clone()),
            Some((_, lifetime)) => Self::Ref(lifetime.clone()),
            None => Self::Value,
        }
    }

    /// Only borrowed receivers can be forwarded through a boxed trait object.
    #[must_use]
    pub const fn is_forwardable(&self) -> bool {
        matches!(self, Self::Ref(_) | Self::RefMut(_))
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Value => "self",
            Self::Ref(_) => "&self",
            Self::RefMut(_) => "&mut self",
        }
    }
}

impl ToTokens for Receiver {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        match self {
            Self::None => {}
            Self::Value => tokens.extend(quote!(self)),
            Self::Ref(lifetime) => tokens.extend(quote!(&#lifetime self)),
            Self::RefMut(lifetime) => tokens.extend(quote!(&#lifetime mut self)),
        }
    }
}

///
/// Param
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub ty: Type,
}

///
/// Operation
///
/// One trait method as seen by implementers. Parameters bound by patterns
/// other than a plain identifier are renamed `arg<i>` so they can be
/// forwarded by name.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Operation {
    pub name: Ident,
    pub receiver: Receiver,
    pub generics: Generics,
    pub params: Vec<Param>,

    /// `None` when the operation returns no value (missing or `()`).
    pub output: Option<Type>,

    /// The trait supplies a default body.
    pub has_default: bool,

    pub is_unsafe: bool,
}

impl Operation {
    #[must_use]
    pub fn from_trait_fn(item: &TraitItemFn) -> Self {
        let sig = &item.sig;
        let mut receiver = Receiver::None;
        let mut params = Vec::new();

        for input in &sig.inputs {
            match input {
                FnArg::Receiver(r) => receiver = Receiver::from_syn(r),
                FnArg::Typed(typed) => {
                    let name = match &*typed.pat {
                        Pat::Ident(pat) => pat.ident.clone(),
                        _ => format_ident!("arg{}", params.len()),
                    };
                    params.push(Param {
                        name,
                        ty: (*typed.ty).clone(),
                    });
                }
            }
        }

        let output = match &sig.output {
            ReturnType::Default => None,
            ReturnType::Type(_, ty) => match &**ty {
                Type::Tuple(tuple) if tuple.elems.is_empty() => None,
                ty => Some(ty.clone()),
            },
        };

        Self {
            name: sig.ident.clone(),
            receiver,
            generics: sig.generics.clone(),
            params,
            output,
            has_default: item.default.is_some(),
            is_unsafe: sig.unsafety.is_some(),
        }
    }

    #[must_use]
    pub const fn returns_value(&self) -> bool {
        self.output.is_some()
    }

    /// Identity within one capability: name, receiver and parameter types.
    #[must_use]
    pub fn signature_key(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|param| compact(&param.ty.to_token_stream()))
            .collect::<Vec<_>>()
            .join(",");

        format!("{}[{}]({params})", self.name, self.receiver.label())
    }

    /// Replace trait-level generic parameters throughout the signature.
    #[must_use]
    pub fn substitute(&self, subst: &Substitution) -> Self {
        if subst.is_empty() {
            return self.clone();
        }

        Self {
            name: self.name.clone(),
            receiver: self.receiver.clone(),
            generics: subst.apply_generics(&self.generics),
            params: self
                .params
                .iter()
                .map(|param| Param {
                    name: param.name.clone(),
                    ty: subst.apply_type(&param.ty),
                })
                .collect(),
            output: self.output.as_ref().map(|ty| subst.apply_type(ty)),
            has_default: self.has_default,
            is_unsafe: self.is_unsafe,
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .params
            .iter()
            .map(|param| format!("{}: {}", param.name, compact(&param.ty.to_token_stream())))
            .collect::<Vec<_>>()
            .join(", ");

        write!(f, "{}({params})", self.name)?;
        if let Some(output) = &self.output {
            write!(f, " -> {}", compact(&output.to_token_stream()))?;
        }

        Ok(())
    }
}

///
/// QualifiedName
///
/// Namespace (module path) plus simple name. Used both for declarations and
/// for the destination of generated types.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct QualifiedName {
    pub namespace: String,
    pub name: String,
}

impl QualifiedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.namespace, self.name)
    }
}

/// Render tokens as compact source text, keeping spaces only between words.
#[must_use]
pub fn compact(tokens: &TokenStream) -> String {
    let raw = tokens.to_string();
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());

    for (i, c) in chars.iter().enumerate() {
        if *c != ' ' {
            out.push(*c);
            continue;
        }

        let prev = out.chars().last();
        let next = chars.get(i + 1).copied();
        if let (Some(prev), Some(next)) = (prev, next)
            && is_word_char(prev)
            && is_word_char(next)
        {
            out.push(' ');
        }
    }

    out
}

const fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '\''
}

///
/// TESTS
///
