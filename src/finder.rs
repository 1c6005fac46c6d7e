use regex::Regex;
use std::path::{Path, PathBuf};

use crate::autoload::{AutoloadSource, AutoloadState};
use crate::descriptor::TypeDescriptor;
use crate::error::ConfigError;
use crate::filter::{
    AnnotationFilter, CallbackFilter, DirectoryFilter, FilterChain, InstantiableFilter,
    InterfaceImplementationFilter, NamespaceFilter, PathFilter, Predicate, SuperclassFilter,
};
use crate::naming::Convention;
use crate::path::normalize_path;
use crate::reflect::Reflector;
use crate::sequence::{ClassSequence, Classes, RawClasses};
use crate::walk::{DirectoryWalker, PreFilter, PrefixWalker, WalkContext};

enum Source {
    Directory { root: PathBuf },
    Autoload(AutoloadState),
}

/// A reusable class query.
///
/// Configure it once, then call [`Finder::iter`] as often as needed: every
/// call walks the sources again and reflects lazily, one type per pull.
///
/// ```no_run
/// use class_discovery::{Finder, JavaReflector, AutoloadState, Convention, PrefixStyle};
///
/// let state = AutoloadState::new(Convention::java())
///     .with_prefix(PrefixStyle::Nested, "", "src/main/java");
/// let finder = Finder::in_dir("src/main/java", Convention::java(), JavaReflector::new(state))
///     .in_namespace(["org.example"])
///     .implementation_of(["org.example.api.Service"]);
///
/// for (name, descriptor) in finder.iter() {
///     println!("{name} {:?}", descriptor.file);
/// }
/// ```
pub struct Finder<R> {
    reflector: R,
    source: Source,
    convention: Convention,
    base_namespace: String,
    namespaces: Vec<String>,
    not_namespaces: Vec<String>,
    dirs: Vec<String>,
    namespace_filter: NamespaceFilter,
    directory_filter: DirectoryFilter,
    predicates: Vec<Box<dyn Predicate>>,
}

impl<R: Reflector> Finder<R> {
    /// Finder over a directory tree resolved by direct nesting. The
    /// convention is fixed here because every later filter is normalized
    /// with its separator.
    pub fn in_dir(root: impl AsRef<Path>, convention: Convention, reflector: R) -> Self {
        let root = PathBuf::from(normalize_path(root));
        Self::with_source(Source::Directory { root }, convention, reflector)
    }

    /// Finder over an autoloader. The tables are copied once, here.
    pub fn from_autoload(
        source: &impl AutoloadSource,
        convention: Convention,
        reflector: R,
    ) -> Result<Self, ConfigError> {
        Self::from_state(AutoloadState::snapshot(source, convention), reflector)
    }

    pub fn from_state(state: AutoloadState, reflector: R) -> Result<Self, ConfigError> {
        state.validate()?;
        let convention = state.convention.clone();
        Ok(Self::with_source(Source::Autoload(state), convention, reflector))
    }

    fn with_source(source: Source, convention: Convention, reflector: R) -> Self {
        Self {
            reflector,
            source,
            convention,
            base_namespace: String::new(),
            namespaces: Vec::new(),
            not_namespaces: Vec::new(),
            dirs: Vec::new(),
            namespace_filter: NamespaceFilter::default(),
            directory_filter: DirectoryFilter::default(),
            predicates: Vec::new(),
        }
    }

    pub fn reflector(&self) -> &R {
        &self.reflector
    }

    /// Namespace of the root directory. Only used for directory finders.
    pub fn base_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.base_namespace = namespace.into();
        self
    }

    pub fn in_namespace<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let convention = &self.convention;
        self.namespaces.extend(
            namespaces
                .into_iter()
                .map(|ns| convention.trim_leading(ns.as_ref()).to_string()),
        );
        self.refresh_namespace_filter();
        self
    }

    pub fn not_in_namespace<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let convention = &self.convention;
        self.not_namespaces.extend(
            namespaces
                .into_iter()
                .map(|ns| convention.trim_leading(ns.as_ref()).to_string()),
        );
        self.refresh_namespace_filter();
        self
    }

    pub fn in_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.dirs.extend(dirs.into_iter().map(normalize_path));
        self.directory_filter = DirectoryFilter::new(self.dirs.clone());
        self
    }

    pub fn implementation_of<I, S>(self, interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let filter = InterfaceImplementationFilter::new(self.convention.separator, interfaces);
        self.with_predicate(filter)
    }

    pub fn subclass_of<I, S>(self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let filter = SuperclassFilter::new(self.convention.separator, classes);
        self.with_predicate(filter)
    }

    pub fn annotated_by<I, S>(self, annotations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let filter = AnnotationFilter::new(self.convention.separator, annotations);
        self.with_predicate(filter)
    }

    /// Keeps types whose source path matches `pattern`.
    pub fn path(self, pattern: &str) -> Result<Self, ConfigError> {
        let re = compile(pattern)?;
        Ok(self.with_predicate(PathFilter::include(re)))
    }

    /// Drops types whose source path matches `pattern`.
    pub fn not_path(self, pattern: &str) -> Result<Self, ConfigError> {
        let re = compile(pattern)?;
        Ok(self.with_predicate(PathFilter::exclude(re)))
    }

    pub fn skip_non_instantiable(self) -> Self {
        self.with_predicate(InstantiableFilter)
    }

    pub fn filter<F>(self, callback: F) -> Self
    where
        F: Fn(&str, &TypeDescriptor) -> bool + 'static,
    {
        self.with_predicate(CallbackFilter::new(callback))
    }

    pub fn with_predicate(mut self, predicate: impl Predicate + 'static) -> Self {
        self.predicates.push(Box::new(predicate));
        self
    }

    /// Starts a fresh traversal.
    ///
    /// Namespace and directory restrictions are checked first, whenever they
    /// were configured, since they cost no reflection. The remaining
    /// predicates run in registration order.
    pub fn iter(&self) -> Classes<'_> {
        let filter = PreFilter::new(
            &self.convention,
            &self.namespaces,
            &self.not_namespaces,
            &self.dirs,
        );
        let ctx = WalkContext::new(&self.reflector, &self.convention, filter);

        let raw: RawClasses<'_> = match &self.source {
            Source::Directory { root } => {
                Box::new(DirectoryWalker::new(root, &self.base_namespace, ctx))
            }
            Source::Autoload(state) => Box::new(PrefixWalker::new(state, ctx)),
        };

        let mut chain = FilterChain::default();
        if !self.namespace_filter.is_empty() {
            chain.push(&self.namespace_filter);
        }
        if !self.directory_filter.is_empty() {
            chain.push(&self.directory_filter);
        }
        for predicate in &self.predicates {
            chain.push(predicate.as_ref());
        }

        Classes::new(ClassSequence::new(raw), chain, &self.reflector)
    }

    fn refresh_namespace_filter(&mut self) {
        self.namespace_filter =
            NamespaceFilter::new(self.namespaces.clone(), self.not_namespaces.clone());
    }
}

impl<'a, R: Reflector> IntoIterator for &'a Finder<R> {
    type Item = (String, TypeDescriptor);
    type IntoIter = Classes<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}
