use log::debug;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;

use crate::descriptor::{TypeDescriptor, TypeKind};
use crate::path::normalize_path;
use crate::reflect::Reflector;

/// A boolean test over one reflected type.
pub trait Predicate {
    fn accept(&self, name: &str, descriptor: &TypeDescriptor, reflector: &dyn Reflector) -> bool;
}

/// Ordered predicates combined with short-circuiting AND.
#[derive(Default)]
pub struct FilterChain<'a> {
    predicates: Vec<&'a dyn Predicate>,
}

impl<'a> FilterChain<'a> {
    pub fn push(&mut self, predicate: &'a dyn Predicate) {
        self.predicates.push(predicate);
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn accepts(&self, name: &str, descriptor: &TypeDescriptor, reflector: &dyn Reflector) -> bool {
        self.predicates
            .iter()
            .all(|p| p.accept(name, descriptor, reflector))
    }
}

fn name_set<I, S>(separator: char, names: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| n.as_ref().trim_start_matches(separator).to_string())
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct NamespaceFilter {
    allow: Vec<String>,
    deny: Vec<String>,
}

impl NamespaceFilter {
    pub fn new(allow: Vec<String>, deny: Vec<String>) -> Self {
        Self { allow, deny }
    }

    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.deny.is_empty()
    }
}

impl Predicate for NamespaceFilter {
    fn accept(&self, name: &str, _: &TypeDescriptor, _: &dyn Reflector) -> bool {
        if self.deny.iter().any(|ns| name.starts_with(ns.as_str())) {
            return false;
        }
        self.allow.is_empty() || self.allow.iter().any(|ns| name.starts_with(ns.as_str()))
    }
}

/// Keeps types whose source file lies inside one of the directories.
/// Unlike the walk pre-filter's `path_intersects`, the match must end on a
/// path segment, so `src/lib` does not admit `src/library/B.java`.
#[derive(Debug, Clone, Default)]
pub struct DirectoryFilter {
    dirs: Vec<String>,
}

impl DirectoryFilter {
    /// `dirs` must already be normalized.
    pub fn new(dirs: Vec<String>) -> Self {
        Self { dirs }
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}

impl Predicate for DirectoryFilter {
    fn accept(&self, _: &str, descriptor: &TypeDescriptor, _: &dyn Reflector) -> bool {
        let Some(file) = descriptor.file.as_deref() else {
            return false;
        };
        let file = normalize_path(file);
        self.dirs.iter().any(|dir| {
            file == *dir
                || (file.starts_with(dir.as_str())
                    && (dir.ends_with('/') || file[dir.len()..].starts_with('/')))
        })
    }
}

/// Classes implementing any of the interfaces. Interfaces and traits never
/// match.
#[derive(Debug, Clone)]
pub struct InterfaceImplementationFilter {
    separator: char,
    interfaces: HashSet<String>,
}

impl InterfaceImplementationFilter {
    pub fn new<I, S>(separator: char, interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            separator,
            interfaces: name_set(separator, interfaces),
        }
    }
}

impl Predicate for InterfaceImplementationFilter {
    fn accept(&self, _: &str, descriptor: &TypeDescriptor, _: &dyn Reflector) -> bool {
        if descriptor.kind != TypeKind::Class {
            return false;
        }
        descriptor
            .interfaces
            .iter()
            .any(|i| self.interfaces.contains(i.trim_start_matches(self.separator)))
    }
}

/// Types whose supertype chain reaches one of the classes at any depth.
#[derive(Debug, Clone)]
pub struct SuperclassFilter {
    separator: char,
    classes: HashSet<String>,
}

impl SuperclassFilter {
    pub fn new<I, S>(separator: char, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            separator,
            classes: name_set(separator, classes),
        }
    }
}

impl Predicate for SuperclassFilter {
    fn accept(&self, name: &str, descriptor: &TypeDescriptor, reflector: &dyn Reflector) -> bool {
        let mut seen = HashSet::new();
        let mut parent = descriptor.supertype.clone();

        while let Some(current) = parent {
            let current = current.trim_start_matches(self.separator).to_string();
            if self.classes.contains(&current) {
                return true;
            }
            if !seen.insert(current.clone()) {
                debug!("supertype cycle at {current} while checking {name}");
                return false;
            }
            parent = match reflector.reflect_name(&current) {
                Ok(ancestor) => ancestor.supertype,
                Err(err) => {
                    debug!("supertype chain of {name} broken at {current}: {err}");
                    return false;
                }
            };
        }
        false
    }
}

#[derive(Debug, Clone)]
pub struct AnnotationFilter {
    separator: char,
    annotations: HashSet<String>,
}

impl AnnotationFilter {
    pub fn new<I, S>(separator: char, annotations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            separator,
            annotations: name_set(separator, annotations),
        }
    }
}

impl Predicate for AnnotationFilter {
    fn accept(&self, _: &str, descriptor: &TypeDescriptor, _: &dyn Reflector) -> bool {
        descriptor.annotations.iter().any(|a| {
            self.annotations
                .contains(a.type_name().trim_start_matches(self.separator))
        })
    }
}

/// Regex include/exclude patterns over the normalized source path.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl PathFilter {
    pub fn include(pattern: Regex) -> Self {
        Self {
            include: vec![pattern],
            exclude: Vec::new(),
        }
    }

    pub fn exclude(pattern: Regex) -> Self {
        Self {
            include: Vec::new(),
            exclude: vec![pattern],
        }
    }
}

impl Predicate for PathFilter {
    fn accept(&self, _: &str, descriptor: &TypeDescriptor, _: &dyn Reflector) -> bool {
        let Some(file) = descriptor.file.as_deref() else {
            return self.include.is_empty();
        };
        let file = normalize_path(file);
        if self.exclude.iter().any(|re| re.is_match(&file)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|re| re.is_match(&file))
    }
}

/// Rejects interfaces, traits and abstract classes.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantiableFilter;

impl Predicate for InstantiableFilter {
    fn accept(&self, _: &str, descriptor: &TypeDescriptor, _: &dyn Reflector) -> bool {
        descriptor.is_instantiable()
    }
}

pub struct CallbackFilter<F> {
    callback: F,
}

impl<F> CallbackFilter<F>
where
    F: Fn(&str, &TypeDescriptor) -> bool,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> fmt::Debug for CallbackFilter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CallbackFilter")
    }
}

impl<F> Predicate for CallbackFilter<F>
where
    F: Fn(&str, &TypeDescriptor) -> bool,
{
    fn accept(&self, name: &str, descriptor: &TypeDescriptor, _: &dyn Reflector) -> bool {
        (self.callback)(name, descriptor)
    }
}
