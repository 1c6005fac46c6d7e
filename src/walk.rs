//! Lazy traversal strategies producing raw `(name, descriptor)` pairs.
//!
//! Both walkers apply a cheap, deliberately approximate pre-filter before
//! reflecting anything. Whatever slips through is corrected by the
//! predicates in [`crate::filter`].

use ignore::{Walk, WalkBuilder};
use log::{debug, trace};
use std::collections::HashSet;
use std::collections::btree_map;
use std::path::{Path, PathBuf};

use crate::autoload::{AutoloadState, PrefixStyle};
use crate::descriptor::TypeDescriptor;
use crate::naming::{Convention, NamespaceResolver};
use crate::path::{normalize_path, path_intersects};
use crate::reflect::Reflector;

/// Namespace and directory restrictions checked before reflection.
#[derive(Debug, Clone, Default)]
pub struct PreFilter {
    namespaces: Option<Vec<String>>,
    not_namespaces: Vec<String>,
    dirs: Option<Vec<String>>,
}

impl PreFilter {
    /// `dirs` must already be normalized. Allowed namespaces are reduced to
    /// their first segment.
    pub fn new(
        convention: &Convention,
        namespaces: &[String],
        not_namespaces: &[String],
        dirs: &[String],
    ) -> Self {
        let namespaces = (!namespaces.is_empty()).then(|| {
            let mut roots: Vec<String> = namespaces
                .iter()
                .map(|ns| convention.first_segment(ns).to_string())
                .collect();
            roots.sort();
            roots.dedup();
            roots
        });

        let mut not_namespaces: Vec<String> = not_namespaces
            .iter()
            .map(|ns| convention.trim_leading(ns).to_string())
            .collect();
        not_namespaces.sort();
        not_namespaces.dedup();

        Self {
            namespaces,
            not_namespaces,
            dirs: (!dirs.is_empty()).then(|| dirs.to_vec()),
        }
    }

    pub fn accepts_namespace(&self, name: &str) -> bool {
        if self.not_namespaces.iter().any(|ns| name.starts_with(ns.as_str())) {
            return false;
        }
        match &self.namespaces {
            None => true,
            Some(allowed) => allowed.iter().any(|ns| name.starts_with(ns.as_str())),
        }
    }

    /// An empty prefix is a catch-all registration and always passes the
    /// allow-list.
    pub fn accepts_prefix(&self, prefix: &str) -> bool {
        if prefix.is_empty() {
            return true;
        }
        self.accepts_namespace(prefix)
    }

    pub fn accepts_dir(&self, normalized: &str) -> bool {
        match &self.dirs {
            None => true,
            Some(dirs) => dirs.iter().any(|dir| path_intersects(normalized, dir)),
        }
    }
}

/// Per-iteration state. A fresh context is built for every traversal.
/// Names are deduplicated downstream; files are only deduplicated within
/// one tree, so overlapping prefix directories each get their own pass.
pub struct WalkContext<'a> {
    reflector: &'a dyn Reflector,
    convention: &'a Convention,
    filter: PreFilter,
}

impl<'a> WalkContext<'a> {
    pub fn new(reflector: &'a dyn Reflector, convention: &'a Convention, filter: PreFilter) -> Self {
        Self {
            reflector,
            convention,
            filter,
        }
    }

    fn resolver(&self) -> NamespaceResolver<'a> {
        NamespaceResolver::new(self.convention)
    }

    fn reflect(&self, name: &str, path: &Path, normalized: &str) -> Option<TypeDescriptor> {
        match self.reflector.reflect_file(name, path) {
            Ok(mut descriptor) => {
                if descriptor.file.is_none() {
                    descriptor.file = Some(PathBuf::from(normalized));
                }
                Some(descriptor)
            }
            Err(err) => {
                debug!("skipping {name}: {err}");
                None
            }
        }
    }
}

struct SourceFile {
    path: PathBuf,
    normalized: String,
}

/// Sequential, sorted walk over one directory yielding source files.
/// Files reached twice through symlinks are yielded once per tree.
struct SourceTree {
    root: PathBuf,
    walk: Walk,
    visited: HashSet<String>,
}

impl SourceTree {
    fn open(dir: &Path) -> Self {
        let root = PathBuf::from(normalize_path(dir));
        let walk = WalkBuilder::new(&root)
            .hidden(false)
            .ignore(false)
            .parents(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .follow_links(true)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();
        Self {
            root,
            walk,
            visited: HashSet::new(),
        }
    }

    fn next_file(&mut self, convention: &Convention) -> Option<SourceFile> {
        loop {
            let entry = match self.walk.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    debug!("skipping unreadable entry under {}: {err}", self.root.display());
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let path = entry.into_path();
            if !convention.is_source_file(&path) {
                continue;
            }
            let normalized = normalize_path(&path);
            if !self.visited.insert(normalized.clone()) {
                continue;
            }
            return Some(SourceFile { path, normalized });
        }
    }
}

/// Walks a directory tree, mapping files to names by direct nesting.
pub struct DirectoryWalker<'a> {
    ctx: WalkContext<'a>,
    tree: SourceTree,
    base_namespace: String,
}

impl<'a> DirectoryWalker<'a> {
    pub fn new(root: &Path, base_namespace: &str, ctx: WalkContext<'a>) -> Self {
        Self {
            tree: SourceTree::open(root),
            base_namespace: base_namespace.to_string(),
            ctx,
        }
    }
}

impl Iterator for DirectoryWalker<'_> {
    type Item = (String, TypeDescriptor);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let file = self.tree.next_file(self.ctx.convention)?;
            if !self.ctx.filter.accepts_dir(&file.normalized) {
                continue;
            }
            let Some(name) =
                self.ctx
                    .resolver()
                    .nested(&self.tree.root, &self.base_namespace, &file.path)
            else {
                trace!("no name for {}", file.normalized);
                continue;
            };
            if !self.ctx.filter.accepts_namespace(&name) {
                continue;
            }
            if let Some(descriptor) = self.ctx.reflect(&name, &file.path, &file.normalized) {
                return Some((name, descriptor));
            }
        }
    }
}

struct PrefixRoot {
    style: PrefixStyle,
    prefix: String,
    dir: PathBuf,
}

/// Walks an autoload snapshot: class map entries first, then every prefix
/// directory unless the class map is authoritative.
pub struct PrefixWalker<'a> {
    ctx: WalkContext<'a>,
    state: &'a AutoloadState,
    class_map: btree_map::Iter<'a, String, PathBuf>,
    roots: std::vec::IntoIter<PrefixRoot>,
    current: Option<(PrefixRoot, SourceTree)>,
}

impl<'a> PrefixWalker<'a> {
    pub fn new(state: &'a AutoloadState, ctx: WalkContext<'a>) -> Self {
        let mut roots = Vec::new();
        if state.authoritative {
            debug!("class map is authoritative, prefix directories are not walked");
        } else {
            for style in PrefixStyle::ALL {
                for (prefix, dirs) in state.table(style) {
                    if !ctx.filter.accepts_prefix(prefix) {
                        continue;
                    }
                    for dir in dirs {
                        let normalized = normalize_path(dir);
                        if !ctx.filter.accepts_dir(&normalized) {
                            continue;
                        }
                        roots.push(PrefixRoot {
                            style,
                            prefix: prefix.clone(),
                            dir: PathBuf::from(normalized),
                        });
                    }
                }
            }
        }

        Self {
            ctx,
            state,
            class_map: state.class_map.iter(),
            roots: roots.into_iter(),
            current: None,
        }
    }

    fn next_mapped(&mut self) -> Option<(String, TypeDescriptor)> {
        for (name, file) in self.class_map.by_ref() {
            if !self.ctx.filter.accepts_namespace(name) {
                continue;
            }
            let normalized = normalize_path(file);
            if !self.ctx.filter.accepts_dir(&normalized) {
                continue;
            }
            if let Some(descriptor) = self.ctx.reflect(name, file, &normalized) {
                return Some((name.clone(), descriptor));
            }
        }
        None
    }

    fn resolve(&self, root: &PrefixRoot, tree: &SourceTree, path: &Path) -> Option<String> {
        let resolver = self.ctx.resolver();
        match root.style {
            PrefixStyle::Prefixed => resolver.prefixed(&root.prefix, &tree.root, path),
            PrefixStyle::Nested => resolver
                .nested(&tree.root, "", path)
                .filter(|name| name.starts_with(root.prefix.as_str())),
        }
    }
}

impl Iterator for PrefixWalker<'_> {
    type Item = (String, TypeDescriptor);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(found) = self.next_mapped() {
            return Some(found);
        }

        loop {
            let (root, mut tree) = match self.current.take() {
                Some(current) => current,
                None => {
                    let root = self.roots.next()?;
                    let tree = SourceTree::open(&root.dir);
                    (root, tree)
                }
            };

            let Some(file) = tree.next_file(self.ctx.convention) else {
                continue;
            };

            let name = self.resolve(&root, &tree, &file.path);
            let item = match name {
                Some(name)
                    if !self.state.class_map.contains_key(&name)
                        && self.ctx.filter.accepts_namespace(&name) =>
                {
                    self.ctx
                        .reflect(&name, &file.path, &file.normalized)
                        .map(|descriptor| (name, descriptor))
                }
                Some(_) => None,
                None => {
                    trace!("{} is outside prefix {:?}", file.normalized, root.prefix);
                    None
                }
            };

            self.current = Some((root, tree));
            if item.is_some() {
                return item;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_filter_reduces_allowed_namespaces_to_first_segment() {
        let convention = Convention::php();
        let filter = PreFilter::new(
            &convention,
            &[r"Acme\Lib".to_string()],
            &[r"Acme\Lib\Internal".to_string()],
            &[],
        );

        assert!(filter.accepts_namespace(r"Acme\Lib\Widget"));
        assert!(filter.accepts_namespace(r"Acme\Other\Thing"));
        assert!(!filter.accepts_namespace(r"Acme\Lib\Internal\Secret"));
        assert!(!filter.accepts_namespace(r"Vendor\Thing"));
        assert!(filter.accepts_prefix(""));
        assert!(filter.accepts_prefix(r"Acme\"));
        assert!(!filter.accepts_prefix(r"Vendor\"));
    }

    #[test]
    fn pre_filter_dirs_intersect_both_ways() {
        let filter = PreFilter::new(
            &Convention::java(),
            &[],
            &[],
            &["/p/src/lib/Sub".to_string()],
        );
        assert!(filter.accepts_dir("/p/src/lib"));
        assert!(filter.accepts_dir("/p/src/lib/Sub/Thing.java"));
        assert!(!filter.accepts_dir("/p/src/app"));
    }
}
