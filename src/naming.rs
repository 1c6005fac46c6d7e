use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// How fully-qualified names and source files relate in the host language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Convention {
    pub separator: char,
    pub extension: String,
}

impl Convention {
    pub fn new(separator: char, extension: impl Into<String>) -> Self {
        Self {
            separator,
            extension: extension.into().trim_start_matches('.').to_string(),
        }
    }

    pub fn java() -> Self {
        Self::new('.', "java")
    }

    pub fn php() -> Self {
        Self::new('\\', "php")
    }

    pub fn is_source_file(&self, path: &Path) -> bool {
        path.extension().is_some_and(|e| e == self.extension.as_str())
    }

    /// Strips a leading separator (`\Foo\Bar` -> `Foo\Bar`).
    pub fn trim_leading<'a>(&self, name: &'a str) -> &'a str {
        name.trim_start_matches(self.separator)
    }

    pub fn trim_namespace<'a>(&self, namespace: &'a str) -> &'a str {
        namespace.trim_matches(self.separator)
    }

    /// Returns the first segment of a name (`Acme\Lib\X` -> `Acme`).
    pub fn first_segment<'a>(&self, name: &'a str) -> &'a str {
        let name = self.trim_leading(name);
        name.split(self.separator).next().unwrap_or(name)
    }

    pub fn join(&self, namespace: &str, segments: &[&str]) -> String {
        let namespace = self.trim_namespace(namespace);
        let mut out = String::from(namespace);
        for segment in segments {
            if !out.is_empty() {
                out.push(self.separator);
            }
            out.push_str(segment);
        }
        out
    }
}

impl Default for Convention {
    fn default() -> Self {
        Self::java()
    }
}

/// Maps discovered source files to fully-qualified names.
#[derive(Debug, Clone, Copy)]
pub struct NamespaceResolver<'a> {
    convention: &'a Convention,
}

impl<'a> NamespaceResolver<'a> {
    pub fn new(convention: &'a Convention) -> Self {
        Self { convention }
    }

    /// Direct nesting: every directory below `root` is one namespace segment,
    /// the file stem is the type name.
    pub fn nested(&self, root: &Path, base_namespace: &str, file: &Path) -> Option<String> {
        if !self.convention.is_source_file(file) {
            return None;
        }
        let relative = file.strip_prefix(root).ok()?;
        let segments = self.segments(relative)?;
        Some(self.convention.join(base_namespace, &segments))
    }

    /// Prefix based: `prefix` owns `base_dir`, the rest of the name comes from
    /// the path below it.
    pub fn prefixed(&self, prefix: &str, base_dir: &Path, file: &Path) -> Option<String> {
        self.nested(base_dir, prefix, file)
    }

    /// Relative source path of `name` under a direct-nesting root.
    pub fn relative_path(&self, name: &str) -> PathBuf {
        let name = self.convention.trim_leading(name);
        let mut path: PathBuf = name.split(self.convention.separator).collect();
        path.set_extension(&self.convention.extension);
        path
    }

    fn segments<'p>(&self, relative: &'p Path) -> Option<Vec<&'p str>> {
        let mut segments = Vec::new();
        let mut components = relative.components().peekable();
        while let Some(component) = components.next() {
            let Component::Normal(raw) = component else {
                return None;
            };
            let raw = raw.to_str()?;
            let segment = if components.peek().is_none() {
                Path::new(raw).file_stem()?.to_str()?
            } else {
                raw
            };
            if !is_identifier(segment) {
                return None;
            }
            segments.push(segment);
        }
        if segments.is_empty() { None } else { Some(segments) }
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
