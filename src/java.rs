use log::trace;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser};

use crate::autoload::AutoloadState;
use crate::descriptor::{Annotation, TypeDescriptor, TypeKind};
use crate::error::ReflectError;
use crate::reflect::Reflector;

/// Reflects Java source files with tree-sitter. Names are located through an
/// autoload snapshot, so supertype chains can be followed across files.
#[derive(Debug, Clone)]
pub struct JavaReflector {
    locator: AutoloadState,
}

impl JavaReflector {
    pub fn new(locator: AutoloadState) -> Self {
        Self { locator }
    }

    fn locate(&self, name: &str) -> Result<PathBuf, ReflectError> {
        self.locator
            .find_file(name)
            .ok_or_else(|| ReflectError::NotFound {
                name: name.to_string(),
            })
    }

    /// Reflects `name` and widens its interfaces to everything inherited
    /// through supertypes and super-interfaces. Ancestors that cannot be
    /// located or parsed contribute nothing.
    fn reflect_inherited(&self, name: &str, path: &Path) -> Result<TypeDescriptor, ReflectError> {
        let mut descriptor = self.parse_file(name, path)?;

        let mut interfaces = descriptor.interfaces.clone();
        let mut seen = HashSet::from([descriptor.name.clone()]);
        let mut pending: VecDeque<String> = descriptor
            .supertype
            .iter()
            .chain(&descriptor.interfaces)
            .cloned()
            .collect();

        while let Some(ancestor) = pending.pop_front() {
            if !seen.insert(ancestor.clone()) {
                continue;
            }
            let parent = match self
                .locate(&ancestor)
                .and_then(|path| self.parse_file(&ancestor, &path))
            {
                Ok(parent) => parent,
                Err(err) => {
                    trace!("{name}: ancestor {ancestor} not reflected: {err}");
                    continue;
                }
            };
            for interface in &parent.interfaces {
                if !interfaces.contains(interface) {
                    interfaces.push(interface.clone());
                }
            }
            pending.extend(parent.supertype);
            pending.extend(parent.interfaces);
        }

        descriptor.interfaces = interfaces;
        Ok(descriptor)
    }

    fn parse_file(&self, name: &str, path: &Path) -> Result<TypeDescriptor, ReflectError> {
        let source = std::fs::read_to_string(path).map_err(|source| ReflectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let unit = parse_compilation_unit(&source).ok_or_else(|| ReflectError::Syntax {
            path: path.to_path_buf(),
        })?;

        let simple = name.rsplit('.').next().unwrap_or(name);
        let declared = unit
            .types
            .into_iter()
            .find(|t| t.simple_name == simple)
            .ok_or_else(|| ReflectError::NotDeclared {
                path: path.to_path_buf(),
                name: name.to_string(),
            })?;

        let qualified = qualify(&unit.package, &declared.simple_name);
        if qualified != name {
            return Err(ReflectError::NameMismatch {
                path: path.to_path_buf(),
                expected: name.to_string(),
                declared: qualified,
            });
        }

        let scope = Scope {
            package: &unit.package,
            imports: &unit.imports,
        };
        let mut descriptor = TypeDescriptor::new(qualified, declared.kind)
            .implements(declared.interfaces.iter().map(|i| scope.resolve(i)))
            .located_at(path);
        descriptor.is_abstract = declared.is_abstract || declared.kind != TypeKind::Class;
        descriptor.supertype = declared.supertype.as_deref().map(|s| scope.resolve(s));
        descriptor.annotations = declared
            .annotations
            .iter()
            .map(|a| Annotation::resolved(a.clone(), scope.resolve(a)))
            .collect();
        Ok(descriptor)
    }
}

impl Reflector for JavaReflector {
    fn reflect_name(&self, name: &str) -> Result<TypeDescriptor, ReflectError> {
        let path = self.locate(name)?;
        self.reflect_inherited(name, &path)
    }

    fn reflect_file(&self, name: &str, path: &Path) -> Result<TypeDescriptor, ReflectError> {
        self.reflect_inherited(name, path)
    }
}

#[derive(Debug, Default)]
struct CompilationUnit {
    package: String,
    imports: Vec<String>,
    types: Vec<DeclaredType>,
}

#[derive(Debug)]
struct DeclaredType {
    simple_name: String,
    kind: TypeKind,
    is_abstract: bool,
    supertype: Option<String>,
    interfaces: Vec<String>,
    annotations: Vec<String>,
}

struct Scope<'a> {
    package: &'a str,
    imports: &'a [String],
}

impl Scope<'_> {
    /// Resolves a type as written in source to a fully-qualified name.
    fn resolve(&self, written: &str) -> String {
        let written = strip_type_arguments(written);
        if written.contains('.') {
            return written.to_string();
        }
        let suffix = format!(".{written}");
        if let Some(import) = self.imports.iter().find(|i| i.ends_with(&suffix)) {
            return import.clone();
        }
        if is_java_lang(written) {
            return format!("java.lang.{written}");
        }
        qualify(self.package, written)
    }
}

fn parse_compilation_unit(source: &str) -> Option<CompilationUnit> {
    if source.trim().is_empty() {
        return None;
    }

    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .ok()?;
    let tree = parser.parse(source, None)?;
    let root = tree.root_node();
    if root.has_error() {
        return None;
    }
    let bytes = source.as_bytes();

    let mut unit = CompilationUnit::default();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "package_declaration" => {
                unit.package = extract_package(&child, bytes);
            }
            "import_declaration" => {
                if let Some(imp) = extract_import(&child, bytes) {
                    unit.imports.push(imp);
                }
            }
            "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "record_declaration"
            | "annotation_type_declaration" => {
                if let Some(declared) = extract_declaration(&child, bytes) {
                    unit.types.push(declared);
                }
            }
            _ => {}
        }
    }

    Some(unit)
}

fn extract_package(node: &Node, source: &[u8]) -> String {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "scoped_identifier" || child.kind() == "identifier" {
            return node_text(&child, source).to_string();
        }
    }
    String::new()
}

fn extract_import(node: &Node, source: &[u8]) -> Option<String> {
    let mut path = String::new();
    let mut wildcard = false;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "static" => return None,
            "scoped_identifier" | "identifier" => {
                path = node_text(&child, source).to_string();
            }
            "asterisk" => wildcard = true,
            _ => {}
        }
    }

    if path.is_empty() || wildcard { None } else { Some(path) }
}

fn extract_declaration(node: &Node, source: &[u8]) -> Option<DeclaredType> {
    let kind = match node.kind() {
        "interface_declaration" | "annotation_type_declaration" => TypeKind::Interface,
        _ => TypeKind::Class,
    };
    let simple_name = node_text(&node.child_by_field_name("name")?, source).to_string();

    let mut declared = DeclaredType {
        simple_name,
        kind,
        is_abstract: false,
        supertype: None,
        interfaces: Vec::new(),
        annotations: Vec::new(),
    };

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "modifiers" => extract_modifiers(&child, source, &mut declared),
            "superclass" => {
                declared.supertype = first_named_child(&child).map(|t| type_text(&t, source));
            }
            "super_interfaces" | "extends_interfaces" => {
                declared.interfaces.extend(type_list(&child, source));
            }
            _ => {}
        }
    }

    Some(declared)
}

fn extract_modifiers(node: &Node, source: &[u8], declared: &mut DeclaredType) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "abstract" => declared.is_abstract = true,
            "marker_annotation" | "annotation" => {
                if let Some(name) = child.child_by_field_name("name") {
                    declared
                        .annotations
                        .push(node_text(&name, source).to_string());
                }
            }
            _ => {}
        }
    }
}

fn type_list(node: &Node, source: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "type_list" {
            let mut inner = child.walk();
            for ty in child.named_children(&mut inner) {
                out.push(type_text(&ty, source));
            }
        }
    }
    out
}

fn first_named_child<'a>(node: &Node<'a>) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).next()
}

fn type_text(node: &Node, source: &[u8]) -> String {
    strip_type_arguments(node_text(node, source)).to_string()
}

fn strip_type_arguments(written: &str) -> &str {
    written.split('<').next().unwrap_or(written).trim()
}

fn qualify(package: &str, simple: &str) -> String {
    if package.is_empty() {
        simple.to_string()
    } else {
        format!("{package}.{simple}")
    }
}

fn is_java_lang(simple: &str) -> bool {
    matches!(
        simple,
        "Object"
            | "Enum"
            | "Record"
            | "Exception"
            | "RuntimeException"
            | "Throwable"
            | "Error"
            | "Runnable"
            | "Comparable"
            | "Iterable"
            | "AutoCloseable"
            | "Cloneable"
            | "Deprecated"
            | "FunctionalInterface"
            | "Override"
            | "SuppressWarnings"
    )
}

fn node_text<'a>(node: &Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}
