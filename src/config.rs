use anyhow::{Context, Result, bail};
use std::path::PathBuf;

use crate::autoload::{AutoloadState, PrefixStyle};
use crate::cli::{Cli, FilterArgs};
use crate::finder::Finder;
use crate::naming::Convention;
use crate::reflect::Reflector;

/// Where the binary discovers classes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    Root {
        dir: PathBuf,
        base_namespace: String,
    },
    Autoload(PathBuf),
}

pub fn resolve_source(cli: &Cli) -> Result<SourceConfig> {
    if let Some(p) = cli.autoload.clone() {
        return Ok(SourceConfig::Autoload(p));
    }

    let dir = match cli.root.clone() {
        Some(p) => p,
        None => std::env::current_dir().context("Failed to resolve current directory")?,
    };
    Ok(SourceConfig::Root {
        dir,
        base_namespace: cli.base_namespace.clone().unwrap_or_default(),
    })
}

/// Autoload snapshot used to locate sources by name. A plain root becomes a
/// single catch-all nested rule. Snapshots must use the Java convention,
/// the only one the binary can reflect.
pub fn load_state(source: &SourceConfig) -> Result<AutoloadState> {
    match source {
        SourceConfig::Autoload(path) => {
            let state = AutoloadState::from_json_file(path).with_context(|| {
                format!("Failed to load autoload snapshot: {}", path.display())
            })?;
            if state.convention != Convention::java() {
                bail!(
                    "Autoload snapshot {} uses separator {:?} and extension {:?}; only Java sources can be reflected",
                    path.display(),
                    state.convention.separator,
                    state.convention.extension
                );
            }
            Ok(state)
        }
        SourceConfig::Root {
            dir,
            base_namespace,
        } if base_namespace.is_empty() => {
            Ok(AutoloadState::new(Convention::java()).with_prefix(PrefixStyle::Nested, "", dir))
        }
        SourceConfig::Root {
            dir,
            base_namespace,
        } => {
            let convention = Convention::java();
            let prefix = format!(
                "{}{}",
                convention.trim_namespace(base_namespace),
                convention.separator
            );
            Ok(AutoloadState::new(convention).with_prefix(PrefixStyle::Prefixed, prefix, dir))
        }
    }
}

pub fn build_finder<R: Reflector>(
    source: &SourceConfig,
    state: &AutoloadState,
    filters: &FilterArgs,
    reflector: R,
) -> Result<Finder<R>> {
    let mut finder = match source {
        SourceConfig::Root {
            dir,
            base_namespace,
        } => Finder::in_dir(dir, state.convention.clone(), reflector)
            .base_namespace(base_namespace.clone()),
        SourceConfig::Autoload(_) => Finder::from_state(state.clone(), reflector)?,
    };

    finder = finder
        .in_namespace(&filters.namespaces)
        .not_in_namespace(&filters.not_namespaces)
        .in_dirs(&filters.dirs);

    for group in &filters.implements {
        finder = finder.implementation_of(split_names(group));
    }
    for group in &filters.extends {
        finder = finder.subclass_of(split_names(group));
    }
    for group in &filters.annotated_by {
        finder = finder.annotated_by(split_names(group));
    }
    if let Some(pattern) = filters.path.as_deref() {
        finder = finder.path(pattern)?;
    }
    if let Some(pattern) = filters.not_path.as_deref() {
        finder = finder.not_path(pattern)?;
    }
    if filters.instantiable {
        finder = finder.skip_non_instantiable();
    }
    Ok(finder)
}

fn split_names(group: &str) -> Vec<&str> {
    group
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
