//! # class-discovery
//!
//! Enumerates the classes, interfaces and traits reachable from a directory
//! tree or an autoloader's prefix tables, reflects each one lazily and
//! exposes filtered views.
//!
//! ## Architecture
//!
//! - **path**: path normalization and the approximate directory intersection test
//! - **naming**: naming conventions and file-to-name resolution
//! - **descriptor**: reflected type metadata
//! - **reflect**: the reflector contract and an in-memory reflector
//! - **java**: Java source reflector built on tree-sitter
//! - **autoload**: autoloader snapshots (class map, prefix tables)
//! - **walk**: directory and prefix walkers with their pre-filter
//! - **sequence**: deduplication and filter application over walker output
//! - **filter**: composable predicates
//! - **finder**: the query builder tying it all together
//! - **cli** / **config**: command line surface of the `class-discovery` binary

pub mod autoload;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod filter;
pub mod finder;
pub mod java;
pub mod naming;
pub mod path;
pub mod reflect;
pub mod sequence;
pub mod walk;

pub use autoload::{AutoloadSource, AutoloadState, ClassMap, PrefixStyle, PrefixTable};
pub use descriptor::{Annotation, TypeDescriptor, TypeKind};
pub use error::{ConfigError, ReflectError};
pub use finder::Finder;
pub use java::JavaReflector;
pub use naming::{Convention, NamespaceResolver};
pub use path::normalize_path;
pub use reflect::{Reflector, StaticReflector};
pub use sequence::Classes;
