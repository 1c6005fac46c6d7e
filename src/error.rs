use std::path::PathBuf;
use thiserror::Error;

/// Recoverable failure to reflect one type. Walkers skip the item.
#[derive(Debug, Error)]
pub enum ReflectError {
    #[error("no source found for {name}")]
    NotFound { name: String },

    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("syntax error in {}", .path.display())]
    Syntax { path: PathBuf },

    #[error("{} declares {declared}, expected {expected}", .path.display())]
    NameMismatch {
        path: PathBuf,
        expected: String,
        declared: String,
    },

    #[error("{} does not declare {name}", .path.display())]
    NotDeclared { path: PathBuf, name: String },
}

/// Programmer errors, reported when a finder or snapshot is configured.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("prefix {prefix:?} must end with {separator:?}")]
    PrefixWithoutSeparator { prefix: String, separator: char },

    #[error("prefix {prefix:?} has no directories")]
    PrefixWithoutDirectories { prefix: String },

    #[error("class map is marked authoritative but is empty while prefix mappings are declared")]
    EmptyAuthoritativeClassMap,

    #[error("invalid path pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to read autoload snapshot {}", .path.display())]
    SnapshotIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse autoload snapshot {}", .path.display())]
    SnapshotJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
