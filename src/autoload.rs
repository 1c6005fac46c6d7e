use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::naming::{Convention, NamespaceResolver};

pub type ClassMap = BTreeMap<String, PathBuf>;
pub type PrefixTable = BTreeMap<String, Vec<PathBuf>>;

/// Traversal convention of a prefix table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixStyle {
    /// The prefix owns its directories; only the rest of the name is derived
    /// from the path.
    Prefixed,
    /// Directories hold the whole namespace tree; the prefix only selects
    /// which names live there.
    Nested,
}

impl PrefixStyle {
    pub const ALL: [PrefixStyle; 2] = [PrefixStyle::Prefixed, PrefixStyle::Nested];
}

/// Read access to an autoloader's registration tables.
pub trait AutoloadSource {
    fn class_map(&self) -> ClassMap;
    fn is_class_map_authoritative(&self) -> bool;
    fn prefixes(&self, style: PrefixStyle) -> PrefixTable;
}

/// Owned snapshot of an autoloader, taken once and never refreshed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutoloadState {
    #[serde(default)]
    pub convention: Convention,
    #[serde(default)]
    pub class_map: ClassMap,
    #[serde(default)]
    pub authoritative: bool,
    #[serde(default)]
    pub prefixed: PrefixTable,
    #[serde(default)]
    pub nested: PrefixTable,
}

impl AutoloadState {
    pub fn new(convention: Convention) -> Self {
        Self {
            convention,
            ..Self::default()
        }
    }

    pub fn snapshot(source: &impl AutoloadSource, convention: Convention) -> Self {
        Self {
            convention,
            class_map: source.class_map(),
            authoritative: source.is_class_map_authoritative(),
            prefixed: source.prefixes(PrefixStyle::Prefixed),
            nested: source.prefixes(PrefixStyle::Nested),
        }
    }

    /// Loads a JSON snapshot. Relative paths are taken relative to the
    /// snapshot's own directory.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::SnapshotIo {
            path: path.to_path_buf(),
            source,
        })?;
        let mut state: AutoloadState =
            serde_json::from_str(&raw).map_err(|source| ConfigError::SnapshotJson {
                path: path.to_path_buf(),
                source,
            })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        state.rebase(base);
        state.validate()?;
        Ok(state)
    }

    pub fn with_class(mut self, name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        self.class_map.insert(name.into(), file.into());
        self
    }

    pub fn with_prefix(
        mut self,
        style: PrefixStyle,
        prefix: impl Into<String>,
        dir: impl Into<PathBuf>,
    ) -> Self {
        self.table_mut(style)
            .entry(prefix.into())
            .or_default()
            .push(dir.into());
        self
    }

    pub fn authoritative(mut self, authoritative: bool) -> Self {
        self.authoritative = authoritative;
        self
    }

    pub fn table(&self, style: PrefixStyle) -> &PrefixTable {
        match style {
            PrefixStyle::Prefixed => &self.prefixed,
            PrefixStyle::Nested => &self.nested,
        }
    }

    fn table_mut(&mut self, style: PrefixStyle) -> &mut PrefixTable {
        match style {
            PrefixStyle::Prefixed => &mut self.prefixed,
            PrefixStyle::Nested => &mut self.nested,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let separator = self.convention.separator;
        for style in PrefixStyle::ALL {
            for (prefix, dirs) in self.table(style) {
                if dirs.is_empty() {
                    return Err(ConfigError::PrefixWithoutDirectories {
                        prefix: prefix.clone(),
                    });
                }
                if style == PrefixStyle::Prefixed
                    && !prefix.is_empty()
                    && !prefix.ends_with(separator)
                {
                    return Err(ConfigError::PrefixWithoutSeparator {
                        prefix: prefix.clone(),
                        separator,
                    });
                }
            }
        }

        let has_prefixes = !self.prefixed.is_empty() || !self.nested.is_empty();
        if self.authoritative && self.class_map.is_empty() && has_prefixes {
            return Err(ConfigError::EmptyAuthoritativeClassMap);
        }
        Ok(())
    }

    /// Locates the source file of `name` the way the autoloader would:
    /// class map first, then prefixed rules (longest prefix first), then
    /// nested rules.
    pub fn find_file(&self, name: &str) -> Option<PathBuf> {
        let name = self.convention.trim_leading(name);
        if let Some(file) = self.class_map.get(name) {
            return Some(file.clone());
        }
        if self.authoritative {
            return None;
        }

        let resolver = NamespaceResolver::new(&self.convention);
        let mut prefixed: Vec<_> = self
            .prefixed
            .iter()
            .filter(|(prefix, _)| name.starts_with(prefix.as_str()))
            .collect();
        prefixed.sort_by_key(|(prefix, _)| std::cmp::Reverse(prefix.len()));

        for (prefix, dirs) in prefixed {
            let relative = resolver.relative_path(&name[prefix.len()..]);
            if let Some(found) = first_existing(dirs, &relative) {
                return Some(found);
            }
        }

        let relative = resolver.relative_path(name);
        self.nested
            .iter()
            .filter(|(prefix, _)| name.starts_with(prefix.as_str()))
            .find_map(|(_, dirs)| first_existing(dirs, &relative))
    }

    fn rebase(&mut self, base: &Path) {
        for file in self.class_map.values_mut() {
            *file = base.join(&*file);
        }
        for table in [&mut self.prefixed, &mut self.nested] {
            for dirs in table.values_mut() {
                for dir in dirs.iter_mut() {
                    *dir = base.join(&*dir);
                }
            }
        }
    }
}

impl AutoloadSource for AutoloadState {
    fn class_map(&self) -> ClassMap {
        self.class_map.clone()
    }

    fn is_class_map_authoritative(&self) -> bool {
        self.authoritative
    }

    fn prefixes(&self, style: PrefixStyle) -> PrefixTable {
        self.table(style).clone()
    }
}

fn first_existing(dirs: &[PathBuf], relative: &Path) -> Option<PathBuf> {
    dirs.iter()
        .map(|dir| dir.join(relative))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "class_discovery_autoload_{}_{}_{}",
            std::process::id(),
            nanos,
            name
        ))
    }

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    #[test]
    fn validate_rejects_prefix_without_separator() {
        let state = AutoloadState::new(Convention::php()).with_prefix(
            PrefixStyle::Prefixed,
            r"Acme\Lib",
            "/src/lib",
        );
        assert!(matches!(
            state.validate(),
            Err(ConfigError::PrefixWithoutSeparator { .. })
        ));
    }

    #[test]
    fn validate_rejects_empty_authoritative_class_map() {
        let state = AutoloadState::new(Convention::php())
            .with_prefix(PrefixStyle::Prefixed, r"Acme\", "/src")
            .authoritative(true);
        assert!(matches!(
            state.validate(),
            Err(ConfigError::EmptyAuthoritativeClassMap)
        ));
    }

    #[test]
    fn from_json_file_rebases_relative_paths() {
        let base = temp_dir("json");
        std::fs::create_dir_all(&base).unwrap();
        let snapshot = base.join("autoload.json");
        std::fs::write(
            &snapshot,
            r#"{
                "convention": { "separator": "\\", "extension": "php" },
                "class_map": { "Acme\\Single": "lib/Single.php" },
                "prefixed": { "Acme\\Lib\\": ["src/lib"] }
            }"#,
        )
        .unwrap();

        let state = AutoloadState::from_json_file(&snapshot).unwrap();
        assert_eq!(state.convention, Convention::php());
        assert_eq!(state.class_map[r"Acme\Single"], base.join("lib/Single.php"));
        assert_eq!(state.prefixed[r"Acme\Lib\"], vec![base.join("src/lib")]);
        assert!(!state.authoritative);

        let _ = std::fs::remove_dir_all(base);
    }

    #[test]
    fn find_file_prefers_class_map_then_longest_prefix() {
        let base = temp_dir("find_file");
        let short = base.join("short");
        let long = base.join("long");
        touch(&short.join("Lib").join("Thing.php"));
        touch(&long.join("Thing.php"));
        touch(&base.join("nested").join("Other").join("Util.php"));

        let state = AutoloadState::new(Convention::php())
            .with_class(r"Acme\Mapped", base.join("mapped.php"))
            .with_prefix(PrefixStyle::Prefixed, r"Acme\", &short)
            .with_prefix(PrefixStyle::Prefixed, r"Acme\Lib\", &long)
            .with_prefix(PrefixStyle::Nested, "Other", base.join("nested"));

        assert_eq!(
            state.find_file(r"\Acme\Mapped"),
            Some(base.join("mapped.php"))
        );
        assert_eq!(
            state.find_file(r"Acme\Lib\Thing"),
            Some(long.join("Thing.php"))
        );
        assert_eq!(
            state.find_file(r"Other\Util"),
            Some(base.join("nested").join("Other").join("Util.php"))
        );
        assert_eq!(state.find_file(r"Acme\Missing"), None);

        let _ = std::fs::remove_dir_all(base);
    }
}
