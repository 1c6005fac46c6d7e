use std::path::{Component, Path, PathBuf};

/// Turns any path into an absolute, `/`-separated string with `.` and `..`
/// resolved. Existing paths are canonicalized; missing ones are resolved
/// lexically.
pub fn normalize_path(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let resolved = std::fs::canonicalize(&absolute).unwrap_or_else(|_| lexical_resolve(&absolute));
    to_canonical_string(&resolved)
}

/// Quick and imprecise directory test: true when either path is a textual
/// prefix of the other. Callers must confirm matches with a stricter check.
pub fn path_intersects(path: &str, dir: &str) -> bool {
    path.starts_with(dir) || dir.starts_with(path)
}

fn lexical_resolve(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(segment) => out.push(segment),
        }
    }
    out
}

fn to_canonical_string(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let raw = raw.strip_prefix(r"\\?\").unwrap_or(&raw);
    let mut s = raw.replace('\\', "/");
    while s.len() > 1 && s.ends_with('/') && !s.ends_with(":/") {
        s.pop();
    }
    s
}
