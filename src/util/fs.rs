//! Filesystem utilities.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Expand source patterns relative to a base directory.
///
/// Patterns keep their declared order; matches of a single glob are sorted.
/// Literal paths are kept even when the file does not exist yet.
pub fn expand_sources(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut results: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let full_pattern = base.join(pattern);

        if !is_glob(pattern) {
            let path = normalize_lexically(&full_pattern);
            if !results.contains(&path) {
                results.push(path);
            }
            continue;
        }

        let pattern_str = full_pattern.to_string_lossy();
        let mut matched = Vec::new();
        for entry in glob(&pattern_str)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
        {
            match entry {
                Ok(path) => {
                    if path.is_file() {
                        matched.push(normalize_lexically(&path));
                    }
                }
                Err(e) => {
                    tracing::warn!("glob error: {}", e);
                }
            }
        }
        matched.sort();
        for path in matched {
            if !results.contains(&path) {
                results.push(path);
            }
        }
    }

    Ok(results)
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Render a relative path with forward slashes, `.` for the empty path.
pub fn to_slash(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Express `path` relative to `base` when it lives inside it, else keep it absolute.
pub fn relative_if_inside(base: &Path, path: &Path) -> String {
    let path = normalize_lexically(path);
    if is_inside(&path, base) {
        to_slash(&relative_path(base, &path))
    } else {
        path.display().to_string()
    }
}

/// Check if a path is inside another path.
pub fn is_inside(path: &Path, parent: &Path) -> bool {
    path.starts_with(parent)
}

/// Create a symlink (platform-aware).
#[cfg(unix)]
pub fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
pub fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    if src.is_dir() {
        std::os::windows::fs::symlink_dir(src, dst)
    } else {
        std::os::windows::fs::symlink_file(src, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_expand_sources_keeps_pattern_order() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("b.c"), "").unwrap();
        fs::write(src.join("a.c"), "").unwrap();
        fs::write(src.join("z.c"), "").unwrap();
        fs::write(src.join("readme.txt"), "").unwrap();

        let files = expand_sources(
            tmp.path(),
            &["src/z.c".to_string(), "src/*.c".to_string()],
        )
        .unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["z.c", "a.c", "b.c"]);
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/top/a/./b/../c")),
            PathBuf::from("/top/a/c")
        );
        assert_eq!(normalize_lexically(Path::new("../x")), PathBuf::from("../x"));
    }

    #[test]
    fn test_relative_if_inside() {
        let top = Path::new("/top");
        assert_eq!(relative_if_inside(top, Path::new("/top/build/lib")), "build/lib");
        assert_eq!(relative_if_inside(top, Path::new("/top")), ".");
        assert_eq!(relative_if_inside(top, Path::new("/usr/lib")), "/usr/lib");
    }

    #[test]
    fn test_to_slash() {
        assert_eq!(to_slash(Path::new("")), ".");
        assert_eq!(to_slash(Path::new("components/libcore")), "components/libcore");
    }
}
