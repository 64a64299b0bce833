//! Generated documents and their on-disk lifecycle.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::export::error::ExportError;
use crate::export::xml::{self, Element};

/// One generated file: where it goes and what it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDocument {
    pub path: PathBuf,
    pub content: String,
}

impl ProjectDocument {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        ProjectDocument {
            path: path.into(),
            content: content.into(),
        }
    }

    /// XML document from a root element and header lines.
    pub fn xml(path: impl Into<PathBuf>, headers: &[&str], root: &Element) -> Self {
        ProjectDocument::new(path, xml::to_string(headers, root))
    }

    /// Write the document, creating parent directories. Overwrites unconditionally.
    pub fn write(&self) -> Result<(), ExportError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ExportError::io(parent, e))?;
        }
        fs::write(&self.path, &self.content).map_err(|e| ExportError::io(&self.path, e))
    }
}

/// Parse an existing XML document for merging, if there is one.
pub fn read_existing(path: &Path) -> Result<Option<Element>, ExportError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ExportError::io(path, e)),
    };
    xml::parse(&text)
        .map(Some)
        .map_err(|source| ExportError::MalformedDocument {
            path: path.to_path_buf(),
            source,
        })
}

/// Remove the given files. Missing files are skipped; directories are never removed.
pub fn remove_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, ExportError> {
    let mut removed = Vec::new();
    for path in paths {
        if path.is_dir() {
            tracing::debug!("not removing directory {}", path.display());
            continue;
        }
        match fs::remove_file(path) {
            Ok(()) => removed.push(path.clone()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(ExportError::io(path, e)),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let doc = ProjectDocument::new(tmp.path().join("codeblocks/app.cbp"), "x");
        doc.write().unwrap();
        assert_eq!(fs::read_to_string(&doc.path).unwrap(), "x");
    }

    #[test]
    fn test_read_existing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.xml");
        assert!(read_existing(&path).unwrap().is_none());

        fs::write(&path, "<root><x/></root>").unwrap();
        assert_eq!(read_existing(&path).unwrap().unwrap().name, "root");

        fs::write(&path, "<root><x></root>").unwrap();
        assert!(matches!(
            read_existing(&path),
            Err(ExportError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn test_remove_files_never_touches_directories() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("Makefile");
        let dir = tmp.path().join("sub");
        fs::write(&file, "").unwrap();
        fs::create_dir(&dir).unwrap();

        let removed = remove_files(&[file.clone(), dir.clone(), tmp.path().join("missing")]).unwrap();
        assert_eq!(removed, vec![file.clone()]);
        assert!(!file.exists());
        assert!(dir.exists());
    }
}
