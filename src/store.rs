use crate::document::Document;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Load/save failures. These are the only errors that abort a run.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Document is not valid UTF-8: {path}")]
    Utf8 {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where documents come from and go to.
pub trait DocumentStore {
    fn load(&self, path: &Path) -> Result<Document, StoreError>;
    fn save(&self, path: &Path, doc: &Document) -> Result<(), StoreError>;
}

/// Filesystem store with atomic writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl DocumentStore for FsStore {
    fn load(&self, path: &Path) -> Result<Document, StoreError> {
        let bytes = fs::read(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => StoreError::NotFound(path.to_path_buf()),
            _ => StoreError::Read {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let text = String::from_utf8(bytes).map_err(|source| StoreError::Utf8 {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Document::from(text))
    }

    fn save(&self, path: &Path, doc: &Document) -> Result<(), StoreError> {
        atomic_write(path, doc.as_str().as_bytes()).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write lands or the original file is untouched.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    // Same directory keeps the rename on one filesystem.
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

/// In-memory store, keyed by path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RefCell<HashMap<PathBuf, Document>>,
    saves: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.files
            .borrow_mut()
            .insert(path.into(), Document::new(text));
        self
    }

    pub fn get(&self, path: &Path) -> Option<Document> {
        self.files.borrow().get(path).cloned()
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self, path: &Path) -> Result<Document, StoreError> {
        self.get(path)
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))
    }

    fn save(&self, path: &Path, doc: &Document) -> Result<(), StoreError> {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), doc.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}
