//! Where asset bytes come from.
//!
//! Importers never touch the file system directly; every file, including the
//! buffers and images referenced by a glTF document, is read through an
//! [`AssetSource`]. Paths are relative to the root of the source.

use std::{
    collections::HashMap,
    fs, io,
    path::{Component, Path, PathBuf},
};

pub trait AssetSource {
    /// Read a whole file. A missing file is `Ok(None)`, not an error.
    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>>;
}

/// Drop `.` components and resolve `..` lexically.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push("..");
                }
            }
            other => result.push(other),
        }
    }
    result
}

/// Files below a directory of the file system.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for DirectorySource {
    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.root.join(path)) {
            Ok(data) => Ok(Some(data)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error),
        }
    }
}

/// In-memory bundle of files.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>) {
        self.files
            .insert(normalize_path(path.as_ref()), data.into());
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data);
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl AssetSource for MemorySource {
    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        Ok(self.files.get(&normalize_path(path)).cloned())
    }
}
