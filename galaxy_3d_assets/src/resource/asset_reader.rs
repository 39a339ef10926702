/// Asset file access.
///
/// The resource manager never opens files itself: it asks an `AssetReader` for
/// the bytes behind a conventional path (`assets/shaders/<name>`, ...).

use std::io;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

/// Source of asset bytes
pub trait AssetReader {
    /// Read the whole content at `path`
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads assets from the file system, relative to the working directory
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemReader;

impl AssetReader for FileSystemReader {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// In-memory asset store, for embedded assets and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    files: FxHashMap<PathBuf, Vec<u8>>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` at `path`, replacing any previous content
    pub fn insert(&mut self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }

    /// Builder form of [`MemoryReader::insert`]
    pub fn with_file(mut self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl AssetReader for MemoryReader {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no asset at '{}'", path.display()))
        })
    }
}
