//! Storage - the physical medium behind a narrow read/write/remove interface
//!
//! ```text
//! RecklessStore (entropy record, verified writes)
//! WalletRegistry (per-network wallet records)
//!        │
//!        ▼
//!   StorageMedium ── FileMedium   (data dir / flash mount)
//!                 └─ MemoryMedium (simulator, tests)
//! ```
//!
//! Paths are logical, `/`-separated, relative to the medium root.

mod reckless;

pub use reckless::RecklessStore;

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Read/write primitives of the storage medium.
pub trait StorageMedium: Send + Sync {
    /// `Ok(None)` when nothing is stored at `path`.
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>>;
    fn write(&self, path: &str, data: &[u8]) -> io::Result<()>;
    /// Returns whether something was removed.
    fn remove(&self, path: &str) -> io::Result<bool>;
}

/// Files under a root directory.
#[derive(Debug, Clone)]
pub struct FileMedium {
    root: PathBuf,
}

impl FileMedium {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let mut full = self.root.clone();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            if part == ".." || part == "." {
                return Err(io::Error::new(io::ErrorKind::InvalidInput, format!("bad path: {}", path)));
            }
            full.push(part);
        }
        Ok(full)
    }
}

impl StorageMedium for FileMedium {
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        match std::fs::read(self.resolve(path)?) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, path: &str, data: &[u8]) -> io::Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(full, data)
    }

    fn remove(&self, path: &str) -> io::Result<bool> {
        match std::fs::remove_file(self.resolve(path)?) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Volatile medium. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryMedium {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything stored, for before/after comparisons.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.files.lock().map(|f| f.clone()).unwrap_or_default()
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>>> {
        self.files
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "medium lock"))
    }
}

impl StorageMedium for MemoryMedium {
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.lock()?.get(path).cloned())
    }

    fn write(&self, path: &str, data: &[u8]) -> io::Result<()> {
        self.lock()?.insert(path.to_string(), data.to_vec());
        Ok(())
    }

    fn remove(&self, path: &str) -> io::Result<bool> {
        Ok(self.lock()?.remove(path).is_some())
    }
}
