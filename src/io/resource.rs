use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tempfile::NamedTempFile;

use crate::content::Content;

/// A source of existing documents.
pub trait ResourceReader: Send + Sync {
    /// Read the resource at `path`.
    /// Returns `Ok(None)` when it does not exist, which callers treat the
    /// same as an empty document.
    fn read_resource(&self, path: &Path) -> io::Result<Option<Content>>;
}

/// A destination for generated documents.
pub trait ResourceWriter: Send + Sync {
    /// Replace the contents of `path` with `content`.
    fn write_resource(&self, path: &Path, content: &Content) -> io::Result<()>;
}

// --- Implementation: Local Filesystem ---

/// Reads and writes files on the local filesystem.
///
/// Writes go to a temporary file in the destination directory which is then
/// renamed over the target, so readers never observe a partial document.
/// A replaced file keeps its permissions.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsResources;

impl FsResources {
    pub fn new() -> Self {
        Self
    }
}

impl ResourceReader for FsResources {
    fn read_resource(&self, path: &Path) -> io::Result<Option<Content>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(Content::from(bytes))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl ResourceWriter for FsResources {
    fn write_resource(&self, path: &Path, content: &Content) -> io::Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(content.as_bytes())?;
        match fs::metadata(path) {
            Ok(meta) => file.as_file().set_permissions(meta.permissions())?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        file.as_file().sync_all()?;
        file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

// --- Implementation: In-Memory ---

/// An in-memory store, useful for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryResources {
    files: Mutex<HashMap<PathBuf, Content>>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<Content>) -> Self {
        self.lock().insert(path.into(), content.into());
        self
    }

    /// Current contents of `path`, if any.
    pub fn get(&self, path: &Path) -> Option<Content> {
        self.lock().get(path).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Content>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResourceReader for MemoryResources {
    fn read_resource(&self, path: &Path) -> io::Result<Option<Content>> {
        Ok(self.get(path))
    }
}

impl ResourceWriter for MemoryResources {
    fn write_resource(&self, path: &Path, content: &Content) -> io::Result<()> {
        self.lock().insert(path.to_path_buf(), content.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_resources_round_trip() {
        let store = MemoryResources::new().with_file("README.md", "hello");
        let path = Path::new("README.md");
        assert_eq!(store.read_resource(path).unwrap(), Some(Content::from("hello")));
        store.write_resource(path, &Content::from("bye")).unwrap();
        assert_eq!(store.get(path), Some(Content::from("bye")));
    }

    #[test]
    fn test_memory_resources_missing_file() {
        let store = MemoryResources::new();
        assert_eq!(store.read_resource(Path::new("nope.md")).unwrap(), None);
    }

    #[test]
    fn test_fs_resources_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("README.md");
        assert_eq!(FsResources::new().read_resource(&path).unwrap(), None);
    }

    #[test]
    fn test_fs_resources_write_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("README.md");
        fs::write(&path, "old contents that are longer").unwrap();

        let fs_io = FsResources::new();
        fs_io.write_resource(&path, &Content::from("new")).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new");
        assert_eq!(fs_io.read_resource(&path).unwrap(), Some(Content::from("new")));

        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_fs_resources_write_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let fs_io = FsResources::new();
        for mode in [0o644, 0o755, 0o600] {
            let path = dir.path().join(format!("README-{mode:o}.md"));
            fs::write(&path, "old").unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();

            fs_io.write_resource(&path, &Content::from("new")).unwrap();
            let after = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(after, mode);
            assert_eq!(fs::read(&path).unwrap(), b"new");
        }
    }
}
